//! Lists assets against a local mock of the platform API, then shows the client adopting the
//! smaller quota a throttling response advertises.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use attack_sdk::{Client, assets::AssetFilter};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let inventory_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v2/assets");
			then.status(200).header("content-type", "application/json").json_body(json!([
				{"id": "lab-01", "connected": true, "available": true, "version": "4.2.0"},
				{"id": "lab-02", "connected": false, "available": false, "version": "4.1.3"}
			]));
		})
		.await;
	let client = Client::new(&server.base_url(), "demo-api-key")?;
	let online =
		client.filtered_assets(AssetFilter { connected: true, available: true }).await?;

	for asset in &online {
		println!("Online asset {} running agent {}.", asset.id, asset.version);
	}

	inventory_mock.assert_async().await;

	let throttle_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v2/assets/lab-01");
			then.status(429).header("x-ratelimit-limit", "20").header("x-ratelimit-retry-after", "15");
		})
		.await;
	let err = client.get_asset("lab-01").await.expect_err("The mock always throttles.");

	println!(
		"Throttled ({err}); retry after {:?}, local budget now {} requests per minute.",
		err.retry_after(),
		client.rate_limiter().capacity()
	);

	throttle_mock.assert_async().await;

	Ok(())
}
