//! Typed JSON helpers: encode the payload, execute, decode the response.

// self
use crate::{
	_prelude::*,
	client::{Client, NO_PAYLOAD, ReqOptions},
	http::HttpTransport,
	response,
};

impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `payload` (JSON-encoded, omitted when `None`) and decodes the response into `D`.
	///
	/// An encoding failure is returned before any network or limiter activity.
	pub async fn request_json<B, D>(
		&self,
		method: Method,
		path: &str,
		payload: Option<&B>,
		options: Option<&ReqOptions>,
	) -> Result<D>
	where
		B: ?Sized + Serialize,
		D: DeserializeOwned,
	{
		let body = payload.map(serde_json::to_vec).transpose().map_err(Error::Encode)?;
		let raw = self.execute(method, path, body, true, options).await?;

		response::decode_response(raw.status, &raw.body)
	}

	/// `GET path` decoded into `D`.
	pub async fn get_json<D>(&self, path: &str, options: Option<&ReqOptions>) -> Result<D>
	where
		D: DeserializeOwned,
	{
		self.request_json(Method::GET, path, NO_PAYLOAD, options).await
	}

	/// `POST path` with an optional JSON payload, decoded into `D`.
	pub async fn post_json<B, D>(
		&self,
		path: &str,
		payload: Option<&B>,
		options: Option<&ReqOptions>,
	) -> Result<D>
	where
		B: ?Sized + Serialize,
		D: DeserializeOwned,
	{
		self.request_json(Method::POST, path, payload, options).await
	}

	/// `PUT path` with an optional JSON payload, decoded into `D`.
	pub async fn put_json<B, D>(
		&self,
		path: &str,
		payload: Option<&B>,
		options: Option<&ReqOptions>,
	) -> Result<D>
	where
		B: ?Sized + Serialize,
		D: DeserializeOwned,
	{
		self.request_json(Method::PUT, path, payload, options).await
	}

	/// `DELETE path` with an optional JSON payload, decoded into `D`.
	pub async fn delete_json<B, D>(
		&self,
		path: &str,
		payload: Option<&B>,
		options: Option<&ReqOptions>,
	) -> Result<D>
	where
		B: ?Sized + Serialize,
		D: DeserializeOwned,
	{
		self.request_json(Method::DELETE, path, payload, options).await
	}
}
