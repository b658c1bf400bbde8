//! Rate-aware REST client for the FourCore attack platform: authenticated JSON calls, a closed
//! error taxonomy, and a token-bucket limiter that adapts to the quota the server advertises.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod assets;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod obs;
pub mod rate_limit;
pub mod response;

pub use client::{Client, NO_PAYLOAD, RawResponse, ReqOptions};
pub use error::{Error, Result};

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
