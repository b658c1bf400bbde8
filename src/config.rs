//! JSON configuration file holding the API key and base URL.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
};
// self
use crate::{_prelude::*, auth::ApiKey, error::ConfigError, models::null_as_default};

/// Base URL used when a configuration does not provide one.
pub const DEFAULT_BASE_URL: &str = "https://prod.fourcore.io";

/// Persisted client settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// API key used as the bearer credential.
	#[serde(default, deserialize_with = "null_as_default")]
	pub api_key: ApiKey,
	/// Base URL of the API; empty means [`DEFAULT_BASE_URL`].
	#[serde(default, deserialize_with = "null_as_default")]
	pub base_url: String,
}
impl ClientConfig {
	const DIR: &'static str = ".fourcore";
	const FILE: &'static str = "config.json";

	/// Creates a configuration for the provided pair.
	pub fn new(base_url: impl Into<String>, api_key: impl Into<ApiKey>) -> Self {
		Self { api_key: api_key.into(), base_url: base_url.into() }
	}

	/// `<home>/.fourcore/config.json`.
	pub fn default_path() -> Result<PathBuf, ConfigError> {
		let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;

		Ok(home.join(Self::DIR).join(Self::FILE))
	}

	/// Loads the file at `path`; a missing or empty file yields the default configuration.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => return Err(ConfigError::File { path: path.to_owned(), source }),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Self::default());
		}

		serde_json::from_slice(&bytes)
			.map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
	}

	/// Writes the configuration to `path` atomically, creating parent directories as needed.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let path = path.as_ref();

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(file_error(parent))?;
		}

		let serialized =
			serde_json::to_vec_pretty(self).map_err(|source| ConfigError::Encode { source })?;
		let mut tmp_path = path.to_owned();

		tmp_path.set_extension("tmp");

		{
			let mut file = Self::create_private(&tmp_path).map_err(file_error(&tmp_path))?;

			file.write_all(&serialized).map_err(file_error(&tmp_path))?;
			file.sync_all().map_err(file_error(&tmp_path))?;
		}

		fs::rename(&tmp_path, path).map_err(file_error(path))
	}

	/// Stored base URL, or [`DEFAULT_BASE_URL`] when none is set.
	pub fn effective_base_url(&self) -> &str {
		match self.base_url.trim() {
			"" => DEFAULT_BASE_URL,
			url => url,
		}
	}

	#[cfg(unix)]
	fn create_private(path: &Path) -> std::io::Result<File> {
		// std
		use std::os::unix::fs::OpenOptionsExt;

		fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)
	}

	#[cfg(not(unix))]
	fn create_private(path: &Path) -> std::io::Result<File> {
		File::create(path)
	}
}

fn file_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + use<> {
	let path = path.to_owned();

	move |source| ConfigError::File { path, source }
}
