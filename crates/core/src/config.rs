//! Connection settings file.
//!
//! The file is JSON with three optional fields, matching what the host surface
//! asks the user for:
//!
//! ```json
//! { "host": "10.0.0.5", "port": "26000", "password": "" }
//! ```
//!
//! It lives at `$XDG_CONFIG_HOME/smaart/config.json` (or `~/.config/...`).
//! Only presence of host and port is checked here; format checks happen when
//! the session tries to connect.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use smaart_runtime::ConnectParams;

use crate::error::{Error, Result};

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub host: Option<String>,
	/// Accepts `"26000"` or `26000` in the file.
	#[serde(skip_serializing_if = "Option::is_none", deserialize_with = "port_text")]
	pub port: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
}

impl SessionConfig {
	pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
		Self {
			host: Some(host.into()),
			port: Some(port.into()),
			password: None,
		}
	}

	pub fn with_password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(password.into());
		self
	}

	/// `$XDG_CONFIG_HOME/smaart/config.json`, falling back to `$HOME/.config`.
	pub fn default_path() -> PathBuf {
		let config_home = std::env::var_os("XDG_CONFIG_HOME")
			.map(PathBuf::from)
			.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
			.unwrap_or_else(|| PathBuf::from("."));
		config_home.join("smaart").join("config.json")
	}

	/// Reads `path`. A missing file yields the empty config; an unreadable or
	/// malformed one is an error.
	pub fn load(path: &Path) -> Result<Self> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "no config file");
				return Ok(Self::default());
			}
			Err(err) => return Err(err.into()),
		};
		serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Writes the config, readable by the owner only since it may hold a password.
	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
		}
		Ok(())
	}

	/// Overrides fields with those set in `other`.
	pub fn merge(&mut self, other: &SessionConfig) {
		if other.host.is_some() {
			self.host.clone_from(&other.host);
		}
		if other.port.is_some() {
			self.port.clone_from(&other.port);
		}
		if other.password.is_some() {
			self.password.clone_from(&other.password);
		}
	}

	/// True when both host and port are filled in.
	pub fn is_complete(&self) -> bool {
		let filled = |field: &Option<String>| field.as_deref().is_some_and(|value| !value.trim().is_empty());
		filled(&self.host) && filled(&self.port)
	}

	pub fn connect_params(&self) -> ConnectParams {
		ConnectParams {
			host: self.host.clone(),
			port: self.port.clone(),
			password: self.password.clone(),
		}
	}
}

impl fmt::Debug for SessionConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

fn port_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Port {
		Text(String),
		Number(u64),
	}

	Ok(Option::<Port>::deserialize(deserializer)?.map(|port| match port {
		Port::Text(text) => text,
		Port::Number(number) => number.to_string(),
	}))
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn missing_file_is_empty_config() {
		let tmp = TempDir::new().unwrap();
		let config = SessionConfig::load(&tmp.path().join("missing.json")).unwrap();
		assert_eq!(config, SessionConfig::default());
		assert!(!config.is_complete());
	}

	#[test]
	fn numeric_port_is_accepted() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("config.json");
		fs::write(&path, r#"{"host":"10.0.0.5","port":26000}"#).unwrap();

		let config = SessionConfig::load(&path).unwrap();
		assert_eq!(config.port.as_deref(), Some("26000"));
		assert!(config.is_complete());
		assert_eq!(config.connect_params().endpoint().unwrap().url(), "ws://10.0.0.5:26000/api/v3/");
	}

	#[test]
	fn malformed_file_names_the_path() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("config.json");
		fs::write(&path, "{host:").unwrap();

		let err = SessionConfig::load(&path).unwrap_err();
		assert!(matches!(err, Error::ConfigParse { .. }));
		assert!(err.to_string().contains("config.json"));
	}

	#[test]
	fn save_then_load_keeps_fields() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("nested").join("config.json");
		let config = SessionConfig::new("smaart.local", "26000").with_password("secret");

		config.save(&path).unwrap();
		assert_eq!(SessionConfig::load(&path).unwrap(), config);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let mode = fs::metadata(&path).unwrap().permissions().mode();
			assert_eq!(mode & 0o777, 0o600);
		}
	}

	#[test]
	fn merge_overrides_only_set_fields() {
		let mut config = SessionConfig::new("10.0.0.5", "26000").with_password("secret");
		config.merge(&SessionConfig {
			port: Some("26001".into()),
			..Default::default()
		});

		assert_eq!(config.host.as_deref(), Some("10.0.0.5"));
		assert_eq!(config.port.as_deref(), Some("26001"));
		assert_eq!(config.password.as_deref(), Some("secret"));
	}

	#[test]
	fn debug_output_hides_the_password() {
		let config = SessionConfig::new("h", "1").with_password("hunter2");
		assert!(!format!("{config:?}").contains("hunter2"));
	}

	#[test]
	fn blank_host_is_incomplete() {
		assert!(!SessionConfig::new("  ", "26000").is_complete());
	}
}
