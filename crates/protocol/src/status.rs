use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection status as shown by the host automation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
	Ok,
	Connecting,
	Disconnected,
	ConnectionFailure,
	AuthenticationFailure,
	UnknownWarning,
	UnknownError,
	BadConfig,
}

impl Status {
	/// Whether the session is usable in this status.
	pub fn is_healthy(self) -> bool {
		matches!(self, Status::Ok | Status::UnknownWarning)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Status::Ok => "ok",
			Status::Connecting => "connecting",
			Status::Disconnected => "disconnected",
			Status::ConnectionFailure => "connection_failure",
			Status::AuthenticationFailure => "authentication_failure",
			Status::UnknownWarning => "unknown_warning",
			Status::UnknownError => "unknown_error",
			Status::BadConfig => "bad_config",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
