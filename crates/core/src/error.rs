use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// The session task is gone, or a command could not be queued.
	#[error(transparent)]
	Session(#[from] smaart_runtime::Error),

	#[error("invalid config file {}: {source}", path.display())]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// An action option outside the values the action accepts.
	#[error("invalid {option}: {value}")]
	InvalidOption { option: &'static str, value: String },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub(crate) fn invalid(option: &'static str, value: impl Into<String>) -> Self {
		Self::InvalidOption {
			option,
			value: value.into(),
		}
	}
}
