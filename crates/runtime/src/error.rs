//! Error types for the session runtime.
//!
//! Transport failures never reach callers as errors; they are reported as
//! status and drive reconnection. What remains here is the small set of
//! failures a caller can actually observe.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// The session task has exited (after shutdown, or if it panicked).
	#[error("Session closed")]
	SessionClosed,

	/// WebSocket handshake or I/O failure.
	#[error("WebSocket error: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}
