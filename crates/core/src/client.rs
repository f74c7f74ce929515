use std::sync::Arc;

use smaart_protocol::{CommandRequest, commands};
use smaart_runtime::{Connector, SessionHandle, SessionOptions, SessionSnapshot, StatusReport, Ticket, WebSocketConnector};
use tokio::sync::watch;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::Result;

/// A Smaart session plus the typed commands it exposes.
///
/// Command methods only queue the request: the returned [`Ticket`] resolves
/// once the frame was handed to the socket (or dropped because there was no
/// open socket). Server-side outcomes show up in [`Smaart::status`].
///
/// Creating a client spawns the session task, so it must happen inside a
/// tokio runtime.
#[derive(Clone)]
pub struct Smaart {
	session: SessionHandle,
	status: watch::Receiver<StatusReport>,
}

impl Smaart {
	pub fn new(options: SessionOptions) -> Self {
		Self::with_connector(Arc::new(WebSocketConnector), options)
	}

	pub fn with_connector(connector: Arc<dyn Connector>, options: SessionOptions) -> Self {
		let (status_tx, status) = watch::channel(StatusReport::default());
		let session = SessionHandle::spawn(connector, Arc::new(status_tx), options);
		Self { session, status }
	}

	/// First configuration; same as [`Smaart::config_updated`].
	pub async fn init(&self, config: &SessionConfig) -> Result<()> {
		self.config_updated(config).await
	}

	/// Drops queued commands and the current connection, then connects with
	/// `config` if it names a host and port.
	pub async fn config_updated(&self, config: &SessionConfig) -> Result<()> {
		self.session.config_updated(config.connect_params()).await?;
		Ok(())
	}

	pub async fn disconnect(&self) -> Result<()> {
		self.session.disconnect().await?;
		Ok(())
	}

	pub async fn shutdown(&self) -> Result<()> {
		self.session.shutdown().await?;
		Ok(())
	}

	/// Latest `(status, message)` pair; changes only when the pair changes.
	pub fn status(&self) -> watch::Receiver<StatusReport> {
		self.status.clone()
	}

	pub async fn snapshot(&self) -> Result<SessionSnapshot> {
		Ok(self.session.snapshot().await?)
	}

	pub fn reset_avg(&self) -> Result<Ticket> {
		self.send("reset average", commands::reset_average())
	}

	pub fn select_tab(&self, tab_name: &str) -> Result<Ticket> {
		self.send("select tab", commands::select_tab(tab_name))
	}

	/// Starts every measurement in the named tab.
	pub fn start_all_measurements(&self, tab_name: &str) -> Result<Ticket> {
		self.send("start all measurements", commands::start_all_measurements(tab_name))
	}

	pub fn generator_state(&self, active: bool) -> Result<Ticket> {
		self.send("generator state", commands::generator_state(active))
	}

	/// Generator gain in dB FS.
	pub fn set_generator_level(&self, level: f64) -> Result<Ticket> {
		self.send("generator level", commands::generator_level(level))
	}

	/// Delay tracking for all transfer function measurements.
	pub fn tracking_state(&self, active: bool) -> Result<Ticket> {
		self.send("tracking state", commands::tracking_state(active))
	}

	/// Sends a keyboard shortcut, e.g. `"shift + E"`.
	pub fn issue_command(&self, keypress: &str) -> Result<Ticket> {
		self.send("issue command", commands::issue_command(keypress))
	}

	pub fn capture_trace(&self, name: &str) -> Result<Ticket> {
		self.send("capture trace", commands::capture_trace(name))
	}

	pub fn rename_trace(&self, name: &str, trace_file_path: &str) -> Result<Ticket> {
		self.send("rename trace", commands::rename_trace(name, trace_file_path))
	}

	fn send(&self, command: &'static str, request: CommandRequest) -> Result<Ticket> {
		let ticket = self.session.send(request)?;
		debug!(command, seq = ?ticket.sequence_number(), "queued");
		Ok(ticket)
	}
}
