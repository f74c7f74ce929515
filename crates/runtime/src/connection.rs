//! Session actor.
//!
//! One [`ConnectionManager`] task owns the session: the live transport, the
//! `closing` flag, the reconnect timer, and the status tracker. Everything that
//! can change that state arrives on one of two channels and is handled in a
//! single loop, one input at a time:
//!
//! - control requests from [`SessionHandle`] (connect, config update,
//!   disconnect, shutdown) and the reconnect timer firing
//! - [`TransportEvent`]s, tagged with the generation of the transport that
//!   produced them
//!
//! Every new transport (and every teardown) bumps the generation, so a late
//! `Close` from a socket that was already replaced is dropped instead of
//! scheduling a reconnect.
//!
//! Outbound commands bypass the actor: [`SessionHandle::send`] goes straight to
//! the [`CommandQueue`], whose worker writes through the shared [`SessionLink`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use smaart_protocol::errors::{self, LogLevel};
use smaart_protocol::{CommandRequest, Decoded, Endpoint, HANDSHAKE_SEQUENCE, InboundMessage, Status, commands, decode};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::queue::{CommandQueue, Dispatch, Ticket};
use crate::status::{StatusReport, StatusSink, StatusTracker};
use crate::timer::TimerSlot;
use crate::transport::{Connector, EventSink, TransportEvent, TransportHandle, TransportSender};

/// Delay before reconnecting after an unexpected close.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(10);
/// Minimum spacing between two outbound frames.
pub const COMMAND_INTERVAL: Duration = Duration::from_millis(10);
/// Outbound silence after which a keep-alive probe is sent.
pub const KEEPALIVE_DELAY: Duration = Duration::from_millis(500);

/// Timing knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
	pub reconnect_backoff: Duration,
	pub command_interval: Duration,
	pub keepalive_delay: Duration,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			reconnect_backoff: RECONNECT_BACKOFF,
			command_interval: COMMAND_INTERVAL,
			keepalive_delay: KEEPALIVE_DELAY,
		}
	}
}

/// Where to connect and how to authenticate.
///
/// Host and port are only checked for presence (and the port for being a
/// number) when a connection is attempted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectParams {
	pub host: Option<String>,
	pub port: Option<String>,
	pub password: Option<String>,
}

impl ConnectParams {
	pub fn new(host: impl Into<String>, port: impl Into<String>, password: Option<&str>) -> Self {
		Self {
			host: Some(host.into()),
			port: Some(port.into()),
			password: password.map(str::to_owned),
		}
	}

	/// The endpoint, if host and port are both usable.
	pub fn endpoint(&self) -> Option<Endpoint> {
		Endpoint::parse(self.host.as_deref()?, self.port.as_deref()?)
	}

	/// The configured password. A blank one counts as none.
	pub fn password(&self) -> Option<&str> {
		self.password.as_deref().filter(|password| !password.is_empty())
	}
}

impl fmt::Debug for ConnectParams {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectParams")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("password", &self.password().map(|_| "<redacted>"))
			.finish()
	}
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	Connecting,
	/// The password was sent; waiting for the server to accept it.
	Authenticating,
	Ready,
	ConnectionLost,
	ReconnectPending,
	Closed,
}

/// Point-in-time view of the session, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
	pub state: SessionState,
	pub closing: bool,
	pub transport_present: bool,
	pub reconnect_pending: bool,
	pub keepalive_armed: bool,
	/// The handshake reply arrived and, if a password was asked for, it was accepted.
	pub handshake_complete: bool,
	pub last_status: Option<StatusReport>,
}

enum SessionInput {
	Connect(ConnectParams, oneshot::Sender<()>),
	ConfigUpdated(ConnectParams, oneshot::Sender<()>),
	Disconnect(oneshot::Sender<()>),
	Snapshot(oneshot::Sender<SessionSnapshot>),
	Shutdown(oneshot::Sender<()>),
	/// The reconnect timer armed for `generation` fired.
	ReconnectDue(u64),
}

/// The transport sender the queue writes through. Empty while disconnected.
#[derive(Clone, Default)]
struct SessionLink(Arc<RwLock<Option<TransportSender>>>);

impl SessionLink {
	fn attach(&self, sender: TransportSender) {
		*self.0.write() = Some(sender);
	}

	fn detach(&self) {
		self.0.write().take();
	}
}

impl Dispatch for SessionLink {
	fn dispatch(&self, frame: &str) -> bool {
		self.0.read().as_ref().is_some_and(|sender| sender.send_text(frame.to_owned()))
	}
}

/// Cloneable handle to a running session.
///
/// The session task exits after [`SessionHandle::shutdown`], or once every
/// handle has been dropped.
#[derive(Clone)]
pub struct SessionHandle {
	inbox: mpsc::UnboundedSender<SessionInput>,
	queue: CommandQueue,
}

impl SessionHandle {
	/// Starts an idle session. Must be called from within a tokio runtime.
	pub fn spawn(connector: Arc<dyn Connector>, sink: Arc<dyn StatusSink>, options: SessionOptions) -> Self {
		let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let link = SessionLink::default();
		let queue = CommandQueue::new(Arc::new(link.clone()), options.command_interval, options.keepalive_delay);

		let manager = ConnectionManager {
			connector,
			options,
			tracker: StatusTracker::new(sink),
			queue: queue.clone(),
			link,
			params: ConnectParams::default(),
			transport: None,
			generation: 0,
			closing: false,
			state: SessionState::Idle,
			handshake_complete: false,
			login_sequence: None,
			reconnect: TimerSlot::new(),
			inbox: inbox_tx.downgrade(),
			events: events_tx,
		};
		tokio::spawn(manager.run(inbox_rx, events_rx));

		Self { inbox: inbox_tx, queue }
	}

	/// Connects with `params`, replacing any existing connection.
	pub async fn connect(&self, params: ConnectParams) -> Result<()> {
		self.request(|ack| SessionInput::Connect(params, ack)).await
	}

	/// Applies new settings: clears the queue, drops the current connection,
	/// and reconnects if the settings name a host and port.
	pub async fn config_updated(&self, params: ConnectParams) -> Result<()> {
		self.request(|ack| SessionInput::ConfigUpdated(params, ack)).await
	}

	/// Closes the connection without scheduling a reconnect. Idempotent.
	pub async fn disconnect(&self) -> Result<()> {
		self.request(SessionInput::Disconnect).await
	}

	/// Tears the session down for good. Further requests fail with
	/// [`Error::SessionClosed`].
	pub async fn shutdown(&self) -> Result<()> {
		self.request(SessionInput::Shutdown).await
	}

	pub async fn snapshot(&self) -> Result<SessionSnapshot> {
		self.request(SessionInput::Snapshot).await
	}

	/// Queues a command for transmission.
	pub fn send(&self, request: CommandRequest) -> Result<Ticket> {
		self.queue.enqueue(request)
	}

	async fn request<T>(&self, input: impl FnOnce(oneshot::Sender<T>) -> SessionInput) -> Result<T> {
		let (tx, rx) = oneshot::channel();
		self.inbox.send(input(tx)).map_err(|_| Error::SessionClosed)?;
		rx.await.map_err(|_| Error::SessionClosed)
	}
}

struct ConnectionManager {
	connector: Arc<dyn Connector>,
	options: SessionOptions,
	tracker: StatusTracker,
	queue: CommandQueue,
	link: SessionLink,
	/// Last settings passed to connect; reused by reconnects.
	params: ConnectParams,
	transport: Option<TransportHandle>,
	generation: u64,
	closing: bool,
	state: SessionState,
	handshake_complete: bool,
	/// Sequence number of the queued password command while authenticating.
	login_sequence: Option<u32>,
	reconnect: TimerSlot,
	inbox: mpsc::WeakUnboundedSender<SessionInput>,
	events: mpsc::UnboundedSender<(u64, TransportEvent)>,
}

impl ConnectionManager {
	async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<SessionInput>, mut events: mpsc::UnboundedReceiver<(u64, TransportEvent)>) {
		loop {
			tokio::select! {
				input = inbox.recv() => match input {
					Some(input) => {
						if !self.handle_input(input) {
							break;
						}
					}
					None => {
						debug!("all session handles dropped");
						self.shutdown();
						break;
					}
				},
				Some((generation, event)) = events.recv() => self.handle_event(generation, event),
			}
		}
		debug!("session task exiting");
	}

	/// Returns false once the session is shut down.
	fn handle_input(&mut self, input: SessionInput) -> bool {
		match input {
			SessionInput::Connect(params, ack) => {
				self.params = params;
				self.connect();
				let _ = ack.send(());
			}
			SessionInput::ConfigUpdated(params, ack) => {
				self.config_updated(params);
				let _ = ack.send(());
			}
			SessionInput::Disconnect(ack) => {
				self.disconnect();
				let _ = ack.send(());
			}
			SessionInput::Snapshot(ack) => {
				let _ = ack.send(self.snapshot());
			}
			SessionInput::Shutdown(ack) => {
				self.shutdown();
				let _ = ack.send(());
				return false;
			}
			SessionInput::ReconnectDue(generation) => {
				if self.closing || generation != self.generation {
					debug!(generation, "stale reconnect timer ignored");
				} else {
					self.connect();
				}
			}
		}
		true
	}

	fn config_updated(&mut self, params: ConnectParams) {
		debug!(?params, "configuration updated");
		self.tracker.report(Status::Connecting, None);
		self.queue.clear();
		self.disconnect();
		self.params = params;
		self.connect();
	}

	fn connect(&mut self) {
		let Some(endpoint) = self.params.endpoint() else {
			error!(host = ?self.params.host, port = ?self.params.port, "Smaart host or port is not configured");
			self.tracker.report(Status::BadConfig, Some("Host and port required"));
			return;
		};

		self.disconnect();
		self.closing = false;
		self.reconnect.cancel();

		self.generation += 1;
		self.handshake_complete = false;
		self.login_sequence = None;
		let url = endpoint.url();
		let transport = self.connector.open(&url, EventSink::new(self.generation, self.events.clone()));
		self.link.attach(transport.sender());
		self.transport = Some(transport);

		self.state = SessionState::Connecting;
		self.tracker.report(Status::Connecting, None);
		info!(%endpoint, generation = self.generation, "connecting to Smaart");
	}

	/// Drops the connection on purpose: no reconnect follows.
	fn disconnect(&mut self) {
		self.closing = true;
		self.reconnect.cancel();
		self.queue.clear();
		self.queue.cancel_keepalive();

		if let Some(transport) = self.transport.take() {
			if transport.close() {
				debug!(generation = self.generation, "closing transport");
			}
		}
		self.link.detach();

		self.generation += 1;
		if self.state != SessionState::Closed {
			self.state = SessionState::Idle;
		}
	}

	fn shutdown(&mut self) {
		info!("shutting down Smaart session");
		self.disconnect();
		self.queue.shutdown();
		self.state = SessionState::Closed;
		self.tracker.report(Status::Disconnected, None);
	}

	fn schedule_reconnect(&mut self) {
		let inbox = self.inbox.clone();
		let generation = self.generation;
		let delay = self.options.reconnect_backoff;

		let armed = self.reconnect.arm_if_idle(delay, async move {
			if let Some(inbox) = inbox.upgrade() {
				let _ = inbox.send(SessionInput::ReconnectDue(generation));
			}
		});
		if armed {
			info!(delay_secs = delay.as_secs_f64(), "attempting to reconnect to Smaart");
		}
		self.state = SessionState::ReconnectPending;
	}

	fn handle_event(&mut self, generation: u64, event: TransportEvent) {
		if generation != self.generation {
			debug!(generation, current = self.generation, ?event, "event from a replaced transport ignored");
			return;
		}

		match event {
			TransportEvent::Open => self.on_open(),
			TransportEvent::Error(detail) => {
				error!(error = %detail, "Smaart connection error");
				self.tracker.report(Status::ConnectionFailure, Some(&detail));
			}
			TransportEvent::Close { code, reason } => self.on_close(code, &reason),
			TransportEvent::Message(raw) => match decode(&raw) {
				Decoded::Parsed(message) => self.on_message(message),
				Decoded::Malformed { raw, cause } => {
					warn!(frame = %raw, error = %cause, "unparsable message from Smaart");
					self.tracker.report(Status::UnknownWarning, None);
				}
			},
		}
	}

	fn on_open(&mut self) {
		info!(generation = self.generation, "connected to Smaart");
		self.state = SessionState::Ready;
		self.tracker.report(Status::Ok, None);

		if let Err(err) = self.queue.enqueue(CommandRequest::get().with_sequence(HANDSHAKE_SEQUENCE)) {
			error!(error = %err, "handshake not queued");
		}
	}

	fn on_close(&mut self, code: Option<u16>, reason: &str) {
		warn!(?code, reason, "Smaart socket closed");
		self.transport = None;
		self.link.detach();
		self.queue.cancel_keepalive();

		if self.closing {
			return;
		}
		self.state = SessionState::ConnectionLost;
		self.tracker.report(Status::ConnectionFailure, Some("Disconnected from Smaart"));
		self.schedule_reconnect();
	}

	fn on_message(&mut self, message: InboundMessage) {
		if let Some(id) = message.response.error.as_deref() {
			self.on_server_error(id);
			return;
		}

		if message.requests_authentication() {
			self.authenticate();
			return;
		}

		if self.state == SessionState::Authenticating {
			// Replies to probes or earlier commands say nothing about the password.
			if message.sequence_number.is_none() || message.sequence_number != self.login_sequence {
				debug!(seq = ?message.sequence_number, "reply while waiting for the password to be accepted");
				return;
			}
			info!("authenticated with Smaart");
			self.state = SessionState::Ready;
			self.handshake_complete = true;
			self.login_sequence = None;
		} else if message.sequence_number == Some(HANDSHAKE_SEQUENCE) {
			self.handshake_complete = true;
		}
		self.tracker.report(Status::Ok, None);
	}

	fn authenticate(&mut self) {
		let Some(password) = self.params.password().map(str::to_owned) else {
			warn!("Smaart requires a password but none is configured");
			self.tracker.report(Status::AuthenticationFailure, Some("Password required"));
			return;
		};

		info!("authenticating with Smaart");
		self.tracker.report(Status::Ok, None);
		match self.queue.enqueue(commands::authenticate(&password)) {
			Ok(ticket) => {
				self.state = SessionState::Authenticating;
				self.login_sequence = ticket.sequence_number();
			}
			Err(err) => error!(error = %err, "password not queued"),
		}
	}

	/// Server-reported errors never reconnect; they only change the status.
	fn on_server_error(&mut self, id: &str) {
		match errors::lookup(id) {
			Some(descriptor) => {
				match descriptor.log_level {
					LogLevel::Warn => warn!(error = id, "{}", descriptor.description),
					LogLevel::Error => error!(error = id, "{}", descriptor.description),
				}
				self.tracker.report(descriptor.status, Some(descriptor.status_description));
			}
			None => {
				warn!(error = id, "unrecognised error from Smaart");
				self.tracker.report(Status::UnknownWarning, Some(id));
			}
		}
	}

	fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			state: self.state,
			closing: self.closing,
			transport_present: self.transport.is_some(),
			reconnect_pending: self.reconnect.is_armed(),
			keepalive_armed: self.queue.keepalive_armed(),
			handshake_complete: self.handshake_complete,
			last_status: self.tracker.last().cloned(),
		}
	}
}
