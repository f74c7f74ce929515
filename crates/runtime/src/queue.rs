//! Rate-limited outbound command queue.
//!
//! Every outbound request goes through one worker task that transmits at most
//! one frame per interval, in submission order. Requests are stamped with a
//! sequence number when they are enqueued. [`CommandQueue::clear`] drops
//! everything still waiting without sending it.
//!
//! Each successful transmission (re)arms the keep-alive timer. When it fires
//! before anything else is sent, an unsequenced `get` probe is enqueued.
//! Clearing the queue stops in-flight sends from re-arming it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use smaart_protocol::CommandRequest;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::sequence::SequenceAllocator;
use crate::timer::TimerSlot;

/// Where the worker hands serialized frames. Returns false when there is no
/// open transport to take the frame.
pub trait Dispatch: Send + Sync + 'static {
	fn dispatch(&self, frame: &str) -> bool;
}

/// What became of one queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	/// Handed to the transport. Says nothing about whether the server acted on it.
	Sent,
	/// No open transport at the time; the frame was dropped.
	NotConnected,
	/// Cleared from the queue before its turn.
	Discarded,
}

/// Completion handle returned by [`CommandQueue::enqueue`].
#[derive(Debug)]
pub struct Ticket {
	sequence: Option<u32>,
	done: oneshot::Receiver<Delivery>,
}

impl Ticket {
	/// Sequence number the request was sent with, if it carries one.
	pub fn sequence_number(&self) -> Option<u32> {
		self.sequence
	}

	/// Waits until the worker has dealt with the request.
	pub async fn delivered(self) -> Delivery {
		self.done.await.unwrap_or(Delivery::Discarded)
	}
}

struct QueueTask {
	epoch: u64,
	frame: String,
	sequence: Option<u32>,
	done: oneshot::Sender<Delivery>,
}

/// Cloneable handle to the queue. The worker stops once every handle is dropped.
#[derive(Clone)]
pub struct CommandQueue {
	inner: Arc<Inner>,
}

struct Inner {
	tasks: mpsc::UnboundedSender<QueueTask>,
	epoch: AtomicU64,
	sequence: SequenceAllocator,
	keepalive: TimerSlot,
	keepalive_delay: Duration,
	worker: JoinHandle<()>,
}

impl CommandQueue {
	/// Spawns the worker. Must be called from within a tokio runtime.
	pub fn new(link: Arc<dyn Dispatch>, interval: Duration, keepalive_delay: Duration) -> Self {
		let (tasks, rx) = mpsc::unbounded_channel();
		let inner = Arc::new_cyclic(|weak: &Weak<Inner>| Inner {
			tasks,
			epoch: AtomicU64::new(0),
			sequence: SequenceAllocator::new(),
			keepalive: TimerSlot::new(),
			keepalive_delay,
			worker: tokio::spawn(run(rx, weak.clone(), link, interval)),
		});
		Self { inner }
	}

	/// Queues `request`, assigning the next sequence number unless it already has one.
	pub fn enqueue(&self, request: CommandRequest) -> Result<Ticket> {
		let request = match request.sequence_number {
			Some(_) => request,
			None => request.with_sequence(self.inner.sequence.next()),
		};
		self.inner.submit(&request)
	}

	/// Queues `request` exactly as given, without a sequence number if it has none.
	pub fn enqueue_unsequenced(&self, request: CommandRequest) -> Result<Ticket> {
		self.inner.submit(&request)
	}

	/// Discards every task that has not started yet. Returns immediately.
	pub fn clear(&self) {
		let epoch = self.inner.epoch.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::debug!(epoch, "command queue cleared");
	}

	pub fn cancel_keepalive(&self) -> bool {
		self.inner.keepalive.cancel()
	}

	pub fn keepalive_armed(&self) -> bool {
		self.inner.keepalive.is_armed()
	}

	/// Stops the worker. Pending tickets resolve as [`Delivery::Discarded`].
	pub fn shutdown(&self) {
		self.clear();
		self.inner.keepalive.cancel();
		self.inner.worker.abort();
	}
}

impl Inner {
	fn submit(&self, request: &CommandRequest) -> Result<Ticket> {
		let frame = serde_json::to_string(request)?;
		let (done, rx) = oneshot::channel();
		let task = QueueTask {
			epoch: self.epoch.load(Ordering::Acquire),
			frame,
			sequence: request.sequence_number,
			done,
		};
		self.tasks.send(task).map_err(|_| Error::SessionClosed)?;
		Ok(Ticket {
			sequence: request.sequence_number,
			done: rx,
		})
	}

	/// Re-arms the keep-alive after a send, unless the queue was cleared since
	/// `epoch`. Checked under the timer lock, so a concurrent clear followed by
	/// [`CommandQueue::cancel_keepalive`] never leaves a timer behind.
	fn arm_keepalive(self: &Arc<Self>, epoch: u64) {
		let weak = Arc::downgrade(self);
		self.keepalive.rearm_if(
			|| self.epoch.load(Ordering::Acquire) == epoch,
			self.keepalive_delay,
			async move {
				let Some(inner) = weak.upgrade() else { return };
				tracing::trace!("keep-alive probe");
				if let Err(err) = (CommandQueue { inner }).enqueue_unsequenced(CommandRequest::get()) {
					tracing::debug!(error = %err, "keep-alive probe not queued");
				}
			},
		);
	}
}

impl Drop for Inner {
	fn drop(&mut self) {
		self.worker.abort();
	}
}

async fn run(mut tasks: mpsc::UnboundedReceiver<QueueTask>, queue: Weak<Inner>, link: Arc<dyn Dispatch>, interval: Duration) {
	while let Some(task) = tasks.recv().await {
		let Some(inner) = queue.upgrade() else { break };

		if task.epoch != inner.epoch.load(Ordering::Acquire) {
			let _ = task.done.send(Delivery::Discarded);
			continue;
		}

		let delivery = if link.dispatch(&task.frame) {
			tracing::debug!(seq = ?task.sequence, frame = %task.frame, "command sent");
			inner.arm_keepalive(task.epoch);
			Delivery::Sent
		} else {
			tracing::warn!(seq = ?task.sequence, "not connected to Smaart, dropping command");
			Delivery::NotConnected
		};
		drop(inner);

		let _ = task.done.send(delivery);
		tokio::time::sleep(interval).await;
	}
}
