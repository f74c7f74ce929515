//! Single-slot one-shot timer.
//!
//! At most one timer is outstanding per slot. Arming either keeps an existing
//! timer ([`TimerSlot::arm_if_idle`]) or replaces it ([`TimerSlot::rearm`]);
//! [`TimerSlot::cancel`] aborts it. A timer that has already fired no longer
//! counts as armed.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TimerSlot {
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl TimerSlot {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_armed(&self) -> bool {
		self.handle.lock().as_ref().is_some_and(|handle| !handle.is_finished())
	}

	/// Arms the slot unless a timer is already pending. Returns whether it armed.
	pub fn arm_if_idle<F>(&self, delay: Duration, on_fire: F) -> bool
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let mut slot = self.handle.lock();
		if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
			return false;
		}
		*slot = Some(spawn_after(delay, on_fire));
		true
	}

	/// Cancels any pending timer and arms a new one.
	pub fn rearm<F>(&self, delay: Duration, on_fire: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		self.rearm_if(|| true, delay, on_fire);
	}

	/// [`TimerSlot::rearm`], but only if `wanted` still holds once the slot is
	/// locked. Returns whether it armed; a pending timer is left alone otherwise.
	pub fn rearm_if<F>(&self, wanted: impl FnOnce() -> bool, delay: Duration, on_fire: F) -> bool
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let mut slot = self.handle.lock();
		if !wanted() {
			return false;
		}
		if let Some(previous) = slot.take() {
			previous.abort();
		}
		*slot = Some(spawn_after(delay, on_fire));
		true
	}

	/// Aborts the pending timer, if any. Returns whether one was pending.
	pub fn cancel(&self) -> bool {
		match self.handle.lock().take() {
			Some(handle) => {
				let pending = !handle.is_finished();
				handle.abort();
				pending
			}
			None => false,
		}
	}
}

impl Drop for TimerSlot {
	fn drop(&mut self) {
		if let Some(handle) = self.handle.get_mut().take() {
			handle.abort();
		}
	}
}

fn spawn_after<F>(delay: Duration, on_fire: F) -> JoinHandle<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	tokio::spawn(async move {
		tokio::time::sleep(delay).await;
		on_fire.await;
	})
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	fn bump(count: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
		let count = Arc::clone(count);
		async move {
			count.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[tokio::test(start_paused = true)]
	async fn arm_if_idle_keeps_the_first_timer() {
		let slot = TimerSlot::new();
		let count = Arc::new(AtomicUsize::new(0));

		assert!(slot.arm_if_idle(Duration::from_secs(10), bump(&count)));
		assert!(!slot.arm_if_idle(Duration::from_secs(10), bump(&count)));
		assert!(slot.is_armed());

		tokio::time::sleep(Duration::from_secs(11)).await;

		assert_eq!(count.load(Ordering::SeqCst), 1);
		assert!(!slot.is_armed());
	}

	#[tokio::test(start_paused = true)]
	async fn fired_slot_can_be_armed_again() {
		let slot = TimerSlot::new();
		let count = Arc::new(AtomicUsize::new(0));

		slot.arm_if_idle(Duration::from_secs(1), bump(&count));
		tokio::time::sleep(Duration::from_secs(2)).await;
		assert!(slot.arm_if_idle(Duration::from_secs(1), bump(&count)));
		tokio::time::sleep(Duration::from_secs(2)).await;

		assert_eq!(count.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn rearm_supersedes_pending_timer() {
		let slot = TimerSlot::new();
		let count = Arc::new(AtomicUsize::new(0));

		slot.rearm(Duration::from_millis(500), bump(&count));
		tokio::time::sleep(Duration::from_millis(300)).await;
		slot.rearm(Duration::from_millis(500), bump(&count));
		tokio::time::sleep(Duration::from_millis(300)).await;

		assert_eq!(count.load(Ordering::SeqCst), 0);

		tokio::time::sleep(Duration::from_millis(300)).await;
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn rearm_if_checks_the_condition_first() {
		let slot = TimerSlot::new();
		let count = Arc::new(AtomicUsize::new(0));

		assert!(!slot.rearm_if(|| false, Duration::from_millis(500), bump(&count)));
		assert!(!slot.is_armed());

		assert!(slot.rearm_if(|| true, Duration::from_millis(500), bump(&count)));
		assert!(!slot.rearm_if(|| false, Duration::from_millis(500), bump(&count)));
		assert!(slot.is_armed());

		tokio::time::sleep(Duration::from_secs(1)).await;
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn cancel_prevents_firing() {
		let slot = TimerSlot::new();
		let count = Arc::new(AtomicUsize::new(0));

		slot.arm_if_idle(Duration::from_secs(10), bump(&count));
		assert!(slot.cancel());
		assert!(!slot.is_armed());
		assert!(!slot.cancel());

		tokio::time::sleep(Duration::from_secs(20)).await;
		assert_eq!(count.load(Ordering::SeqCst), 0);
	}
}
