//! Debounced status reporting.

use std::sync::Arc;

use serde::Serialize;
use smaart_protocol::Status;
use tokio::sync::watch;

/// A status together with its optional detail text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
	pub status: Status,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl StatusReport {
	pub fn new(status: Status, message: Option<String>) -> Self {
		Self { status, message }
	}
}

impl Default for StatusReport {
	fn default() -> Self {
		Self::new(Status::Disconnected, None)
	}
}

/// Receives status changes. Only called when the `(status, message)` pair changes.
pub trait StatusSink: Send + Sync {
	fn status_changed(&self, report: &StatusReport);
}

impl StatusSink for watch::Sender<StatusReport> {
	fn status_changed(&self, report: &StatusReport) {
		self.send_replace(report.clone());
	}
}

/// Remembers the last reported pair and drops repeats.
pub struct StatusTracker {
	last: Option<StatusReport>,
	sink: Arc<dyn StatusSink>,
}

impl StatusTracker {
	pub fn new(sink: Arc<dyn StatusSink>) -> Self {
		Self { last: None, sink }
	}

	/// Forwards the pair to the sink unless it equals the previous one.
	/// Returns whether a notification was emitted.
	pub fn report(&mut self, status: Status, message: Option<&str>) -> bool {
		if let Some(last) = &self.last {
			if last.status == status && last.message.as_deref() == message {
				return false;
			}
		}

		let report = StatusReport::new(status, message.map(str::to_owned));
		tracing::debug!(status = %report.status, message = ?report.message, "status changed");
		self.sink.status_changed(&report);
		self.last = Some(report);
		true
	}

	pub fn last(&self) -> Option<&StatusReport> {
		self.last.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;

	use super::*;

	#[derive(Default)]
	struct Recording(Mutex<Vec<StatusReport>>);

	impl StatusSink for Recording {
		fn status_changed(&self, report: &StatusReport) {
			self.0.lock().push(report.clone());
		}
	}

	#[test]
	fn identical_reports_notify_once() {
		let sink = Arc::new(Recording::default());
		let mut tracker = StatusTracker::new(sink.clone());

		assert!(tracker.report(Status::Ok, None));
		assert!(!tracker.report(Status::Ok, None));

		assert_eq!(sink.0.lock().len(), 1);
	}

	#[test]
	fn message_change_alone_is_a_new_report() {
		let sink = Arc::new(Recording::default());
		let mut tracker = StatusTracker::new(sink.clone());

		tracker.report(Status::UnknownWarning, Some("Timeout"));
		tracker.report(Status::UnknownWarning, Some("Unknown Target"));
		tracker.report(Status::UnknownWarning, Some("Unknown Target"));
		tracker.report(Status::UnknownWarning, None);

		let seen: Vec<_> = sink.0.lock().iter().map(|r| r.message.clone()).collect();
		assert_eq!(seen, vec![Some("Timeout".to_string()), Some("Unknown Target".to_string()), None]);
	}

	#[test]
	fn returning_to_a_previous_status_notifies_again() {
		let sink = Arc::new(Recording::default());
		let mut tracker = StatusTracker::new(sink.clone());

		tracker.report(Status::Ok, None);
		tracker.report(Status::ConnectionFailure, Some("Disconnected from Smaart"));
		tracker.report(Status::Ok, None);

		assert_eq!(sink.0.lock().len(), 3);
		assert_eq!(tracker.last(), Some(&StatusReport::new(Status::Ok, None)));
	}

	#[test]
	fn watch_sender_is_a_sink() {
		let (tx, rx) = watch::channel(StatusReport::default());
		let mut tracker = StatusTracker::new(Arc::new(tx));

		tracker.report(Status::Connecting, None);

		assert_eq!(rx.borrow().status, Status::Connecting);
	}
}
