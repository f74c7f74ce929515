//! Payload builders for the commands the client exposes.
//!
//! None of these assign a sequence number; the command queue does that.

use crate::command::{Action, CommandRequest, Selector, Target};

const ACTIVE_MEASUREMENTS: &str = "activeMeasurements";
const SIGNAL_GENERATOR: &str = "signalGenerator";

pub fn reset_average() -> CommandRequest {
	CommandRequest::set()
		.with_target(Target::name(ACTIVE_MEASUREMENTS))
		.with_property("runningAverage", 0)
}

pub fn select_tab(tab_name: &str) -> CommandRequest {
	CommandRequest::set().with_target(Target::name("tabs")).with_property("activeTab", tab_name)
}

pub fn start_all_measurements(tab_name: &str) -> CommandRequest {
	CommandRequest::set()
		.with_target(Selector::measurement("allMeasurements").tab(tab_name))
		.with_property("active", true)
}

pub fn generator_state(active: bool) -> CommandRequest {
	CommandRequest::set().with_target(Target::name(SIGNAL_GENERATOR)).with_property("active", active)
}

/// Generator gain in dB FS.
pub fn generator_level(level: f64) -> CommandRequest {
	CommandRequest::set().with_target(Target::name(SIGNAL_GENERATOR)).with_property("gain", level)
}

/// Delay tracking for every transfer function measurement on the current tab.
pub fn tracking_state(active: bool) -> CommandRequest {
	CommandRequest::set()
		.with_target(Selector::measurement("allTransferFunctionMeasurements"))
		.with_property("trackingDelay", active)
}

/// Forwards a key chord (e.g. `"shift + command + H"`) to the Smaart UI.
pub fn issue_command(keypress: &str) -> CommandRequest {
	CommandRequest::new(Action::IssueCommand).with_property("keypress", keypress)
}

pub fn capture_trace(name: &str) -> CommandRequest {
	CommandRequest::new(Action::Capture)
		.with_target(Target::name(ACTIVE_MEASUREMENTS))
		.with_property("name", name)
}

pub fn rename_trace(name: &str, trace_file_path: &str) -> CommandRequest {
	CommandRequest::set()
		.with_target(Selector::trace_file(trace_file_path))
		.with_property("name", name)
}

/// Password submission sent after the handshake reports `authenticationRequired`.
pub fn authenticate(password: &str) -> CommandRequest {
	CommandRequest::set().with_property("password", password)
}
