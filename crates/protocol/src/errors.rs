//! Error identifiers reported by the server in `response.error`.
//!
//! The table is pure data. Lookup is an exact match on the identifier string;
//! anything not listed is treated by the session as an unclassified warning.
//! Add new server strings here rather than in the message handler.

use crate::status::Status;

/// Severity at which a server error is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Warn,
	Error,
}

/// One row of the error table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDescriptor {
	pub id: &'static str,
	pub description: &'static str,
	pub status: Status,
	/// Short text reported alongside `status`.
	pub status_description: &'static str,
	pub log_level: LogLevel,
}

const fn warning(id: &'static str, description: &'static str, status_description: &'static str) -> ErrorDescriptor {
	ErrorDescriptor {
		id,
		description,
		status: Status::UnknownWarning,
		status_description,
		log_level: LogLevel::Warn,
	}
}

/// Every error identifier the v3 API is known to return.
pub static ERRORS: &[ErrorDescriptor] = &[
	warning("parse error", "An error occurred while parsing the JSON request", "Parsing Error"),
	warning(
		"timeout",
		"The timeout elapsed while an asynchronous operation was being carried out (making a window or tab active, etc)",
		"Timeout",
	),
	warning(
		"unknown target",
		"The target of the request was not recognized - name misspelled, measurement was specified that was not in the active tab/window. etc.",
		"Unknown Target",
	),
	warning("unknown action", "The action was not recognized by the target", "Unknown Action"),
	warning("unknown property", "The property does not apply to the target", "Unknown Property"),
	// Spelling used by some server builds.
	warning("unkown property", "The property does not apply to the target", "Unknown Property"),
	warning("unknown value", "The value does not apply to the property", "Unknown Value"),
	warning(
		"read only",
		"An attempt was made to 'set' a property that is read-only",
		"Attempt to set read only property",
	),
	warning(
		"not implemented",
		"A hole in the implementation, or an unreasonable request has been made",
		"Not Implemented",
	),
	warning(
		"signal generator required",
		"An attempt was made to start a measurement that requires the signal generator to be active",
		"Sig Gen Required",
	),
	warning(
		"measurement not active",
		"An attempt to find the delay of a measurement was made while the measurement was not active and the automaticallyStart property was not set",
		"Measurement not active",
	),
	ErrorDescriptor {
		id: "authentication required",
		description: "The API requires a password",
		status: Status::AuthenticationFailure,
		status_description: "Authentication Required",
		log_level: LogLevel::Warn,
	},
	ErrorDescriptor {
		id: "incorrect password",
		description: "The submitted password was incorrect",
		status: Status::AuthenticationFailure,
		status_description: "Incorrect Password",
		log_level: LogLevel::Error,
	},
	ErrorDescriptor {
		id: "incorect password",
		description: "The submitted password was incorrect",
		status: Status::AuthenticationFailure,
		status_description: "Incorrect Password",
		log_level: LogLevel::Error,
	},
	ErrorDescriptor {
		id: "internal error",
		description: "Internal error: Theoretical impossibility",
		status: Status::UnknownError,
		status_description: "Internal Error",
		log_level: LogLevel::Error,
	},
];

/// Looks up a server error identifier.
pub fn lookup(id: &str) -> Option<&'static ErrorDescriptor> {
	ERRORS.iter().find(|descriptor| descriptor.id == id)
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn both_password_spellings_are_auth_failures_at_error_level() {
		for id in ["incorrect password", "incorect password"] {
			let descriptor = lookup(id).unwrap();
			assert_eq!(descriptor.status, Status::AuthenticationFailure);
			assert_eq!(descriptor.log_level, LogLevel::Error);
		}
	}

	#[test]
	fn authentication_required_is_auth_failure_at_warn_level() {
		let descriptor = lookup("authentication required").unwrap();
		assert_eq!(descriptor.status, Status::AuthenticationFailure);
		assert_eq!(descriptor.log_level, LogLevel::Warn);
	}

	#[test]
	fn request_errors_are_warnings() {
		for id in [
			"parse error",
			"timeout",
			"unknown target",
			"unknown action",
			"unknown property",
			"unknown value",
			"read only",
			"not implemented",
			"signal generator required",
			"measurement not active",
		] {
			let descriptor = lookup(id).unwrap_or_else(|| panic!("missing {id}"));
			assert_eq!(descriptor.status, Status::UnknownWarning, "{id}");
			assert_eq!(descriptor.log_level, LogLevel::Warn, "{id}");
		}
	}

	#[test]
	fn internal_error_is_an_error() {
		let descriptor = lookup("internal error").unwrap();
		assert_eq!(descriptor.status, Status::UnknownError);
		assert_eq!(descriptor.log_level, LogLevel::Error);
	}

	#[test]
	fn lookup_is_exact() {
		assert!(lookup("Timeout").is_none());
		assert!(lookup(" timeout").is_none());
		assert!(lookup("something new").is_none());
	}

	#[test]
	fn identifiers_are_unique() {
		let ids: HashSet<_> = ERRORS.iter().map(|d| d.id).collect();
		assert_eq!(ids.len(), ERRORS.len());
	}
}
