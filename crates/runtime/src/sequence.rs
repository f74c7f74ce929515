//! Request sequence numbers.

use std::sync::atomic::{AtomicU32, Ordering};

use smaart_protocol::HANDSHAKE_SEQUENCE;

/// First number handed out. `0` is never used and `1` belongs to the handshake.
pub const FIRST_SEQUENCE: u32 = HANDSHAKE_SEQUENCE + 1;

/// Highest number handed out before wrapping back to [`FIRST_SEQUENCE`].
pub const SEQUENCE_CEILING: u32 = u16::MAX as u32;

/// Issues request identifiers in `FIRST_SEQUENCE..=SEQUENCE_CEILING`, wrapping.
///
/// Safe to share between tasks; every call returns a distinct value until the
/// range is exhausted.
#[derive(Debug)]
pub struct SequenceAllocator {
	next: AtomicU32,
}

impl SequenceAllocator {
	pub fn new() -> Self {
		Self {
			next: AtomicU32::new(FIRST_SEQUENCE),
		}
	}

	pub fn next(&self) -> u32 {
		let mut current = self.next.load(Ordering::Relaxed);
		loop {
			let following = if current >= SEQUENCE_CEILING { FIRST_SEQUENCE } else { current + 1 };
			match self.next.compare_exchange_weak(current, following, Ordering::AcqRel, Ordering::Relaxed) {
				Ok(_) => return current,
				Err(actual) => current = actual,
			}
		}
	}
}

impl Default for SequenceAllocator {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::sync::Arc;

	use super::*;

	#[test]
	fn starts_after_handshake() {
		let allocator = SequenceAllocator::new();
		assert_eq!(allocator.next(), 2);
		assert_eq!(allocator.next(), 3);
	}

	#[test]
	fn strictly_increases_until_ceiling_then_wraps_to_two() {
		let allocator = SequenceAllocator::new();
		let mut previous = allocator.next();
		for _ in FIRST_SEQUENCE..SEQUENCE_CEILING {
			let value = allocator.next();
			assert!(value > previous, "{value} after {previous}");
			previous = value;
		}
		assert_eq!(previous, SEQUENCE_CEILING);
		assert_eq!(allocator.next(), FIRST_SEQUENCE);
		assert_eq!(allocator.next(), FIRST_SEQUENCE + 1);
	}

	#[test]
	fn never_issues_reserved_values() {
		let allocator = SequenceAllocator::new();
		for _ in 0..(2 * SEQUENCE_CEILING) {
			let value = allocator.next();
			assert!(value >= FIRST_SEQUENCE && value <= SEQUENCE_CEILING);
		}
	}

	#[test]
	fn concurrent_callers_get_distinct_values() {
		let allocator = Arc::new(SequenceAllocator::new());
		let handles: Vec<_> = (0..4)
			.map(|_| {
				let allocator = Arc::clone(&allocator);
				std::thread::spawn(move || (0..1000).map(|_| allocator.next()).collect::<Vec<_>>())
			})
			.collect();

		let mut seen = HashSet::new();
		for handle in handles {
			for value in handle.join().unwrap() {
				assert!(seen.insert(value), "duplicate {value}");
			}
		}
		assert_eq!(seen.len(), 4000);
	}
}
