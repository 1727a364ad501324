//! Stale-result detection.
//!
//! In-flight calls are never cancelled. A caller that starts a new request
//! takes a fresh ticket; when an older request finishes, its ticket is no
//! longer current and the result is discarded.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

#[derive(Debug, Default)]
pub struct RequestGenerations {
    latest: AtomicU64,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding every earlier ticket.
    pub fn next(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Generation) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Supersede all outstanding tickets without starting a new request.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}
