//! Record of failed boot attempts.
//!
//! The sequencer pushes every failed attempt here so the fatal report can list
//! what was tried and why it failed. Storage is a fixed ring buffer, so
//! recording never allocates.
//!
//! # Usage
//!
//! ```ignore
//! let mut log = AttemptLog::new();
//! log.push(candidate.clone(), error);
//!
//! for record in log.iter() {
//!     println!("{}: {}", record.candidate, record.error);
//! }
//! ```

use heapless::Deque;

use crate::config::MAX_CANDIDATES;
use crate::sequencer::{BootCandidate, LoadError};

/// Capacity of the log: every primary candidate plus the final retry.
pub const ATTEMPT_LOG_SIZE: usize = MAX_CANDIDATES + 1;

/// One failed attempt.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AttemptRecord {
    /// What was tried.
    pub candidate: BootCandidate,
    /// Why it failed.
    pub error: LoadError,
}

/// Ring buffer of failed attempts.
///
/// Keeps the last [`ATTEMPT_LOG_SIZE`] records. Older records are dropped
/// when the buffer is full.
#[derive(Debug)]
pub struct AttemptLog {
    buffer: Deque<AttemptRecord, ATTEMPT_LOG_SIZE>,
}

impl AttemptLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self { buffer: Deque::new() }
    }

    /// Record a failure. If the buffer is full, the oldest record is dropped.
    pub fn push(
        &mut self,
        candidate: BootCandidate,
        error: LoadError,
    ) {
        if self.buffer.is_full() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(AttemptRecord { candidate, error }).ok();
    }

    /// Iterate over records (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &AttemptRecord> { self.buffer.iter() }

    /// Most recent failure.
    pub fn last(&self) -> Option<&AttemptRecord> { self.buffer.back() }

    /// Number of records held.
    #[inline]
    pub fn len(&self) -> usize { self.buffer.len() }

    /// Whether nothing failed yet.
    #[inline]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }
}

impl Default for AttemptLog {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================
