//! Boot candidate sequencing.
//!
//! Tries an ordered list of boot images until one starts, then makes exactly
//! one more attempt at a designated last-resort image.
//!
//! # State Machine
//!
//! ```text
//!  Pending(0) ──fail──▶ Pending(1) ──fail──▶ … ──fail──▶ ExhaustedPrimary
//!      │                    │                                  │
//!      └──ok──┐      ┌──ok──┘                                  ▼
//!             ▼      ▼                                     FinalRetry
//!            Succeeded ◀──────────────────ok────────────────── │
//!                                                              fail
//!                                                              ▼
//!                                                            Failed
//! ```
//!
//! `Succeeded` and `Failed` are terminal. Every failure is recorded in the
//! [`AttemptLog`] and never ends the sequence early.

use core::fmt;

use heapless::{String, Vec};
use thiserror::Error;

use crate::attempts::AttemptLog;
use crate::config::{ConfigError, MAX_CANDIDATES, PATH_LEN, bounded_path};
use crate::error::{ErrorKind, StatusCode};

// =============================================================================
// Candidates
// =============================================================================

/// One boot image to try.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BootCandidate {
    path: String<PATH_LEN>,
    ordinal: usize,
}

impl BootCandidate {
    /// Candidate at position `ordinal` of the priority list.
    pub fn new(
        path: &str,
        ordinal: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            path: bounded_path(path)?,
            ordinal,
        })
    }

    /// Firmware path of the image.
    #[inline]
    pub fn path(&self) -> &str { self.path.as_str() }

    /// Position in the priority list. The last-resort candidate sits one past
    /// the end of the primary list.
    #[inline]
    pub const fn ordinal(&self) -> usize { self.ordinal }
}

impl fmt::Display for BootCandidate {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Non-empty, bounded list of primary candidates plus the last-resort one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BootCandidates {
    primary: Vec<BootCandidate, MAX_CANDIDATES>,
    fallback: BootCandidate,
}

impl BootCandidates {
    /// Build from paths in priority order.
    pub fn new(
        paths: &[&str],
        fallback: &str,
    ) -> Result<Self, ConfigError> {
        let mut primary = Vec::new();
        for (ordinal, path) in paths.iter().enumerate() {
            primary
                .push(BootCandidate::new(path, ordinal)?)
                .map_err(|_| ConfigError::TooManyCandidates)?;
        }
        if primary.is_empty() {
            return Err(ConfigError::NoCandidates);
        }

        let fallback = BootCandidate::new(fallback, primary.len())?;
        Ok(Self { primary, fallback })
    }

    /// Primary candidates in priority order.
    #[inline]
    pub fn primary(&self) -> &[BootCandidate] { &self.primary }

    /// Last-resort candidate.
    #[inline]
    pub const fn fallback(&self) -> &BootCandidate { &self.fallback }

    /// Number of primary candidates (never zero).
    #[inline]
    pub fn len(&self) -> usize { self.primary.len() }

    /// Always `false`, the list is never empty.
    #[inline]
    pub fn is_empty(&self) -> bool { self.primary.is_empty() }

    /// Replace the primary list.
    pub fn set_primary(
        &mut self,
        primary: Vec<BootCandidate, MAX_CANDIDATES>,
    ) -> Result<(), ConfigError> {
        if primary.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        self.fallback.ordinal = primary.len();
        self.primary = primary;
        Ok(())
    }

    /// Replace the last-resort path.
    pub fn set_fallback(
        &mut self,
        path: &str,
    ) -> Result<(), ConfigError> {
        self.fallback = BootCandidate::new(path, self.primary.len())?;
        Ok(())
    }
}

// =============================================================================
// Loader interface
// =============================================================================

/// A failed load or start, as reported by the platform.
///
/// Displays with the firmware's name for the status, which can be finer
/// grained than `kind`.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
#[error("{} ({})", .status.name(), .status)]
pub struct LoadError {
    /// Classified failure.
    pub kind: ErrorKind,
    /// Raw firmware status.
    pub status: StatusCode,
}

/// Loads and starts a boot image.
pub trait ImageLoader {
    /// Load `candidate` and transfer control to it.
    ///
    /// On a real hand-off this does not return. `Ok(())` means the image ran
    /// and exited with success.
    fn load_and_start(
        &mut self,
        candidate: &BootCandidate,
    ) -> Result<(), LoadError>;
}

// =============================================================================
// Sequencer
// =============================================================================

/// Sequencer state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SequenceState {
    /// Primary candidate `i` is next.
    Pending(usize),
    /// A candidate started (terminal).
    Succeeded,
    /// Every primary candidate failed.
    ExhaustedPrimary,
    /// The last-resort candidate is next.
    FinalRetry,
    /// Nothing could be started (terminal).
    Failed,
}

impl SequenceState {
    /// Whether the sequence has ended.
    #[inline]
    pub const fn is_terminal(self) -> bool { matches!(self, Self::Succeeded | Self::Failed) }
}

/// Walks [`BootCandidates`] through the state machine.
pub struct BootSequencer<'c> {
    candidates: &'c BootCandidates,
    state: SequenceState,
    started: Option<&'c BootCandidate>,
    attempts: u32,
    failures: AttemptLog,
}

impl<'c> BootSequencer<'c> {
    /// Start at `Pending(0)`.
    pub const fn new(candidates: &'c BootCandidates) -> Self {
        Self {
            candidates,
            state: SequenceState::Pending(0),
            started: None,
            attempts: 0,
            failures: AttemptLog::new(),
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> SequenceState { self.state }

    /// Candidate that started, once `Succeeded`.
    #[inline]
    pub const fn started(&self) -> Option<&'c BootCandidate> { self.started }

    /// Total attempts made so far.
    #[inline]
    pub const fn attempts(&self) -> u32 { self.attempts }

    /// Every failed attempt.
    #[inline]
    pub const fn failures(&self) -> &AttemptLog { &self.failures }

    /// Candidate the next step will try, if any.
    pub fn next_candidate(&self) -> Option<&'c BootCandidate> {
        match self.state {
            SequenceState::Pending(i) => self.candidates.primary().get(i),
            SequenceState::FinalRetry => Some(self.candidates.fallback()),
            _ => None,
        }
    }

    /// Perform one transition.
    pub fn step<L: ImageLoader>(
        &mut self,
        loader: &mut L,
    ) -> SequenceState {
        let candidates = self.candidates;
        let state = self.state;
        self.state = match state {
            SequenceState::Pending(i) => match candidates.primary().get(i) {
                Some(candidate) if self.attempt(loader, candidate) => SequenceState::Succeeded,
                Some(_) if i + 1 < candidates.len() => SequenceState::Pending(i + 1),
                _ => SequenceState::ExhaustedPrimary,
            },
            SequenceState::ExhaustedPrimary => {
                log::warn!("all {} boot candidates failed, retrying {}", candidates.len(), candidates.fallback());
                SequenceState::FinalRetry
            }
            SequenceState::FinalRetry => {
                if self.attempt(loader, candidates.fallback()) {
                    SequenceState::Succeeded
                } else {
                    SequenceState::Failed
                }
            }
            terminal @ (SequenceState::Succeeded | SequenceState::Failed) => terminal,
        };
        self.state
    }

    /// Step until a terminal state.
    pub fn run<L: ImageLoader>(
        &mut self,
        loader: &mut L,
    ) -> SequenceState {
        while !self.state.is_terminal() {
            self.step(loader);
        }
        self.state
    }

    fn attempt<L: ImageLoader>(
        &mut self,
        loader: &mut L,
        candidate: &'c BootCandidate,
    ) -> bool {
        self.attempts += 1;
        log::info!("starting boot candidate {} ({})", candidate.ordinal(), candidate);

        match loader.load_and_start(candidate) {
            Ok(()) => {
                self.started = Some(candidate);
                true
            }
            Err(err) => {
                log::warn!("{} failed: {}", candidate, err);
                self.failures.push(candidate.clone(), err);
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
