//! Simulated console input on a virtual clock.
//!
//! Nothing sleeps: waits jump the clock to the next key press or timer
//! deadline, so a ten second fatal pause costs no wall time.

use bootsplash_common::input::{InputEvents, Key, Wake};
use thiserror::Error;

/// Keys the operator "presses", in milliseconds since start.
#[derive(Clone, Default, Debug)]
pub struct KeyScript {
    presses: Vec<(u32, Key)>,
}

impl KeyScript {
    /// One key press (Enter) at each of `times_ms`.
    pub fn at(times_ms: &[u32]) -> Self {
        let mut presses: Vec<_> = times_ms.iter().map(|&ms| (ms, Key::Printable('\r'))).collect();
        presses.sort_by_key(|&(ms, _)| ms);
        Self { presses }
    }
}

/// Why a simulated wait cannot finish.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClockError {
    #[error("waiting for a key that is never pressed (at {now_ms} ms)")]
    NoMoreInput { now_ms: u64 },
}

/// Virtual clock with scripted key presses.
#[derive(Debug)]
pub struct SimClock {
    now_ms: u64,
    script: KeyScript,
    next_press: usize,
    timers_armed: u32,
    timers_disarmed: u32,
}

impl SimClock {
    pub fn new(script: KeyScript) -> Self {
        Self {
            now_ms: 0,
            script,
            next_press: 0,
            timers_armed: 0,
            timers_disarmed: 0,
        }
    }

    /// Virtual time elapsed since start.
    #[inline]
    pub const fn now_ms(&self) -> u64 { self.now_ms }

    /// Armed timers not yet released.
    #[inline]
    pub const fn timers_outstanding(&self) -> u32 { self.timers_armed - self.timers_disarmed }

    fn pending_press_time(&self) -> Option<u64> {
        self.script.presses.get(self.next_press).map(|&(ms, _)| u64::from(ms))
    }
}

impl InputEvents for SimClock {
    type Error = ClockError;
    /// Absolute deadline in virtual ms.
    type Timer = u64;

    fn read_key(&mut self) -> Result<Option<Key>, Self::Error> {
        match self.script.presses.get(self.next_press) {
            Some(&(ms, key)) if u64::from(ms) <= self.now_ms => {
                self.next_press += 1;
                log::debug!("key {:?} read at {} ms", key, self.now_ms);
                Ok(Some(key))
            }
            _ => Ok(None),
        }
    }

    fn arm_timer(
        &mut self,
        timeout_ms: u32,
    ) -> Result<u64, Self::Error> {
        self.timers_armed += 1;
        Ok(self.now_ms + u64::from(timeout_ms))
    }

    fn wait(
        &mut self,
        timer: Option<&u64>,
    ) -> Result<Wake, Self::Error> {
        match (self.pending_press_time(), timer) {
            (Some(press), Some(&deadline)) if press > deadline => {
                self.now_ms = self.now_ms.max(deadline);
                Ok(Wake::Timer)
            }
            (Some(press), _) => {
                self.now_ms = self.now_ms.max(press);
                Ok(Wake::Key)
            }
            (None, Some(&deadline)) => {
                self.now_ms = self.now_ms.max(deadline);
                Ok(Wake::Timer)
            }
            (None, None) => Err(ClockError::NoMoreInput { now_ms: self.now_ms }),
        }
    }

    fn disarm_timer(
        &mut self,
        _timer: u64,
    ) {
        self.timers_disarmed += 1;
    }

    fn stall(
        &mut self,
        ms: u32,
    ) {
        self.now_ms += u64::from(ms);
    }
}

// =============================================================================
// Tests
// =============================================================================
