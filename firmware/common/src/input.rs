//! Key press vs. timer race.
//!
//! The boot flow lingers on the splash for a fixed time, but an operator key
//! press cuts the wait short. [`TimedInput`] implements that race on top of the
//! small [`InputEvents`] primitive set a platform provides (key poll, one-shot
//! timer, blocking wait).
//!
//! # Guarantees
//!
//! - A key already pending at entry wins without arming anything.
//! - The timer is disarmed on every exit path (see [`TimerGuard`]), so it never
//!   fires into a later, unrelated wait.
//! - A key that wins the race is consumed.
//! - Failure to arm the timer yields [`RaceOutcome::Error`] instead of an
//!   unbounded wait.

use core::fmt::Debug;

// =============================================================================
// Types
// =============================================================================

/// A key read from the console.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    /// Key with a printable character.
    Printable(char),
    /// Non-printable key (arrows, function keys, Esc) by scan code.
    Special(u16),
}

/// What woke a blocking wait.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Wake {
    /// The console signalled key input.
    Key,
    /// The armed timer expired.
    Timer,
}

/// Result of [`TimedInput::race_key_or_timeout`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RaceOutcome {
    /// A key arrived first (and was consumed).
    KeyPressed,
    /// The deadline passed with no key.
    TimedOut,
    /// The event primitives failed. Callers treat this as "no key".
    Error,
}

impl RaceOutcome {
    /// Whether the operator interrupted the wait.
    #[inline]
    pub const fn key_pressed(self) -> bool { matches!(self, Self::KeyPressed) }
}

// =============================================================================
// Platform primitives
// =============================================================================

/// Console input and timer services of the platform.
pub trait InputEvents {
    /// Handle for an armed one-shot timer.
    type Timer;
    /// Platform failure.
    type Error: Debug;

    /// Consume the next pending key without blocking.
    fn read_key(&mut self) -> Result<Option<Key>, Self::Error>;

    /// Arm a one-shot timer that expires after `timeout_ms`.
    fn arm_timer(
        &mut self,
        timeout_ms: u32,
    ) -> Result<Self::Timer, Self::Error>;

    /// Block until key input is signalled or `timer` expires.
    ///
    /// With `timer = None` only key input can end the wait.
    fn wait(
        &mut self,
        timer: Option<&Self::Timer>,
    ) -> Result<Wake, Self::Error>;

    /// Cancel and release a timer. Must be safe on an expired timer.
    fn disarm_timer(
        &mut self,
        timer: Self::Timer,
    );

    /// Busy-wait for `ms` milliseconds.
    fn stall(
        &mut self,
        ms: u32,
    );
}

/// Disarms the timer when the race returns, whichever way it returns.
struct TimerGuard<'a, I: InputEvents> {
    events: &'a mut I,
    timer: Option<I::Timer>,
}

impl<I: InputEvents> Drop for TimerGuard<'_, I> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.events.disarm_timer(timer);
        }
    }
}

// =============================================================================
// Race
// =============================================================================

/// Operator input with deadlines.
pub struct TimedInput<I> {
    events: I,
}

impl<I: InputEvents> TimedInput<I> {
    /// Wrap platform input primitives.
    pub const fn new(events: I) -> Self { Self { events } }

    /// Borrow the underlying primitives.
    #[inline]
    pub const fn events(&self) -> &I { &self.events }

    /// Instant poll. Consumes the key it sees.
    pub fn is_key_pending_now(&mut self) -> bool {
        match self.events.read_key() {
            Ok(key) => key.is_some(),
            Err(err) => {
                log::warn!("key poll failed: {:?}", err);
                false
            }
        }
    }

    /// Wait for a key press or `timeout_ms`, whichever comes first.
    pub fn race_key_or_timeout(
        &mut self,
        timeout_ms: u32,
    ) -> RaceOutcome {
        if self.is_key_pending_now() {
            return RaceOutcome::KeyPressed;
        }
        if timeout_ms == 0 {
            return RaceOutcome::TimedOut;
        }

        let timer = match self.events.arm_timer(timeout_ms) {
            Ok(timer) => timer,
            Err(err) => {
                log::warn!("cannot arm {} ms timer: {:?}", timeout_ms, err);
                return RaceOutcome::Error;
            }
        };
        let guard = TimerGuard {
            events: &mut self.events,
            timer: Some(timer),
        };

        loop {
            match guard.events.wait(guard.timer.as_ref()) {
                Ok(Wake::Timer) => return RaceOutcome::TimedOut,
                Ok(Wake::Key) => match guard.events.read_key() {
                    Ok(Some(key)) => {
                        log::debug!("race won by {:?}", key);
                        return RaceOutcome::KeyPressed;
                    }
                    // Signalled without a key (e.g. a shift press), keep waiting
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("key read failed: {:?}", err);
                        return RaceOutcome::Error;
                    }
                },
                Err(err) => {
                    log::warn!("wait failed: {:?}", err);
                    return RaceOutcome::Error;
                }
            }
        }
    }

    /// Drop keys typed earlier, then wait with no deadline for a fresh one.
    pub fn press_any_key_blocking(&mut self) -> Result<Key, I::Error> {
        while self.events.read_key()?.is_some() {}

        loop {
            if self.events.wait(None)? == Wake::Key {
                if let Some(key) = self.events.read_key()? {
                    return Ok(key);
                }
            }
        }
    }

    /// Fixed delay with no input.
    pub fn stall(
        &mut self,
        ms: u32,
    ) {
        self.events.stall(ms);
    }
}

// =============================================================================
// Tests
// =============================================================================
