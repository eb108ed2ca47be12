//! Console keys and timer events.

use bootsplash_common::input::{InputEvents, Key, Wake};
use uefi::boot::{self, EventType, TimerTrigger, Tpl};
use uefi::proto::console::text;
use uefi::{Event, Status, system};

/// One timer tick is 100 ns.
const TICKS_PER_MS: u64 = 10_000;

/// Simple Text Input plus boot-services timers.
pub struct ConsoleInput;

fn key_event() -> uefi::Result<Event> {
    system::with_stdin(|stdin| stdin.wait_for_key_event()).ok_or_else(|| Status::UNSUPPORTED.into())
}

impl InputEvents for ConsoleInput {
    type Error = uefi::Error;
    type Timer = Event;

    fn read_key(&mut self) -> Result<Option<Key>, Self::Error> {
        let key = system::with_stdin(|stdin| stdin.read_key())?;
        Ok(key.map(|key| match key {
            text::Key::Printable(c) => Key::Printable(char::from(c)),
            text::Key::Special(scan) => Key::Special(scan.0),
        }))
    }

    fn arm_timer(
        &mut self,
        timeout_ms: u32,
    ) -> Result<Event, Self::Error> {
        // SAFETY: no notification function, so there is no callback to outlive.
        let timer = unsafe { boot::create_event(EventType::TIMER, Tpl::APPLICATION, None, None)? };
        if let Err(err) = boot::set_timer(&timer, TimerTrigger::Relative(u64::from(timeout_ms) * TICKS_PER_MS)) {
            boot::close_event(timer).ok();
            return Err(err);
        }
        Ok(timer)
    }

    fn wait(
        &mut self,
        timer: Option<&Event>,
    ) -> Result<Wake, Self::Error> {
        let key = key_event()?;
        let index = match timer {
            // SAFETY: the clone only lives for this wait; the armed handle
            // is closed later by `disarm_timer`.
            Some(timer) => boot::wait_for_event(&mut [key, unsafe { timer.unsafe_clone() }]),
            None => boot::wait_for_event(&mut [key]),
        }
        .map_err(|err| err.to_err_without_payload())?;

        Ok(if index == 0 { Wake::Key } else { Wake::Timer })
    }

    fn disarm_timer(
        &mut self,
        timer: Event,
    ) {
        if let Err(err) = boot::set_timer(&timer, TimerTrigger::Cancel) {
            log::warn!("timer cancel failed: {:?}", err.status());
        }
        if let Err(err) = boot::close_event(timer) {
            log::warn!("timer close failed: {:?}", err.status());
        }
    }

    fn stall(
        &mut self,
        ms: u32,
    ) {
        boot::stall(ms as usize * 1000);
    }
}
