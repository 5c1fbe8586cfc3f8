//! Single-notification completion event.
//!
//! A [`Completion`] is armed by the transaction engine, handed to a
//! descriptor as its callback and satisfied exactly once by the channel's
//! interrupt path. The flag is level-triggered: a completion signalled before
//! anyone waits on it is still observed by a later wait.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;

/// Level-triggered completion flag
#[derive(Debug, Default)]
pub struct Completion {
    done: AtomicBool,
}

impl Completion {
    /// Create an unsignalled completion.
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Mark the completion as satisfied. Safe to call from interrupt context.
    #[inline]
    pub fn complete(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Whether the completion has been signalled
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Wait until signalled or `timeout_ms` elapses.
    ///
    /// Polls every `poll_interval_us` using `delay`. Returns `true` when the
    /// completion was observed. An unsignalled completion delays exactly
    /// `timeout_ms` before returning `false`.
    pub fn wait_timeout<D: DelayNs>(
        &self,
        delay: &mut D,
        timeout_ms: u32,
        poll_interval_us: u32,
    ) -> bool {
        let poll_interval_us = poll_interval_us.max(1);
        let mut remaining_us = u64::from(timeout_ms) * 1000;

        while remaining_us > 0 {
            if self.is_completed() {
                return true;
            }
            // Last step is shortened so the total never exceeds the bound
            let step = u64::from(poll_interval_us).min(remaining_us) as u32;
            delay.delay_us(step);
            remaining_us -= u64::from(step);
        }

        self.is_completed()
    }
}
