// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A counting semaphore for bare-metal targets without an RTOS.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use scanout_core::sync::{SyncError, SyncPrimitive};
use scanout_core::time::{Duration, HostTime};
use spin::Once;

static CLOCK: Once<fn() -> HostTime> = Once::new();

/// Installs the monotonic clock used for bounded waits.
///
/// Only the first call has an effect. Semaphores created before a clock is
/// installed (or without one at all) support unbounded and zero-length waits
/// only.
pub fn install_clock(clock: fn() -> HostTime) {
    CLOCK.call_once(|| clock);
}

/// A [`SyncPrimitive`] that busy-waits on an atomic counter.
///
/// Signaling is a single atomic increment, so it is safe from any interrupt
/// priority. Waiting spins with [`core::hint::spin_loop`].
pub struct SpinSemaphore {
    count: AtomicU32,
    clock: Option<fn() -> HostTime>,
}

impl SpinSemaphore {
    /// Consumes a signal if one is pending.
    pub fn try_acquire(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Signals not yet consumed.
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

impl SyncPrimitive for SpinSemaphore {
    fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
            clock: CLOCK.get().copied(),
        }
    }

    fn wait(&self) -> Result<(), SyncError> {
        while !self.try_acquire() {
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn wait_timeout(&self, timeout: Duration) -> Result<(), SyncError> {
        if self.try_acquire() {
            return Ok(());
        }
        if timeout == Duration::ZERO {
            return Err(SyncError::TimedOut);
        }
        let clock = self.clock.ok_or(SyncError::Unsupported)?;
        let deadline = clock().deadline(timeout);
        loop {
            if self.try_acquire() {
                return Ok(());
            }
            if clock() >= deadline {
                return Err(SyncError::TimedOut);
            }
            core::hint::spin_loop();
        }
    }

    fn signal_from_isr(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for SpinSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinSemaphore")
            .field("pending", &self.pending())
            .field("bounded", &self.clock.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_are_counted() {
        let s = SpinSemaphore::new();
        assert!(!s.try_acquire());
        s.signal_from_isr();
        s.signal_from_isr();
        assert_eq!(s.pending(), 2);
        assert_eq!(s.wait(), Ok(()));
        assert_eq!(s.wait_timeout(Duration::ZERO), Ok(()));
        assert_eq!(s.wait_timeout(Duration::ZERO), Err(SyncError::TimedOut));
    }

    #[test]
    fn bounded_wait_needs_a_clock() {
        let s = SpinSemaphore {
            count: AtomicU32::new(0),
            clock: None,
        };
        assert_eq!(s.wait_timeout(Duration(10)), Err(SyncError::Unsupported));
    }

    #[test]
    fn bounded_wait_expires() {
        static TICKS: AtomicU32 = AtomicU32::new(0);
        fn ticking() -> HostTime {
            HostTime(u64::from(TICKS.fetch_add(1, Ordering::Relaxed)))
        }
        let s = SpinSemaphore {
            count: AtomicU32::new(0),
            clock: Some(ticking),
        };
        assert_eq!(s.wait_timeout(Duration(50)), Err(SyncError::TimedOut));
        assert!(TICKS.load(Ordering::Relaxed) > 50, "clock was polled until the deadline");
    }
}
