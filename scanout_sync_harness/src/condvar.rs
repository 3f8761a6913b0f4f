// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A blocking [`SyncPrimitive`] for host threads.

use std::sync::{Condvar, Mutex};
use std::time::Instant;

use scanout_core::sync::{SyncError, SyncPrimitive};
use scanout_core::time::Duration;

/// Counting semaphore built on a mutex and condition variable.
///
/// Timeouts are read as nanoseconds, matching [`crate::now`].
#[derive(Debug, Default)]
pub struct CondvarSync {
    count: Mutex<u32>,
    cond: Condvar,
}

impl CondvarSync {
    /// Signals not yet consumed.
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.count.lock().map_or(0, |count| *count)
    }
}

impl SyncPrimitive for CondvarSync {
    fn new() -> Self {
        Self::default()
    }

    fn wait(&self) -> Result<(), SyncError> {
        let mut count = self.count.lock().map_err(|_| SyncError::Poisoned)?;
        while *count == 0 {
            count = self.cond.wait(count).map_err(|_| SyncError::Poisoned)?;
        }
        *count -= 1;
        Ok(())
    }

    fn wait_timeout(&self, timeout: Duration) -> Result<(), SyncError> {
        let deadline = Instant::now() + std::time::Duration::from_nanos(timeout.ticks());
        let mut count = self.count.lock().map_err(|_| SyncError::Poisoned)?;
        while *count == 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Err(SyncError::TimedOut);
            }
            count = self
                .cond
                .wait_timeout(count, left)
                .map_err(|_| SyncError::Poisoned)?
                .0;
        }
        *count -= 1;
        Ok(())
    }

    fn signal_from_isr(&self) {
        if let Ok(mut count) = self.count.lock() {
            *count += 1;
            self.cond.notify_one();
        }
    }
}
