// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The blocking primitive a render thread parks on while a reload is in
//! flight.

use core::fmt;

use crate::time::Duration;

/// A counting semaphore that starts at zero, signaled from interrupt
/// context and waited on from thread context.
///
/// Creating a value initializes the primitive; dropping it destroys it.
/// Signals that arrive before a wait are not lost: each signal releases
/// exactly one wait.
pub trait SyncPrimitive: Send + Sync {
    /// Creates a primitive with no pending signals.
    fn new() -> Self
    where
        Self: Sized;

    /// Blocks until a signal is available, then consumes it.
    ///
    /// Must not be called from interrupt context.
    fn wait(&self) -> Result<(), SyncError>;

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Returns [`SyncError::TimedOut`] if no signal arrived in time; no
    /// signal is consumed in that case.
    fn wait_timeout(&self, timeout: Duration) -> Result<(), SyncError>;

    /// Releases one waiter, or records the signal for the next wait.
    ///
    /// Safe to call from interrupt context: never blocks.
    fn signal_from_isr(&self);
}

/// Errors reported by a [`SyncPrimitive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// No signal arrived before the timeout.
    TimedOut,
    /// The primitive can no longer be waited on.
    Poisoned,
    /// The primitive cannot time out waits on this platform.
    Unsupported,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => f.write_str("timed out waiting for signal"),
            Self::Poisoned => f.write_str("sync primitive is poisoned"),
            Self::Unsupported => f.write_str("bounded waits are not supported"),
        }
    }
}

impl core::error::Error for SyncError {}
