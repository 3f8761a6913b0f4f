// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick time for trace timestamps and bounded flush-waits.
//!
//! Firmware rarely has nanoseconds at hand. An RTOS counts system ticks, a
//! Cortex-M core counts cycles, and the host harness counts
//! `std::time::Instant` nanoseconds. [`HostTime`] and [`Duration`] carry raw
//! ticks of whichever counter the platform installed, and a [`Timebase`]
//! turns them into nanoseconds only where a human reads them.

use core::fmt;

/// Nanoseconds-per-tick ratio of a monotonic counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Nanoseconds per `denom` ticks.
    numer: u64,
    denom: u64,
}

impl Timebase {
    /// One tick per nanosecond.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// A counter running at `hz` ticks per second: `1_000` for a typical
    /// RTOS system tick, the core clock for a cycle counter.
    ///
    /// # Panics
    ///
    /// Panics if `hz` is zero.
    #[must_use]
    pub const fn from_hz(hz: u32) -> Self {
        assert!(hz != 0, "tick frequency must not be zero");
        let hz = hz as u64;
        let g = gcd(NANOS_PER_SEC, hz);
        Self {
            numer: NANOS_PER_SEC / g,
            denom: hz / g,
        }
    }

    /// Nanoseconds spanned by `ticks`, saturating at `u64::MAX`.
    #[must_use]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        saturate(ticks as u128 * self.numer as u128 / self.denom as u128)
    }

    /// Ticks spanned by `nanos`, rounded down and saturating at `u64::MAX`.
    #[must_use]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        saturate(nanos as u128 * self.denom as u128 / self.numer as u128)
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({} ns / {} ticks)", self.numer, self.denom)
    }
}

const NANOS_PER_SEC: u64 = 1_000_000_000;

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "checked against u64::MAX first"
)]
const fn saturate(wide: u128) -> u64 {
    if wide > u64::MAX as u128 {
        u64::MAX
    } else {
        wide as u64
    }
}

/// A reading of the platform's monotonic counter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// The raw counter value.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if the counter reads earlier
    /// than it.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// The instant a wait of `timeout` starting now gives up. A timeout past
    /// the end of the counter never expires.
    #[must_use]
    pub const fn deadline(self, timeout: Duration) -> Self {
        Self(self.0.saturating_add(timeout.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A span of counter ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// No time at all. A flush-wait with this timeout only polls.
    pub const ZERO: Self = Self(0);

    /// The raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// `ms` milliseconds on a counter with the given timebase.
    #[must_use]
    pub const fn from_millis(ms: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(ms.saturating_mul(1_000_000)))
    }

    /// Length in nanoseconds.
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}
