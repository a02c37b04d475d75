//! Virtual time for the simulation kernel.
//!
//! All scheduling and comparisons operate on a single global resolution
//! (nanoseconds), so mixed-unit construction normalizes at creation and the
//! rest of the kernel never thinks about units again.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A point in (or span of) virtual time.
///
/// `Time` is a signed 64-bit nanosecond count. It is a plain `Copy` value
/// type: arithmetic is closed under addition, subtraction and scalar
/// multiplication, and ordering is total. Virtual time is advanced only by
/// the simulator popping scheduled events, never by the wall clock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    ns: i64,
}

impl Time {
    /// Zero duration / the simulation epoch.
    pub const ZERO: Time = Time { ns: 0 };
    /// The largest representable time.
    pub const MAX: Time = Time { ns: i64::MAX };

    /// Creates a time value from whole seconds.
    pub const fn seconds(s: i64) -> Self {
        Time {
            ns: s * 1_000_000_000,
        }
    }

    /// Creates a time value from milliseconds.
    pub const fn millis(ms: i64) -> Self {
        Time { ns: ms * 1_000_000 }
    }

    /// Creates a time value from microseconds.
    pub const fn micros(us: i64) -> Self {
        Time { ns: us * 1_000 }
    }

    /// Creates a time value from nanoseconds, the kernel resolution.
    pub const fn nanos(ns: i64) -> Self {
        Time { ns }
    }

    /// The value in whole seconds, truncated.
    pub const fn as_secs(self) -> i64 {
        self.ns / 1_000_000_000
    }

    /// The value in whole milliseconds, truncated.
    pub const fn as_millis(self) -> i64 {
        self.ns / 1_000_000
    }

    /// The value in whole microseconds, truncated.
    pub const fn as_micros(self) -> i64 {
        self.ns / 1_000
    }

    /// The value in nanoseconds.
    pub const fn as_nanos(self) -> i64 {
        self.ns
    }

    /// Returns `true` if this value is strictly below zero.
    ///
    /// Negative delays are a contract violation at every scheduling entry
    /// point; this is the check those entry points use.
    pub const fn is_negative(self) -> bool {
        self.ns < 0
    }

    /// Saturating subtraction, clamped at [`Time::ZERO`].
    pub fn saturating_sub(self, other: Time) -> Time {
        Time {
            ns: (self.ns - other.ns).max(0),
        }
    }
}

impl Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time { ns: self.ns + rhs.ns }
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Time) {
        self.ns += rhs.ns;
    }
}

impl Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time { ns: self.ns - rhs.ns }
    }
}

impl SubAssign for Time {
    fn sub_assign(&mut self, rhs: Time) {
        self.ns -= rhs.ns;
    }
}

impl Neg for Time {
    type Output = Time;
    fn neg(self) -> Time {
        Time { ns: -self.ns }
    }
}

impl Mul<i64> for Time {
    type Output = Time;
    fn mul(self, rhs: i64) -> Time {
        Time { ns: self.ns * rhs }
    }
}

impl Div<i64> for Time {
    type Output = Time;
    fn div(self, rhs: i64) -> Time {
        Time { ns: self.ns / rhs }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.ns < 0 { "-" } else { "" };
        let abs = self.ns.unsigned_abs();
        let secs = abs / 1_000_000_000;
        let frac = abs % 1_000_000_000;
        if frac == 0 {
            write!(f, "{sign}{secs}s")
        } else {
            write!(f, "{sign}{secs}.{frac:09}s")
        }
    }
}
