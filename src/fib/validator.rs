//! Turns the raw `n` query value into a bounded index.

use std::fmt;

use super::{Bound, FibError};

/// Smallest accepted index.
pub const MIN_N: u32 = 1;

/// Largest accepted index.
pub const MAX_N: u32 = 100_000;

/// An index in `[MIN_N, MAX_N]`.
///
/// The only ways to obtain one are [`validate`] and `TryFrom<u32>`, so the
/// engine and the cache never see an out-of-range index.
///
/// # Examples
///
/// ```
/// use fibserve::fib::{Bound, FibError, FibIndex};
///
/// assert_eq!(FibIndex::try_from(7).map(FibIndex::get), Ok(7));
/// assert_eq!(FibIndex::try_from(0), Err(FibError::OutOfRange(Bound::BelowMinimum)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FibIndex(u32);

impl FibIndex {
    /// The index as a plain integer.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for FibIndex {
    type Error = FibError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        if n < MIN_N {
            Err(FibError::OutOfRange(Bound::BelowMinimum))
        } else if n > MAX_N {
            Err(FibError::OutOfRange(Bound::AboveMaximum))
        } else {
            Ok(Self(n))
        }
    }
}

impl fmt::Display for FibIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Checks `raw` and converts it to a [`FibIndex`].
///
/// The checks run in a fixed order: presence, then an all-ASCII-digits
/// scan, then range. A leading `-` or an embedded `.` therefore fails the
/// digit scan and is reported as [`FibError::NotAnInteger`], never as a
/// range error.
///
/// # Examples
///
/// ```
/// use fibserve::fib::{validate, Bound, FibError};
///
/// assert_eq!(validate(Some("10")).map(|n| n.get()), Ok(10));
/// assert_eq!(validate(None), Err(FibError::MissingParameter));
/// assert_eq!(validate(Some("-1")), Err(FibError::NotAnInteger));
/// assert_eq!(validate(Some("0")), Err(FibError::OutOfRange(Bound::BelowMinimum)));
/// ```
pub fn validate(raw: Option<&str>) -> Result<FibIndex, FibError> {
    let raw = raw.ok_or(FibError::MissingParameter)?;

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FibError::NotAnInteger);
    }

    // "0", "00", ... all denote zero.
    let significant = raw.trim_start_matches('0');
    if significant.is_empty() {
        return Err(FibError::OutOfRange(Bound::BelowMinimum));
    }

    // Overflowing u32 is necessarily above MAX_N.
    let n = significant
        .parse::<u32>()
        .map_err(|_| FibError::OutOfRange(Bound::AboveMaximum))?;
    FibIndex::try_from(n)
}
