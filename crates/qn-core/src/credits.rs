//! Server-access credits.
//!
//! A queue may only start a job while it holds at least one credit.  Each
//! start consumes one.  `Credits::INFINITE` is a saturating sentinel: starting
//! a job never decrements it.

use std::fmt;

/// A non-negative, saturating-infinite credit counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credits(u64);

impl Credits {
    pub const ZERO: Credits = Credits(0);
    pub const ONE: Credits = Credits(1);
    pub const INFINITE: Credits = Credits(u64::MAX);

    #[inline]
    pub const fn new(n: u64) -> Credits {
        Credits(n)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        self.0 == u64::MAX
    }

    /// `true` if at least one start is currently allowed.
    #[inline]
    pub fn is_available(self) -> bool {
        self.0 > 0
    }

    /// Credits left after one start, or `None` if there are none to consume.
    pub fn consume_one(self) -> Option<Credits> {
        match self.0 {
            0 => None,
            u64::MAX => Some(self),
            n => Some(Credits(n - 1)),
        }
    }
}

impl Default for Credits {
    fn default() -> Self {
        Credits::INFINITE
    }
}

impl From<u64> for Credits {
    fn from(n: u64) -> Self {
        Credits(n)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
