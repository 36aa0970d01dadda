//! Core type definitions for hnswdb identifiers and timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable, caller-visible vector identifier.
///
/// IDs are allocated sequentially starting at 1 and are never reused, even
/// after the vector they named has been deleted. The HNSW index never sees
/// these IDs; it works with dense `0..n` labels that the database maps back
/// on every search.
///
/// # Example
/// ```
/// use hnswdb::VectorId;
///
/// let id: VectorId = "42".parse().unwrap();
/// assert_eq!(id.as_u64(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VectorId(pub u64);

impl VectorId {
    /// The first ID handed out by a fresh database.
    pub const FIRST: VectorId = VectorId(1);

    /// Creates a VectorId from its raw value.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value (the redb key).
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the ID that follows this one.
    #[inline]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for VectorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for VectorId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in milliseconds.
///
/// Using i64 allows representing dates far into the future and past.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    ///
    /// If the system clock is before the Unix epoch, returns a timestamp
    /// of 0 (epoch) rather than panicking.
    #[inline]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as i64)
    }

    /// Creates a timestamp from Unix milliseconds.
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as Unix milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
