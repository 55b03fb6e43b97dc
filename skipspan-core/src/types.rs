//! Core types used throughout SkipSpan

use serde::{Deserialize, Serialize};

/// A closed interval `[start, end]` over the index domain
///
/// Both endpoints are inclusive. The container that stores an interval
/// enforces `start <= end` under its comparator; the record itself is plain
/// data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval<K> {
    /// The inclusive lower endpoint
    pub start: K,
    /// The inclusive upper endpoint
    pub end: K,
}

impl<K> Interval<K> {
    /// Creates a new interval record
    pub fn new(start: K, end: K) -> Self {
        Self { start, end }
    }
}
