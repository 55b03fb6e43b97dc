//! Error types for SkipSpan
//!
//! This module defines the error types used throughout SkipSpan.

use thiserror::Error;

/// The main error type for SkipSpan operations
#[derive(Error, Debug)]
pub enum Error {
    /// A precondition of `insert` or `update` was violated: a duplicate
    /// marker, reversed endpoints, or an endpoint outside the sentinel
    /// bounds
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The marker placement invariant does not hold; raised only by the
    /// diagnostic checker and indicates a bug in marker maintenance
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// A specialized Result type for SkipSpan operations
pub type Result<T> = std::result::Result<T, Error>;
