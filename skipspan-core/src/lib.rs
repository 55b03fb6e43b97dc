//! Core types for SkipSpan
//!
//! This crate contains the fundamental types and error handling used
//! throughout the SkipSpan project. It provides:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - The [`Interval`] record holding a marker's endpoints
//!
//! # Example
//!
//! ```
//! use skipspan_core::Interval;
//!
//! let interval = Interval::new(2, 7);
//! assert_eq!(interval.start, 2);
//! assert_eq!(interval.end, 7);
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
