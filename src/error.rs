//! The `error` module defines the common error types produced by the encoder.

use std::error;
use std::fmt;

use super::Result;

/// `EncodeError` enumerates all possible errors reported by the encoder core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A configuration value was out of range, or `validate` was not given enough
    /// working memory for the configured block size.
    InvalidConfiguration(&'static str),
    /// The output buffer passed to an encode call could not hold the frame.
    BufferFull,
    /// A single bit-writer `add` call would have exceeded the accumulator width.
    Overflow,
    /// The residual-coding path produced a subframe larger than the verbatim bound.
    Internal(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::InvalidConfiguration(ref msg) => {
                write!(f, "invalid encoder configuration: {}", msg)
            }
            EncodeError::BufferFull => write!(f, "output buffer exhausted"),
            EncodeError::Overflow => write!(f, "bit writer accumulator overflow"),
            EncodeError::Internal(ref msg) => write!(f, "internal encoder error: {}", msg),
        }
    }
}

impl error::Error for EncodeError {}

/// Creates a configuration error.
pub fn config_error<T>(desc: &'static str) -> Result<T> {
    Err(EncodeError::InvalidConfiguration(desc))
}

/// Creates an internal-invariant error.
pub fn internal_error<T>(desc: &'static str) -> Result<T> {
    Err(EncodeError::Internal(desc))
}
