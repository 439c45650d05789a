//! Centralized error handling for Shapecode.
//!
//! Every failure in the codec is represented as a [`ShapecodeError`] and propagated
//! synchronously to the immediate caller. Nothing is retried internally: byte-level
//! corruption is never transient.
//!
//! ## Error Categories
//!
//! - **Bounds** ([`ShapecodeError::Bounds`]): a write or read ran past the supplied buffer.
//!   On the write side this means the buffer was not sized with
//!   [`Shapecode::expected_size`](crate::Shapecode::expected_size).
//! - **Fingerprint mismatch** ([`ShapecodeError::FingerprintMismatch`]): the type stamp
//!   in the stream is not the one the reader expected. Signals format drift.
//! - **Unsupported shape** ([`ShapecodeError::UnsupportedShape`]): a shape reached the
//!   codec that it cannot walk. This is a programming error and surfaces immediately.
//! - **Value mismatch** ([`ShapecodeError::ValueMismatch`]): a [`Value`](crate::Value)
//!   does not fit the shape it is being encoded with.
//! - **Format** ([`ShapecodeError::Format`]): malformed framing (negative lengths,
//!   invalid presence tags, invalid UTF-8, header disagreement).
//! - **Strategy** ([`ShapecodeError::Strategy`], [`ShapecodeError::StrategyContract`]):
//!   registry misconfiguration or a custom strategy breaking the size/write contract.
//! - **Cancelled** ([`ShapecodeError::Cancelled`]): an asynchronous transfer was
//!   cancelled at a suspension boundary. The partial result must be discarded.
//!
//! ```rust
//! use shapecode::{Shape, Shapecode, ShapecodeError, Value};
//!
//! let codec = Shapecode::new();
//! let mut small = [0u8; 8];
//! match codec.write(&mut small, &Shape::Text, &Value::from("Foobar")) {
//!     Err(ShapecodeError::Bounds { needed, .. }) => assert!(needed > 0),
//!     other => panic!("expected a bounds error, got {other:?}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::fingerprint::Fingerprint;

/// A specialized `Result` type for Shapecode operations.
pub type Result<T> = std::result::Result<T, ShapecodeError>;

/// The master error enum covering all failure domains in Shapecode.
///
/// The type is `Clone` so batch operations can hand the first failure back to the
/// caller after the worker threads have joined. I/O errors are wrapped in `Arc`.
#[derive(Debug, Clone)]
pub enum ShapecodeError {
    /// Low-level I/O failure while reading or writing a stream or file.
    Io(Arc<io::Error>),

    /// A write or read ran past the end of the supplied buffer.
    Bounds {
        /// Cursor position at which the access was attempted.
        offset: usize,
        /// Number of bytes the access required.
        needed: usize,
        /// Number of bytes left in the buffer.
        available: usize,
    },

    /// The fingerprint found in the stream does not match the expected type.
    FingerprintMismatch {
        /// Canonical name of the statically expected type.
        type_name: String,
        /// Fingerprint of the expected type.
        expected: Fingerprint,
        /// Fingerprint actually decoded from the stream.
        found: Fingerprint,
    },

    /// A shape that the codec cannot walk (e.g. a custom shape with no strategy).
    UnsupportedShape(String),

    /// A value does not fit the shape it is being encoded with.
    ValueMismatch {
        /// Canonical name of the shape.
        type_name: String,
        /// Description of what was wrong with the value.
        reason: String,
    },

    /// The byte stream is malformed.
    Format(String),

    /// Failure while producing the canonical encoding of a shape descriptor.
    Serialization(String),

    /// Strategy registry misconfiguration or a failing user strategy.
    Strategy(String),

    /// A custom strategy wrote a different number of bytes than it predicted.
    StrategyContract {
        /// Name of the type whose strategy (or subtree) disagreed.
        type_name: String,
        /// Size reported by the size calculator.
        expected: usize,
        /// Bytes actually written.
        written: usize,
    },

    /// An asynchronous transfer was cancelled at a suspension boundary.
    Cancelled,
}

impl ShapecodeError {
    pub(crate) fn value_mismatch(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValueMismatch {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ShapecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::Bounds {
                offset,
                needed,
                available,
            } => write!(
                f,
                "Bounds Error: {needed} bytes needed at offset {offset}, {available} available"
            ),
            Self::FingerprintMismatch {
                type_name,
                expected,
                found,
            } => write!(
                f,
                "Fingerprint Mismatch for '{type_name}': expected {expected}, found {found}"
            ),
            Self::UnsupportedShape(s) => write!(f, "Unsupported Shape: {s}"),
            Self::ValueMismatch { type_name, reason } => {
                write!(f, "Value Mismatch for '{type_name}': {reason}")
            }
            Self::Format(s) => write!(f, "Format Error: {s}"),
            Self::Serialization(s) => write!(f, "Serialization Error: {s}"),
            Self::Strategy(s) => write!(f, "Strategy Error: {s}"),
            Self::StrategyContract {
                type_name,
                expected,
                written,
            } => write!(
                f,
                "Strategy Contract Violation for '{type_name}': sized {expected} bytes, wrote {written}"
            ),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for ShapecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ShapecodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn bounds_error_reports_offset() {
        let err = ShapecodeError::Bounds {
            offset: 12,
            needed: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Bounds Error: 4 bytes needed at offset 12, 2 available"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let err: ShapecodeError = io::Error::new(io::ErrorKind::UnexpectedEof, "short").into();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("I/O Error"));
    }

    #[test]
    fn contract_violation_display() {
        let err = ShapecodeError::StrategyContract {
            type_name: "Version".into(),
            expected: 16,
            written: 12,
        };
        assert_eq!(
            err.to_string(),
            "Strategy Contract Violation for 'Version': sized 16 bytes, wrote 12"
        );
    }
}
