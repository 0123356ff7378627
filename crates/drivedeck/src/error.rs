//! Error types for the drivedeck crate.

use std::{fmt, time::Duration};

/// Result type for drivedeck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drivedeck operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A pointer event carried a NaN or infinite coordinate.
    NonFinitePointer {
        /// Horizontal coordinate as received.
        x: f32,
        /// Vertical coordinate as received.
        y: f32,
    },
    /// A configuration value is out of range.
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// The tracked vehicle's pose could not be obtained.
    TargetLost,
    /// A sink rejected a forwarded value.
    Sink {
        /// Which sink failed.
        sink: &'static str,
        /// The error message.
        message: String,
    },
    /// A sink did not finish forwarding within the configured timeout.
    SinkTimeout {
        /// Which sink timed out.
        sink: &'static str,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl Error {
    /// Build a [`Error::Sink`] from any displayable failure.
    pub fn sink(sink: &'static str, message: impl fmt::Display) -> Self {
        Error::Sink {
            sink,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NonFinitePointer { x, y } => {
                write!(f, "pointer position ({x}, {y}) is not finite")
            }
            Error::InvalidConfig { field, detail } => {
                write!(f, "invalid config value for {field}: {detail}")
            }
            Error::TargetLost => write!(f, "tracked vehicle pose is unavailable"),
            Error::Sink { sink, message } => write!(f, "{sink} sink failed: {message}"),
            Error::SinkTimeout { sink, timeout } => {
                write!(f, "{sink} sink timed out after {timeout:?}")
            }
        }
    }
}

impl std::error::Error for Error {}
