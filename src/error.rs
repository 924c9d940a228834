//! Error types for Quicpool
//!
//! This module defines the errors surfaced by `acquire_stream` and pool
//! initialization.

use thiserror::Error;

/// Boxed transport error carried by dial and stream failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for pool operations
#[derive(Error, Debug)]
pub enum PoolError {
    /// Establishing a session failed (timeout, refused, TLS failure)
    #[error("Dial error for {addr}: {source}")]
    Dial {
        /// Address that was dialed
        addr: String,
        /// Underlying transport error
        #[source]
        source: BoxError,
    },

    /// Opening a stream on a believed-live session failed
    #[error("Stream error for {addr}: {source}")]
    Stream {
        /// Address of the session
        addr: String,
        /// Underlying transport error
        #[source]
        source: BoxError,
    },

    /// The address is unregistered and the pool is full
    #[error("Capacity error: session limit of {max} reached")]
    Capacity {
        /// Configured maximum number of sessions
        max: usize,
    },

    /// `acquire_stream` was called before a pool was installed
    #[error("Pool is not initialized")]
    Uninitialized,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PoolError {
    /// Build a dial error from a transport error
    pub fn dial(addr: &str, source: impl Into<BoxError>) -> Self {
        PoolError::Dial {
            addr: addr.to_string(),
            source: source.into(),
        }
    }

    /// Build a stream error from a transport error
    pub fn stream(addr: &str, source: impl Into<BoxError>) -> Self {
        PoolError::Stream {
            addr: addr.to_string(),
            source: source.into(),
        }
    }

    /// Whether this is a capacity rejection
    pub fn is_capacity(&self) -> bool {
        matches!(self, PoolError::Capacity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::Capacity { max: 3 };
        assert_eq!(format!("{}", err), "Capacity error: session limit of 3 reached");

        let err = PoolError::Uninitialized;
        assert_eq!(format!("{}", err), "Pool is not initialized");

        let err = PoolError::Config("bad value".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad value");
    }

    #[test]
    fn test_dial_error_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = PoolError::dial("10.0.0.1:5454", io_err);

        assert_eq!(format!("{}", err), "Dial error for 10.0.0.1:5454: refused");
        assert!(err.source().is_some());
        assert!(matches!(err, PoolError::Dial { .. }));
    }

    #[test]
    fn test_stream_error_from_anyhow() {
        let err = PoolError::stream("a:1", anyhow::anyhow!("connection lost"));
        assert_eq!(format!("{}", err), "Stream error for a:1: connection lost");
    }

    #[test]
    fn test_is_capacity() {
        assert!(PoolError::Capacity { max: 1 }.is_capacity());
        assert!(!PoolError::Uninitialized.is_capacity());
    }
}
