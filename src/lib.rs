//! # Quicpool - Client-side QUIC Session Pool
//!
//! Quicpool hands callers ready-to-use bidirectional streams to a remote
//! address. It keeps at most one QUIC session per address, multiplexes new
//! streams over it while it is healthy, and transparently re-dials when the
//! cached session turns out to be broken.
//!
//! ## Features
//!
//! - **Session Reuse**: one session per address, many streams over it
//! - **Lazy Health Checks**: a session is trusted until an operation on it fails
//! - **Bounded Pool**: dialing a new address fails once the session limit is reached
//! - **No Leaked Sessions**: concurrent dials to one address never overwrite each other
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quicpool::{init_pool, Config};
//! use tokio::io::AsyncWriteExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = init_pool(&Config::default())?;
//!
//!     let mut stream = pool.acquire_stream("localhost:5454").await?;
//!     stream.write_all(b"hello").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller -> SessionPool::acquire_stream -> SessionRegistry -> Connector::dial
//!                                                          -> Session::open_stream
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod echo;
pub mod error;
pub mod helper;
pub mod pool;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::PoolError;
pub use pool::{init_pool, PoolSlot, SessionPool};
pub use transport::{Connector, QuicConnector, Session};

/// Version of the Quicpool library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "quicpool");
    }
}
