//! Session pool module for Quicpool
//!
//! This module provides the session registry, the controller deciding
//! between reuse, re-dial and rejection, and the shared slot the pool
//! lives in.

mod controller;
mod registry;
mod slot;
mod stats;

pub use controller::{SessionPool, StreamOf};
pub use registry::{Registration, SessionRegistry};
pub use slot::PoolSlot;
pub use stats::{PoolStats, PoolStatsSnapshot};

use crate::config::Config;
use crate::error::PoolError;
use crate::transport::QuicConnector;

/// Build a QUIC session pool from configuration
///
/// Must be called from within a tokio runtime, since the client endpoint is
/// bound immediately.
pub fn init_pool(config: &Config) -> Result<SessionPool<QuicConnector>, PoolError> {
    config.validate()?;

    let connector = QuicConnector::new(&config.tls, &config.quic)
        .map_err(|e| PoolError::Config(format!("{:#}", e)))?;

    SessionPool::new(connector, &config.pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, QuicConfig};

    fn loopback_config() -> Config {
        Config {
            quic: QuicConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_init_pool() {
        let pool = init_pool(&loopback_config()).unwrap();
        assert_eq!(pool.max_sessions(), 100);
        assert!(pool.is_empty().await);
    }

    #[tokio::test]
    async fn test_init_pool_rejects_invalid_config() {
        let config = Config {
            pool: PoolConfig {
                max_sessions: 0,
                ..Default::default()
            },
            ..loopback_config()
        };
        assert!(matches!(init_pool(&config), Err(PoolError::Config(_))));
    }

    #[tokio::test]
    async fn test_init_pool_reports_transport_errors() {
        let mut config = loopback_config();
        config.quic.bind_addr = "nowhere".to_string();

        match init_pool(&config) {
            Err(PoolError::Config(msg)) => assert!(msg.contains("nowhere")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
