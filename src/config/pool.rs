//! Session pool configuration
//!
//! Defines the bound on distinct sessions and the handshake timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum number of distinct sessions
fn default_max_sessions() -> usize {
    100
}

/// Default handshake timeout in milliseconds
fn default_connect_timeout_ms() -> u64 {
    60_000
}

/// Session pool configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// Maximum number of distinct addresses with a registered session
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Handshake timeout applied to every dial, in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_sessions: default_max_sessions(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl PoolConfig {
    /// Create a pool configuration with the given bound and timeout
    ///
    /// Sub-millisecond remainders are rounded up, so a non-zero timeout
    /// never collapses to zero.
    pub fn new(max_sessions: usize, connect_timeout: Duration) -> Self {
        let millis = connect_timeout.as_nanos().div_ceil(1_000_000);
        PoolConfig {
            max_sessions,
            connect_timeout_ms: u64::try_from(millis).unwrap_or(u64::MAX),
        }
    }

    /// Handshake timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validate the pool configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sessions == 0 {
            return Err("max_sessions must be greater than 0".to_string());
        }
        if self.connect_timeout_ms == 0 {
            return Err("connect_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}
