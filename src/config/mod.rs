//! Configuration module for Quicpool
//!
//! This module provides configuration types and parsing for the pool.

mod pool;
mod transport;

pub use pool::PoolConfig;
pub use transport::{QuicConfig, TlsConfig, DEFAULT_ALPN};

use crate::error::PoolError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Session pool configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Shared security configuration
    #[serde(default)]
    pub tls: TlsConfig,

    /// Shared QUIC tuning configuration
    #[serde(default)]
    pub quic: QuicConfig,
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<(), PoolError> {
        self.pool.validate().map_err(PoolError::Config)?;
        self.quic.validate().map_err(PoolError::Config)?;
        if self.tls.alpn.is_empty() {
            return Err(PoolError::Config(
                "at least one ALPN protocol is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
}
