//! Transport configuration types
//!
//! Defines the shared security (TLS) and tuning (QUIC) configuration used
//! for every dialed session.

use serde::{Deserialize, Serialize};

/// ALPN protocol spoken by the bundled echo server and client
pub const DEFAULT_ALPN: &str = "quicpool-echo";

fn default_alpn() -> Vec<String> {
    vec![DEFAULT_ALPN.to_string()]
}

fn default_skip_verify() -> bool {
    true
}

/// TLS configuration shared by all sessions
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TlsConfig {
    /// Server name used for verification, defaults to the host part of the address
    #[serde(default)]
    pub server_name: Option<String>,

    /// Path to an additional trusted root certificate (PEM)
    #[serde(default)]
    pub trusted_root: Option<String>,

    /// Accept any server certificate
    #[serde(default = "default_skip_verify")]
    pub skip_verify: bool,

    /// ALPN protocols offered during the handshake
    #[serde(default = "default_alpn")]
    pub alpn: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            server_name: None,
            trusted_root: None,
            skip_verify: default_skip_verify(),
            alpn: default_alpn(),
        }
    }
}

/// Default keep-alive interval in seconds
fn default_keep_alive_secs() -> u64 {
    15
}

/// Default idle timeout in seconds
fn default_max_idle_timeout_secs() -> u64 {
    30
}

/// Default number of concurrent bidirectional streams
fn default_max_concurrent_bidi_streams() -> u32 {
    100
}

/// Default local bind address for the client endpoint
fn default_bind_addr() -> String {
    "0.0.0.0:0".to_string()
}

/// QUIC tuning configuration shared by all sessions
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuicConfig {
    /// Keep-alive interval in seconds (0 disables keep-alive)
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Idle timeout in seconds after which a silent session is closed
    #[serde(default = "default_max_idle_timeout_secs")]
    pub max_idle_timeout_secs: u64,

    /// Maximum concurrent bidirectional streams the peer may open
    #[serde(default = "default_max_concurrent_bidi_streams")]
    pub max_concurrent_bidi_streams: u32,

    /// Local UDP address the client endpoint binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for QuicConfig {
    fn default() -> Self {
        QuicConfig {
            keep_alive_secs: default_keep_alive_secs(),
            max_idle_timeout_secs: default_max_idle_timeout_secs(),
            max_concurrent_bidi_streams: default_max_concurrent_bidi_streams(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl QuicConfig {
    /// Validate the QUIC configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.keep_alive_secs > 0 && self.keep_alive_secs >= self.max_idle_timeout_secs {
            return Err("keep_alive_secs must be shorter than max_idle_timeout_secs".to_string());
        }
        if self.max_concurrent_bidi_streams == 0 {
            return Err("max_concurrent_bidi_streams must be greater than 0".to_string());
        }
        Ok(())
    }
}
