//! Helper utilities for Quicpool
//!
//! This module provides small utilities shared by the binary and the harness.

/// Default echo server listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5454";

/// Default server list for the load client
pub const DEFAULT_SERVERS: &str = "localhost:5454";

/// Default number of calls per server
pub const DEFAULT_CALLS: usize = 10;

/// Split a comma separated server list, dropping blanks
pub fn parse_server_list(servers: &str) -> Vec<String> {
    servers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
