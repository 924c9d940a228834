//! Transport module for Quicpool
//!
//! This module provides the seam between the pool and the multiplexed
//! transport, plus the QUIC implementation backed by quinn.

mod addr;
mod quic;
mod tls;

pub use addr::RemoteAddr;
pub use quic::{build_transport_config, QuicConnector, QuicSession, QuicStream};
pub use tls::{build_client_crypto, build_server_crypto};

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Connector trait for establishing sessions
///
/// A connector owns the shared security and tuning configuration and the
/// handshake timeout; every session it produces is dialed with them.
#[async_trait]
pub trait Connector: Debug + Send + Sync + 'static {
    /// The session type produced by this connector
    type Session: Session;

    /// Establish a new session with a remote address
    async fn dial(&self, addr: &str) -> Result<Self::Session>;
}

/// Session trait for one established multiplexed connection
///
/// Liveness is verified lazily: a session is trusted until `is_closed`
/// reports otherwise or `open_stream` fails.
#[async_trait]
pub trait Session: Debug + Send + Sync + 'static {
    /// The stream type multiplexed over this session
    type Stream: Send + 'static;

    /// Open a new bidirectional stream
    async fn open_stream(&self) -> Result<Self::Stream>;

    /// Close the session, best-effort
    fn close(&self, reason: &str);

    /// Whether the session is known to be unusable
    fn is_closed(&self) -> bool;

    /// Address this session was dialed against
    fn remote_addr(&self) -> &str;
}
