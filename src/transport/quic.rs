//! QUIC transport implementation
//!
//! Sessions are quinn connections; streams are bidirectional QUIC streams.

use super::{Connector, RemoteAddr, Session};
use crate::config::{QuicConfig, TlsConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use quinn::crypto::rustls::QuicClientConfig;
use quinn::{Endpoint, IdleTimeout, RecvStream, SendStream, VarInt};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Close reasons longer than this are truncated before hitting the wire
const MAX_CLOSE_REASON_LEN: usize = 256;

/// Application error code sent when the pool closes a session
const CLOSE_CODE: u32 = 0;

/// Build the quinn transport (tuning) configuration
pub fn build_transport_config(config: &QuicConfig) -> Result<quinn::TransportConfig> {
    let mut transport = quinn::TransportConfig::default();

    let idle = IdleTimeout::try_from(Duration::from_secs(config.max_idle_timeout_secs))
        .context("max_idle_timeout_secs is out of range")?;
    transport.max_idle_timeout(Some(idle));

    if config.keep_alive_secs > 0 {
        transport.keep_alive_interval(Some(Duration::from_secs(config.keep_alive_secs)));
    }

    transport.max_concurrent_bidi_streams(VarInt::from_u32(config.max_concurrent_bidi_streams));

    Ok(transport)
}

/// QUIC connector holding the shared TLS and tuning configuration
#[derive(Clone)]
pub struct QuicConnector {
    /// Client endpoint shared by every session
    endpoint: Endpoint,
    /// Crypto and transport configuration applied to each dial
    client_config: quinn::ClientConfig,
    /// Server name override for TLS verification
    server_name: Option<String>,
}

impl std::fmt::Debug for QuicConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuicConnector")
            .field("local_addr", &self.endpoint.local_addr().ok())
            .field("server_name", &self.server_name)
            .finish()
    }
}

impl QuicConnector {
    /// Create a connector; must be called from within a tokio runtime
    ///
    /// Dials are not bounded here; the pool applies its handshake timeout
    /// around every dial.
    pub fn new(tls: &TlsConfig, quic: &QuicConfig) -> Result<Self> {
        let crypto = super::build_client_crypto(tls)?;
        let crypto =
            QuicClientConfig::try_from(crypto).context("TLS configuration is unusable for QUIC")?;

        let mut client_config = quinn::ClientConfig::new(Arc::new(crypto));
        client_config.transport_config(Arc::new(build_transport_config(quic)?));

        let bind_addr: SocketAddr = quic
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address: {}", quic.bind_addr))?;
        let endpoint = Endpoint::client(bind_addr)
            .with_context(|| format!("Failed to bind QUIC endpoint on {}", bind_addr))?;

        Ok(QuicConnector {
            endpoint,
            client_config,
            server_name: tls.server_name.clone(),
        })
    }

    /// Local address of the client endpoint
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.endpoint.local_addr()?)
    }

    async fn handshake(&self, addr: &str) -> Result<quinn::Connection> {
        let remote = RemoteAddr::parse(addr)?;
        let local_is_ipv6 = self.endpoint.local_addr()?.is_ipv6();
        let resolved = remote.resolve(local_is_ipv6).await?;

        let server_name = self.server_name.as_deref().unwrap_or_else(|| remote.host());

        let connecting = self
            .endpoint
            .connect_with(self.client_config.clone(), resolved, server_name)
            .with_context(|| format!("Failed to start handshake with {}", addr))?;

        connecting
            .await
            .with_context(|| format!("QUIC handshake failed with {}", addr))
    }
}

#[async_trait]
impl Connector for QuicConnector {
    type Session = QuicSession;

    async fn dial(&self, addr: &str) -> Result<QuicSession> {
        let conn = self.handshake(addr).await?;

        tracing::debug!(
            "QUIC session established to {} ({})",
            addr,
            conn.remote_address()
        );

        Ok(QuicSession::new(addr, conn))
    }
}

/// One established QUIC connection
#[derive(Debug, Clone)]
pub struct QuicSession {
    /// Address the session was dialed against
    addr: String,
    /// Underlying connection
    conn: quinn::Connection,
}

impl QuicSession {
    /// Wrap an established connection
    pub fn new(addr: &str, conn: quinn::Connection) -> Self {
        QuicSession {
            addr: addr.to_string(),
            conn,
        }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &quinn::Connection {
        &self.conn
    }
}

#[async_trait]
impl Session for QuicSession {
    type Stream = QuicStream;

    async fn open_stream(&self) -> Result<QuicStream> {
        let (send, recv) = self
            .conn
            .open_bi()
            .await
            .with_context(|| format!("Failed to open stream to {}", self.addr))?;
        Ok(QuicStream::new(send, recv))
    }

    fn close(&self, reason: &str) {
        self.conn
            .close(VarInt::from_u32(CLOSE_CODE), truncate_reason(reason).as_bytes());
    }

    fn is_closed(&self) -> bool {
        self.conn.close_reason().is_some()
    }

    fn remote_addr(&self) -> &str {
        &self.addr
    }
}

fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_CLOSE_REASON_LEN {
        return reason;
    }
    let mut end = MAX_CLOSE_REASON_LEN;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}

/// Bidirectional QUIC stream
///
/// Shutting down the write half finishes the send stream; the caller owns
/// the stream and the pool keeps no reference to it.
#[derive(Debug)]
pub struct QuicStream {
    send: SendStream,
    recv: RecvStream,
}

impl QuicStream {
    /// Combine the two halves of a bidirectional stream
    pub fn new(send: SendStream, recv: RecvStream) -> Self {
        QuicStream { send, recv }
    }

    /// Split into the send and receive halves
    pub fn into_split(self) -> (SendStream, RecvStream) {
        (self.send, self.recv)
    }

    /// Stream identifier
    pub fn id(&self) -> quinn::StreamId {
        self.send.id()
    }
}

impl AsyncRead for QuicStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        AsyncRead::poll_read(Pin::new(&mut self.recv), cx, buf)
    }
}

impl AsyncWrite for QuicStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        AsyncWrite::poll_write(Pin::new(&mut self.send), cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_flush(Pin::new(&mut self.send), cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_shutdown(Pin::new(&mut self.send), cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_from_defaults() {
        let config = QuicConfig::default();
        assert!(build_transport_config(&config).is_ok());
    }

    #[test]
    fn test_transport_config_keep_alive_disabled() {
        let config = QuicConfig {
            keep_alive_secs: 0,
            ..Default::default()
        };
        assert!(build_transport_config(&config).is_ok());
    }

    #[test]
    fn test_truncate_reason() {
        assert_eq!(truncate_reason("broken pipe"), "broken pipe");

        let long = "x".repeat(MAX_CLOSE_REASON_LEN + 10);
        assert_eq!(truncate_reason(&long).len(), MAX_CLOSE_REASON_LEN);

        // Multi-byte characters are never split
        let long = "é".repeat(MAX_CLOSE_REASON_LEN);
        let truncated = truncate_reason(&long);
        assert!(truncated.len() <= MAX_CLOSE_REASON_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[tokio::test]
    async fn test_connector_new() {
        let tls = TlsConfig::default();
        let quic = QuicConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let connector = QuicConnector::new(&tls, &quic).unwrap();
        let local = connector.local_addr().unwrap();
        assert!(local.ip().is_loopback());
        assert_ne!(local.port(), 0);
    }

    #[tokio::test]
    async fn test_connector_rejects_bad_bind_addr() {
        let quic = QuicConfig {
            bind_addr: "not-an-addr".to_string(),
            ..Default::default()
        };
        let result = QuicConnector::new(&TlsConfig::default(), &quic);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dial_invalid_address_fails() {
        let quic = QuicConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let connector = QuicConnector::new(&TlsConfig::default(), &quic).unwrap();

        assert!(connector.dial("no-port-here").await.is_err());
    }
}
