//! QUIC echo server
//!
//! Accepts sessions and echoes every bidirectional stream back to the peer.

use crate::config::QuicConfig;
use crate::transport::{build_server_crypto, build_transport_config};
use anyhow::{Context, Result};
use quinn::crypto::rustls::QuicServerConfig;
use quinn::{Connection, Endpoint, RecvStream, SendStream};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Echo server bound to a UDP address
#[derive(Debug)]
pub struct EchoServer {
    endpoint: Endpoint,
}

impl EchoServer {
    /// Bind the server; must be called from within a tokio runtime
    pub fn bind(
        listen: SocketAddr,
        cert_path: &Path,
        key_path: &Path,
        alpn: &[String],
        quic: &QuicConfig,
    ) -> Result<Self> {
        let crypto = build_server_crypto(cert_path, key_path, alpn)?;
        let crypto =
            QuicServerConfig::try_from(crypto).context("TLS configuration is unusable for QUIC")?;

        let mut server_config = quinn::ServerConfig::with_crypto(Arc::new(crypto));
        server_config.transport_config(Arc::new(build_transport_config(quic)?));

        let endpoint = Endpoint::server(server_config, listen)
            .with_context(|| format!("Failed to listen on {}", listen))?;

        Ok(EchoServer { endpoint })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.endpoint.local_addr()?)
    }

    /// Accept sessions until shutdown is signalled
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        info!("Echo server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                incoming = self.endpoint.accept() => {
                    let Some(incoming) = incoming else {
                        info!("Endpoint closed");
                        break;
                    };
                    tokio::spawn(async move {
                        match incoming.await {
                            Ok(conn) => serve_session(conn).await,
                            Err(e) => warn!("Incoming session failed: {}", e),
                        }
                    });
                }
                _ = shutdown_rx.recv() => {
                    info!("Echo server shutting down");
                    break;
                }
            }
        }

        self.endpoint.close(0u32.into(), b"server shutdown");
        self.endpoint.wait_idle().await;
        Ok(())
    }
}

async fn serve_session(conn: Connection) {
    let remote = conn.remote_address();
    info!("Accepted session from {}", remote);

    loop {
        match conn.accept_bi().await {
            Ok((send, recv)) => {
                tokio::spawn(async move {
                    if let Err(e) = serve_stream(send, recv).await {
                        debug!("Stream from {} ended with error: {:#}", remote, e);
                    }
                });
            }
            Err(e) => {
                info!("Session from {} closed: {}", remote, e);
                return;
            }
        }
    }
}

async fn serve_stream(mut send: SendStream, mut recv: RecvStream) -> Result<()> {
    let echoed = tokio::io::copy(&mut recv, &mut send)
        .await
        .context("Echo copy failed")?;
    send.finish().context("Failed to finish stream")?;
    debug!("Echoed {} bytes on stream {}", echoed, send.id());
    Ok(())
}
