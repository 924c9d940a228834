//! Session pool controller
//!
//! Decides per call whether to reuse, replace, or reject a session for an
//! address, and hands the caller a fresh stream.

use super::registry::{Registration, SessionRegistry};
use super::stats::PoolStats;
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::transport::{Connector, Session};
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Stream type produced by a connector's sessions
pub type StreamOf<C> = <<C as Connector>::Session as Session>::Stream;

/// Client-side pool of multiplexed sessions, one per address
///
/// Cloning is not supported; share the pool behind an `Arc`.
#[derive(Debug)]
pub struct SessionPool<C: Connector> {
    /// Dials new sessions with the shared security and tuning configuration
    connector: C,
    /// Registered sessions
    registry: SessionRegistry<C::Session>,
    /// Bound on distinct registered addresses
    max_sessions: usize,
    /// Bound on every dial, handshake included
    connect_timeout: Duration,
    /// Statistics
    stats: PoolStats,
}

impl<C: Connector> SessionPool<C> {
    /// Create a pool around a connector
    pub fn new(connector: C, config: &PoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::Config)?;

        info!(
            "Session pool ready: max_sessions={}, connect_timeout={:?}",
            config.max_sessions,
            config.connect_timeout()
        );

        Ok(SessionPool {
            connector,
            registry: SessionRegistry::new(),
            max_sessions: config.max_sessions,
            connect_timeout: config.connect_timeout(),
            stats: PoolStats::new(),
        })
    }

    /// Get a ready-to-use stream to `addr`
    ///
    /// Reuses the registered session when it is healthy. A broken session is
    /// evicted and closed, then replaced by a fresh dial if the pool has
    /// room. Errors are never retried here; the next call for the address
    /// starts from a clean registry entry.
    pub async fn acquire_stream(&self, addr: &str) -> Result<StreamOf<C>, PoolError> {
        if let Some(session) = self.registry.get(addr).await {
            if session.is_closed() {
                self.evict(addr, &session, "session closed").await;
            } else {
                match session.open_stream().await {
                    Ok(stream) => {
                        self.stats.record_stream(true);
                        debug!("Reusing session to {}", addr);
                        return Ok(stream);
                    }
                    Err(e) => {
                        warn!("Session to {} is broken: {:#}", addr, e);
                        self.evict(addr, &session, &e.to_string()).await;
                    }
                }
            }
        }

        // A concurrent caller may already have replaced the broken entry
        if !self.registry.has_room(addr, self.max_sessions).await {
            return Err(self.reject(addr));
        }

        let session = self.dial(addr).await?;
        let (session, reused) = match self
            .registry
            .register(addr, session.clone(), self.max_sessions)
            .await
        {
            Registration::Registered { replaced } => {
                if let Some(old) = replaced {
                    old.close("replaced");
                }
                debug!("Registered new session to {}", addr);
                (session, false)
            }
            Registration::Existing(existing) => {
                debug!("Session to {} registered concurrently, discarding ours", addr);
                session.close("duplicate session");
                (existing, true)
            }
            Registration::Full => {
                session.close("pool full");
                return Err(self.reject(addr));
            }
        };

        // A failure here leaves the session registered; the next call evicts it
        let stream = session
            .open_stream()
            .await
            .map_err(|e| PoolError::stream(addr, e))?;
        self.stats.record_stream(reused);
        Ok(stream)
    }

    /// Dial `addr`, bounded by the handshake timeout
    async fn dial(&self, addr: &str) -> Result<Arc<C::Session>, PoolError> {
        debug!("Dialing {}", addr);
        let result = match timeout(self.connect_timeout, self.connector.dial(addr)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "handshake with {} timed out after {:?}",
                addr,
                self.connect_timeout
            )),
        };

        match result {
            Ok(session) => {
                self.stats.record_dial();
                Ok(Arc::new(session))
            }
            Err(e) => {
                self.stats.record_dial_failure();
                warn!("Failed to dial {}: {:#}", addr, e);
                Err(PoolError::dial(addr, e))
            }
        }
    }

    async fn evict(&self, addr: &str, session: &Arc<C::Session>, reason: &str) {
        if self.registry.remove_if_same(addr, session).await {
            self.stats.record_evicted();
            debug!("Evicted session to {}", addr);
        }
        session.close(reason);
    }

    fn reject(&self, addr: &str) -> PoolError {
        self.stats.record_rejected();
        warn!(
            "Session limit of {} reached, rejecting {}",
            self.max_sessions, addr
        );
        PoolError::Capacity {
            max: self.max_sessions,
        }
    }

    /// Number of registered sessions
    pub async fn len(&self) -> usize {
        self.registry.size().await
    }

    /// Whether no session is registered
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether `addr` has a registered session
    pub async fn contains(&self, addr: &str) -> bool {
        self.registry.contains(addr).await
    }

    /// Session currently registered for `addr`
    pub async fn session(&self, addr: &str) -> Option<Arc<C::Session>> {
        self.registry.get(addr).await
    }

    /// Configured bound on distinct sessions
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Handshake timeout applied to every dial
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Get pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Log pool health status
    pub async fn log_health(&self) {
        self.stats.log_health(self.len().await);
    }

    /// Remove and close every registered session
    pub async fn close_all(&self, reason: &str) {
        let sessions = self.registry.drain().await;
        info!("Closing {} pooled sessions", sessions.len());
        for (_, session) in sessions {
            session.close(reason);
        }
    }
}
