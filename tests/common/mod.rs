//! Test utilities and mocks for Quicpool
//!
//! This module provides an in-memory transport with failure injection used
//! across integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use quicpool::config::PoolConfig;
use quicpool::{Connector, Session, SessionPool};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared state of the fake network
#[derive(Debug, Default)]
pub struct MockNetwork {
    dials: AtomicUsize,
    unreachable: Mutex<HashSet<String>>,
    sessions: Mutex<Vec<Arc<MockSessionState>>>,
    dial_delay: Mutex<Option<Duration>>,
    fail_fresh_streams: AtomicBool,
}

impl MockNetwork {
    /// Number of dial attempts so far, failed ones included
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Make dials to `addr` fail
    pub fn set_unreachable(&self, addr: &str) {
        self.unreachable.lock().unwrap().insert(addr.to_string());
    }

    /// Make dials to `addr` succeed again
    pub fn set_reachable(&self, addr: &str) {
        self.unreachable.lock().unwrap().remove(addr);
    }

    /// Delay every dial, widening race windows
    pub fn set_dial_delay(&self, delay: Duration) {
        *self.dial_delay.lock().unwrap() = Some(delay);
    }

    /// Make newly dialed sessions fail to open streams
    pub fn set_fail_fresh_streams(&self, fail: bool) {
        self.fail_fresh_streams.store(fail, Ordering::SeqCst);
    }

    /// Every session ever dialed, in dial order
    pub fn sessions(&self) -> Vec<Arc<MockSessionState>> {
        self.sessions.lock().unwrap().clone()
    }

    /// Sessions dialed against `addr`
    pub fn sessions_for(&self, addr: &str) -> Vec<Arc<MockSessionState>> {
        self.sessions()
            .into_iter()
            .filter(|s| s.addr == addr)
            .collect()
    }

    /// Sessions that were never closed
    pub fn open_sessions(&self) -> usize {
        self.sessions().iter().filter(|s| !s.is_closed()).count()
    }
}

/// Observable state of one mock session
#[derive(Debug)]
pub struct MockSessionState {
    pub id: usize,
    pub addr: String,
    broken: AtomicBool,
    closed: AtomicBool,
    close_reason: Mutex<Option<String>>,
    streams_opened: AtomicUsize,
    stream_delays: Mutex<VecDeque<Duration>>,
}

impl MockSessionState {
    /// Make `open_stream` fail while the session still looks open
    pub fn break_streams(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    /// Delay the next `open_stream` calls, one entry per call
    pub fn delay_streams(&self, delays: &[Duration]) {
        self.stream_delays.lock().unwrap().extend(delays);
    }

    /// Simulate the transport closing the session underneath the pool
    pub fn kill(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.close_reason.lock().unwrap() = Some("killed by peer".to_string());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_reason(&self) -> Option<String> {
        self.close_reason.lock().unwrap().clone()
    }

    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }
}

/// Connector over the fake network
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    pub net: Arc<MockNetwork>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Session = MockSession;

    async fn dial(&self, addr: &str) -> Result<MockSession> {
        let id = self.net.dials.fetch_add(1, Ordering::SeqCst);

        let delay = *self.net.dial_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.net.unreachable.lock().unwrap().contains(addr) {
            anyhow::bail!("connection refused by {}", addr);
        }

        let state = Arc::new(MockSessionState {
            id,
            addr: addr.to_string(),
            broken: AtomicBool::new(self.net.fail_fresh_streams.load(Ordering::SeqCst)),
            closed: AtomicBool::new(false),
            close_reason: Mutex::new(None),
            streams_opened: AtomicUsize::new(0),
            stream_delays: Mutex::new(VecDeque::new()),
        });
        self.net.sessions.lock().unwrap().push(state.clone());

        Ok(MockSession { state })
    }
}

/// Session over the fake network
#[derive(Debug)]
pub struct MockSession {
    pub state: Arc<MockSessionState>,
}

/// Stream handed out by a mock session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockStream {
    pub session_id: usize,
    pub seq: usize,
}

#[async_trait]
impl Session for MockSession {
    type Stream = MockStream;

    async fn open_stream(&self) -> Result<MockStream> {
        let delay = self.state.stream_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.is_closed() {
            anyhow::bail!("session {} is closed", self.state.id);
        }
        if self.state.broken.load(Ordering::SeqCst) {
            anyhow::bail!("stream limit exceeded on session {}", self.state.id);
        }
        let seq = self.state.streams_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockStream {
            session_id: self.state.id,
            seq,
        })
    }

    fn close(&self, reason: &str) {
        if !self.state.closed.swap(true, Ordering::SeqCst) {
            *self.state.close_reason.lock().unwrap() = Some(reason.to_string());
        }
    }

    fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    fn remote_addr(&self) -> &str {
        &self.state.addr
    }
}

/// Build a mock pool with the given bound
pub fn mock_pool(max_sessions: usize) -> (SessionPool<MockConnector>, Arc<MockNetwork>) {
    mock_pool_with_timeout(max_sessions, Duration::from_secs(5))
}

/// Build a mock pool with the given bound and handshake timeout
pub fn mock_pool_with_timeout(
    max_sessions: usize,
    connect_timeout: Duration,
) -> (SessionPool<MockConnector>, Arc<MockNetwork>) {
    let connector = MockConnector::new();
    let net = connector.net.clone();
    let config = PoolConfig::new(max_sessions, connect_timeout);
    (SessionPool::new(connector, &config).unwrap(), net)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_connector_dial_and_open() {
        let connector = MockConnector::new();
        let session = connector.dial("a:1").await.unwrap();

        assert_eq!(session.remote_addr(), "a:1");
        assert_eq!(session.open_stream().await.unwrap().seq, 0);
        assert_eq!(session.open_stream().await.unwrap().seq, 1);
        assert_eq!(connector.net.dials(), 1);
    }

    #[tokio::test]
    async fn test_mock_connector_unreachable() {
        let connector = MockConnector::new();
        connector.net.set_unreachable("a:1");
        assert!(connector.dial("a:1").await.is_err());
        assert!(connector.net.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_mock_session_break_and_kill() {
        let connector = MockConnector::new();
        let session = connector.dial("a:1").await.unwrap();

        session.state.break_streams();
        assert!(session.open_stream().await.is_err());
        assert!(!session.is_closed());

        session.state.kill();
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_mock_session_stream_delays() {
        let connector = MockConnector::new();
        let session = connector.dial("a:1").await.unwrap();
        session.state.delay_streams(&[Duration::from_millis(20)]);

        let start = std::time::Instant::now();
        assert!(session.open_stream().await.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
