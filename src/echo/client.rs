//! Echo load client
//!
//! Drives calls against a set of servers through one shared session pool.

use crate::pool::SessionPool;
use crate::transport::{Connector, Session};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Follow-up messages sent after the greeting on every stream
const FOLLOW_UPS: usize = 2;

/// Load run parameters
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Server addresses to call
    pub servers: Vec<String>,
    /// Streams acquired per server per round
    pub calls: usize,
    /// Number of rounds
    pub rounds: usize,
    /// Pause between rounds
    pub pause: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            servers: vec!["localhost:5454".to_string()],
            calls: 10,
            rounds: 1,
            pause: Duration::from_secs(0),
        }
    }
}

/// Outcome counts of a load run
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Calls whose echo exchange completed
    pub succeeded: AtomicUsize,
    /// Calls that could not get a stream or failed mid-exchange
    pub failed: AtomicUsize,
}

impl LoadReport {
    /// Total successful calls
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Total failed calls
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Write `message` and read back exactly as many bytes, expecting an echo
pub async fn echo_exchange<S>(stream: &mut S, message: &[u8]) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    stream
        .write_all(message)
        .await
        .context("Failed to send message")?;

    let mut buf = vec![0u8; message.len()];
    stream
        .read_exact(&mut buf)
        .await
        .context("Failed to read echo")?;

    if buf != message {
        anyhow::bail!(
            "Echo mismatch: sent {:?}, got {:?}",
            String::from_utf8_lossy(message),
            String::from_utf8_lossy(&buf)
        );
    }
    Ok(())
}

/// Run one call: greeting plus follow-ups, then finish the stream
pub async fn run_call<S>(mut stream: S, name: usize) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    echo_exchange(&mut stream, format!("client{}", name).as_bytes()).await?;
    for i in 0..FOLLOW_UPS {
        let message = format!("client{},send no. {} message", name, i);
        echo_exchange(&mut stream, message.as_bytes()).await?;
    }
    stream.shutdown().await.context("Failed to finish stream")?;
    debug!("Client {} done", name);
    Ok(())
}

/// Run every round against every server concurrently
pub async fn run_load<C>(pool: Arc<SessionPool<C>>, options: &LoadOptions) -> Result<Arc<LoadReport>>
where
    C: Connector,
    <C::Session as Session>::Stream: AsyncRead + AsyncWrite + Unpin,
{
    if options.servers.is_empty() {
        anyhow::bail!("No servers to call");
    }

    let report = Arc::new(LoadReport::default());

    for round in 0..options.rounds {
        if round > 0 && !options.pause.is_zero() {
            info!("Sleeping {:?} before round {}", options.pause, round + 1);
            tokio::time::sleep(options.pause).await;
        }

        let tasks: Vec<_> = options
            .servers
            .iter()
            .map(|addr| {
                let pool = pool.clone();
                let report = report.clone();
                let addr = addr.clone();
                let calls = options.calls;
                tokio::spawn(async move { call_server(pool, &addr, calls, report).await })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            task.context("Load task panicked")?;
        }

        pool.log_health().await;
    }

    info!(
        "Load finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

async fn call_server<C>(pool: Arc<SessionPool<C>>, addr: &str, calls: usize, report: Arc<LoadReport>)
where
    C: Connector,
    <C::Session as Session>::Stream: AsyncRead + AsyncWrite + Unpin,
{
    let mut exchanges = Vec::with_capacity(calls);

    for i in 0..calls {
        let stream = match pool.acquire_stream(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Cannot get stream to {}: {}", addr, e);
                report
                    .failed
                    .fetch_add(calls - i, Ordering::Relaxed);
                break;
            }
        };

        let report = report.clone();
        exchanges.push(tokio::spawn(async move {
            match run_call(stream, i).await {
                Ok(()) => report.succeeded.fetch_add(1, Ordering::Relaxed),
                Err(e) => {
                    warn!("Client {} failed: {:#}", i, e);
                    report.failed.fetch_add(1, Ordering::Relaxed)
                }
            };
        }));
    }

    for result in futures::future::join_all(exchanges).await {
        if let Err(e) = result {
            warn!("Call task panicked: {}", e);
            report.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
