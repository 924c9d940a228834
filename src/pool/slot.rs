//! Shared pool slot
//!
//! Holds the process-wide pool as an injectable value instead of a global.
//! Installing a second pool replaces the first, which is reported rather
//! than done silently.

use super::controller::{SessionPool, StreamOf};
use crate::error::PoolError;
use crate::transport::Connector;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Slot holding the pool shared by every caller
#[derive(Debug)]
pub struct PoolSlot<C: Connector> {
    pool: RwLock<Option<Arc<SessionPool<C>>>>,
}

impl<C: Connector> Default for PoolSlot<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> PoolSlot<C> {
    /// Create an empty slot
    pub fn new() -> Self {
        PoolSlot {
            pool: RwLock::new(None),
        }
    }

    /// Install a pool, returning the one it replaced
    ///
    /// Sessions of the replaced pool stay open until the caller closes them
    /// or drops the last reference.
    pub async fn init(&self, pool: SessionPool<C>) -> Option<Arc<SessionPool<C>>> {
        let previous = self.pool.write().await.replace(Arc::new(pool));
        if previous.is_some() {
            warn!("Session pool re-initialized, previous configuration replaced");
        } else {
            info!("Session pool initialized");
        }
        previous
    }

    /// Get the installed pool
    pub async fn get(&self) -> Result<Arc<SessionPool<C>>, PoolError> {
        self.pool
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(PoolError::Uninitialized)
    }

    /// Whether a pool has been installed
    pub async fn is_initialized(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Get a stream to `addr` from the installed pool
    pub async fn acquire_stream(&self, addr: &str) -> Result<StreamOf<C>, PoolError> {
        let pool = self.get().await?;
        pool.acquire_stream(addr).await
    }
}
