// src/db/registry.rs
// DOCUMENTATION: Keyed connection-pool registry
// PURPOSE: Create Oracle pools lazily per endpoint, reuse them, close them all on cleanup

use super::backend::{PoolBounds, PoolFactory, PoolHandle};
use super::pool_key::PoolKey;
use crate::errors::OjetError;
use crate::models::DbDescriptor;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

/// Outcome of a close-all sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloseSummary {
    pub closed: usize,
    pub failed: usize,
}

/// Registry statistics for the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub keyed_pools: usize,
    pub legacy_pool: bool,
}

/// Process-wide pool registry
/// DOCUMENTATION: Constructed once in main.rs and shared with handlers through
/// `web::Data`. Each key owns a `OnceCell` so concurrent first requests for the
/// same endpoint wait on a single pool creation.
pub struct PoolRegistry {
    factory: Arc<dyn PoolFactory>,
    bounds: PoolBounds,
    close_grace: Duration,
    default_descriptor: Option<DbDescriptor>,
    pools: Mutex<HashMap<PoolKey, Arc<OnceCell<PoolHandle>>>>,
    legacy: Mutex<Option<PoolHandle>>,
}

impl PoolRegistry {
    pub fn new(factory: Arc<dyn PoolFactory>) -> Self {
        Self {
            factory,
            bounds: PoolBounds::default(),
            close_grace: Duration::from_secs(10),
            default_descriptor: None,
            pools: Mutex::new(HashMap::new()),
            legacy: Mutex::new(None),
        }
    }

    pub fn with_bounds(mut self, bounds: PoolBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Descriptor used when a request carries none and no legacy pool is set
    pub fn with_default_descriptor(mut self, descriptor: Option<DbDescriptor>) -> Self {
        self.default_descriptor = descriptor;
        self
    }

    /// Return the pool for this endpoint, creating it on first use
    pub async fn get_or_create_pool(
        &self,
        descriptor: &DbDescriptor,
    ) -> Result<PoolHandle, OjetError> {
        let key = PoolKey::derive(descriptor);

        let slot = {
            let mut pools = self.pools.lock().await;
            Arc::clone(
                pools
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        if let Some(pool) = slot.get() {
            log::debug!("Reusing connection pool {}", key);
            return Ok(Arc::clone(pool));
        }

        let created = slot
            .get_or_try_init(|| async {
                log::info!("Creating connection pool {}", key);
                self.factory.create_pool(descriptor, self.bounds).await
            })
            .await;

        match created {
            Ok(pool) => Ok(Arc::clone(pool)),
            Err(e) => {
                log::error!("Failed to create connection pool {}: {}", key, e);
                // Only drop the slot if no other caller holds it; a waiter may
                // be running its own init on it. Slots are cloned under this
                // lock, and one left behind empty is simply retried.
                let mut pools = self.pools.lock().await;
                let unused = pools
                    .get(&key)
                    .map(|current| {
                        Arc::ptr_eq(current, &slot)
                            && !current.initialized()
                            && Arc::strong_count(current) == 2
                    })
                    .unwrap_or(false);
                if unused {
                    pools.remove(&key);
                }
                Err(e)
            }
        }
    }

    /// Replace the single legacy pool with a fresh one for `descriptor`
    /// DOCUMENTATION: The previous legacy pool is closed with the configured
    /// grace period; work still running on it after that may fail.
    pub async fn get_legacy_pool(&self, descriptor: &DbDescriptor) -> Result<PoolHandle, OjetError> {
        let mut legacy = self.legacy.lock().await;

        if let Some(previous) = legacy.take() {
            log::info!("Closing previous legacy connection pool");
            if let Err(e) = previous.close(self.close_grace).await {
                log::warn!("Error closing previous legacy pool: {}", e);
            }
        }

        log::info!(
            "Creating legacy connection pool for {}",
            PoolKey::derive(descriptor)
        );
        let pool = self.factory.create_pool(descriptor, self.bounds).await?;
        *legacy = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Pick the pool a request should run on
    pub async fn resolve(&self, descriptor: Option<&DbDescriptor>) -> Result<PoolHandle, OjetError> {
        if let Some(descriptor) = descriptor {
            return self.get_or_create_pool(descriptor).await;
        }

        if let Some(pool) = self.legacy.lock().await.as_ref() {
            return Ok(Arc::clone(pool));
        }

        match &self.default_descriptor {
            Some(descriptor) => self.get_or_create_pool(descriptor).await,
            None => Err(OjetError::NotInitialized),
        }
    }

    /// Close every keyed and legacy pool concurrently and empty the registry
    pub async fn close_all(&self) -> CloseSummary {
        let mut handles: Vec<(String, PoolHandle)> = Vec::new();

        {
            let mut pools = self.pools.lock().await;
            for (key, slot) in pools.drain() {
                if let Some(pool) = slot.get() {
                    handles.push((key.to_string(), Arc::clone(pool)));
                }
            }
        }

        if let Some(pool) = self.legacy.lock().await.take() {
            handles.push(("legacy".to_string(), pool));
        }

        if handles.is_empty() {
            log::debug!("No connection pools to close");
            return CloseSummary::default();
        }

        let grace = self.close_grace;
        let results = join_all(
            handles
                .iter()
                .map(|(label, pool)| async move { (label, pool.close(grace).await) }),
        )
        .await;

        let mut summary = CloseSummary::default();
        for (label, result) in results {
            match result {
                Ok(()) => summary.closed += 1,
                Err(e) => {
                    log::error!("Error closing connection pool {}: {}", label, e);
                    summary.failed += 1;
                }
            }
        }

        log::info!(
            "Closed {} connection pools ({} failed)",
            summary.closed,
            summary.failed
        );
        summary
    }

    pub async fn stats(&self) -> RegistryStats {
        let keyed_pools = self
            .pools
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count();

        RegistryStats {
            keyed_pools,
            legacy_pool: self.legacy.lock().await.is_some(),
        }
    }
}
