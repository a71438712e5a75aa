// src/db/testing.rs
// DOCUMENTATION: In-memory pool doubles for unit tests
// PURPOSE: Count pool creations, borrows and releases without a database

use super::backend::{
    DbConnection, DbPool, PoolBounds, PoolFactory, PoolHandle, RawRows, Statement,
};
use crate::errors::OjetError;
use crate::models::DbDescriptor;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Responder = Arc<dyn Fn(&Statement) -> Result<RawRows, OjetError> + Send + Sync>;

/// Responder that answers every statement with the same rows
pub fn rows(columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Responder {
    let raw = RawRows {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    };
    Arc::new(move |_: &Statement| Ok::<_, OjetError>(raw.clone()))
}

#[derive(Default)]
pub struct MockPool {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub closed: AtomicUsize,
    pub fail_acquire: AtomicBool,
    pub fail_release: AtomicBool,
    pub fail_close: AtomicBool,
    pub executed: Mutex<Vec<Statement>>,
    pub max_rows_seen: Mutex<Vec<usize>>,
    responder: Option<Responder>,
}

impl MockPool {
    pub fn new(responder: Responder) -> Arc<Self> {
        Arc::new(Self {
            responder: Some(responder),
            ..Default::default()
        })
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockConnection {
    pool: Arc<MockPool>,
}

#[async_trait]
impl DbConnection for MockConnection {
    async fn run(&mut self, statement: &Statement, max_rows: usize) -> Result<RawRows, OjetError> {
        self.pool.executed.lock().unwrap().push(statement.clone());
        self.pool.max_rows_seen.lock().unwrap().push(max_rows);
        match &self.pool.responder {
            Some(responder) => responder(statement),
            None => Ok(RawRows::default()),
        }
    }

    async fn release(self: Box<Self>) -> Result<(), OjetError> {
        self.pool.released.fetch_add(1, Ordering::SeqCst);
        if self.pool.fail_release.load(Ordering::SeqCst) {
            return Err(OjetError::InternalError("release failed".into()));
        }
        Ok(())
    }
}

/// DbPool wrapper so the same MockPool can be inspected after being handed out
struct SharedMockPool(Arc<MockPool>);

#[async_trait]
impl DbPool for SharedMockPool {
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, OjetError> {
        if self.0.fail_acquire.load(Ordering::SeqCst) {
            return Err(OjetError::PoolUnavailable("all connections busy".into()));
        }
        self.0.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            pool: Arc::clone(&self.0),
        }))
    }

    async fn close(&self, _grace: Duration) -> Result<(), OjetError> {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_close.load(Ordering::SeqCst) {
            return Err(OjetError::DatabaseError("close failed".into()));
        }
        Ok(())
    }
}

pub fn handle(pool: &Arc<MockPool>) -> PoolHandle {
    Arc::new(SharedMockPool(Arc::clone(pool)))
}

/// Factory that records every pool it creates
pub struct MockFactory {
    pub created: AtomicUsize,
    pub fail_next: AtomicBool,
    pub fail_close: AtomicBool,
    pub delay: Duration,
    pub pools: Mutex<Vec<Arc<MockPool>>>,
    pub descriptors: Mutex<Vec<DbDescriptor>>,
    responder: Responder,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Self::with_responder(rows(&[], Vec::new()))
    }

    pub fn with_responder(responder: Responder) -> Arc<Self> {
        Arc::new(Self::build(responder, Duration::ZERO))
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(rows(&[], Vec::new()), delay))
    }

    fn build(responder: Responder, delay: Duration) -> Self {
        Self {
            created: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            delay,
            pools: Mutex::new(Vec::new()),
            descriptors: Mutex::new(Vec::new()),
            responder,
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn pool(&self, index: usize) -> Arc<MockPool> {
        Arc::clone(&self.pools.lock().unwrap()[index])
    }
}

#[async_trait]
impl PoolFactory for MockFactory {
    async fn create_pool(
        &self,
        descriptor: &DbDescriptor,
        _bounds: PoolBounds,
    ) -> Result<PoolHandle, OjetError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(OjetError::DatabaseError("ORA-01017: invalid username/password".into()));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        let pool = MockPool::new(Arc::clone(&self.responder));
        pool.fail_close
            .store(self.fail_close.load(Ordering::SeqCst), Ordering::SeqCst);
        self.pools.lock().unwrap().push(Arc::clone(&pool));
        self.descriptors.lock().unwrap().push(descriptor.clone());
        Ok(handle(&pool))
    }
}
