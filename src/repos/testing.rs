//! Recording `UserRepo` double for service and router tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::repos::{
    MemoryUserRepo,
    error::{RepoError, RepoResult},
    user_repo::{NewUser, User, UserRepo},
};

/// Wraps `MemoryUserRepo`, counts calls, and can be told to fail either call.
#[derive(Clone, Debug, Default)]
pub struct RecordingRepo {
    pub inner: MemoryUserRepo,
    gets: Arc<AtomicUsize>,
    creates: Arc<AtomicUsize>,
    created_names: Arc<std::sync::Mutex<Vec<String>>>,
    fail_get: bool,
    fail_create: bool,
    get_gate: Option<Arc<Barrier>>,
}

impl RecordingRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_get() -> Self {
        Self {
            fail_get: true,
            ..Self::default()
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Every `get` result is held until `callers` lookups have completed, so
    /// that many concurrent first contacts all miss before any of them creates.
    pub fn gated_gets(callers: usize) -> Self {
        Self {
            get_gate: Some(Arc::new(Barrier::new(callers))),
            ..Self::default()
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRepo for RecordingRepo {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn get(&self, name: &str) -> RepoResult<Option<User>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        let found = self.inner.get(name).await;
        if let Some(gate) = &self.get_gate {
            gate.wait().await;
        }
        found
    }

    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.created_names.lock().unwrap().push(user.name.clone());
        if self.fail_create {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        self.inner.create(user).await
    }
}
