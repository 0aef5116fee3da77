//! In-process user store.
//!
//! Used when no `DATABASE_URL` is configured (local development) and by tests.
//! Records live only as long as the process.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::{
    error::{RepoError, RepoResult},
    user_repo::{NewUser, User, UserRepo},
};

#[derive(Clone, Debug, Default)]
pub struct MemoryUserRepo {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, name: &str) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(name).cloned())
    }

    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        // Check and insert under one write guard so racing creates see each other.
        let mut users = self.users.write().await;
        if users.contains_key(&user.name) {
            return Err(RepoError::Conflict {
                name: user.name.clone(),
            });
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            created_at: Utc::now(),
        };
        users.insert(created.name.clone(), created.clone());

        Ok(created)
    }
}
