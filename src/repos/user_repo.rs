/*
 * Responsibility
 * - identity record (User) と user store の契約 (UserRepo)
 * - users テーブル向け SQLx 実装 (PgUserRepo)
 * - name が lookup key。一意性は store 側 (UNIQUE 制約) が保証する
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

/// Durable identity record.
///
/// `id` / `created_at` は store が割り当てる profile field。core はこれらを解釈しない。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Value handed to `UserRepo::create`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// User store capability.
///
/// Contract:
/// - `get` returns `Ok(None)` when no record has that name. `Err(_)` always means
///   the lookup itself failed and must not be read as "absent".
/// - `create` rejects a duplicate name with `RepoError::Conflict`. Two concurrent
///   first contacts for the same name therefore yield one success and one conflict.
#[async_trait]
pub trait UserRepo: Send + Sync + 'static {
    // Returns the store backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn get(&self, name: &str) -> RepoResult<Option<User>>;

    async fn create(&self, user: &NewUser) -> RepoResult<User>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, name: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, created_at
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        // No ON CONFLICT: a duplicate must surface as RepoError::Conflict.
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::from_sqlx(e, &user.name))?;

        Ok(row)
    }
}
