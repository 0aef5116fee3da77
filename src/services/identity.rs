//! Who-am-I resolution: principal -> subject -> User (find-or-create).
//!
//! The lookup-then-create sequence is not transactional here. The store owns
//! name uniqueness; when two first contacts race, the losing `create` fails
//! with a conflict and that request errors out. There is no retry and no
//! re-lookup after a failed create.

use std::sync::Arc;

use thiserror::Error;

use crate::api::v1::extractors::Principal;
use crate::repos::{NewUser, RepoError, User, UserRepo};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("token not found")]
    Unauthenticated,

    #[error("error looking up user {subject}: {source}")]
    Lookup {
        subject: String,
        #[source]
        source: RepoError,
    },

    #[error("error storing user {subject}: {source}")]
    Provision {
        subject: String,
        #[source]
        source: RepoError,
    },
}

/// Returns the verified subject carried by the request.
///
/// A missing principal and an empty subject are the same thing: no identity.
pub fn subject_of(principal: Option<&Principal>) -> Result<&str, IdentityError> {
    match principal {
        Some(p) if !p.subject.is_empty() => Ok(p.subject.as_str()),
        _ => Err(IdentityError::Unauthenticated),
    }
}

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepo>,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("backend", &self.users.backend_name())
            .finish()
    }
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    /// Find the user named `subject`, creating it on first contact.
    pub async fn resolve_or_create(&self, subject: &str) -> Result<User, IdentityError> {
        let backend = self.users.backend_name();

        let existing = self.users.get(subject).await.map_err(|source| {
            tracing::error!(subject, backend, error = %source, "user lookup failed");
            IdentityError::Lookup {
                subject: subject.to_string(),
                source,
            }
        })?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let new_user = NewUser::new(subject);
        let created = self.users.create(&new_user).await.map_err(|source| {
            tracing::error!(subject, backend, error = %source, "user provisioning failed");
            IdentityError::Provision {
                subject: subject.to_string(),
                source,
            }
        })?;

        tracing::info!(subject, backend, user_id = %created.id, "provisioned new user");
        Ok(created)
    }
}
