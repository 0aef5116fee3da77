/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AuthService, access_jwt::AccessJwtError};

/// Returns `None` when authentication is disabled.
pub fn build_auth_service(config: &Config) -> Result<Option<Arc<AuthService>>, AccessJwtError> {
    if !config.auth_enabled {
        return Ok(None);
    }

    let secret = config
        .token_secret
        .as_deref()
        .ok_or(AccessJwtError::MissingSecret)?;

    let auth = AuthService::new(secret, config.token_leeway_seconds)?;

    Ok(Some(Arc::new(auth)))
}
