/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - identity: IdentityService, auth: AuthService (auth 有効時のみ), base_path など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::AuthService, identity::IdentityService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub identity: IdentityService,
    pub auth: Option<Arc<AuthService>>,
    pub auth_enabled: bool,
    pub base_path: Arc<str>,
}

impl AppState {
    pub fn new(
        identity: IdentityService,
        auth: Option<Arc<AuthService>>,
        base_path: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            identity,
            auth_enabled: auth.is_some(),
            auth,
            base_path: base_path.into(),
        }
    }
}
