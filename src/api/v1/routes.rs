/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /me
 * - 認証 middleware は /me にだけ掛ける (auth 有効時のみ)。/health は認証入力に依存しない
 */
use axum::{Router, routing::get};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{health::health, me::me};

pub fn routes(state: &AppState) -> Router<AppState> {
    let identity = Router::new().route("/me", get(me));
    let identity = if state.auth_enabled {
        access::apply(identity, state.clone())
    } else {
        identity
    };

    Router::new().route("/health", get(health)).merge(identity)
}
