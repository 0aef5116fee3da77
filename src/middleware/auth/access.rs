//! access token (HS256 JWT) 検証 → Principal を extensions に入れる
//!
//! - `Authorization` ヘッダが無い: principal 無しで handler へ (/me が 422 を返す)
//! - ヘッダはあるが token が不正: ここで 401
//! - auth 無効時はこの middleware 自体を mount しない

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Router に認証 middleware を適用する (route_layer: 既に登録済みの route にだけ掛かる)。
///
/// 例：
/// ```ignore
/// let me = Router::new().route("/me", get(me));
/// let me = middleware::auth::access::apply(me, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth) = state.auth.as_ref() else {
        return Ok(next.run(req).await);
    };

    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let principal = match auth.verify_principal(token.trim()) {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(AppError::Unauthorized);
        }
    };

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
