/*
 * Responsibility
 * - GET /me : 呼び出し元の identity を find-or-create して返す
 * - auth 無効時は store に触れず、user 不在の resource を返す
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{dto::identity::IdentityResource, extractors::CurrentPrincipal},
    error::AppError,
    services::identity,
    state::AppState,
};

pub async fn me(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<IdentityResource>, AppError> {
    if !state.auth_enabled {
        return Ok(Json(IdentityResource::present(&state.base_path, None)));
    }

    let subject = identity::subject_of(principal.as_ref()).inspect_err(|_| {
        tracing::warn!("no authenticated principal on request");
    })?;

    let user = state.identity.resolve_or_create(subject).await?;

    Ok(Json(IdentityResource::present(&state.base_path, Some(user))))
}
