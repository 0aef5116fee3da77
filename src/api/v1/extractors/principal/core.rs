use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::Principal;

/// Handler で Principal を (あれば) 受け取るための extractor
///
/// 見つからなくても reject しない。principal が無いことの扱い (Unauthenticated) は
/// identity service が決める。
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
