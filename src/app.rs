/*
 * Responsibility
 * - Config読み込み → 依存生成 (user store / auth / identity) → Router 組み立て
 * - Middleware の適用 (access/CORS/security headers/http)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{MemoryUserRepo, PgUserRepo, UserRepo},
    services::{auth::build_auth_service, identity::IdentityService},
    state::AppState,
};

const API_PREFIX: &str = "/chronograf/v1";

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,identity_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,identity_api=debug,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing (stderr can be hidden depending on the launcher).
        tracing::error!(?info, "panic");

        // Development: crash the whole process. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting identity API in {:?} mode on {} (auth enabled: {})",
        config.app_env,
        config.addr,
        config.auth_enabled
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_users(config: &Config) -> Result<Arc<dyn UserRepo>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, users are kept in memory only");
        return Ok(Arc::new(MemoryUserRepo::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connecting to postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    Ok(Arc::new(PgUserRepo::new(pool)))
}

async fn build_state(config: &Config) -> Result<AppState> {
    let users = build_users(config).await?;
    let auth = build_auth_service(config)?;

    Ok(AppState::new(
        IdentityService::new(users),
        auth,
        config.identity_base_path.as_str(),
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let v1 = api::v1::routes(&state);

    let router = Router::new().nest(API_PREFIX, v1).with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config.request_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt as _;

    use crate::repos::{NewUser, testing::RecordingRepo};
    use crate::services::auth::access_jwt::tests::{SECRET, sign, valid_token};

    fn config(auth_enabled: bool) -> Config {
        let mut vars = HashMap::new();
        if auth_enabled {
            vars.insert("AUTH_ENABLED", "true");
            vars.insert("TOKEN_SECRET", SECRET);
        }
        Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
    }

    fn app(repo: &RecordingRepo, auth_enabled: bool) -> Router {
        let config = config(auth_enabled);
        let auth = build_auth_service(&config).unwrap();
        let state = AppState::new(
            IdentityService::new(Arc::new(repo.clone())),
            auth,
            config.identity_base_path.as_str(),
        );
        build_router(state, &config)
    }

    async fn get_me(app: Router, authorization: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri("/chronograf/v1/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn health_is_ok() {
        let repo = RecordingRepo::new();
        let res = app(&repo, false)
            .oneshot(
                Request::builder()
                    .uri("/chronograf/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn health_ignores_authorization_when_auth_enabled() {
        let repo = RecordingRepo::new();

        for authorization in ["Token abc", "Bearer not-a-jwt"] {
            let res = app(&repo, true)
                .oneshot(
                    Request::builder()
                        .uri("/chronograf/v1/health")
                        .header(header::AUTHORIZATION, authorization)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn auth_disabled_returns_anonymous_resource() {
        let repo = RecordingRepo::new();

        for authorization in [None, Some("Bearer garbage"), Some("Basic dXNlcjpwYXNz")] {
            let res = get_me(app(&repo, false), authorization).await;
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(
                body_json(res).await,
                json!({ "links": { "self": "/chronograf/v1/users/me" } })
            );
        }

        assert_eq!(repo.gets(), 0);
        assert_eq!(repo.creates(), 0);
    }

    #[tokio::test]
    async fn first_contact_provisions_user() {
        let repo = RecordingRepo::new();
        let token = valid_token("alice@example.com");

        let res = get_me(app(&repo, true), Some(&bearer(&token))).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_json(res).await;
        assert_eq!(body["name"], "alice@example.com");
        assert_eq!(
            body["links"]["self"],
            "/chronograf/v1/users/alice%40example.com"
        );
        assert_eq!(repo.created_names(), vec!["alice@example.com".to_string()]);
    }

    #[tokio::test]
    async fn existing_user_is_returned_without_create() {
        let repo = RecordingRepo::new();
        let bob = repo.inner.create(&NewUser::new("bob")).await.unwrap();
        let token = valid_token("bob");

        let res = get_me(app(&repo, true), Some(&bearer(&token))).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_json(res).await;
        assert_eq!(body["name"], "bob");
        assert_eq!(body["id"], json!(bob.id));
        assert_eq!(body["links"]["self"], "/chronograf/v1/users/bob");
        assert_eq!(repo.creates(), 0);
    }

    #[tokio::test]
    async fn missing_token_is_invalid_data_without_store_access() {
        let repo = RecordingRepo::new();

        let res = get_me(app(&repo, true), None).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(res).await["error"]["code"], "INVALID_DATA");
        assert_eq!(repo.gets(), 0);
        assert_eq!(repo.creates(), 0);
    }

    #[tokio::test]
    async fn empty_subject_is_invalid_data_without_store_access() {
        let repo = RecordingRepo::new();
        let token = valid_token("");

        let res = get_me(app(&repo, true), Some(&bearer(&token))).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(repo.gets(), 0);
    }

    #[tokio::test]
    async fn bad_token_is_unauthorized() {
        let repo = RecordingRepo::new();
        let forged = sign("not-the-secret", "mallory", u64::MAX / 2);

        for authorization in [bearer(&forged), "Token abc".to_string()] {
            let res = get_me(app(&repo, true), Some(&authorization)).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(repo.gets(), 0);
    }

    #[tokio::test]
    async fn create_failure_is_an_error_without_user_fields() {
        let repo = RecordingRepo::failing_create();
        let token = valid_token("carol");

        let res = get_me(app(&repo, true), Some(&bearer(&token))).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(res).await;
        assert!(body.get("name").is_none());
        assert!(body.get("links").is_none());
        assert_eq!(body["error"]["code"], "UNKNOWN");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("error storing user carol:")
        );
    }

    #[tokio::test]
    async fn lookup_failure_is_an_error_not_a_create() {
        let repo = RecordingRepo::failing_get();
        let token = valid_token("dave");

        let res = get_me(app(&repo, true), Some(&bearer(&token))).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(repo.creates(), 0);
    }

    #[tokio::test]
    async fn development_cors_allows_any_origin() {
        let repo = RecordingRepo::new();
        let res = app(&repo, false)
            .oneshot(
                Request::builder()
                    .uri("/chronograf/v1/me")
                    .header(header::ORIGIN, "https://ui.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn responses_carry_request_id_and_no_store() {
        let repo = RecordingRepo::new();
        let res = get_me(app(&repo, false), None).await;

        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(res.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
