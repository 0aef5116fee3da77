/*
 * Responsibility
 * - 環境変数や設定の読み込み (AUTH_ENABLED, TOKEN_SECRET, DATABASE_URL, CORS 許可など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_PATH: &str = "/chronograf/v1/users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // None -> in-memory user store
    pub database_url: Option<String>,

    pub auth_enabled: bool,
    pub token_secret: Option<String>,
    pub token_leeway_seconds: u64,

    pub identity_base_path: String,

    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the token secret or database credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("auth_enabled", &self.auth_enabled)
            .field("identity_base_path", &self.identity_base_path)
            .finish()
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}

// Absent -> default, present but unparsable -> Invalid(key).
fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key -> value source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or("PORT", get("PORT"), 8888)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let database_url = get("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let auth_enabled = match get("AUTH_ENABLED") {
            Some(v) => parse_bool("AUTH_ENABLED", &v)?,
            None => false,
        };

        let token_secret = get("TOKEN_SECRET").filter(|s| !s.is_empty());
        if auth_enabled && token_secret.is_none() {
            return Err(ConfigError::Missing("TOKEN_SECRET"));
        }

        let token_leeway_seconds: u64 =
            parse_or("TOKEN_LEEWAY_SECONDS", get("TOKEN_LEEWAY_SECONDS"), 60)?;

        let identity_base_path =
            get("IDENTITY_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());
        if !identity_base_path.starts_with('/') {
            return Err(ConfigError::Invalid("IDENTITY_BASE_PATH"));
        }

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(parse_or(
            "REQUEST_TIMEOUT_SECONDS",
            get("REQUEST_TIMEOUT_SECONDS"),
            30,
        )?);

        Ok(Self {
            addr,
            app_env,
            database_url,
            auth_enabled,
            token_secret,
            token_leeway_seconds,
            identity_base_path,
            cors_allowed_origins,
            request_timeout,
        })
    }
}
