/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - IdentityError / AccessJwtError を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::identity::IdentityError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidData(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{message}")]
    Unknown { message: String },
}

impl AppError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::InvalidData(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_DATA"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Unknown { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Unauthenticated => AppError::invalid_data(e.to_string()),
            // Lookup / Provision: message carries the subject and the store cause
            IdentityError::Lookup { .. } | IdentityError::Provision { .. } => {
                AppError::unknown(e.to_string())
            }
        }
    }
}
