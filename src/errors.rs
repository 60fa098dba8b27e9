use crate::{
    api::{codes, ApiResponse},
    vault::{ErrorKind, VaultError},
};
use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("rate limited")]
    RateLimited,
    #[error("request too large")]
    RequestTooLarge,
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn from_rejection(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::RequestTooLarge
        } else {
            AppError::BadRequest(format!("invalid JSON format: {}", rejection.body_text()))
        }
    }

    /// Envelope code understood by the browser extension.
    pub fn code(&self) -> i32 {
        match self {
            AppError::Unauthorized(_) => codes::AUTH_FAILED,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::RateLimited => codes::RATE_LIMITED,
            AppError::RequestTooLarge => codes::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::Vault(e) => match e.kind {
                ErrorKind::Validation => codes::BAD_REQUEST,
                ErrorKind::Security => codes::SECURITY_VIOLATION,
                ErrorKind::DirectoryCreate => codes::DIR_CREATE_FAILED,
                ErrorKind::MarkdownWrite => codes::MARKDOWN_WRITE_FAILED,
                ErrorKind::AssetWrite => codes::ASSET_WRITE_FAILED,
                ErrorKind::Permission => codes::PERMISSION_DENIED,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::BadRequest(_) => "BadRequest",
            AppError::RateLimited => "RateLimited",
            AppError::RequestTooLarge => "RequestTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::Vault(e) => e.kind.as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Vault(e) => match e.kind {
                ErrorKind::Validation | ErrorKind::Security => StatusCode::BAD_REQUEST,
                ErrorKind::Permission => StatusCode::FORBIDDEN,
                ErrorKind::DirectoryCreate | ErrorKind::MarkdownWrite | ErrorKind::AssetWrite => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn into_response(err: AppError) -> (StatusCode, Json<ApiResponse<()>>) {
    (err.status(), Json(ApiResponse::error(err.code(), err.to_string())))
}
