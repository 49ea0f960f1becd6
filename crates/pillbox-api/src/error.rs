//! API 에러 응답.
//!
//! 모든 에러 본문은 `{"error": "<메시지>"}` 형식입니다.
//! 서버 내부 에러는 세부 내용을 tracing으로만 남기고 `"Server error"`로 응답합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use pillbox_core::{ImportError, ProfileError, StoreError};

use crate::auth::{AuthError, GuardError, PasswordError, TokenError};
use crate::services::AccountError;

/// 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 사람이 읽을 수 있는 에러 메시지
    pub error: String,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// HTTP 계층 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400
    #[error("{0}")]
    BadRequest(String),
    /// 401 (토큰 없음/무효/만료, 로그인 실패)
    #[error("{0}")]
    Unauthorized(String),
    /// 403
    #[error("Forbidden")]
    Forbidden,
    /// 404
    #[error("Not found")]
    NotFound,
    /// 500. 메시지는 로그에만 남습니다.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiErrorResponse::new(message))).into_response()
    }
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(_) => ApiError::internal(err),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            GuardError::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidEmsCredentials => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Store(e) => e.into(),
            AuthError::Password(e) => e.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => ApiError::BadRequest(message),
            other => ApiError::internal(other),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(_) => ApiError::NotFound,
            ProfileError::Import(e) => e.into(),
            ProfileError::Store(e) => e.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Store(e) => e.into(),
            AccountError::Password(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}
