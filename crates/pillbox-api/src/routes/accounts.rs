//! 계정 생성 endpoint (관리자 전용).
//!
//! - `POST /api/users` - 병원 사용자 생성
//! - `POST /api/ems_accounts` - EMS 유닛 계정 생성

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use pillbox_core::{Permission, UserSummary};

use super::accept_json;
use crate::auth::Authenticated;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 병원 사용자 생성 요청.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// 생략 시 `viewer`
    #[serde(default)]
    pub role: Option<String>,
}

/// EMS 계정 생성 요청.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateEmsAccountRequest {
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub unit_code: Option<String>,
}

/// EMS 계정 생성 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEmsAccountResponse {
    pub ok: bool,
    pub id: i64,
}

/// 병원 사용자 생성.
///
/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "사용자 생성", body = UserSummary),
        (status = 400, description = "필수 항목 누락, 알 수 없는 역할, 중복 사용자명", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserSummary>> {
    state
        .authorize(&principal, Permission::CreateUser, None)
        .await?;
    let request = accept_json(&state, &principal, Permission::CreateUser, None, body).await?;

    let user = state
        .accounts
        .create_user(
            &principal,
            request.username.as_deref(),
            request.password.as_deref(),
            request.role.as_deref(),
        )
        .await?;

    Ok(Json(user))
}

/// EMS 유닛 계정 생성.
///
/// POST /api/ems_accounts
#[utoipa::path(
    post,
    path = "/api/ems_accounts",
    request_body = CreateEmsAccountRequest,
    responses(
        (status = 200, description = "EMS 계정 생성", body = CreateEmsAccountResponse),
        (status = 400, description = "필수 항목 누락 또는 중복 유닛 ID", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn create_ems_account(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Result<Json<CreateEmsAccountRequest>, JsonRejection>,
) -> ApiResult<Json<CreateEmsAccountResponse>> {
    state
        .authorize(&principal, Permission::CreateEmsAccount, None)
        .await?;
    let request =
        accept_json(&state, &principal, Permission::CreateEmsAccount, None, body).await?;

    let id = state
        .accounts
        .create_ems_account(
            &principal,
            request.unit_id.as_deref(),
            request.unit_code.as_deref(),
        )
        .await?;

    Ok(Json(CreateEmsAccountResponse { ok: true, id }))
}

/// 계정 라우터 생성.
pub fn accounts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/ems_accounts", post(create_ems_account))
}
