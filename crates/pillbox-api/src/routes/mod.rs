//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/auth` - 로그인, 로그아웃, 현재 주체
//! - `/api/users`, `/api/ems_accounts` - 계정 생성 (관리자)
//! - `/api/profiles` - 환자 프로필 CRUD
//! - `/api/search` - 프로필 검색
//! - `/api/audits` - 감사 로그 (관리자)
//! - `/api/export`, `/api/import` - 프로필 내보내기/가져오기 (관리자)

pub mod accounts;
pub mod audits;
pub mod auth;
pub mod health;
pub mod profiles;
pub mod transfer;

pub use accounts::{accounts_router, CreateEmsAccountRequest, CreateEmsAccountResponse, CreateUserRequest};
pub use audits::audits_router;
pub use auth::{auth_router, LoginRequest, LoginResponse, LogoutResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use profiles::{profiles_router, DeleteProfileResponse, SearchQuery, UpdateProfileResponse};
pub use transfer::{transfer_router, ImportResponse};

use axum::{extract::rejection::JsonRejection, Json, Router};
use std::sync::Arc;

use pillbox_core::{Permission, Principal};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API 엔드포인트
        .merge(auth_router())
        .merge(accounts_router())
        .merge(profiles_router())
        .merge(audits_router())
        .merge(transfer_router())
}

/// 권한 확인을 통과한 요청의 JSON 본문을 꺼냅니다.
///
/// 본문이 잘못되었으면 실패 감사 항목을 남기고 400을 반환합니다.
pub(crate) async fn accept_json<T>(
    state: &AppState,
    principal: &Principal,
    permission: Permission,
    subject_id: Option<i64>,
    body: Result<Json<T>, JsonRejection>,
) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let message = rejection.body_text();
            let detail = format!("failed: {message}");
            state
                .audit_log
                .record(Some(&principal.id), permission.action(), subject_id, Some(&detail))
                .await;
            Err(ApiError::BadRequest(message))
        }
    }
}
