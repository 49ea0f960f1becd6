//! 감사 로그 endpoint (관리자 전용).

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use pillbox_core::{AuditEntry, Permission};

use crate::auth::Authenticated;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 감사 로그 조회 (최신순, 최대 `audit.read_limit`건).
///
/// 조회 자체도 `view_audits` 항목으로 기록되며, 기록은 조회 후에 이루어집니다.
/// GET /api/audits
#[utoipa::path(
    get,
    path = "/api/audits",
    responses(
        (status = 200, description = "감사 항목 (최신순)", body = Vec<AuditEntry>),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "audits"
)]
pub async fn list_audits(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<Json<Vec<AuditEntry>>> {
    let permission = Permission::ViewAuditLog;
    state.authorize(&principal, permission, None).await?;

    let result = state
        .audit_log
        .read_recent(state.config.audit.read_limit)
        .await;

    let detail = match &result {
        Ok(entries) => format!("read {}", entries.len()),
        Err(e) => format!("failed: {e}"),
    };
    state
        .audit_log
        .record(Some(&principal.id), permission.action(), None, Some(&detail))
        .await;

    Ok(Json(result?))
}

/// 감사 로그 라우터 생성.
pub fn audits_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/audits", get(list_audits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use pillbox_core::{Principal, Role};
    use tower::ServiceExt;

    use crate::state::create_test_state;

    fn request(state: &AppState, role: Role) -> Request<Body> {
        let principal = Principal {
            id: "1".to_string(),
            display_name: "someone".to_string(),
            role,
            ems_unit: None,
        };
        let token = state
            .tokens
            .issue(&principal, chrono::Duration::hours(1))
            .unwrap();
        Request::builder()
            .uri("/api/audits")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_audits_newest_first() {
        let state = Arc::new(create_test_state());
        state.audit_log.record(Some("1"), "login", None, Some("first")).await;
        state.audit_log.record(Some("1"), "login", None, Some("second")).await;
        let app = audits_router().with_state(state.clone());

        let response = app.oneshot(request(&state, Role::Admin)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entries: Vec<AuditEntry> = serde_json::from_slice(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].detail.as_deref(), Some("second"));

        // 조회 기록은 응답 이후에 보입니다
        let latest = state.audit_log.read_recent(1).await.unwrap();
        assert_eq!(latest[0].action, "view_audits");
    }

    #[tokio::test]
    async fn test_audits_admin_only() {
        let state = Arc::new(create_test_state());
        let app = audits_router().with_state(state.clone());

        for role in [Role::Doctor, Role::Nurse, Role::Ems, Role::Viewer] {
            let response = app.clone().oneshot(request(&state, role)).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role}");
        }
    }
}
