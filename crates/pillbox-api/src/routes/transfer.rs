//! 프로필 내보내기/가져오기 endpoint (관리자 전용).
//!
//! - `GET /api/export` - 전체 프로필 JSON 다운로드
//! - `POST /api/import` - multipart `file` 필드의 JSON 배열 가져오기

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header::CONTENT_DISPOSITION,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use pillbox_core::{ExportedProfile, ImportError, Permission, Principal};

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 내보내기 파일 이름.
pub const EXPORT_FILENAME: &str = "pillbox_profiles.json";

/// 가져오기 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub ok: bool,
    pub inserted: usize,
}

/// 전체 프로필 내보내기.
///
/// GET /api/export
#[utoipa::path(
    get,
    path = "/api/export",
    responses(
        (status = 200, description = "전체 프로필 (첨부 파일)", body = Vec<ExportedProfile>),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transfer"
)]
pub async fn export_profiles(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<impl IntoResponse> {
    state
        .authorize(&principal, Permission::ExportProfiles, None)
        .await?;
    let profiles = state.profiles.export(&principal).await?;

    Ok((
        [(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILENAME}\""),
        )],
        Json(profiles),
    ))
}

/// 프로필 가져오기.
///
/// 페이로드 전체가 검증된 뒤에만 삽입하며, 하나라도 잘못되면 아무것도 저장하지 않습니다.
/// POST /api/import
#[utoipa::path(
    post,
    path = "/api/import",
    request_body(content_type = "multipart/form-data", description = "`file` 필드에 JSON 배열"),
    responses(
        (status = 200, description = "가져오기 완료", body = ImportResponse),
        (status = 400, description = "파싱 실패 (파서 메시지 포함)", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transfer"
)]
pub async fn import_profiles(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ImportResponse>> {
    state
        .authorize(&principal, Permission::ImportProfiles, None)
        .await?;

    let payload = match multipart {
        Ok(multipart) => read_file_field(multipart).await,
        Err(rejection) => Err(ImportError::Parse(rejection.body_text())),
    };
    let payload = match payload {
        Ok(payload) => payload,
        Err(e) => return Err(reject_upload(&state, &principal, e).await),
    };

    let inserted = state.profiles.import(&principal, &payload).await?;
    Ok(Json(ImportResponse { ok: true, inserted }))
}

/// multipart에서 `file` 필드를 읽습니다.
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, ImportError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImportError::Parse(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ImportError::Parse(e.body_text()))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ImportError::MissingFile)
}

async fn reject_upload(state: &AppState, principal: &Principal, err: ImportError) -> ApiError {
    let detail = format!("failed: {err}");
    state
        .audit_log
        .record(
            Some(&principal.id),
            Permission::ImportProfiles.action(),
            None,
            Some(&detail),
        )
        .await;
    err.into()
}

/// 내보내기/가져오기 라우터 생성.
pub fn transfer_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/export", get(export_profiles))
        .route("/api/import", post(import_profiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use pillbox_core::Role;
    use tower::ServiceExt;

    use crate::state::create_test_state;

    const BOUNDARY: &str = "pillbox-boundary";

    fn admin_token(state: &AppState) -> String {
        let principal = Principal {
            id: "1".to_string(),
            display_name: "admin".to_string(),
            role: Role::Admin,
            ems_unit: None,
        };
        state
            .tokens
            .issue(&principal, chrono::Duration::hours(1))
            .unwrap()
    }

    fn multipart_request(token: &str, field: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"profiles.json\"\r\n\
             Content-Type: application/json\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/import")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_import_then_export() {
        let state = Arc::new(create_test_state());
        let app = transfer_router().with_state(state.clone());
        let token = admin_token(&state);

        let response = app
            .clone()
            .oneshot(multipart_request(
                &token,
                "file",
                r#"[{"name": "Jane", "profile": {"mrn": "7"}}, {"name": "Bob"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"ok": true, "inserted": 2})
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/export")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"pillbox_profiles.json\""
        );
        let exported = json_body(response).await;
        assert_eq!(exported[0]["name"], "Jane");
        assert_eq!(exported[0]["profile"]["mrn"], "7");
        assert_eq!(exported[1]["id"], 2);
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_payload() {
        let state = Arc::new(create_test_state());
        let app = transfer_router().with_state(state.clone());
        let token = admin_token(&state);

        for content in ["{\"not\": \"array\"}", "[1, {\"name\": \"x\"}]", "[{"] {
            let response = app
                .clone()
                .oneshot(multipart_request(&token, "file", content))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{content}");
            assert!(json_body(response).await["error"].is_string());
        }

        let audits = state.audit_log.read_recent(10).await.unwrap();
        assert_eq!(audits.len(), 3);
        assert!(audits.iter().all(|a| a.action == "import_profiles"));
    }

    #[tokio::test]
    async fn test_import_requires_file_field() {
        let state = Arc::new(create_test_state());
        let app = transfer_router().with_state(state.clone());
        let token = admin_token(&state);

        let response = app
            .oneshot(multipart_request(&token, "upload", "[]"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "missing multipart field \"file\""
        );
    }
}
