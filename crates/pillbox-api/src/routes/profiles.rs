//! 환자 프로필 endpoint.
//!
//! - `GET /api/profiles` - 목록 `{id, name}`
//! - `POST /api/profiles` - 생성
//! - `GET /api/profiles/{id}` - 조회
//! - `PUT /api/profiles/{id}` - 얕은 병합 수정
//! - `DELETE /api/profiles/{id}` - 삭제 (관리자)
//! - `GET /api/search?q=` - 검색

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use pillbox_core::{Permission, ProfileDocument, ProfileSummary};

use super::accept_json;
use crate::auth::Authenticated;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::services::parse_profile_id;
use crate::state::AppState;

/// 검색 쿼리.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// 검색어 (대소문자 무시 부분 문자열)
    #[serde(default)]
    pub q: String,
}

/// 수정 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileResponse {
    pub ok: bool,
    /// 병합된 문서 (`id` 제외)
    #[schema(value_type = Object)]
    pub profile: Value,
}

/// 삭제 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteProfileResponse {
    pub ok: bool,
}

/// 프로필 목록.
///
/// GET /api/profiles
#[utoipa::path(
    get,
    path = "/api/profiles",
    responses(
        (status = 200, description = "프로필 목록 (ID 오름차순)", body = Vec<ProfileSummary>),
        (status = 401, description = "인증 필요", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<Json<Vec<ProfileSummary>>> {
    state
        .authorize(&principal, Permission::ListProfiles, None)
        .await?;
    let profiles = state.profiles.list(&principal).await?;
    Ok(Json(profiles))
}

/// 프로필 생성.
///
/// POST /api/profiles
#[utoipa::path(
    post,
    path = "/api/profiles",
    request_body(content = Object, description = "프로필 문서 (누락된 키는 기본값)"),
    responses(
        (status = 200, description = "생성된 전체 프로필", body = Object),
        (status = 400, description = "JSON 객체가 아님", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Result<Json<ProfileDocument>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    state
        .authorize(&principal, Permission::CreateProfile, None)
        .await?;
    let input = accept_json(&state, &principal, Permission::CreateProfile, None, body).await?;

    let created = state.profiles.create(&principal, &input).await?;
    Ok(Json(created))
}

/// 프로필 조회.
///
/// GET /api/profiles/{id}
#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    params(("id" = String, Path, description = "프로필 ID")),
    responses(
        (status = 200, description = "전체 프로필", body = Object),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 404, description = "프로필 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .authorize(&principal, Permission::ReadProfile, parse_profile_id(&id))
        .await?;
    let profile = state.profiles.get(&principal, &id).await?;
    Ok(Json(profile))
}

/// 프로필 수정 (최상위 얕은 병합).
///
/// PUT /api/profiles/{id}
#[utoipa::path(
    put,
    path = "/api/profiles/{id}",
    params(("id" = String, Path, description = "프로필 ID")),
    request_body(content = Object, description = "덮어쓸 최상위 키"),
    responses(
        (status = 200, description = "병합 결과", body = UpdateProfileResponse),
        (status = 400, description = "JSON 객체가 아님", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "프로필 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<ProfileDocument>, JsonRejection>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let subject_id = parse_profile_id(&id);
    state
        .authorize(&principal, Permission::UpdateProfile, subject_id)
        .await?;
    let partial =
        accept_json(&state, &principal, Permission::UpdateProfile, subject_id, body).await?;

    let merged = state.profiles.update(&principal, &id, &partial).await?;
    Ok(Json(UpdateProfileResponse {
        ok: true,
        profile: merged,
    }))
}

/// 프로필 삭제 (관리자 전용).
///
/// 관리자가 아니면 프로필 존재 여부와 관계없이 403입니다.
/// DELETE /api/profiles/{id}
#[utoipa::path(
    delete,
    path = "/api/profiles/{id}",
    params(("id" = String, Path, description = "프로필 ID")),
    responses(
        (status = 200, description = "삭제됨", body = DeleteProfileResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse),
        (status = 404, description = "프로필 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteProfileResponse>> {
    state
        .authorize(&principal, Permission::DeleteProfile, parse_profile_id(&id))
        .await?;
    state.profiles.delete(&principal, &id).await?;
    Ok(Json(DeleteProfileResponse { ok: true }))
}

/// 프로필 검색.
///
/// GET /api/search?q=
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "일치하는 프로필 (빈 검색어는 빈 목록)", body = Vec<ProfileSummary>),
        (status = 401, description = "인증 필요", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn search_profiles(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<ProfileSummary>>> {
    debug!(q = %query.q, "GET /api/search");
    state
        .authorize(&principal, Permission::SearchProfiles, None)
        .await?;
    let matches = state.profiles.search(&principal, &query.q).await?;
    Ok(Json(matches))
}

/// 프로필 라우터 생성.
pub fn profiles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profiles", get(list_profiles).post(create_profile))
        .route(
            "/api/profiles/{id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/api/search", get(search_profiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use pillbox_core::{Principal, Role};
    use tower::ServiceExt;

    use crate::state::create_test_state;

    struct Harness {
        state: Arc<AppState>,
        app: Router,
    }

    fn harness() -> Harness {
        let state = Arc::new(create_test_state());
        let app = profiles_router().with_state(state.clone());
        Harness { state, app }
    }

    impl Harness {
        fn token(&self, role: Role) -> String {
            let principal = Principal {
                id: format!("{role}-id"),
                display_name: role.to_string(),
                role,
                ems_unit: None,
            };
            self.state
                .tokens
                .issue(&principal, chrono::Duration::hours(1))
                .unwrap()
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            role: Role,
            body: Option<serde_json::Value>,
        ) -> Response {
            let builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token(role)));
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.app.clone().oneshot(request).await.unwrap()
        }

        async fn audit_count(&self) -> usize {
            self.state.audit_log.read_recent(1000).await.unwrap().len()
        }
    }

    async fn json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let h = harness();

        let response = h
            .send("POST", "/api/profiles", Role::Nurse, Some(serde_json::json!({"name": "Jane"})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["status"], "Admitted");

        let response = h.send("GET", "/api/profiles/1", Role::Viewer, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["name"], "Jane");
    }

    #[tokio::test]
    async fn test_viewer_cannot_create() {
        let h = harness();

        let response = h
            .send("POST", "/api/profiles", Role::Viewer, Some(serde_json::json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Forbidden");
        assert_eq!(h.audit_count().await, 1);
    }

    #[tokio::test]
    async fn test_non_admin_delete_is_forbidden_regardless_of_existence() {
        let h = harness();
        h.send("POST", "/api/profiles", Role::Doctor, Some(serde_json::json!({})))
            .await;

        for uri in ["/api/profiles/1", "/api/profiles/999"] {
            let response = h.send("DELETE", uri, Role::Doctor, None).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        let response = h.send("DELETE", "/api/profiles/999", Role::Admin, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = h.send("DELETE", "/api/profiles/1", Role::Admin, None).await;
        assert_eq!(json_body(response).await, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_update_merge_response() {
        let h = harness();
        h.send(
            "POST",
            "/api/profiles",
            Role::Ems,
            Some(serde_json::json!({"name": "Jane", "vitals": {"hr": "90"}})),
        )
        .await;

        let response = h
            .send(
                "PUT",
                "/api/profiles/1",
                Role::Ems,
                Some(serde_json::json!({"status": "Discharged"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["profile"]["status"], "Discharged");
        assert_eq!(body["profile"]["vitals"]["hr"], "90");
        assert!(body["profile"].get("id").is_none());
    }

    #[tokio::test]
    async fn test_update_with_non_object_body_is_bad_request() {
        let h = harness();
        h.send("POST", "/api/profiles", Role::Admin, Some(serde_json::json!({})))
            .await;
        let before = h.audit_count().await;

        let response = h
            .send("PUT", "/api/profiles/1", Role::Admin, Some(serde_json::json!([1, 2])))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.audit_count().await, before + 1);
    }

    #[tokio::test]
    async fn test_every_guarded_call_audits_once() {
        let h = harness();

        let calls: [(&str, &str, Option<serde_json::Value>); 5] = [
            ("POST", "/api/profiles", Some(serde_json::json!({"name": "A"}))),
            ("GET", "/api/profiles", None),
            ("GET", "/api/profiles/1", None),
            ("GET", "/api/profiles/42", None),
            ("GET", "/api/search?q=a", None),
        ];

        for (expected, (method, uri, body)) in calls.into_iter().enumerate() {
            h.send(method, uri, Role::Doctor, body).await;
            assert_eq!(h.audit_count().await, expected + 1, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let h = harness();
        h.send(
            "POST",
            "/api/profiles",
            Role::Doctor,
            Some(serde_json::json!({"name": "Jane", "mrn": "EMS-1-ABC"})),
        )
        .await;

        let response = h.send("GET", "/api/search?q=ems-1", Role::Viewer, None).await;
        assert_eq!(
            json_body(response).await,
            serde_json::json!([{"id": 1, "name": "Jane"}])
        );

        let response = h.send("GET", "/api/search", Role::Viewer, None).await;
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }
}
