//! 인증 endpoint.
//!
//! - `POST /api/auth/login` - 병원/EMS 로그인, 토큰 발급 및 쿠키 설정
//! - `POST /api/auth/logout` - 토큰 쿠키 삭제
//! - `GET /api/auth/me` - 현재 주체

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::SET_COOKIE,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use pillbox_core::Principal;

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 로그인 요청.
///
/// 병원: `{mode: "hospital", username, password}`
/// EMS: `{mode: "ems", unitId, unitCode}`
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// `hospital` 또는 `ems`
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "unitId")]
    pub unit_id: Option<String>,
    #[serde(default, rename = "unitCode")]
    pub unit_code: Option<String>,
}

/// 로그인 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: Principal,
}

/// 로그아웃 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub ok: bool,
}

fn token_cookie(name: &str, token: &str, max_age_secs: i64) -> String {
    format!("{name}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

/// 로그인.
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 400, description = "잘못된 로그인 모드", body = ApiErrorResponse),
        (status = 401, description = "자격증명 불일치", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!(mode = %request.mode, "POST /api/auth/login");

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    let principal = match request.mode.as_str() {
        "hospital" => {
            state
                .verifier
                .verify_hospital(&field(&request.username), &field(&request.password))
                .await?
        }
        "ems" => {
            state
                .verifier
                .verify_ems(&field(&request.unit_id), &field(&request.unit_code))
                .await?
        }
        _ => return Err(ApiError::BadRequest("Invalid login mode".to_string())),
    };

    let ttl = state.tokens.ttl_for(&principal);
    let token = state.tokens.issue(&principal, ttl)?;
    let cookie = token_cookie(&state.config.auth.cookie_name, &token, ttl.num_seconds());

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            user: principal,
        }),
    ))
}

/// 로그아웃. 인증 없이 호출할 수 있습니다.
///
/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "쿠키 삭제", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cookie = token_cookie(&state.config.auth.cookie_name, "", 0);
    ([(SET_COOKIE, cookie)], Json(LogoutResponse { ok: true }))
}

/// 현재 주체.
///
/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "현재 주체", body = Principal),
        (status = 401, description = "인증 필요", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(Authenticated(principal): Authenticated) -> Json<Principal> {
    Json(principal)
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use pillbox_core::BootstrapConfig;
    use tower::ServiceExt;

    use crate::services::ensure_bootstrap;
    use crate::state::create_test_state;

    async fn app() -> Router {
        let state = create_test_state();
        ensure_bootstrap(state.credentials.as_ref(), &BootstrapConfig::default())
            .await
            .unwrap();
        auth_router().with_state(Arc::new(state))
    }

    fn login_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_hospital_login_sets_cookie() {
        let response = app()
            .await
            .oneshot(login_request(serde_json::json!({
                "mode": "hospital", "username": "admin", "password": "adminpass"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("pillbox_token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=43200"));

        let body = json_body(response).await;
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["user"]["username"], "admin");
        assert_eq!(body["user"]["role"], "admin");
    }

    #[tokio::test]
    async fn test_ems_login_ttl() {
        let response = app()
            .await
            .oneshot(login_request(serde_json::json!({
                "mode": "ems", "unitId": "EMS-1", "unitCode": "ems123"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.contains("Max-Age=28800"));

        let body = json_body(response).await;
        assert_eq!(body["user"]["role"], "ems");
        assert_eq!(body["user"]["ems_unit"], "EMS-1");
    }

    #[tokio::test]
    async fn test_invalid_mode_and_credentials() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(login_request(serde_json::json!({"mode": "fax"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid login mode");

        let response = app
            .oneshot(login_request(serde_json::json!({
                "mode": "hospital", "username": "admin", "password": "nope"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("pillbox_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(json_body(response).await, serde_json::json!({"ok": true}));
    }
}
