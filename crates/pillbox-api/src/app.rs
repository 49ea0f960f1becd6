//! 전체 라우터 조립.
//!
//! API 라우트, Swagger UI, `/metrics`, 정적 UI 파일에 공통 미들웨어를 씌웁니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::metrics_layer;
use crate::openapi::swagger_ui_router;
use crate::routes::create_api_router;
use crate::state::AppState;

/// CORS 레이어.
///
/// `CORS_ORIGINS`(쉼표 구분)가 있으면 해당 origin만 허용하고 쿠키 전송을 허용합니다.
/// 없으면 개발 모드로 모든 origin을 허용합니다.
pub fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        warn!("CORS_ORIGINS not set or empty, allowing any origin (development mode)");
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
///
/// `metrics_handle`이 없으면 `/metrics`를 마운트하지 않습니다.
pub fn build_app(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let server = state.config.server.clone();

    let mut app = Router::new()
        .merge(create_api_router().with_state(state))
        .merge(swagger_ui_router());

    if let Some(handle) = metrics_handle {
        app = app.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(handle),
        );
    }

    if let Some(dir) = server.static_dir.as_deref().filter(|d| !d.is_empty()) {
        info!(dir, "Serving static UI files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(metrics_layer))
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(cors_layer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::state::create_test_state;

    #[tokio::test]
    async fn test_build_app_routes() {
        let app = build_app(Arc::new(create_test_state()), None);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // 레코더가 없으면 /metrics 없음
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut state = create_test_state();
        let mut config = (*state.config).clone();
        config.server.body_limit_bytes = 16;
        state.config = Arc::new(config);
        let app = build_app(Arc::new(state), None);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({"mode": "hospital", "username": "a-long-username"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
