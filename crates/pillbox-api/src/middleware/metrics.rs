//! HTTP 요청 metrics middleware.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::debug;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 스크레이프 경로는 집계하지 않음.
const SKIPPED_PATHS: [&str; 1] = ["/metrics"];

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// - `http_requests_total`: 총 요청 수 (method, path 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
///
/// path 라벨은 매칭된 라우트 템플릿(`/api/profiles/{id}`)을 우선 사용하고,
/// 매칭되지 않은 요청(정적 파일 등)은 ID 세그먼트를 정규화한 경로를 씁니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let raw_path = request.uri().path();
    if SKIPPED_PATHS.contains(&raw_path) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().to_string();
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(raw_path),
    };

    record_http_request(&method, &path);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_response(&method, &path, status);
    record_http_duration(&method, &path, duration);
    debug!(%method, %path, status, duration_ms = duration * 1000.0, "Request completed");

    response
}
