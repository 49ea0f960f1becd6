//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 인증/감사 관련 도메인 메트릭을 `/metrics`로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 레코더를 설치하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러입니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭
// ============================================================================

pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 도메인 메트릭
// ============================================================================

/// 로그인 시도 (`mode`: hospital/ems, `outcome`: success/failure/error).
pub fn record_login(mode: &'static str, outcome: &'static str) {
    counter!("pillbox_logins_total", "mode" => mode, "outcome" => outcome).increment(1);
}

/// 감사 로그 쓰기 실패.
pub fn record_audit_write_failure(action: &str) {
    counter!("pillbox_audit_write_failures_total", "action" => action.to_string()).increment(1);
}

/// 권한 부족으로 거부된 요청.
pub fn record_access_denied(permission: &'static str) {
    counter!("pillbox_access_denied_total", "permission" => permission).increment(1);
}

// ============================================================================
// 경로 정규화
// ============================================================================

/// 경로의 숫자/UUID 세그먼트를 `:id`로 바꿉니다.
///
/// 예: `/api/profiles/42` → `/api/profiles/:id`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_uuid = segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4;
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());

            if is_uuid || is_numeric {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
