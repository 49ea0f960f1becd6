//! Pillbox EHR REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (인증, 계정, 환자 프로필, 감사 로그, 내보내기/가져오기)
//! - JWT 인증과 역할 기반 접근 제어
//! - 요청당 하나의 감사 항목 기록
//! - 헬스 체크 엔드포인트와 Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT, 자격증명 검증, 역할 가드
//! - [`services`]: 프로필/계정 작업과 감사 기록
//! - [`repository`]: 저장소 트레이트와 SQLite/메모리 구현
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod app;
pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
pub use auth::{hash_password, verify_password, Authenticated, Claims, TokenError, TokenService};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::create_api_router;
pub use services::{ensure_bootstrap, AccountService, AuditLog, ProfileService};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
