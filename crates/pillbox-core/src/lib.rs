//! # Pillbox Core
//!
//! Pillbox EHR의 도메인 모델과 공통 인프라.
//!
//! - 역할과 권한 매트릭스
//! - 병원 사용자 / EMS 계정, 인증 주체
//! - 환자 프로필 문서 규칙 (기본값, 병합, 검색, 가져오기)
//! - 감사 로그 항목
//! - 설정 로딩과 로깅 초기화

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
