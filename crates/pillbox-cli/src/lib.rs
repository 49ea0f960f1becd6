//! Pillbox 관리 CLI.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 데이터베이스 스키마 생성 및 부트스트랩 계정 시드
//! - 병원 사용자 / EMS 유닛 계정 생성
//! - 프로필 전체 내보내기

pub mod commands;

pub use commands::*;
