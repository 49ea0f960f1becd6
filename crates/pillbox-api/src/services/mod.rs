//! 도메인 서비스 모듈.
//!
//! 핸들러는 권한 확인 후 이 서비스들을 호출하며, 서비스는 작업 결과마다
//! 감사 항목을 남깁니다.

pub mod accounts;
pub mod audit_log;
pub mod bootstrap;
pub mod profiles;

pub use accounts::{AccountError, AccountService};
pub use audit_log::AuditLog;
pub use bootstrap::{ensure_bootstrap, BootstrapReport};
pub use profiles::{parse_profile_id, ProfileService};
