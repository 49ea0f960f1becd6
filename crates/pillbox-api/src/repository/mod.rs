//! 저장소 계층.
//!
//! 핸들러와 서비스는 트레이트 객체(`Arc<dyn …Store>`)만 알고,
//! 구현은 SQLite([`SqliteStore`])와 메모리([`MemoryStore`]) 두 가지입니다.

mod audits;
mod credentials;
mod memory;
mod profiles;
mod sqlite;

pub use audits::AuditStore;
pub use credentials::CredentialStore;
pub use memory::MemoryStore;
pub use profiles::ProfileStore;
pub use sqlite::SqliteStore;
