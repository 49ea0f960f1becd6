//! 감사 로그 저장소.

use async_trait::async_trait;

use pillbox_core::{AuditEntry, NewAuditEntry, StoreResult};

/// 추가 전용 감사 로그 저장소.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// 항목 추가 후 ID 반환.
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<i64>;

    /// 최신 항목부터 최대 `limit`건.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<AuditEntry>>;
}
