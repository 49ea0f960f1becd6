//! 감사 로그 기록기.
//!
//! 기록은 최선 노력(best-effort)입니다. 쓰기 실패는 tracing과 메트릭으로만
//! 보고되고 호출한 작업을 중단시키지 않습니다.

use std::sync::Arc;

use tracing::error;

use pillbox_core::{truncate_detail, AuditEntry, NewAuditEntry, StoreResult};

use crate::metrics::record_audit_write_failure;
use crate::repository::AuditStore;

/// 감사 로그.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
    detail_max_chars: usize,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>, detail_max_chars: usize) -> Self {
        Self {
            store,
            detail_max_chars,
        }
    }

    /// 항목 하나를 기록합니다. 실패해도 에러를 반환하지 않습니다.
    pub async fn record(
        &self,
        actor_id: Option<&str>,
        action: &str,
        subject_id: Option<i64>,
        detail: Option<&str>,
    ) {
        let entry = NewAuditEntry::new(
            actor_id.map(str::to_string),
            action,
            subject_id,
            detail.map(|d| truncate_detail(d, self.detail_max_chars)),
        );

        if let Err(e) = self.store.append(entry).await {
            error!(action, ?subject_id, error = %e, "Audit write failed");
            record_audit_write_failure(action);
        }
    }

    /// 최신 항목부터 최대 `limit`건.
    pub async fn read_recent(&self, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        self.store.recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    #[tokio::test]
    async fn test_record_truncates_detail() {
        let store = Arc::new(MemoryStore::new());
        let log = AuditLog::new(store.clone(), 10);

        log.record(Some("1"), "update_profile", Some(3), Some("abcdefghijklmnop"))
            .await;

        let entries = log.read_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].detail.as_deref(), Some("abcdefghij"));
        assert_eq!(entries[0].actor_id.as_deref(), Some("1"));
        assert_eq!(entries[0].subject_id, Some(3));
    }

    #[tokio::test]
    async fn test_record_swallows_write_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_audit_writes(true);
        let log = AuditLog::new(store.clone(), 500);

        // 패닉이나 에러 없이 반환되어야 함
        log.record(None, "login", None, Some("ems login unit:EMS-1"))
            .await;

        store.set_fail_audit_writes(false);
        assert!(log.read_recent(10).await.unwrap().is_empty());
    }
}
