//! 감사 로그 항목.
//!
//! 감사 항목은 추가만 가능하며 수정/삭제되지 않습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 로그인 감사 동작.
pub const LOGIN_ACTION: &str = "login";

/// 감사 로그 기본 조회 한도.
pub const DEFAULT_AUDIT_READ_LIMIT: usize = 1000;

/// 요청 본문을 포함하는 상세 내용의 최대 길이 (문자 수).
pub const DETAIL_MAX_CHARS: usize = 500;

/// 저장된 감사 항목.
///
/// JSON 필드명은 `audits` 테이블 컬럼명(`user_id`, `profile_id`, `details`)을 따릅니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AuditEntry {
    pub id: i64,
    /// 수행 주체 ID (EMS 로그인 등은 `null`)
    #[serde(rename = "user_id")]
    pub actor_id: Option<String>,
    /// 동작 (예: `login`, `view_profile`)
    pub action: String,
    /// 대상 프로필 ID
    #[serde(rename = "profile_id")]
    pub subject_id: Option<i64>,
    /// 상세 내용
    #[serde(rename = "details")]
    pub detail: Option<String>,
    /// 서버 기록 시각
    pub created_at: DateTime<Utc>,
}

/// 기록할 감사 항목.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub actor_id: Option<String>,
    pub action: String,
    pub subject_id: Option<i64>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    /// 현재 시각으로 새 항목 생성.
    pub fn new(
        actor_id: Option<String>,
        action: impl Into<String>,
        subject_id: Option<i64>,
        detail: Option<String>,
    ) -> Self {
        Self {
            actor_id,
            action: action.into(),
            subject_id,
            detail,
            created_at: Utc::now(),
        }
    }
}

/// 문자 경계를 지키며 `max_chars` 문자로 자릅니다.
pub fn truncate_detail(detail: &str, max_chars: usize) -> String {
    match detail.char_indices().nth(max_chars) {
        Some((byte_index, _)) => detail[..byte_index].to_string(),
        None => detail.to_string(),
    }
}
