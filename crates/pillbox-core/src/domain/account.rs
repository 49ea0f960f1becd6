//! 자격증명 보유자 (병원 사용자, EMS 유닛).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// 병원 사용자 계정.
///
/// 비밀번호는 해시로만 보관되며 API 응답에는 포함되지 않습니다.
#[derive(Debug, Clone)]
pub struct HospitalUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl HospitalUser {
    /// 응답용 요약.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// 새 병원 사용자 입력 (해시 완료 상태).
#[derive(Debug, Clone)]
pub struct NewHospitalUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// 병원 사용자 요약 `{id, username, role}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// EMS 유닛 계정.
#[derive(Debug, Clone)]
pub struct EmsAccount {
    pub id: i64,
    pub unit_id: String,
    pub unit_code_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 새 EMS 계정 입력 (유닛 코드 해시 완료 상태).
#[derive(Debug, Clone)]
pub struct NewEmsAccount {
    pub unit_id: String,
    pub unit_code_hash: String,
}
