//! 인증된 요청 주체.

use serde::{Deserialize, Serialize};

use super::{EmsAccount, HospitalUser, Role};

/// 토큰 검증 후 요청에 붙는 인증 주체.
///
/// 요청마다 새로 만들어지며 저장되지 않습니다.
/// EMS 세션의 `id`는 `"ems-<계정 ID>"` 형태로 합성된 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Principal {
    /// 불투명 주체 ID
    pub id: String,
    /// 표시 이름 (병원 사용자명 또는 `EMS-<유닛 ID>`)
    #[serde(rename = "username")]
    pub display_name: String,
    /// 역할
    pub role: Role,
    /// EMS 유닛 ID (EMS 유닛 로그인일 때만)
    #[serde(default)]
    pub ems_unit: Option<String>,
}

impl Principal {
    /// 병원 사용자 주체.
    pub fn hospital(user: &HospitalUser) -> Self {
        Self {
            id: user.id.to_string(),
            display_name: user.username.clone(),
            role: user.role,
            ems_unit: None,
        }
    }

    /// EMS 유닛 주체.
    pub fn ems(account: &EmsAccount) -> Self {
        Self {
            id: format!("ems-{}", account.id),
            display_name: format!("EMS-{}", account.unit_id),
            role: Role::Ems,
            ems_unit: Some(account.unit_id.clone()),
        }
    }

    /// EMS 유닛 로그인으로 만들어진 주체인지. 역할이 `ems`인 병원 사용자는 해당하지 않습니다.
    pub fn is_ems(&self) -> bool {
        self.ems_unit.is_some()
    }
}
