//! 역할 기반 접근 제어 (RBAC).
//!
//! 사용자 역할과 엔드포인트별 허용 역할 매트릭스를 정의합니다.
//! 역할과 권한은 고정된 열거형이며 정책 언어가 아닙니다.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자 - 계정 관리, 삭제, 감사 로그, 내보내기/가져오기
    Admin,
    /// 의사
    Doctor,
    /// 간호사
    Nurse,
    /// 응급구조대 (EMS 유닛 세션)
    Ems,
    /// 뷰어 - 읽기 전용
    Viewer,
}

impl Role {
    /// 모든 역할.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Ems,
        Role::Viewer,
    ];

    /// 역할이 특정 권한을 가지는지 확인.
    pub fn has_permission(&self, permission: Permission) -> bool {
        permission.allowed_roles().contains(self)
    }

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            "ems" => Some(Role::Ems),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// 저장소/토큰에 기록되는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Ems => "ems",
            Role::Viewer => "viewer",
        }
    }
}

impl Default for Role {
    /// 역할 없이 생성된 병원 사용자는 뷰어입니다.
    fn default() -> Self {
        Role::Viewer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 역할 게이트가 적용되는 작업.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// 병원 사용자 생성
    CreateUser,
    /// EMS 계정 생성
    CreateEmsAccount,
    /// 환자 프로필 목록 조회
    ListProfiles,
    /// 환자 프로필 생성
    CreateProfile,
    /// 환자 프로필 조회
    ReadProfile,
    /// 환자 프로필 수정
    UpdateProfile,
    /// 환자 프로필 삭제
    DeleteProfile,
    /// 감사 로그 조회
    ViewAuditLog,
    /// 프로필 내보내기
    ExportProfiles,
    /// 프로필 가져오기
    ImportProfiles,
    /// 프로필 검색
    SearchProfiles,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const CLINICAL: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse, Role::Ems];
const ANY_AUTHENTICATED: &[Role] = &Role::ALL;

impl Permission {
    /// 모든 권한.
    pub const ALL: [Permission; 11] = [
        Permission::CreateUser,
        Permission::CreateEmsAccount,
        Permission::ListProfiles,
        Permission::CreateProfile,
        Permission::ReadProfile,
        Permission::UpdateProfile,
        Permission::DeleteProfile,
        Permission::ViewAuditLog,
        Permission::ExportProfiles,
        Permission::ImportProfiles,
        Permission::SearchProfiles,
    ];

    /// 이 작업을 수행할 수 있는 역할 집합.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Permission::CreateUser
            | Permission::CreateEmsAccount
            | Permission::DeleteProfile
            | Permission::ViewAuditLog
            | Permission::ExportProfiles
            | Permission::ImportProfiles => ADMIN_ONLY,
            Permission::CreateProfile | Permission::UpdateProfile => CLINICAL,
            Permission::ListProfiles | Permission::ReadProfile | Permission::SearchProfiles => {
                ANY_AUTHENTICATED
            }
        }
    }

    /// 감사 로그에 기록되는 동작 이름.
    pub fn action(&self) -> &'static str {
        match self {
            Permission::CreateUser => "create_user",
            Permission::CreateEmsAccount => "create_ems_account",
            Permission::ListProfiles => "list_profiles",
            Permission::CreateProfile => "create_profile",
            Permission::ReadProfile => "view_profile",
            Permission::UpdateProfile => "update_profile",
            Permission::DeleteProfile => "delete_profile",
            Permission::ViewAuditLog => "view_audits",
            Permission::ExportProfiles => "export_profiles",
            Permission::ImportProfiles => "import_profiles",
            Permission::SearchProfiles => "search_profiles",
        }
    }
}
