//! 자격증명 저장소 (병원 사용자, EMS 유닛).

use async_trait::async_trait;

use pillbox_core::{EmsAccount, HospitalUser, NewEmsAccount, NewHospitalUser, StoreResult};

/// 병원 사용자와 EMS 계정을 보관하는 저장소.
///
/// 계정은 생성만 되며 수정/삭제 경로는 없습니다.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자명 정확 일치 조회.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<HospitalUser>>;

    /// 사용자 생성. 중복 사용자명은 `StoreError::Conflict`.
    async fn create_user(&self, user: NewHospitalUser) -> StoreResult<HospitalUser>;

    async fn count_users(&self) -> StoreResult<i64>;

    /// 유닛 ID 정확 일치 조회.
    async fn find_ems_account(&self, unit_id: &str) -> StoreResult<Option<EmsAccount>>;

    /// EMS 계정 생성. 중복 유닛 ID는 `StoreError::Conflict`.
    async fn create_ems_account(&self, account: NewEmsAccount) -> StoreResult<EmsAccount>;

    async fn count_ems_accounts(&self) -> StoreResult<i64>;
}
