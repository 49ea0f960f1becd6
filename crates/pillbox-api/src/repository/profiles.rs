//! 환자 프로필 저장소.

use async_trait::async_trait;

use pillbox_core::{
    matches_query, ImportItem, Profile, ProfileDocument, ProfileSummary, StoreResult,
};

/// 프로필 문서 저장소.
///
/// 목록과 내보내기는 ID 오름차순입니다.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 새 프로필 저장. 저장소가 ID를 부여합니다.
    async fn create(&self, name: &str, document: &ProfileDocument) -> StoreResult<Profile>;

    async fn get(&self, id: i64) -> StoreResult<Option<Profile>>;

    /// 이름과 문서를 통째로 교체. 해당 ID가 없으면 `false`.
    async fn replace(&self, id: i64, name: &str, document: &ProfileDocument) -> StoreResult<bool>;

    /// 삭제. 삭제된 행이 없으면 `false`.
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    async fn list(&self) -> StoreResult<Vec<ProfileSummary>>;

    /// 전체 프로필 (내보내기/검색용).
    async fn all(&self) -> StoreResult<Vec<Profile>>;

    /// 여러 건을 하나의 트랜잭션으로 삽입. 실패 시 아무것도 남지 않습니다.
    async fn insert_many(&self, items: &[ImportItem]) -> StoreResult<usize>;

    /// `name + " " + 직렬화 문서`에 대한 부분 문자열 검색.
    ///
    /// `needle`은 이미 소문자화되어 있어야 합니다.
    async fn search(&self, needle: &str) -> StoreResult<Vec<ProfileSummary>> {
        let profiles = self.all().await?;
        let mut matches = Vec::new();
        for profile in profiles {
            let serialized = serde_json::to_string(&profile.document)?;
            if matches_query(&profile.name, &serialized, needle) {
                matches.push(ProfileSummary {
                    id: profile.id,
                    name: profile.name,
                });
            }
        }
        Ok(matches)
    }
}
