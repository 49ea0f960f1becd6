//! 환자 프로필 서비스.
//!
//! 권한 확인을 통과한 요청의 프로필 작업을 수행하고, 결과와 상관없이
//! 요청당 정확히 하나의 감사 항목을 남깁니다.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use pillbox_core::{
    document_name, merge_document, new_profile_document, normalize_query, parse_import,
    ExportedProfile, Permission, Principal, ProfileDocument, ProfileError, ProfileSummary,
    DEFAULT_PROFILE_NAME,
};

use crate::repository::ProfileStore;
use crate::services::AuditLog;

/// 경로의 프로필 ID 파싱. 숫자가 아니면 `None`.
pub fn parse_profile_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// 프로필 서비스.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    audit: AuditLog,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// 전체 목록 `{id, name}` (ID 오름차순).
    pub async fn list(&self, actor: &Principal) -> Result<Vec<ProfileSummary>, ProfileError> {
        let result = self
            .store
            .list()
            .await
            .map(|profiles| {
                let detail = format!("list viewed by {}", actor.display_name);
                (profiles, detail)
            })
            .map_err(ProfileError::from);

        self.audited(actor, Permission::ListProfiles, None, result)
            .await
    }

    /// 기본값을 채워 새 프로필을 만들고 `id`가 포함된 전체 문서를 반환합니다.
    pub async fn create(
        &self,
        actor: &Principal,
        input: &ProfileDocument,
    ) -> Result<Value, ProfileError> {
        let document = new_profile_document(input);
        let name = document_name(&document).unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string());

        let action = Permission::CreateProfile.action();
        match self.store.create(&name, &document).await {
            Ok(profile) => {
                self.audit
                    .record(Some(&actor.id), action, Some(profile.id), Some("created profile"))
                    .await;
                info!(profile_id = profile.id, actor = %actor.id, "Profile created");
                Ok(profile.into_json())
            }
            Err(e) => {
                let detail = format!("failed: {e}");
                self.audit
                    .record(Some(&actor.id), action, None, Some(&detail))
                    .await;
                Err(e.into())
            }
        }
    }

    /// 저장된 문서에 `id`를 넣어 반환합니다.
    pub async fn get(&self, actor: &Principal, raw_id: &str) -> Result<Value, ProfileError> {
        let id = parse_profile_id(raw_id);
        let result = match id {
            Some(id) => self
                .store
                .get(id)
                .await
                .map_err(ProfileError::from)
                .and_then(|found| found.ok_or_else(|| ProfileError::NotFound(raw_id.to_string()))),
            None => Err(ProfileError::NotFound(raw_id.to_string())),
        }
        .map(|profile| (profile.into_json(), "viewed profile".to_string()));

        self.audited(actor, Permission::ReadProfile, id, result).await
    }

    /// 최상위 얕은 병합 후 문서를 교체하고 병합 결과(`id` 제외)를 반환합니다.
    ///
    /// 이름 컬럼은 병합된 `name`이 비어 있지 않은 문자열일 때만 바뀝니다.
    pub async fn update(
        &self,
        actor: &Principal,
        raw_id: &str,
        partial: &ProfileDocument,
    ) -> Result<Value, ProfileError> {
        let id = parse_profile_id(raw_id);
        let result = match id {
            Some(id) => self.apply_update(id, raw_id, partial).await,
            None => Err(ProfileError::NotFound(raw_id.to_string())),
        }
        .and_then(|merged| {
            let detail = serde_json::to_string(partial).map_err(pillbox_core::StoreError::from)?;
            Ok((merged, detail))
        });

        self.audited(actor, Permission::UpdateProfile, id, result)
            .await
    }

    async fn apply_update(
        &self,
        id: i64,
        raw_id: &str,
        partial: &ProfileDocument,
    ) -> Result<Value, ProfileError> {
        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(raw_id.to_string()))?;

        let merged = merge_document(&current.document, partial);
        let name = match merged.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => current.name.clone(),
        };

        if !self.store.replace(id, &name, &merged).await? {
            return Err(ProfileError::NotFound(raw_id.to_string()));
        }

        debug!(profile_id = id, keys = partial.len(), "Profile merged");
        Ok(Value::Object(merged))
    }

    pub async fn delete(&self, actor: &Principal, raw_id: &str) -> Result<(), ProfileError> {
        let id = parse_profile_id(raw_id);
        let result = match id {
            Some(id) => match self.store.delete(id).await {
                Ok(true) => Ok(((), "deleted".to_string())),
                Ok(false) => Err(ProfileError::NotFound(raw_id.to_string())),
                Err(e) => Err(e.into()),
            },
            None => Err(ProfileError::NotFound(raw_id.to_string())),
        };

        let outcome = self
            .audited(actor, Permission::DeleteProfile, id, result)
            .await;
        if outcome.is_ok() {
            info!(profile_id = ?id, actor = %actor.id, "Profile deleted");
        }
        outcome
    }

    /// 대소문자 무시 부분 문자열 검색. 빈 검색어는 빈 결과입니다.
    pub async fn search(
        &self,
        actor: &Principal,
        query: &str,
    ) -> Result<Vec<ProfileSummary>, ProfileError> {
        let result = match normalize_query(query) {
            Some(needle) => self.store.search(&needle).await.map_err(ProfileError::from),
            None => Ok(Vec::new()),
        }
        .map(|matches| (matches, format!("q:{query}")));

        self.audited(actor, Permission::SearchProfiles, None, result)
            .await
    }

    /// 전체 프로필 `{id, name, profile}` (ID 오름차순).
    pub async fn export(&self, actor: &Principal) -> Result<Vec<ExportedProfile>, ProfileError> {
        let result = self
            .store
            .all()
            .await
            .map(|profiles| {
                let exported: Vec<ExportedProfile> = profiles
                    .into_iter()
                    .map(|p| ExportedProfile {
                        id: p.id,
                        name: p.name,
                        profile: p.document,
                    })
                    .collect();
                let detail = format!("exported {}", exported.len());
                (exported, detail)
            })
            .map_err(ProfileError::from);

        self.audited(actor, Permission::ExportProfiles, None, result)
            .await
    }

    /// 페이로드 전체를 먼저 검증한 뒤 하나의 트랜잭션으로 삽입합니다.
    pub async fn import(&self, actor: &Principal, payload: &[u8]) -> Result<usize, ProfileError> {
        let result = match parse_import(payload) {
            Ok(items) => self
                .store
                .insert_many(&items)
                .await
                .map_err(ProfileError::from),
            Err(e) => Err(e.into()),
        }
        .map(|inserted| (inserted, format!("imported {inserted}")));

        let outcome = self
            .audited(actor, Permission::ImportProfiles, None, result)
            .await;
        if let Ok(inserted) = outcome {
            info!(inserted, actor = %actor.id, "Profiles imported");
        }
        outcome
    }

    /// 결과에 맞는 감사 항목을 하나 남기고 값을 돌려줍니다.
    async fn audited<T>(
        &self,
        actor: &Principal,
        permission: Permission,
        subject_id: Option<i64>,
        result: Result<(T, String), ProfileError>,
    ) -> Result<T, ProfileError> {
        let detail = match &result {
            Ok((_, detail)) => detail.clone(),
            Err(ProfileError::NotFound(_)) => "not found".to_string(),
            Err(e) => format!("failed: {e}"),
        };

        self.audit
            .record(Some(&actor.id), permission.action(), subject_id, Some(&detail))
            .await;

        result.map(|(value, _)| value)
    }
}
