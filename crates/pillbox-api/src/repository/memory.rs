//! 메모리 저장소.
//!
//! 테스트와 데모용. 하나의 `RwLock` 아래에 모든 테이블을 둡니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use pillbox_core::{
    AuditEntry, EmsAccount, HospitalUser, ImportItem, NewAuditEntry, NewEmsAccount,
    NewHospitalUser, Profile, ProfileDocument, ProfileSummary, StoreError, StoreResult,
};

use super::{AuditStore, CredentialStore, ProfileStore};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<HospitalUser>,
    ems_accounts: Vec<EmsAccount>,
    profiles: BTreeMap<i64, (String, ProfileDocument)>,
    audits: Vec<AuditEntry>,
    next_user_id: i64,
    next_ems_id: i64,
    next_profile_id: i64,
    next_audit_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// 메모리 저장소. 세 저장소 트레이트를 모두 구현합니다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_audit_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 감사 로그 쓰기를 실패하게 만듭니다 (장애 시나리오 테스트용).
    pub fn set_fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<HospitalUser>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewHospitalUser) -> StoreResult<HospitalUser> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("username already exists".to_string()));
        }
        let created = HospitalUser {
            id: next_id(&mut tables.next_user_id),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn find_ems_account(&self, unit_id: &str) -> StoreResult<Option<EmsAccount>> {
        let tables = self.tables.read().await;
        Ok(tables
            .ems_accounts
            .iter()
            .find(|a| a.unit_id == unit_id)
            .cloned())
    }

    async fn create_ems_account(&self, account: NewEmsAccount) -> StoreResult<EmsAccount> {
        let mut tables = self.tables.write().await;
        if tables.ems_accounts.iter().any(|a| a.unit_id == account.unit_id) {
            return Err(StoreError::Conflict("unit_id already exists".to_string()));
        }
        let created = EmsAccount {
            id: next_id(&mut tables.next_ems_id),
            unit_id: account.unit_id,
            unit_code_hash: account.unit_code_hash,
            created_at: Utc::now(),
        };
        tables.ems_accounts.push(created.clone());
        Ok(created)
    }

    async fn count_ems_accounts(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.ems_accounts.len() as i64)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create(&self, name: &str, document: &ProfileDocument) -> StoreResult<Profile> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_profile_id);
        tables
            .profiles
            .insert(id, (name.to_string(), document.clone()));
        Ok(Profile {
            id,
            name: name.to_string(),
            document: document.clone(),
        })
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&id).map(|(name, document)| Profile {
            id,
            name: name.clone(),
            document: document.clone(),
        }))
    }

    async fn replace(&self, id: i64, name: &str, document: &ProfileDocument) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.profiles.get_mut(&id) {
            Some(slot) => {
                *slot = (name.to_string(), document.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.profiles.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<ProfileSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .iter()
            .map(|(id, (name, _))| ProfileSummary {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn all(&self) -> StoreResult<Vec<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .iter()
            .map(|(id, (name, document))| Profile {
                id: *id,
                name: name.clone(),
                document: document.clone(),
            })
            .collect())
    }

    async fn insert_many(&self, items: &[ImportItem]) -> StoreResult<usize> {
        // 쓰기 잠금 하나로 전부 삽입
        let mut tables = self.tables.write().await;
        for item in items {
            let id = next_id(&mut tables.next_profile_id);
            tables
                .profiles
                .insert(id, (item.name.clone(), item.document.clone()));
        }
        Ok(items.len())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<i64> {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("audit table unavailable".to_string()));
        }
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_audit_id);
        tables.audits.push(AuditEntry {
            id,
            actor_id: entry.actor_id,
            action: entry.action,
            subject_id: entry.subject_id,
            detail: entry.detail,
            created_at: entry.created_at,
        });
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        let tables = self.tables.read().await;
        Ok(tables.audits.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillbox_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_ids_are_stable_and_increasing() {
        let store = MemoryStore::new();
        let a = store.create("A", &ProfileDocument::new()).await.unwrap();
        let b = store.create("B", &ProfileDocument::new()).await.unwrap();
        assert!(b.id > a.id);

        store.delete(b.id).await.unwrap();
        let c = store.create("C", &ProfileDocument::new()).await.unwrap();
        assert!(c.id > b.id);
    }

    #[tokio::test]
    async fn test_duplicate_unit_id_is_conflict() {
        let store = MemoryStore::new();
        let account = NewEmsAccount {
            unit_id: "EMS-1".to_string(),
            unit_code_hash: "h".to_string(),
        };
        store.create_ems_account(account.clone()).await.unwrap();
        let err = store.create_ems_account(account).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_ems_accounts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_lookup_is_exact() {
        let store = MemoryStore::new();
        store
            .create_user(NewHospitalUser {
                username: "admin".to_string(),
                password_hash: "h".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        assert!(store.find_user_by_username("admin").await.unwrap().is_some());
        assert!(store.find_user_by_username("Admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_audit_writes() {
        let store = MemoryStore::new();
        store.set_fail_audit_writes(true);
        let result = store
            .append(NewAuditEntry::new(None, "login", None, None))
            .await;
        assert!(result.is_err());
        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_default_method() {
        let store = MemoryStore::new();
        let doc = json!({"status": "Discharged"}).as_object().cloned().unwrap();
        store.create("Jane", &doc).await.unwrap();
        assert_eq!(store.search("discharged").await.unwrap().len(), 1);
        assert!(store.search("admitted").await.unwrap().is_empty());
    }
}
