//! 계정 관리 서비스 (병원 사용자, EMS 유닛).

use std::sync::Arc;

use tracing::info;

use pillbox_core::{
    NewEmsAccount, NewHospitalUser, Permission, Principal, Role, StoreError, UserSummary,
};

use crate::auth::{hash_password_blocking, PasswordError};
use crate::repository::CredentialStore;
use crate::services::AuditLog;

/// 계정 생성 에러.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("username+password required")]
    MissingUserFields,
    #[error("unit_id & unit_code required")]
    MissingEmsFields,
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// 계정 서비스.
#[derive(Clone)]
pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    audit: AuditLog,
}

impl AccountService {
    pub fn new(credentials: Arc<dyn CredentialStore>, audit: AuditLog) -> Self {
        Self { credentials, audit }
    }

    /// 병원 사용자 생성. 역할을 생략하면 `viewer`입니다.
    pub async fn create_user(
        &self,
        actor: &Principal,
        username: Option<&str>,
        password: Option<&str>,
        role: Option<&str>,
    ) -> Result<UserSummary, AccountError> {
        let result = self.insert_user(username, password, role).await;

        let detail = match &result {
            Ok(user) => format!("created user {}", user.username),
            Err(e) => format!("failed: {e}"),
        };
        self.audit
            .record(
                Some(&actor.id),
                Permission::CreateUser.action(),
                None,
                Some(&detail),
            )
            .await;

        if let Ok(user) = &result {
            info!(user_id = user.id, role = %user.role, actor = %actor.id, "Hospital user created");
        }
        result
    }

    async fn insert_user(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        role: Option<&str>,
    ) -> Result<UserSummary, AccountError> {
        let (Some(username), Some(password)) = (non_empty(username), non_empty(password)) else {
            return Err(AccountError::MissingUserFields);
        };
        let role = match non_empty(role) {
            Some(raw) => Role::parse(raw).ok_or_else(|| AccountError::UnknownRole(raw.to_string()))?,
            None => Role::Viewer,
        };

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let user = self
            .credentials
            .create_user(NewHospitalUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?;

        Ok(user.summary())
    }

    /// EMS 유닛 계정 생성. 생성된 계정 ID를 반환합니다.
    pub async fn create_ems_account(
        &self,
        actor: &Principal,
        unit_id: Option<&str>,
        unit_code: Option<&str>,
    ) -> Result<i64, AccountError> {
        let result = self.insert_ems_account(unit_id, unit_code).await;

        let detail = match (&result, non_empty(unit_id)) {
            (Ok(_), Some(unit_id)) => format!("unit:{unit_id}"),
            (Ok(_), None) => "unit:".to_string(),
            (Err(e), _) => format!("failed: {e}"),
        };
        self.audit
            .record(
                Some(&actor.id),
                Permission::CreateEmsAccount.action(),
                None,
                Some(&detail),
            )
            .await;

        if let Ok(id) = result {
            info!(account_id = id, actor = %actor.id, "EMS account created");
        }
        result
    }

    async fn insert_ems_account(
        &self,
        unit_id: Option<&str>,
        unit_code: Option<&str>,
    ) -> Result<i64, AccountError> {
        let (Some(unit_id), Some(unit_code)) = (non_empty(unit_id), non_empty(unit_code)) else {
            return Err(AccountError::MissingEmsFields);
        };

        let unit_code_hash = hash_password_blocking(unit_code.to_string()).await?;
        let account = self
            .credentials
            .create_ems_account(NewEmsAccount {
                unit_id: unit_id.to_string(),
                unit_code_hash,
            })
            .await?;

        Ok(account.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::repository::{AuditStore, MemoryStore};

    fn admin() -> Principal {
        Principal {
            id: "1".to_string(),
            display_name: "admin".to_string(),
            role: Role::Admin,
            ems_unit: None,
        }
    }

    fn setup() -> (AccountService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditLog::new(store.clone(), 500);
        (AccountService::new(store.clone(), audit), store)
    }

    #[tokio::test]
    async fn test_create_user_defaults_to_viewer() {
        let (service, store) = setup();

        let user = service
            .create_user(&admin(), Some("nurse1"), Some("pw"), None)
            .await
            .unwrap();
        assert_eq!(user.username, "nurse1");
        assert_eq!(user.role, Role::Viewer);

        let stored = store.find_user_by_username("nurse1").await.unwrap().unwrap();
        assert!(verify_password("pw", &stored.password_hash).unwrap());

        let audits = store.recent(10).await.unwrap();
        assert_eq!(audits[0].action, "create_user");
        assert_eq!(audits[0].detail.as_deref(), Some("created user nurse1"));
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (service, store) = setup();

        let missing = service
            .create_user(&admin(), Some("x"), Some(""), None)
            .await
            .unwrap_err();
        assert_eq!(missing.to_string(), "username+password required");

        let unknown = service
            .create_user(&admin(), Some("x"), Some("pw"), Some("janitor"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, AccountError::UnknownRole(_)));

        service
            .create_user(&admin(), Some("x"), Some("pw"), Some("nurse"))
            .await
            .unwrap();
        let duplicate = service
            .create_user(&admin(), Some("x"), Some("pw2"), None)
            .await
            .unwrap_err();
        assert!(matches!(duplicate, AccountError::Store(StoreError::Conflict(_))));

        // 실패도 각각 한 건씩 기록
        assert_eq!(store.recent(10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_ems_account() {
        let (service, store) = setup();

        let id = service
            .create_ems_account(&admin(), Some("EMS-2"), Some("code2"))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let err = service
            .create_ems_account(&admin(), Some("EMS-3"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unit_id & unit_code required");

        let audits = store.recent(10).await.unwrap();
        assert_eq!(audits[1].action, "create_ems_account");
        assert_eq!(audits[1].detail.as_deref(), Some("unit:EMS-2"));
    }
}
