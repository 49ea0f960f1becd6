//! 로그인 자격증명 검증.
//!
//! 병원 사용자(사용자명/비밀번호)와 EMS 유닛(유닛 ID/유닛 코드)을
//! [`Principal`]로 해석합니다. 계정이 없는 경우와 비밀이 틀린 경우는
//! 같은 에러, 같은 메시지로 응답합니다.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use pillbox_core::{Principal, StoreError, LOGIN_ACTION};

use super::password::{hash_password_blocking, verify_password_blocking, PasswordError};
use crate::metrics::record_login;
use crate::repository::CredentialStore;
use crate::services::AuditLog;

/// 로그인 실패.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid EMS credentials")]
    InvalidEmsCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// 계정이 없을 때 비교에 쓰는 해시. 응답 시간으로 계정 존재를 알 수 없게 합니다.
///
/// 최초 호출 시 blocking 스레드 풀에서 한 번만 생성합니다.
async fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceCell<Option<String>> = OnceCell::const_new();
    DECOY
        .get_or_init(|| async {
            hash_password_blocking("pillbox-decoy-secret".to_string())
                .await
                .ok()
        })
        .await
        .as_deref()
}

/// 자격증명 검증기.
#[derive(Clone)]
pub struct IdentityVerifier {
    credentials: Arc<dyn CredentialStore>,
    audit: AuditLog,
}

impl IdentityVerifier {
    pub fn new(credentials: Arc<dyn CredentialStore>, audit: AuditLog) -> Self {
        Self { credentials, audit }
    }

    /// 병원 사용자 로그인.
    ///
    /// 성공 시 `login` 감사 항목(행위자 = 사용자 ID, `"hospital login"`)을 남깁니다.
    pub async fn verify_hospital(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let user = self
            .credentials
            .find_user_by_username(username)
            .await
            .inspect_err(|_| record_login("hospital", "error"))?;

        let matched = match &user {
            Some(user) => {
                verify_secret(password, &user.password_hash).await?
            }
            None => {
                burn_decoy(password).await;
                false
            }
        };

        let Some(user) = user.filter(|_| matched) else {
            warn!(username, "Hospital login rejected");
            record_login("hospital", "failure");
            return Err(AuthError::InvalidCredentials);
        };

        let principal = Principal::hospital(&user);
        self.audit
            .record(Some(&principal.id), LOGIN_ACTION, None, Some("hospital login"))
            .await;
        record_login("hospital", "success");
        info!(user_id = user.id, role = %user.role, "Hospital login");

        Ok(principal)
    }

    /// EMS 유닛 로그인.
    ///
    /// 성공 시 `login` 감사 항목(행위자 없음, `"ems login unit:<유닛 ID>"`)을 남깁니다.
    pub async fn verify_ems(&self, unit_id: &str, unit_code: &str) -> Result<Principal, AuthError> {
        let account = self
            .credentials
            .find_ems_account(unit_id)
            .await
            .inspect_err(|_| record_login("ems", "error"))?;

        let matched = match &account {
            Some(account) => verify_secret(unit_code, &account.unit_code_hash).await?,
            None => {
                burn_decoy(unit_code).await;
                false
            }
        };

        let Some(account) = account.filter(|_| matched) else {
            warn!(unit_id, "EMS login rejected");
            record_login("ems", "failure");
            return Err(AuthError::InvalidEmsCredentials);
        };

        let detail = format!("ems login unit:{}", account.unit_id);
        self.audit
            .record(None, LOGIN_ACTION, None, Some(&detail))
            .await;
        record_login("ems", "success");
        info!(unit_id = %account.unit_id, "EMS login");

        Ok(Principal::ems(&account))
    }
}

/// 해시 비교. 저장된 해시가 손상되었으면 불일치로 취급합니다.
async fn verify_secret(secret: &str, hash: &str) -> Result<bool, AuthError> {
    match verify_password_blocking(secret.to_string(), hash.to_string()).await {
        Ok(matched) => Ok(matched),
        Err(PasswordError::InvalidHashFormat) => {
            warn!("Stored credential hash is malformed");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

async fn burn_decoy(secret: &str) {
    if let Some(hash) = decoy_hash().await {
        let _ = verify_password_blocking(secret.to_string(), hash.to_string()).await;
    }
}
