//! 계정 생성 명령어.
//!
//! 운영자가 서버 밖에서 직접 실행하므로 감사 로그를 남기지 않습니다.
//!
//! ```bash
//! pillbox create-user -u nurse1 -p secret -r nurse
//! pillbox create-ems-account --unit-id EMS-7 --unit-code 4821
//! ```

use anyhow::{bail, Result};
use tracing::info;

use pillbox_api::auth::hash_password_blocking;
use pillbox_api::repository::CredentialStore;
use pillbox_core::{NewEmsAccount, NewHospitalUser, Role, UserSummary};

/// 병원 사용자 생성. 역할을 생략하면 `viewer`입니다.
pub async fn create_user(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
    role: Option<&str>,
) -> Result<UserSummary> {
    if username.is_empty() || password.is_empty() {
        bail!("username and password must not be empty");
    }
    let role = match role {
        Some(raw) => match Role::parse(raw) {
            Some(role) => role,
            None => bail!("unknown role: {raw}"),
        },
        None => Role::Viewer,
    };

    let password_hash = hash_password_blocking(password.to_string()).await?;
    let user = store
        .create_user(NewHospitalUser {
            username: username.to_string(),
            password_hash,
            role,
        })
        .await?;

    info!(user_id = user.id, role = %user.role, "Hospital user created");
    Ok(user.summary())
}

/// EMS 유닛 계정 생성. 생성된 ID를 반환합니다.
pub async fn create_ems_account(
    store: &dyn CredentialStore,
    unit_id: &str,
    unit_code: &str,
) -> Result<i64> {
    if unit_id.is_empty() || unit_code.is_empty() {
        bail!("unit id and unit code must not be empty");
    }

    let unit_code_hash = hash_password_blocking(unit_code.to_string()).await?;
    let account = store
        .create_ems_account(NewEmsAccount {
            unit_id: unit_id.to_string(),
            unit_code_hash,
        })
        .await?;

    info!(account_id = account.id, unit_id = %account.unit_id, "EMS account created");
    Ok(account.id)
}
