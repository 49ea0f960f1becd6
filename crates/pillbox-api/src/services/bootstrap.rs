//! 첫 실행 부트스트랩.
//!
//! 사용자 테이블이 비어 있으면 관리자 계정을, EMS 테이블이 비어 있으면
//! 데모 유닛을 만듭니다. 이미 계정이 있으면 아무것도 하지 않습니다.

use tracing::{info, warn};

use pillbox_core::{BootstrapConfig, NewEmsAccount, NewHospitalUser, Role};

use crate::auth::hash_password_blocking;
use crate::repository::CredentialStore;
use crate::services::AccountError;

/// 부트스트랩 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub admin_created: bool,
    pub ems_created: bool,
}

/// 기본 계정 생성.
pub async fn ensure_bootstrap(
    credentials: &dyn CredentialStore,
    config: &BootstrapConfig,
) -> Result<BootstrapReport, AccountError> {
    let mut report = BootstrapReport::default();
    if !config.enabled {
        info!("Bootstrap disabled");
        return Ok(report);
    }

    if credentials.count_users().await? == 0 && !config.admin_username.is_empty() {
        let password_hash = hash_password_blocking(config.admin_password.clone()).await?;
        credentials
            .create_user(NewHospitalUser {
                username: config.admin_username.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await?;
        warn!(
            username = %config.admin_username,
            "Created bootstrap admin with development credentials; change the password"
        );
        report.admin_created = true;
    }

    if credentials.count_ems_accounts().await? == 0 && !config.ems_unit_id.is_empty() {
        let unit_code_hash = hash_password_blocking(config.ems_unit_code.clone()).await?;
        credentials
            .create_ems_account(NewEmsAccount {
                unit_id: config.ems_unit_id.clone(),
                unit_code_hash,
            })
            .await?;
        warn!(unit_id = %config.ems_unit_id, "Created demo EMS unit with development code");
        report.ems_created = true;
    }

    Ok(report)
}
