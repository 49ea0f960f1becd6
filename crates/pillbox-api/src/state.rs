//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 저장소는 트레이트 객체로 주입됩니다. 운영에서는 [`SqliteStore`],
//! 테스트에서는 [`MemoryStore`]가 같은 트레이트를 구현합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use pillbox_core::{AppConfig, Permission, Principal};

use crate::auth::{require_permission, GuardError, IdentityVerifier, TokenService};
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_access_denied;
use crate::repository::{AuditStore, CredentialStore, MemoryStore, ProfileStore, SqliteStore};
use crate::services::{AccountService, AuditLog, ProfileService};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 `Arc<AppState>`로 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 로드된 설정
    pub config: Arc<AppConfig>,

    /// JWT 발급/검증
    pub tokens: TokenService,

    /// 로그인 자격증명 검증
    pub verifier: IdentityVerifier,

    /// 병원 사용자 / EMS 계정 생성
    pub accounts: AccountService,

    /// 환자 프로필 작업
    pub profiles: ProfileService,

    /// 감사 로그
    pub audit_log: AuditLog,

    /// 자격증명 저장소 (부트스트랩, CLI)
    pub credentials: Arc<dyn CredentialStore>,

    /// SQLite 저장소 (readiness 확인용, 메모리 저장소 사용 시 None)
    pub db: Option<SqliteStore>,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// 애플리케이션 버전
    pub version: String,
}

impl AppState {
    /// 저장소 트레이트 객체로 상태 생성.
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileStore>,
        audits: Arc<dyn AuditStore>,
    ) -> Self {
        let audit_log = AuditLog::new(audits, config.audit.detail_max_chars);
        let tokens = TokenService::from_config(&config.auth);

        Self {
            verifier: IdentityVerifier::new(credentials.clone(), audit_log.clone()),
            accounts: AccountService::new(credentials.clone(), audit_log.clone()),
            profiles: ProfileService::new(profiles, audit_log.clone()),
            audit_log,
            tokens,
            credentials,
            config: Arc::new(config),
            db: None,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// SQLite 저장소 하나로 모든 저장소 역할을 구성.
    pub fn with_sqlite(config: AppConfig, store: SqliteStore) -> Self {
        let shared = Arc::new(store.clone());
        let mut state = Self::new(config, shared.clone(), shared.clone(), shared);
        state.db = Some(store);
        state
    }

    /// 메모리 저장소로 구성 (데이터는 프로세스와 함께 사라집니다).
    pub fn with_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store.clone(), store)
    }

    /// 권한 확인.
    ///
    /// 거부되면 `"forbidden"` 감사 항목을 남기고 403을 반환합니다.
    pub async fn authorize(
        &self,
        principal: &Principal,
        permission: Permission,
        subject_id: Option<i64>,
    ) -> ApiResult<()> {
        match require_permission(Some(principal), permission) {
            Ok(_) => Ok(()),
            Err(GuardError::Forbidden) => {
                warn!(
                    actor = %principal.id,
                    role = %principal.role,
                    action = permission.action(),
                    "Access denied"
                );
                self.audit_log
                    .record(
                        Some(&principal.id),
                        permission.action(),
                        subject_id,
                        Some("forbidden"),
                    )
                    .await;
                record_access_denied(permission.action());
                Err(ApiError::Forbidden)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 연결 상태 확인. 메모리 저장소는 항상 정상입니다.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db {
            Some(store) => store.ping().await,
            None => true,
        }
    }
}

/// 테스트용 AppState 생성.
///
/// 메모리 저장소와 고정 시크릿을 사용하며 부트스트랩 계정은 만들지 않습니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("pillbox-test-secret".to_string());
    AppState::with_memory(config)
}
