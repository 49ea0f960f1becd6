//! 설정 관리.
//!
//! 기본값 → TOML 파일(선택) → `PILLBOX__` 접두사 환경 변수 순으로 덮어씁니다.
//!
//! ```text
//! PILLBOX__SERVER__PORT=8080
//! PILLBOX__DATABASE__URL=sqlite://pillbox.db?mode=rwc
//! PILLBOX__AUTH__JWT_SECRET=...
//! ```
//!
//! 기존 배포와의 호환을 위해 `PILLBOX_JWT_SECRET`, `PORT`도 인식합니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 개발용 JWT 시크릿. 운영 환경에서는 반드시 교체해야 합니다.
pub const INSECURE_DEV_SECRET: &str = "pillbox_dev_secret_change_me";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 감사 로그 설정
    #[serde(default)]
    pub audit: AuditConfig,
    /// 첫 실행 부트스트랩 설정
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 정적 UI 파일 디렉토리 (없으면 제공하지 않음)
    #[serde(default)]
    pub static_dir: Option<String>,
    /// 요청 본문 최대 크기 (바이트)
    pub body_limit_bytes: usize,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
            body_limit_bytes: 2 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite 연결 URL
    pub url: String,
    /// 최대 연결 수
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pillbox.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 토큰 서명 시크릿 (미설정 시 개발용 기본값)
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// 병원 사용자 토큰 유효 시간 (시간)
    pub hospital_token_ttl_hours: i64,
    /// EMS 토큰 유효 시간 (시간)
    pub ems_token_ttl_hours: i64,
    /// 토큰 쿠키 이름
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            hospital_token_ttl_hours: 12,
            ems_token_ttl_hours: 8,
            cookie_name: "pillbox_token".to_string(),
        }
    }
}

impl AuthConfig {
    /// 서명 시크릿. 설정이 없으면 개발용 기본값을 반환합니다.
    pub fn secret(&self) -> &str {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(INSECURE_DEV_SECRET)
    }

    /// 개발용 기본 시크릿을 사용 중인지.
    pub fn is_insecure(&self) -> bool {
        self.secret() == INSECURE_DEV_SECRET
    }
}

/// 감사 로그 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 조회 최대 건수
    pub read_limit: usize,
    /// 요청 본문을 담는 상세 내용 최대 문자 수
    pub detail_max_chars: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            read_limit: crate::domain::DEFAULT_AUDIT_READ_LIMIT,
            detail_max_chars: crate::domain::DETAIL_MAX_CHARS,
        }
    }
}

/// 첫 실행 부트스트랩 설정.
///
/// 사용자 테이블이 비어 있으면 관리자를, EMS 테이블이 비어 있으면
/// 데모 유닛을 생성합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// 부트스트랩 활성화
    pub enabled: bool,
    /// 기본 관리자 사용자명
    pub admin_username: String,
    /// 기본 관리자 비밀번호
    pub admin_password: String,
    /// 데모 EMS 유닛 ID (빈 문자열이면 생성하지 않음)
    pub ems_unit_id: String,
    /// 데모 EMS 유닛 코드
    pub ems_unit_code: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_password: "adminpass".to_string(),
            ems_unit_id: "EMS-1".to_string(),
            ems_unit_code: "ems123".to_string(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "pillbox_api=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아닙니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("PILLBOX")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.apply_legacy_env();
        Ok(config)
    }

    /// `PILLBOX_CONFIG` 경로(기본 `config/default.toml`)에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var("PILLBOX_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load(path)
    }

    /// 레거시 환경 변수 반영.
    fn apply_legacy_env(&mut self) {
        if let Ok(secret) = std::env::var("PILLBOX_JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = Some(secret);
            }
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// `host:port` 바인딩 주소.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.body_limit_bytes, 2 * 1024 * 1024);
        assert_eq!(config.auth.hospital_token_ttl_hours, 12);
        assert_eq!(config.auth.ems_token_ttl_hours, 8);
        assert_eq!(config.auth.cookie_name, "pillbox_token");
        assert_eq!(config.audit.read_limit, 1000);
        assert_eq!(config.audit.detail_max_chars, 500);
    }

    #[test]
    fn test_secret_fallback_is_flagged() {
        let mut auth = AuthConfig::default();
        assert!(auth.is_insecure());
        assert_eq!(auth.secret(), INSECURE_DEV_SECRET);

        auth.jwt_secret = Some(String::new());
        assert!(auth.is_insecure());

        auth.jwt_secret = Some("a-real-secret-from-the-vault".to_string());
        assert!(!auth.is_insecure());
        assert_eq!(auth.secret(), "a-real-secret-from-the-vault");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("pillbox-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            host = "0.0.0.0"
            port = 8088
            body_limit_bytes = 1024
            request_timeout_secs = 5

            [audit]
            read_limit = 50
            detail_max_chars = 100
            "#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.audit.read_limit, 50);
        // 파일에 없는 섹션은 기본값
        assert_eq!(config.auth.ems_token_ttl_hours, 8);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/pillbox.toml").unwrap();
        assert_eq!(config.database.max_connections, 5);
    }
}
