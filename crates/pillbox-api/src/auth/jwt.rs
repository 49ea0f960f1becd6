//! JWT 토큰 발급/검증.
//!
//! 토큰은 자체 완결형입니다. 서명과 만료만 확인하며 저장소를 조회하지 않습니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use pillbox_core::{AuthConfig, Principal, Role};

/// JWT 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 주체 ID (EMS는 `ems-<id>`)
    pub sub: String,
    /// 표시 이름
    pub username: String,
    pub role: Role,
    /// EMS 유닛 ID (병원 사용자는 `null`)
    #[serde(default)]
    pub ems_unit: Option<String>,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    fn new(principal: &Principal, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            sub: principal.id.clone(),
            username: principal.display_name.clone(),
            role: principal.role,
            ems_unit: principal.ems_unit.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            display_name: self.username,
            role: self.role,
            ems_unit: self.ems_unit,
        }
    }
}

/// 토큰 에러. 모두 401로 응답됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Unauthorized")]
    Missing,
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(String),
}

/// 토큰 발급/검증 서비스.
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<SecretString>,
    hospital_ttl: Duration,
    ems_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("hospital_ttl", &self.hospital_ttl)
            .field("ems_ttl", &self.ems_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: impl Into<String>, hospital_ttl: Duration, ems_ttl: Duration) -> Self {
        Self {
            secret: Arc::new(SecretString::from(secret.into())),
            hospital_ttl,
            ems_ttl,
        }
    }

    /// `[auth]` 설정에서 생성.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.secret(),
            Duration::hours(config.hospital_token_ttl_hours),
            Duration::hours(config.ems_token_ttl_hours),
        )
    }

    /// 로그인 경로별 유효 시간 (병원 12시간, EMS 8시간이 기본).
    pub fn ttl_for(&self, principal: &Principal) -> Duration {
        if principal.is_ems() {
            self.ems_ttl
        } else {
            self.hospital_ttl
        }
    }

    /// 토큰 발급.
    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(principal, ttl, Utc::now())
    }

    /// 발급 시각을 지정해 토큰 발급.
    pub fn issue_at(
        &self,
        principal: &Principal,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(principal, ttl, now);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// 토큰 검증 후 주체 복원.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims.into_principal())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn service() -> TokenService {
        TokenService::new(TEST_SECRET, Duration::hours(12), Duration::hours(8))
    }

    fn nurse() -> Principal {
        Principal {
            id: "7".to_string(),
            display_name: "nina".to_string(),
            role: Role::Nurse,
            ems_unit: None,
        }
    }

    fn ems_unit() -> Principal {
        Principal {
            id: "ems-1".to_string(),
            display_name: "EMS-EMS-1".to_string(),
            role: Role::Ems,
            ems_unit: Some("EMS-1".to_string()),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service();
        for principal in [nurse(), ems_unit()] {
            let token = service.issue(&principal, service.ttl_for(&principal)).unwrap();
            assert_eq!(service.verify(&token).unwrap(), principal);
        }
    }

    #[test]
    fn test_ttl_per_principal_kind() {
        let service = service();
        assert_eq!(service.ttl_for(&nurse()), Duration::hours(12));
        assert_eq!(service.ttl_for(&ems_unit()), Duration::hours(8));
    }

    #[test]
    fn test_hospital_user_with_ems_role_gets_hospital_ttl() {
        let service = service();
        let medic = Principal {
            id: "9".to_string(),
            display_name: "medic".to_string(),
            role: Role::Ems,
            ems_unit: None,
        };
        assert_eq!(service.ttl_for(&medic), Duration::hours(12));
    }

    #[test]
    fn test_hospital_token_expires_after_12_hours() {
        let service = service();
        let principal = nurse();
        let ttl = service.ttl_for(&principal);

        let still_valid = service
            .issue_at(&principal, ttl, Utc::now() - Duration::hours(11))
            .unwrap();
        assert!(service.verify(&still_valid).is_ok());

        let expired = service
            .issue_at(&principal, ttl, Utc::now() - Duration::hours(12) - Duration::minutes(1))
            .unwrap();
        assert_eq!(service.verify(&expired), Err(TokenError::Expired));
    }

    #[test]
    fn test_ems_token_expires_after_8_hours() {
        let service = service();
        let principal = ems_unit();
        let ttl = service.ttl_for(&principal);

        let expired = service
            .issue_at(&principal, ttl, Utc::now() - Duration::hours(8) - Duration::minutes(1))
            .unwrap();
        assert_eq!(service.verify(&expired), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service().issue(&nurse(), Duration::hours(1)).unwrap();
        let other = TokenService::new("another-secret", Duration::hours(12), Duration::hours(8));
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert_eq!(service().verify("invalid.token.here"), Err(TokenError::Invalid));
        assert_eq!(service().verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let debug = format!("{:?}", service());
        assert!(!debug.contains(TEST_SECRET));
    }
}
