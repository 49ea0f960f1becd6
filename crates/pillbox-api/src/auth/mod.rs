//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`TokenService`]: JWT 발급/검증
//! - [`IdentityVerifier`]: 로그인 자격증명 → [`Principal`](pillbox_core::Principal)
//! - [`Authenticated`]: Axum 인증 추출기
//! - [`require_role`] / [`require_permission`]: 역할 가드
//! - 비밀번호/유닛 코드 해싱 (Argon2)

mod jwt;
mod middleware;
mod password;
mod verifier;

pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{extract_token, require_permission, require_role, Authenticated, GuardError};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    PasswordError,
};
pub use verifier::{AuthError, IdentityVerifier};
