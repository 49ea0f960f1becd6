//! 요청 인증 추출기와 역할 가드.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
};

use pillbox_core::{Permission, Principal, Role};

use super::TokenError;
use crate::error::ApiError;
use crate::state::AppState;

/// 인증된 요청의 주체.
///
/// `Authorization: Bearer <token>`을 먼저 보고, 없으면 토큰 쿠키를 봅니다.
///
/// ```rust,ignore
/// async fn me(Authenticated(principal): Authenticated) -> Json<Principal> {
///     Json(principal)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &state.config.auth.cookie_name)
            .ok_or(TokenError::Missing)?;
        let principal = state.tokens.verify(&token)?;
        Ok(Authenticated(principal))
    }
}

/// 요청 헤더에서 토큰 추출.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// 가드 거부.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
}

/// 주체의 역할이 허용 목록에 있는지 확인.
pub fn require_role<'a>(
    principal: Option<&'a Principal>,
    allowed: &[Role],
) -> Result<&'a Principal, GuardError> {
    let principal = principal.ok_or(GuardError::Unauthorized)?;
    if allowed.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(GuardError::Forbidden)
    }
}

/// 권한 매트릭스 기준 [`require_role`].
pub fn require_permission(
    principal: Option<&Principal>,
    permission: Permission,
) -> Result<&Principal, GuardError> {
    require_role(principal, permission.allowed_roles())
}
