//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use pillbox_core::{AuditEntry, ExportedProfile, Principal, ProfileSummary, Role, UserSummary};

use crate::error::ApiErrorResponse;
use crate::routes::{
    ComponentHealth, ComponentStatus, CreateEmsAccountRequest, CreateEmsAccountResponse,
    CreateUserRequest, DeleteProfileResponse, HealthResponse, ImportResponse, LoginRequest,
    LoginResponse, LogoutResponse, UpdateProfileResponse,
};

/// `bearer_auth` 보안 스키마 등록.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

// ==================== OpenAPI 문서 정의 ====================

/// Pillbox API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pillbox EHR API",
        version = "0.2.0",
        description = r#"
# Pillbox EHR REST API

병원 직원과 EMS 유닛을 위한 환자 프로필 API입니다.

## 인증

`POST /api/auth/login`으로 토큰을 받은 뒤 `Authorization: Bearer <token>` 헤더를
포함하거나, 로그인 시 설정되는 `pillbox_token` 쿠키를 사용하세요.
병원 토큰은 12시간, EMS 토큰은 8시간 유효합니다.

## 감사

권한 확인을 거치는 모든 요청은 결과와 관계없이 감사 로그에 한 건씩 기록됩니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 로그인, 로그아웃, 현재 주체"),
        (name = "accounts", description = "계정 - 병원 사용자 및 EMS 유닛 생성"),
        (name = "profiles", description = "프로필 - 환자 프로필 CRUD 및 검색"),
        (name = "audits", description = "감사 - 감사 로그 조회"),
        (name = "transfer", description = "전송 - 프로필 내보내기/가져오기")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,
            Principal,
            Role,

            // ===== Auth =====
            LoginRequest,
            LoginResponse,
            LogoutResponse,

            // ===== Accounts =====
            CreateUserRequest,
            UserSummary,
            CreateEmsAccountRequest,
            CreateEmsAccountResponse,

            // ===== Profiles =====
            ProfileSummary,
            UpdateProfileResponse,
            DeleteProfileResponse,

            // ===== Audits / Transfer =====
            AuditEntry,
            ExportedProfile,
            ImportResponse,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,

        crate::routes::accounts::create_user,
        crate::routes::accounts::create_ems_account,

        crate::routes::profiles::list_profiles,
        crate::routes::profiles::create_profile,
        crate::routes::profiles::get_profile,
        crate::routes::profiles::update_profile,
        crate::routes::profiles::delete_profile,
        crate::routes::profiles::search_profiles,

        crate::routes::audits::list_audits,

        crate::routes::transfer::export_profiles,
        crate::routes::transfer::import_profiles,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("Pillbox EHR API"));
        assert!(json.contains("bearer_auth"));

        for path in [
            "/health/ready",
            "/api/auth/login",
            "/api/users",
            "/api/ems_accounts",
            "/api/profiles/{id}",
            "/api/search",
            "/api/audits",
            "/api/export",
            "/api/import",
        ] {
            assert!(json.contains(path), "{path}");
        }
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        for schema in ["LoginResponse", "Principal", "AuditEntry", "ApiErrorResponse"] {
            assert!(json.contains(schema), "{schema}");
        }
    }
}
