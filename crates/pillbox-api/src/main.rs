//! Pillbox EHR API 서버.
//!
//! 설정 로드 → 로깅 → 메트릭 → 저장소 연결/스키마 → 부트스트랩 → 서버 시작 순서로
//! 초기화합니다.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use pillbox_api::openapi::ApiDoc;
use pillbox_api::repository::SqliteStore;
use pillbox_api::services::ensure_bootstrap;
use pillbox_api::{build_app, setup_metrics_recorder, AppState};
use pillbox_core::{init_logging, AppConfig, LogConfig};

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력합니다. 출력했으면 `true`.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        println!("{}", serde_json::to_string_pretty(&ApiDoc::openapi())?);
        return Ok(true);
    }

    Ok(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Pillbox API server...");

    if config.auth.is_insecure() {
        warn!("PILLBOX_JWT_SECRET not set, using the built-in development secret (INSECURE)");
    }

    let metrics_handle = match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            Some(handle)
        }
        Err(e) => {
            error!(error = %e, "Failed to install metrics recorder, /metrics disabled");
            None
        }
    };

    let store = SqliteStore::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    store.migrate().await.context("failed to create schema")?;
    info!(url = %config.database.url, "Database ready");

    let report = ensure_bootstrap(&store, &config.bootstrap)
        .await
        .context("bootstrap failed")?;
    info!(
        admin_created = report.admin_created,
        ems_created = report.ems_created,
        "Bootstrap checked"
    );

    let addr = config.bind_address();
    let state = Arc::new(AppState::with_sqlite(config, store));
    let app = build_app(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM을 받으면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
