//! 데이터베이스 초기화 명령어.
//!
//! ```bash
//! pillbox init-db
//! pillbox init-db --db-url sqlite://data/pillbox.db?mode=rwc
//! ```

use anyhow::Result;
use tracing::info;

use pillbox_api::services::{ensure_bootstrap, BootstrapReport};
use pillbox_core::AppConfig;

use super::open_store;

/// 스키마를 만들고 비어 있는 테이블에 기본 계정을 넣습니다.
pub async fn init_db(config: &AppConfig) -> Result<BootstrapReport> {
    let store = open_store(config).await?;
    let report = ensure_bootstrap(&store, &config.bootstrap).await?;

    info!(
        url = %config.database.url,
        admin_created = report.admin_created,
        ems_created = report.ems_created,
        "Database initialized"
    );
    Ok(report)
}
