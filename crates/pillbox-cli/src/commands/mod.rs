//! CLI 명령어 구현 모듈.

pub mod accounts;
pub mod db;
pub mod export;

use anyhow::{Context, Result};

use pillbox_api::repository::SqliteStore;
use pillbox_core::AppConfig;

/// 설정을 로드하고 `--db-url`이 있으면 덮어씁니다.
pub fn load_config(config_path: &str, db_url: Option<String>) -> Result<AppConfig> {
    let mut config = AppConfig::load(config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;
    if let Some(url) = db_url {
        config.database.url = url;
    }
    Ok(config)
}

/// 저장소 연결 후 스키마 생성.
pub async fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    let store = SqliteStore::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    store.migrate().await.context("failed to create schema")?;
    Ok(store)
}
