//! 프로필 내보내기 명령어.
//!
//! HTTP `/api/export`와 같은 `[{id, name, profile}]` 형식을 파일 또는 stdout으로 씁니다.
//!
//! ```bash
//! pillbox export -o backup/profiles.json
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use pillbox_api::repository::ProfileStore;
use pillbox_core::ExportedProfile;

/// 저장된 모든 프로필을 ID 순서로 수집합니다.
pub async fn collect_profiles(store: &dyn ProfileStore) -> Result<Vec<ExportedProfile>> {
    let profiles = store.all().await?;
    Ok(profiles
        .into_iter()
        .map(|p| ExportedProfile {
            id: p.id,
            name: p.name,
            profile: p.document,
        })
        .collect())
}

/// 내보내기 실행. 쓴 프로필 수를 반환합니다.
pub async fn export_profiles(store: &dyn ProfileStore, output: Option<&Path>) -> Result<usize> {
    let exported = collect_profiles(store).await?;
    let json = serde_json::to_string_pretty(&exported)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(count = exported.len(), path = %path.display(), "Profiles exported");
        }
        None => println!("{json}"),
    }

    Ok(exported.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillbox_api::repository::MemoryStore;
    use serde_json::{json, Value};

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        for name in ["Jane", "John"] {
            let document = json!({"name": name, "status": "Admitted"});
            let Value::Object(document) = document else {
                unreachable!()
            };
            store.create(name, &document).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_collect_profiles_keeps_id_order() {
        let store = seeded_store().await;
        let exported = collect_profiles(&store).await.unwrap();

        assert_eq!(exported.len(), 2);
        assert!(exported[0].id < exported[1].id);
        assert_eq!(exported[0].name, "Jane");
        assert_eq!(exported[1].profile["status"], "Admitted");
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let store = seeded_store().await;
        let dir = std::env::temp_dir().join(format!("pillbox-export-{}", std::process::id()));
        let path = dir.join("profiles.json");

        let count = export_profiles(&store, Some(&path)).await.unwrap();
        assert_eq!(count, 2);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[1]["name"], "John");
        assert_eq!(written[0]["profile"]["name"], "Jane");

        std::fs::remove_dir_all(&dir).ok();
    }
}
