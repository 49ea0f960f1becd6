//! SQLite 저장소 구현.
//!
//! `users`, `ems_accounts`, `profiles`(이름 + 직렬화된 문서 `data`),
//! `audits` 테이블을 사용합니다.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use pillbox_core::{
    AuditEntry, DatabaseConfig, EmsAccount, HospitalUser, ImportItem, NewAuditEntry,
    NewEmsAccount, NewHospitalUser, Profile, ProfileDocument, ProfileSummary, Role, StoreError,
    StoreResult,
};

use super::{AuditStore, CredentialStore, ProfileStore};

/// 스키마. 서버 시작과 `init-db`에서 실행되며 여러 번 실행해도 안전합니다.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'viewer',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ems_accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        unit_id TEXT UNIQUE NOT NULL,
        unit_code_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        action TEXT NOT NULL,
        profile_id INTEGER,
        details TEXT,
        created_at TEXT NOT NULL
    )
    "#,
];

// ================================================================================================
// Rows
// ================================================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for HospitalUser {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            StoreError::Corrupt(format!("user {} has unknown role {:?}", row.id, row.role))
        })?;
        Ok(HospitalUser {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EmsRow {
    id: i64,
    unit_id: String,
    unit_code_hash: String,
    created_at: DateTime<Utc>,
}

impl From<EmsRow> for EmsAccount {
    fn from(row: EmsRow) -> Self {
        EmsAccount {
            id: row.id,
            unit_id: row.unit_id,
            unit_code_hash: row.unit_code_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: i64,
    name: String,
    data: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let document: ProfileDocument = serde_json::from_str(&row.data)
            .map_err(|e| StoreError::Corrupt(format!("profile {}: {}", row.id, e)))?;
        Ok(Profile {
            id: row.id,
            name: row.name,
            document,
        })
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    id: i64,
    user_id: Option<String>,
    action: String,
    profile_id: Option<i64>,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: row.id,
            actor_id: row.user_id,
            action: row.action,
            subject_id: row.profile_id,
            detail: row.details,
            created_at: row.created_at,
        }
    }
}

/// sqlx 에러 변환. 유니크 제약 위반은 `conflict` 메시지의 `Conflict`로.
fn db_err(conflict: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(conflict.to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

// ================================================================================================
// Store
// ================================================================================================

/// SQLite 기반 저장소. 세 저장소 트레이트를 모두 구현합니다.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 연결 풀 생성. 파일이 없으면 만듭니다.
    ///
    /// 메모리 DB(`sqlite::memory:`)는 연결마다 별도 DB가 되므로 연결 1개로 제한합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let in_memory = config.url.contains(":memory:");
        let max_connections = if in_memory {
            1
        } else {
            config.max_connections.max(1)
        };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // 연결이 닫히면 메모리 DB도 사라짐
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        debug!(url = %config.url, max_connections, "SQLite pool created");
        Ok(Self { pool })
    }

    /// 테이블 생성.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// 연결 확인 (readiness).
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<HospitalUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        row.map(HospitalUser::try_from).transpose()
    }

    async fn create_user(&self, user: NewHospitalUser) -> StoreResult<HospitalUser> {
        let created_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("username already exists"))?
        .last_insert_rowid();

        Ok(HospitalUser {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at,
        })
    }

    async fn count_users(&self) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(query_err)
    }

    async fn find_ems_account(&self, unit_id: &str) -> StoreResult<Option<EmsAccount>> {
        let row = sqlx::query_as::<_, EmsRow>(
            "SELECT id, unit_id, unit_code_hash, created_at FROM ems_accounts WHERE unit_id = ?",
        )
        .bind(unit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(row.map(EmsAccount::from))
    }

    async fn create_ems_account(&self, account: NewEmsAccount) -> StoreResult<EmsAccount> {
        let created_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO ems_accounts (unit_id, unit_code_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(&account.unit_id)
        .bind(&account.unit_code_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("unit_id already exists"))?
        .last_insert_rowid();

        Ok(EmsAccount {
            id,
            unit_id: account.unit_id,
            unit_code_hash: account.unit_code_hash,
            created_at,
        })
    }

    async fn count_ems_accounts(&self) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ems_accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(query_err)
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn create(&self, name: &str, document: &ProfileDocument) -> StoreResult<Profile> {
        let data = serde_json::to_string(document)?;
        let id = sqlx::query("INSERT INTO profiles (name, data, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(&data)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(query_err)?
            .last_insert_rowid();

        Ok(Profile {
            id,
            name: name.to_string(),
            document: document.clone(),
        })
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT id, name, data FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;

        row.map(Profile::try_from).transpose()
    }

    async fn replace(&self, id: i64, name: &str, document: &ProfileDocument) -> StoreResult<bool> {
        let data = serde_json::to_string(document)?;
        let result = sqlx::query("UPDATE profiles SET name = ?, data = ? WHERE id = ?")
            .bind(name)
            .bind(&data)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> StoreResult<Vec<ProfileSummary>> {
        let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM profiles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| ProfileSummary { id, name })
            .collect())
    }

    async fn all(&self) -> StoreResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>("SELECT id, name, data FROM profiles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;

        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn insert_many(&self, items: &[ImportItem]) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;
        let now = Utc::now();

        for item in items {
            let data = serde_json::to_string(&item.document)?;
            sqlx::query("INSERT INTO profiles (name, data, created_at) VALUES (?, ?, ?)")
                .bind(&item.name)
                .bind(&data)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;
        Ok(items.len())
    }
}

#[async_trait]
impl AuditStore for SqliteStore {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<i64> {
        let id = sqlx::query(
            "INSERT INTO audits (user_id, action, profile_id, details, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.actor_id)
        .bind(&entry.action)
        .bind(entry.subject_id)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_err)?
        .last_insert_rowid();

        Ok(id)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, user_id, action, profile_id, details, created_at
            FROM audits
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
