//! Pillbox EHR 관리 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 스키마 생성 + 기본 계정 시드
//! pillbox init-db
//!
//! # 간호사 계정 생성
//! pillbox create-user -u nurse1 -p secret -r nurse
//!
//! # EMS 유닛 계정 생성
//! pillbox create-ems-account --unit-id EMS-7 --unit-code 4821
//!
//! # 프로필 백업
//! pillbox --db-url sqlite://data/pillbox.db export -o backup/profiles.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use pillbox_core::AppConfig;

use pillbox_cli::accounts::{create_ems_account, create_user};
use pillbox_cli::db::init_db;
use pillbox_cli::export::export_profiles;
use pillbox_cli::{load_config, open_store};

#[derive(Parser)]
#[command(name = "pillbox")]
#[command(about = "Pillbox EHR CLI - 계정 및 데이터 관리 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, global = true, env = "PILLBOX_CONFIG", default_value = "config/default.toml")]
    config: String,

    /// 데이터베이스 URL (설정 파일 값을 덮어씀)
    #[arg(long, global = true)]
    db_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 스키마 생성 및 부트스트랩 계정 시드 (테이블이 비어 있을 때만)
    InitDb,

    /// 병원 사용자 생성
    CreateUser {
        /// 사용자 이름
        #[arg(short, long)]
        username: String,

        /// 비밀번호
        #[arg(short, long)]
        password: String,

        /// 역할 (admin, doctor, nurse, ems, viewer). 생략 시 viewer
        #[arg(short, long)]
        role: Option<String>,
    },

    /// EMS 유닛 계정 생성
    CreateEmsAccount {
        /// 유닛 ID (예: EMS-7)
        #[arg(long)]
        unit_id: String,

        /// 유닛 코드
        #[arg(long)]
        unit_code: String,
    },

    /// 모든 프로필을 JSON으로 내보내기
    Export {
        /// 출력 파일 경로 (생략 시 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 트레이싱 초기화 (stdout은 export 출력용이므로 stderr 사용)
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(&cli.config, cli.db_url)?;

    let result = run(cli.command, &config).await;
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            let report = init_db(config).await?;
            println!(
                "Database ready (admin created: {}, ems created: {})",
                report.admin_created, report.ems_created
            );
        }
        Commands::CreateUser {
            username,
            password,
            role,
        } => {
            let store = open_store(config).await?;
            let user = create_user(&store, &username, &password, role.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Commands::CreateEmsAccount { unit_id, unit_code } => {
            let store = open_store(config).await?;
            let id = create_ems_account(&store, &unit_id, &unit_code).await?;
            println!("Created EMS account {id} for unit {unit_id}");
        }
        Commands::Export { output } => {
            let store = open_store(config).await?;
            let count = export_profiles(&store, output.as_deref()).await?;
            info!(count, "Export finished");
        }
    }
    Ok(())
}
