//! Market data collector CLI.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use markets_core::{init_logging, AssetClass};
use markets_collector::{export, Pipeline, PipelineConfig, RunSummary};
use markets_data::RecordStore;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "markets-collector")]
#[command(about = "Stocks, crypto and forex ETL collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (기본: config/pipeline.toml, 없으면 기본값)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 테이블 생성 (stocks, crypto, forex)
    InitDb,

    /// 활성화된 레인을 한 번 실행
    Run,

    /// 레인 하나만 실행
    Lane {
        /// stocks | crypto | forex
        asset: AssetClass,
    },

    /// 데몬 모드: 주기적으로 전체 레인 실행
    Daemon,

    /// 테이블별 행 수 출력
    Counts,

    /// 테이블을 CSV로 내보내기
    Export {
        /// stocks | crypto | forex
        #[arg(long)]
        table: AssetClass,

        /// 출력 파일 경로
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    init_logging(config.logging.to_log_config(cli.log_level.as_deref()))?;

    tracing::info!("Markets Collector 시작");
    tracing::debug!(database_url = %config.database.url, "설정 로드 완료");

    let store = RecordStore::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;
    store.create_tables().await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("종료 신호 수신");
            on_signal.cancel();
        }
    });
    let pipeline = Pipeline::new(config, store.clone(), cancel);

    let outcome = execute(cli.command, &pipeline, &store).await;

    store.pool().close().await;
    tracing::info!("Markets Collector 종료");
    outcome
}

async fn execute(
    command: Commands,
    pipeline: &Pipeline,
    store: &RecordStore,
) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            tracing::info!("테이블 초기화 완료");
        }
        Commands::Run => {
            let summary = pipeline.run_all().await;
            ensure_success(&summary)?;
        }
        Commands::Lane { asset } => {
            let report = pipeline.run_lane(asset).await;
            report.log_summary();
            if !report.is_success() {
                bail!(
                    "{} 레인 실패: {}",
                    asset,
                    report.error.as_deref().unwrap_or("unknown")
                );
            }
        }
        Commands::Daemon => {
            let interval = pipeline.config().schedule.interval();
            let runs = pipeline.run_daemon(interval).await;
            tracing::info!(runs, "데몬 종료");
        }
        Commands::Counts => {
            for (asset, count) in store.record_counts().await? {
                println!("{:<8} {}", asset.table_name(), count);
            }
        }
        Commands::Export { table, output } => {
            let count = export::export_table(store, table, &output).await?;
            println!("{}개 행 → {}", count, output.display());
        }
    }
    Ok(())
}

fn ensure_success(summary: &RunSummary) -> anyhow::Result<()> {
    let failed: Vec<String> = summary.failed().map(|r| r.asset.to_string()).collect();
    if !failed.is_empty() {
        bail!("실패한 레인: {}", failed.join(", "));
    }
    Ok(())
}
