use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drydock_core::config::DrydockConfig;
use drydock_pipeline::CatalogPipelineBuilder;
use drydock_source::BollardImageDaemon;

mod output;

use output::OutputFormat;

/// Drydock CLI — 컨테이너 이미지/디렉토리 SBOM 스캐너
#[derive(Parser)]
#[command(name = "drydock", version, about)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, default_value = "drydock.toml")]
    config: String,

    /// 로그 레벨 (설정 파일보다 우선)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 소스를 스캔하여 카탈로그 생성
    Scan {
        /// 스캔 대상 (`docker:`, `docker-archive:`, `oci-archive:`,
        /// `oci-dir:`, `dir:` 접두어 또는 자동 추론)
        source: String,

        /// 레이어 스코프 (squashed, all-layers)
        #[arg(short, long)]
        scope: Option<String>,

        /// 출력 형식 (json, table)
        #[arg(short, long, default_value = "json")]
        output: String,
    },
    /// 설정 관련 명령
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 설정 파일을 검증
    Validate,
    /// 적용될 설정을 출력
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config).await?;
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    init_tracing(&config);

    match cli.command {
        Commands::Scan {
            source,
            scope,
            output,
        } => handle_scan(config, source, scope, &output).await,
        Commands::Config { action } => handle_config(&cli.config, config, action),
    }
}

/// 설정 파일이 있으면 로드하고, 없으면 기본값 + 환경변수를 사용합니다.
async fn load_config(path: &str) -> Result<DrydockConfig> {
    if Path::new(path).exists() {
        DrydockConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config '{path}': {e}"))
    } else {
        let mut config = DrydockConfig::default();
        config.apply_env_overrides();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;
        Ok(config)
    }
}

fn init_tracing(config: &DrydockConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    if config.general.log_format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn handle_scan(
    mut config: DrydockConfig,
    source: String,
    scope: Option<String>,
    output: &str,
) -> Result<()> {
    if let Some(scope) = scope {
        config.source.scope = scope;
    }
    let format = OutputFormat::from_str_loose(output)
        .ok_or_else(|| anyhow::anyhow!("unknown output format '{output}' (json, table)"))?;

    let daemon = BollardImageDaemon::connect_with_socket(&config.source.docker_socket)
        .map_err(|e| anyhow::anyhow!("failed to set up docker client: {e}"))?;

    let (pipeline, bus) = CatalogPipelineBuilder::new(daemon)
        .config(config)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build pipeline: {e}"))?;

    // 파이프라인이 발행하는 이벤트를 받으려면 실행 전에 구독해야 한다
    let mut events = bus.subscribe();
    let mut errs = pipeline.run(source);

    // 채널이 닫힐 때까지 읽는다 — 값이 있으면 터미널 에러다
    let mut failure = None;
    while let Some(err) = errs.recv().await {
        failure = Some(err);
    }
    if let Some(err) = failure {
        return Err(err.into());
    }

    match events.try_recv() {
        Ok(event) => {
            tracing::info!(
                locations = event.catalog.entry_count(),
                "scan complete"
            );
            println!("{}", output::render(&event, format)?);
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!(
            "pipeline completed but no catalog event was published"
        )),
    }
}

fn handle_config(path: &str, config: DrydockConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Validate => {
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("invalid config '{path}': {e}"))?;
            println!("✓ config is valid: {path}");
            Ok(())
        }
        ConfigAction::Show => {
            let rendered = serde_json::to_string_pretty(&config)?;
            println!("{rendered}");
            Ok(())
        }
    }
}
