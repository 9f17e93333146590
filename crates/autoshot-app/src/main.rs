//! # autoshot-app
//!
//! autoshot 바이너리 진입점.
//! CLI 파싱, 어댑터 와이어링(DI), 라이프사이클 관리.

mod action_sink;
mod lifecycle;
mod notifier;
mod overrides;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use autoshot_automation::controller::{LoopController, LoopPorts};
use autoshot_automation::input_driver::{create_platform_input_driver, NoOpInputDriver};
use autoshot_automation::permission::{create_permission_check, AlwaysGranted};
use autoshot_core::config::AppConfig;
use autoshot_core::config_manager::ConfigManager;
use autoshot_core::models::run::{AdvanceKey, RunOutcome};
use autoshot_core::ports::input_driver::InputDriver;
use autoshot_core::ports::permission::PermissionCheck;
use autoshot_core::ports::settings::SettingsSource;
use autoshot_storage::destination::default_output_dir;
use autoshot_vision::capture::ScreenCapture;
use autoshot_vision::duplicate::create_duplicate_judge;

use crate::action_sink::DesktopActionSink;
use crate::lifecycle::{InterruptAction, InterruptHandler, EXIT_INTERRUPTED};
use crate::notifier::SoundNotifier;
use crate::overrides::{ConfigOverrides, OverlaySettings};

/// autoshot: 화면 캡처 후 다음 페이지로 넘기기를 반복
#[derive(Parser, Debug)]
#[command(name = "autoshot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 캡처 루프 실행 (Ctrl+C로 중지)
    Run {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// 키 입력 없이 캡처/저장만 수행
        #[arg(long)]
        dry_run: bool,
    },
    /// 1초 후 한 장만 캡처하고 키 한 번 전송
    Shot {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// 키 입력 없이 캡처/저장만 수행
        #[arg(long)]
        dry_run: bool,
    },
    /// 설정 관리
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// 사용 가능한 내비게이션 키 목록
    Keys,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 현재 설정 출력 (JSON)
    Show,
    /// 설정 파일 경로 출력
    Path,
    /// 설정 값 변경 후 저장
    Set {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// 기본 설정으로 초기화
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화: RUST_LOG가 있으면 우선
    let log_filter = format!(
        "autoshot={level},autoshot_core={level},autoshot_vision={level},\
         autoshot_storage={level},autoshot_automation={level}",
        level = cli.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let manager = Arc::new(open_config(cli.config_file)?);

    match cli.command {
        Command::Run { overrides, dry_run } => run_loop(manager, overrides, dry_run).await,
        Command::Shot { overrides, dry_run } => single_shot(manager, overrides, dry_run).await,
        Command::Config { action } => handle_config(&manager, action),
        Command::Keys => {
            print_keys();
            Ok(())
        }
    }
}

fn open_config(path: Option<PathBuf>) -> Result<ConfigManager> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    }
    .context("설정 로드 실패")?;
    info!("설정 파일: {}", manager.config_path().display());
    Ok(manager)
}

/// 어댑터를 조립해 제어기 생성
fn build_controller(settings: Arc<dyn SettingsSource>, dry_run: bool) -> LoopController {
    let config: AppConfig = settings.snapshot().sanitized();

    let (input, permission): (Arc<dyn InputDriver>, Arc<dyn PermissionCheck>) = if dry_run {
        info!("드라이런 모드: 키 입력 없음");
        (Arc::new(NoOpInputDriver), Arc::new(AlwaysGranted))
    } else {
        (
            Arc::from(create_platform_input_driver()),
            Arc::from(create_permission_check()),
        )
    };

    info!(platform = input.platform(), "캡처 루프 구성");

    let ports = LoopPorts {
        capture: Arc::new(ScreenCapture::new()),
        actions: Arc::new(DesktopActionSink::new(input)),
        notifier: Arc::new(SoundNotifier::new(config.notification.clone())),
        permission,
        settings,
        judges: Arc::new(create_duplicate_judge),
    };
    LoopController::new(ports, default_output_dir())
}

async fn run_loop(manager: Arc<ConfigManager>, overrides: ConfigOverrides, dry_run: bool) -> Result<()> {
    let settings: Arc<dyn SettingsSource> = Arc::new(OverlaySettings::new(manager, overrides));
    let controller = Arc::new(build_controller(settings, dry_run));

    let signals = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            let handler = InterruptHandler::new();
            let listened = handler
                .listen(|action| match action {
                    InterruptAction::Stop => {
                        println!("중지하는 중 (한 번 더 누르면 강제 종료)");
                        controller.stop();
                    }
                    InterruptAction::Exit => {
                        warn!("강제 종료");
                        std::process::exit(EXIT_INTERRUPTED);
                    }
                })
                .await;
            if let Err(e) = listened {
                warn!("시그널 핸들러 등록 실패: {e}");
            }
        })
    };

    let run_id = controller.start().await?;
    println!("캡처 시작 (run {run_id}), Ctrl+C로 중지");

    let report = controller.wait().await;
    signals.abort();

    match report {
        Some(report) => {
            let reason = match report.outcome {
                RunOutcome::Completed => "최대 횟수 도달",
                RunOutcome::DuplicateDetected => "중복 화면 감지",
                RunOutcome::Cancelled => "사용자 중지",
            };
            println!("캡처 종료: {} ({}장)", reason, report.shot_count);
            if let Some(folder) = report.session_folder {
                println!("저장 폴더: {}", folder.display());
            }
        }
        None => warn!("실행 결과를 회수하지 못함"),
    }
    Ok(())
}

async fn single_shot(
    manager: Arc<ConfigManager>,
    overrides: ConfigOverrides,
    dry_run: bool,
) -> Result<()> {
    let settings: Arc<dyn SettingsSource> = Arc::new(OverlaySettings::new(manager, overrides));
    let controller = build_controller(settings, dry_run);

    let saved = controller
        .take_single_shot()?
        .await
        .context("단발 캡처 태스크 실패")?;
    match saved {
        Some(path) => println!("저장: {}", path.display()),
        None => println!("캡처 실패, 로그를 확인하세요"),
    }
    Ok(())
}

fn handle_config(manager: &ConfigManager, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&manager.get())?);
        }
        ConfigAction::Path => {
            println!("{}", manager.config_path().display());
        }
        ConfigAction::Set { overrides } => {
            if overrides.is_empty() {
                anyhow::bail!("변경할 설정이 없습니다 (autoshot config set --help)");
            }
            let updated = manager.update_with(|config| overrides.apply(config))?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        ConfigAction::Reset => {
            manager.reset()?;
            println!("설정 초기화 완료: {}", manager.config_path().display());
        }
    }
    Ok(())
}

fn print_keys() {
    for key in AdvanceKey::ALL {
        println!(
            "{:<6} {:<8} (keycode {})",
            key.key_name(),
            key.display_name(),
            key.mac_keycode()
        );
    }
}
