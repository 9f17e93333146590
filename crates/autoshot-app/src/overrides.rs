//! CLI 설정 오버라이드.
//!
//! `run`/`shot`에서는 이번 호출의 설정 스냅샷에만 적용되고,
//! `config set`에서는 설정 파일에 저장된다.

use std::path::PathBuf;
use std::sync::Arc;

use autoshot_core::config::{AppConfig, DuplicateStrategy};
use autoshot_core::config_manager::ConfigManager;
use autoshot_core::models::run::AdvanceKey;
use autoshot_core::ports::settings::SettingsSource;
use clap::Args;

/// 설정 오버라이드 플래그
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// 최대 캡처 횟수 (1~999)
    #[arg(long, short = 'n')]
    pub max_count: Option<u32>,

    /// 캡처 간격 (초)
    #[arg(long, short = 'i')]
    pub interval: Option<f64>,

    /// 시작 전 대기 (초)
    #[arg(long, short = 'd')]
    pub delay: Option<f64>,

    /// 캡처 후 전송할 키 (left, right, down, up 또는 macOS 키코드 123~126)
    #[arg(long, short = 'k')]
    pub key: Option<AdvanceKey>,

    /// 저장 폴더 (빈 문자열이면 데스크톱)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// 파일명 접두사
    #[arg(long)]
    pub prefix: Option<String>,

    /// 실행마다 타임스탬프 하위 폴더 생성
    #[arg(long, value_name = "BOOL")]
    pub session_folder: Option<bool>,

    /// 직전 캡처와 같으면 정지
    #[arg(long, value_name = "BOOL")]
    pub detect_duplicate: Option<bool>,

    /// 중복 판정 임계값 (0.0~1.0)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// 중복 판정 전략 (exact, perceptual)
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<DuplicateStrategy>,

    /// 카운트다운 소리 ("None", "Beep", 사운드 이름)
    #[arg(long)]
    pub countdown_sound: Option<String>,

    /// 완료 소리
    #[arg(long)]
    pub completion_sound: Option<String>,

    /// 완료 시 데스크톱 알림
    #[arg(long, value_name = "BOOL")]
    pub desktop_notification: Option<bool>,
}

impl ConfigOverrides {
    /// 지정된 값만 덮어쓰기
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(v) = self.max_count {
            config.capture.max_count = v;
        }
        if let Some(v) = self.interval {
            config.capture.interval_secs = v;
        }
        if let Some(v) = self.delay {
            config.capture.initial_delay_secs = v;
        }
        if let Some(v) = self.key {
            config.capture.advance_key = v;
        }
        if let Some(v) = &self.output {
            config.output.save_folder = v.to_string_lossy().into_owned();
        }
        if let Some(v) = &self.prefix {
            config.output.filename_prefix = v.clone();
        }
        if let Some(v) = self.session_folder {
            config.output.auto_create_folder = v;
        }
        if let Some(v) = self.detect_duplicate {
            config.duplicate.enabled = v;
        }
        if let Some(v) = self.threshold {
            config.duplicate.threshold = v;
        }
        if let Some(v) = self.strategy {
            config.duplicate.strategy = v;
        }
        if let Some(v) = &self.countdown_sound {
            config.notification.countdown_sound = v.clone();
        }
        if let Some(v) = &self.completion_sound {
            config.notification.completion_sound = v.clone();
        }
        if let Some(v) = self.desktop_notification {
            config.notification.desktop_notification = v;
        }
    }

    /// 오버라이드가 하나도 없는지
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_strategy(s: &str) -> Result<DuplicateStrategy, String> {
    match s.trim().to_lowercase().as_str() {
        "exact" => Ok(DuplicateStrategy::Exact),
        "perceptual" => Ok(DuplicateStrategy::Perceptual),
        other => Err(format!("알 수 없는 전략: {other} (exact, perceptual)")),
    }
}

/// 저장된 설정 위에 오버라이드를 얹은 설정 소스
pub struct OverlaySettings {
    manager: Arc<ConfigManager>,
    overrides: ConfigOverrides,
}

impl OverlaySettings {
    pub fn new(manager: Arc<ConfigManager>, overrides: ConfigOverrides) -> Self {
        Self { manager, overrides }
    }
}

impl SettingsSource for OverlaySettings {
    fn snapshot(&self) -> AppConfig {
        let mut config = self.manager.get();
        self.overrides.apply(&mut config);
        config
    }
}
