//! 캡처 실행(run) 모델.
//!
//! `RunConfig`는 `start()` 시점에 설정 스냅샷으로부터 한 번 만들어지며,
//! 실행 도중 설정 저장소가 바뀌어도 다시 읽지 않는다.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, DuplicateStrategy, NotificationConfig};
use crate::error::CoreError;

/// 캡처 후 전송하는 내비게이션 키
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceKey {
    Left,
    Right,
    #[default]
    Down,
    Up,
}

impl AdvanceKey {
    /// 지원하는 모든 키
    pub const ALL: [AdvanceKey; 4] = [Self::Left, Self::Right, Self::Down, Self::Up];

    /// macOS 가상 키코드 (kVK_LeftArrow 등)
    pub fn mac_keycode(&self) -> u16 {
        match self {
            Self::Left => 123,
            Self::Right => 124,
            Self::Down => 125,
            Self::Up => 126,
        }
    }

    /// `InputDriver`에 넘기는 키 이름
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Down => "down",
            Self::Up => "up",
        }
    }

    /// 표시용 이름
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Left => "← Left",
            Self::Right => "→ Right",
            Self::Down => "↓ Down",
            Self::Up => "↑ Up",
        }
    }
}

impl FromStr for AdvanceKey {
    type Err = CoreError;

    /// 키 이름 또는 macOS 키코드(123~126)를 허용
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if let Ok(code) = normalized.parse::<u16>() {
            return Self::ALL
                .into_iter()
                .find(|k| k.mac_keycode() == code)
                .ok_or_else(|| CoreError::Validation {
                    field: "advance_key".to_string(),
                    message: format!("알 수 없는 키코드: {code}"),
                });
        }
        match normalized.as_str() {
            "left" | "leftarrow" => Ok(Self::Left),
            "right" | "rightarrow" => Ok(Self::Right),
            "down" | "downarrow" => Ok(Self::Down),
            "up" | "uparrow" => Ok(Self::Up),
            other => Err(CoreError::Validation {
                field: "advance_key".to_string(),
                message: format!("알 수 없는 키: {other}"),
            }),
        }
    }
}

impl std::fmt::Display for AdvanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key_name())
    }
}

/// 저장 위치 정책
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationPolicy {
    /// 고정 디렉토리에 바로 저장
    Directory(PathBuf),
    /// 실행 시작 시 `base` 아래에 타임스탬프 하위 폴더 생성
    SessionSubfolder {
        /// 하위 폴더의 부모 (생성 실패 시 폴백 위치)
        base: PathBuf,
    },
}

impl DestinationPolicy {
    /// 세션 폴더가 없을 때 저장할 디렉토리
    pub fn base_dir(&self) -> &Path {
        match self {
            Self::Directory(dir) => dir,
            Self::SessionSubfolder { base } => base,
        }
    }

    /// 세션 폴더 생성 여부
    pub fn wants_session_folder(&self) -> bool {
        matches!(self, Self::SessionSubfolder { .. })
    }
}

/// 한 번의 실행에 고정되는 설정
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// 매 반복 후 전송할 키
    pub advance_key: AdvanceKey,
    /// 최대 반복 횟수 (>= 1)
    pub max_iterations: u32,
    /// 시작 전 대기 (초, >= 0)
    pub initial_delay_secs: f64,
    /// 반복 사이 대기 (초, >= 0)
    pub interval_secs: f64,
    /// 중복 감지 활성화
    pub duplicate_detection_enabled: bool,
    /// 중복 판정 임계값 (의미는 판정 전략이 정의)
    pub duplicate_threshold: f64,
    /// 중복 판정 전략
    pub duplicate_strategy: DuplicateStrategy,
    /// 파일명 접두사
    pub filename_prefix: String,
    /// 저장 위치 정책
    pub destination_policy: DestinationPolicy,
    /// 카운트다운/완료 소리
    pub notification: NotificationConfig,
}

impl RunConfig {
    /// 설정 스냅샷으로부터 실행 설정 생성
    ///
    /// `default_output_dir`는 저장 폴더가 비어 있을 때 사용하는 플랫폼 기본 위치.
    pub fn from_app_config(config: &AppConfig, default_output_dir: &Path) -> Self {
        let base = config
            .output
            .save_folder()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_dir.to_path_buf());

        let destination_policy = if config.output.auto_create_folder {
            DestinationPolicy::SessionSubfolder { base }
        } else {
            DestinationPolicy::Directory(base)
        };

        Self {
            advance_key: config.capture.advance_key,
            max_iterations: config.capture.max_count.max(1),
            initial_delay_secs: config.capture.initial_delay_secs.max(0.0),
            interval_secs: config.capture.interval_secs.max(0.0),
            duplicate_detection_enabled: config.duplicate.enabled,
            duplicate_threshold: config.duplicate.threshold,
            duplicate_strategy: config.duplicate.strategy,
            filename_prefix: config.output.filename_prefix().to_string(),
            destination_policy,
            notification: config.notification.clone(),
        }
    }

    /// 카운트다운 초 (소수점 버림)
    pub fn countdown_secs(&self) -> u64 {
        if self.initial_delay_secs > 0.0 {
            self.initial_delay_secs.floor() as u64
        } else {
            0
        }
    }

    /// 반복 사이 대기 시간 (표현 범위를 넘으면 `Duration::MAX`)
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// 실행 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// 최대 반복 횟수 도달
    Completed,
    /// 직전 프레임과 중복: 의도된 정상 종료
    DuplicateDetected,
    /// `stop()` 또는 새 실행에 의해 취소됨
    Cancelled,
}

/// 종료된 실행의 요약
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// 실행 식별자
    pub run_id: String,
    /// 종료 사유
    pub outcome: RunOutcome,
    /// 완료된 반복 수
    pub shot_count: u32,
    /// 이 실행에서 만든 세션 폴더
    pub session_folder: Option<PathBuf>,
}
