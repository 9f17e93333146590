//! 애플리케이션 설정 구조체.
//!
//! 캡처 동작, 저장 위치, 중복 감지, 알림 소리 설정을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드되며, 캡처 루프는
//! `start()` 시점의 스냅샷만 사용한다.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::run::AdvanceKey;

/// 최대 반복 횟수 상한
pub const MAX_COUNT_LIMIT: u32 = 999;

/// 파일명 접두사 기본값
pub const DEFAULT_FILENAME_PREFIX: &str = "capture";

/// 소리 없음
pub const SOUND_NONE: &str = "None";

/// 시스템 비프음
pub const SOUND_BEEP: &str = "Beep";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 캡처 루프 동작 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 저장 설정
    #[serde(default)]
    pub output: OutputConfig,
    /// 중복 감지 설정
    #[serde(default)]
    pub duplicate: DuplicateConfig,
    /// 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
}

// ============================================================
// 캡처 동작 설정
// ============================================================

/// 캡처 동작 설정: 키, 횟수, 대기 시간
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 후 전송할 키
    #[serde(default)]
    pub advance_key: AdvanceKey,
    /// 최대 캡처 횟수 (1 ~ 999)
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    /// 시작 전 대기 시간 (초)
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,
    /// 캡처 간격 (초)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            advance_key: AdvanceKey::default(),
            max_count: default_max_count(),
            initial_delay_secs: default_initial_delay_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

// ============================================================
// 저장 설정
// ============================================================

/// 저장 설정: 폴더, 세션 폴더 자동 생성, 파일명 접두사
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 저장 폴더 (빈 문자열이면 플랫폼 기본 위치: 데스크톱)
    #[serde(default)]
    pub save_folder: String,
    /// 실행 시작 시 날짜/시간 이름의 하위 폴더 생성
    #[serde(default)]
    pub auto_create_folder: bool,
    /// 파일명 접두사
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

impl OutputConfig {
    /// 설정된 저장 폴더 (비어 있으면 `None`)
    pub fn save_folder(&self) -> Option<&Path> {
        let trimmed = self.save_folder.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Path::new(trimmed))
        }
    }

    /// 파일명 접두사 (비어 있으면 기본값)
    pub fn filename_prefix(&self) -> &str {
        let trimmed = self.filename_prefix.trim();
        if trimmed.is_empty() {
            DEFAULT_FILENAME_PREFIX
        } else {
            trimmed
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_folder: String::new(),
            auto_create_folder: false,
            filename_prefix: default_filename_prefix(),
        }
    }
}

// ============================================================
// 중복 감지 설정
// ============================================================

/// 중복 판정 전략
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    /// PNG 인코딩 바이트 완전 일치
    #[default]
    Exact,
    /// 타일 단위 변경 비율 비교 (임계값 사용)
    Perceptual,
}

/// 중복 감지 설정: 직전 캡처와 같으면 정지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// 중복 감지 시 정지
    #[serde(default)]
    pub enabled: bool,
    /// 판정 임계값 (0.00 = 완전 일치, 클수록 관대)
    #[serde(default = "default_duplicate_threshold")]
    pub threshold: f64,
    /// 판정 전략
    #[serde(default)]
    pub strategy: DuplicateStrategy,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_duplicate_threshold(),
            strategy: DuplicateStrategy::default(),
        }
    }
}

// ============================================================
// 알림 설정
// ============================================================

/// 알림 설정: 카운트다운/완료 소리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 카운트다운 소리 ("None", "Beep" 또는 사운드 이름)
    #[serde(default = "default_countdown_sound")]
    pub countdown_sound: String,
    /// 완료 소리
    #[serde(default = "default_completion_sound")]
    pub completion_sound: String,
    /// 완료 시 데스크톱 알림 표시
    #[serde(default)]
    pub desktop_notification: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            countdown_sound: default_countdown_sound(),
            completion_sound: default_completion_sound(),
            desktop_notification: false,
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            capture: CaptureConfig::default(),
            output: OutputConfig::default(),
            duplicate: DuplicateConfig::default(),
            notification: NotificationConfig::default(),
        }
    }

    /// 범위를 벗어난 값을 보정한 설정 반환
    ///
    /// 보정이 일어난 필드는 경고 로그를 남긴다.
    pub fn sanitized(mut self) -> Self {
        let max_count = self.capture.max_count.clamp(1, MAX_COUNT_LIMIT);
        if max_count != self.capture.max_count {
            warn!(
                "max_count 범위 초과 ({}), {}로 보정",
                self.capture.max_count, max_count
            );
            self.capture.max_count = max_count;
        }

        if !self.capture.initial_delay_secs.is_finite() || self.capture.initial_delay_secs < 0.0 {
            warn!(
                "initial_delay_secs 값 오류 ({}), 0으로 보정",
                self.capture.initial_delay_secs
            );
            self.capture.initial_delay_secs = 0.0;
        }

        if !self.capture.interval_secs.is_finite() || self.capture.interval_secs < 0.0 {
            warn!(
                "interval_secs 값 오류 ({}), 0으로 보정",
                self.capture.interval_secs
            );
            self.capture.interval_secs = 0.0;
        }

        let threshold = if self.duplicate.threshold.is_finite() {
            self.duplicate.threshold.clamp(0.0, 1.0)
        } else {
            default_duplicate_threshold()
        };
        if threshold != self.duplicate.threshold {
            warn!(
                "duplicate.threshold 범위 초과 ({}), {}로 보정",
                self.duplicate.threshold, threshold
            );
            self.duplicate.threshold = threshold;
        }

        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn default_max_count() -> u32 {
    50
}
fn default_initial_delay_secs() -> f64 {
    5.0
}
fn default_interval_secs() -> f64 {
    1.0
}
fn default_filename_prefix() -> String {
    DEFAULT_FILENAME_PREFIX.to_string()
}
fn default_duplicate_threshold() -> f64 {
    0.05
}
fn default_countdown_sound() -> String {
    SOUND_BEEP.to_string()
}
fn default_completion_sound() -> String {
    SOUND_NONE.to_string()
}
