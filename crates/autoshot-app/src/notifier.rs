//! 소리/데스크톱 알림 어댑터.
//!
//! `NotificationPort` 구현. 카운트다운 틱과 완료 이벤트를 설정된 소리로 매핑한다.
//! - `"None"`: 무음
//! - `"Beep"` 또는 그 외 이름: 터미널 벨
//!
//! 완료 시 데스크톱 알림(notify-rust)을 켜 두면 소리 이름을 알림 사운드로 넘긴다.

use std::io::{Stderr, Write};

use async_trait::async_trait;
use autoshot_core::config::{NotificationConfig, SOUND_BEEP, SOUND_NONE};
use autoshot_core::error::CoreError;
use autoshot_core::models::notification::NotificationEvent;
use autoshot_core::ports::notifier::NotificationPort;
use notify_rust::Notification;
use parking_lot::Mutex;
use tracing::{debug, warn};

const BELL: &[u8] = b"\x07";

/// 소리 설정 해석 결과
#[derive(Debug, Clone, PartialEq, Eq)]
enum Sound {
    Silent,
    Bell,
    Named(String),
}

impl Sound {
    fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(SOUND_NONE) {
            Self::Silent
        } else if name.eq_ignore_ascii_case(SOUND_BEEP) {
            Self::Bell
        } else {
            Self::Named(name.to_string())
        }
    }
}

/// 소리 알림기
///
/// 설정은 실행 시작마다 `apply_settings`로 교체된다.
pub struct SoundNotifier<W: Write + Send = Stderr> {
    config: Mutex<NotificationConfig>,
    out: Mutex<W>,
}

impl SoundNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self::with_writer(config, std::io::stderr())
    }
}

impl<W: Write + Send> SoundNotifier<W> {
    /// 벨 출력 대상을 지정해 생성
    pub fn with_writer(config: NotificationConfig, out: W) -> Self {
        Self {
            config: Mutex::new(config),
            out: Mutex::new(out),
        }
    }

    fn ring(&self, sound: &Sound) -> Result<(), CoreError> {
        if *sound == Sound::Silent {
            return Ok(());
        }
        let mut out = self.out.lock();
        out.write_all(BELL)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send + 'static> NotificationPort for SoundNotifier<W> {
    async fn emit(&self, event: NotificationEvent) -> Result<(), CoreError> {
        let config = self.config.lock().clone();
        let sound = match event {
            NotificationEvent::CountdownTick => Sound::parse(&config.countdown_sound),
            NotificationEvent::Completed => Sound::parse(&config.completion_sound),
        };
        debug!(event = %event, ?sound, "알림");

        if event == NotificationEvent::Completed && config.desktop_notification {
            let sound_name = match &sound {
                Sound::Named(name) => Some(name.clone()),
                _ => None,
            };
            let shown = tokio::task::spawn_blocking(move || show_completed(sound_name.as_deref()))
                .await
                .map_err(|e| CoreError::Internal(format!("알림 태스크 실패: {e}")))?;
            match shown {
                // 데스크톱 알림이 소리를 대신함
                Ok(()) if matches!(sound, Sound::Named(_)) => return Ok(()),
                Ok(()) => {}
                Err(e) => warn!("{e}"),
            }
        }

        self.ring(&sound)
    }

    fn apply_settings(&self, config: &NotificationConfig) {
        *self.config.lock() = config.clone();
    }
}

fn show_completed(sound_name: Option<&str>) -> Result<(), CoreError> {
    let mut notification = Notification::new();
    notification
        .summary("autoshot")
        .body("캡처 완료")
        .appname("autoshot");
    if let Some(name) = sound_name {
        notification.sound_name(name);
    }
    notification
        .show()
        .map(|_| ())
        .map_err(|e| CoreError::Internal(format!("알림 표시 실패: {e}")))
}
