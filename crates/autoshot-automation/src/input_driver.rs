//! 입력 드라이버 구현.
//!
//! `NoOpInputDriver` (테스트/드라이런용)와 `EnigoInputDriver` (실제 키 입력)를 제공한다.
//! 캡처 루프는 내비게이션 키(방향키)만 사용하므로 키보드 전용이다.

use async_trait::async_trait;
use tracing::debug;

use autoshot_core::error::CoreError;
use autoshot_core::ports::input_driver::InputDriver;

// ============================================================
// NoOpInputDriver: 테스트/드라이런용
// ============================================================

/// No-Op 입력 드라이버: 키 입력을 로깅만 하고 실행하지 않음
///
/// `enigo` feature 비활성화 빌드와 `--dry-run` 모드에서 사용.
pub struct NoOpInputDriver;

#[async_trait]
impl InputDriver for NoOpInputDriver {
    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 누름");
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 놓음");
        Ok(())
    }

    fn platform(&self) -> &str {
        "noop"
    }
}

// ============================================================
// EnigoInputDriver: 실제 키보드 입력
// ============================================================

/// 실제 키보드 입력 드라이버 (enigo 기반)
///
/// macOS: 손쉬운 사용(Accessibility) 권한 필요
/// Linux: X11 또는 Wayland + uinput 권한 필요
#[cfg(feature = "enigo")]
pub struct EnigoInputDriver {
    /// enigo 인스턴스 (Send지만 !Sync → tokio::sync::Mutex 사용)
    enigo: tokio::sync::Mutex<enigo::Enigo>,
}

#[cfg(feature = "enigo")]
impl EnigoInputDriver {
    /// 새 EnigoInputDriver 생성
    pub fn new() -> Result<Self, CoreError> {
        let settings = enigo::Settings::default();
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| CoreError::Input(format!("입력 드라이버 초기화 실패: {e}")))?;
        Ok(Self {
            enigo: tokio::sync::Mutex::new(enigo),
        })
    }

    /// 문자열 → enigo 키 매핑
    fn parse_key(key: &str) -> Result<enigo::Key, CoreError> {
        let key = match key.to_lowercase().as_str() {
            "left" | "leftarrow" => enigo::Key::LeftArrow,
            "right" | "rightarrow" => enigo::Key::RightArrow,
            "down" | "downarrow" => enigo::Key::DownArrow,
            "up" | "uparrow" => enigo::Key::UpArrow,
            "pageup" => enigo::Key::PageUp,
            "pagedown" => enigo::Key::PageDown,
            "space" => enigo::Key::Space,
            "enter" | "return" => enigo::Key::Return,
            other => {
                return Err(CoreError::Input(format!("지원하지 않는 키: {other}")));
            }
        };
        Ok(key)
    }

    async fn key(&self, key: &str, direction: enigo::Direction) -> Result<(), CoreError> {
        use enigo::Keyboard;
        let parsed = Self::parse_key(key)?;
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(parsed, direction)
            .map_err(|e| CoreError::Input(format!("키 입력 실패 ({key}): {e}")))
    }
}

#[cfg(feature = "enigo")]
#[async_trait]
impl InputDriver for EnigoInputDriver {
    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[Enigo] 키 누름");
        self.key(key, enigo::Direction::Press).await
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[Enigo] 키 놓음");
        self.key(key, enigo::Direction::Release).await
    }

    async fn key_click(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[Enigo] 키 클릭");
        self.key(key, enigo::Direction::Click).await
    }

    fn platform(&self) -> &str {
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(target_os = "windows")]
        {
            "windows"
        }
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            "unknown"
        }
    }
}

/// 플랫폼별 입력 드라이버 생성 팩토리
///
/// `enigo` feature 활성화 시 실제 입력 드라이버 반환,
/// 비활성화 또는 초기화 실패 시 NoOp 드라이버 반환.
pub fn create_platform_input_driver() -> Box<dyn InputDriver> {
    #[cfg(feature = "enigo")]
    {
        match EnigoInputDriver::new() {
            Ok(driver) => {
                tracing::info!("실제 입력 드라이버 (enigo) 초기화 완료");
                return Box::new(driver);
            }
            Err(e) => {
                tracing::warn!("enigo 초기화 실패, NoOp 폴백: {e}");
            }
        }
    }
    Box::new(NoOpInputDriver)
}

// ============================================================
// 테스트
// ============================================================
