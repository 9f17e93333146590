//! 스크린 캡처.
//!
//! xcap 기반 주 모니터 캡처. xcap 호출은 블로킹이므로
//! `spawn_blocking`으로 런타임 워커를 막지 않는다.

use async_trait::async_trait;
use autoshot_core::error::CoreError;
use autoshot_core::models::frame::CapturedFrame;
use autoshot_core::ports::capture::CaptureSource;
use chrono::Local;
use tracing::debug;
use xcap::Monitor;

/// 스크린 캡처: xcap 기반
pub struct ScreenCapture;

impl ScreenCapture {
    /// 새 캡처 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 주 모니터 스크린 캡처 (블로킹)
    ///
    /// 주 모니터를 찾지 못하면 첫 번째 모니터를 사용한다.
    pub fn capture_primary(&self) -> Result<CapturedFrame, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        let mut fallback = None;
        let mut primary = None;
        for monitor in monitors {
            if monitor.is_primary().unwrap_or(false) {
                primary = Some(monitor);
                break;
            }
            if fallback.is_none() {
                fallback = Some(monitor);
            }
        }

        let monitor = primary
            .or(fallback)
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))?;

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        let (width, height) = (image.width(), image.height());
        debug!("스크린 캡처 완료: {}x{}", width, height);

        CapturedFrame::new(width, height, image.into_raw(), Local::now()).ok_or_else(|| {
            CoreError::Capture(format!("캡처 버퍼 크기 불일치: {width}x{height}"))
        })
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for ScreenCapture {
    async fn capture_frame(&self) -> Result<CapturedFrame, CoreError> {
        tokio::task::spawn_blocking(|| ScreenCapture::new().capture_primary())
            .await
            .map_err(|e| CoreError::Capture(format!("캡처 태스크 실패: {e}")))?
    }
}
