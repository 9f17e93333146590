//! 스크린 캡처 포트.
//!
//! 구현: `autoshot-vision` crate (xcap)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::CapturedFrame;

/// 캡처 소스: "주 모니터 전체 화면, 제외 없음"을 캡처한다
///
/// 영역/모니터 선택은 코어가 관여하지 않는다.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// 프레임 한 장 캡처. 실패는 `CoreError::Capture`로 보고한다.
    async fn capture_frame(&self) -> Result<CapturedFrame, CoreError>;
}
