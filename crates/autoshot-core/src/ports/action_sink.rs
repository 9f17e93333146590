//! 액션 싱크 포트: 내비게이션 키 전송과 이미지 저장.
//!
//! 구현: `autoshot-app`의 `DesktopActionSink`
//! (`autoshot-automation` 입력 드라이버 + `autoshot-storage` 파일 저장소)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::CoreError;
use crate::models::frame::CapturedFrame;
use crate::models::run::AdvanceKey;

/// 캡처 루프의 외부 부수 효과
#[async_trait]
pub trait ActionSink: Send + Sync {
    /// 다음 페이지/슬라이드로 넘기는 키 전송 (fire-and-forget)
    ///
    /// 실패해도 호출자에게 보고하지 않는다. 구현체가 로그를 남긴다.
    async fn send_advance_signal(&self, key: AdvanceKey);

    /// 이미지를 `<destination>/<prefix>_<YYYYMMDD_HHmmss>.<ext>`로 저장
    ///
    /// 반환값은 실제로 기록된 파일 경로.
    async fn persist(
        &self,
        frame: &CapturedFrame,
        destination: &Path,
        prefix: &str,
        timestamp: DateTime<Local>,
    ) -> Result<PathBuf, CoreError>;
}
