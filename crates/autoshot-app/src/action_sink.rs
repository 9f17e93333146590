//! 데스크톱 액션 싱크.
//!
//! `ActionSink` 포트 구현: 입력 드라이버로 내비게이션 키를 보내고,
//! 프레임을 PNG로 인코딩해 파일로 저장한다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use autoshot_core::error::CoreError;
use autoshot_core::models::frame::CapturedFrame;
use autoshot_core::models::run::AdvanceKey;
use autoshot_core::ports::action_sink::ActionSink;
use autoshot_core::ports::input_driver::InputDriver;
use autoshot_storage::frame_storage::FrameFileStorage;
use autoshot_vision::encoder::{encode_png, PNG_EXTENSION};
use chrono::{DateTime, Local};
use tracing::{debug, warn};

/// 입력 드라이버 + PNG 파일 저장소
pub struct DesktopActionSink {
    input: Arc<dyn InputDriver>,
    storage: FrameFileStorage,
}

impl DesktopActionSink {
    pub fn new(input: Arc<dyn InputDriver>) -> Self {
        Self {
            input,
            storage: FrameFileStorage::new(PNG_EXTENSION),
        }
    }
}

#[async_trait]
impl ActionSink for DesktopActionSink {
    async fn send_advance_signal(&self, key: AdvanceKey) {
        debug!(key = %key, keycode = key.mac_keycode(), "내비게이션 키 전송");
        if let Err(e) = self.input.key_click(key.key_name()).await {
            warn!("키 전송 실패 ({key}): {e}");
        }
    }

    async fn persist(
        &self,
        frame: &CapturedFrame,
        destination: &Path,
        prefix: &str,
        timestamp: DateTime<Local>,
    ) -> Result<PathBuf, CoreError> {
        // 인코딩은 CPU 바운드
        let owned = frame.clone();
        let png = tokio::task::spawn_blocking(move || encode_png(&owned))
            .await
            .map_err(|e| CoreError::Internal(format!("인코딩 태스크 실패: {e}")))??;

        self.storage.save(destination, prefix, timestamp, &png).await
    }
}
