//! 캡처 이미지 파일 저장소.
//!
//! 인코딩된 이미지 바이트를 `<dir>/<prefix>_<YYYYMMDD_HHmmss>.<ext>`로 저장한다.
//! 같은 초에 두 장이 저장되면 `_1`, `_2` … 접미사를 붙여 덮어쓰기를 막는다.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use autoshot_core::error::CoreError;
use chrono::{DateTime, Local};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::destination::TIMESTAMP_FORMAT;

/// 같은 이름 충돌 시 시도할 최대 접미사
const MAX_COLLISION_SUFFIX: u32 = 999;

/// 이미지 파일 저장소
#[derive(Debug, Clone)]
pub struct FrameFileStorage {
    /// 파일 확장자 (예: "png")
    extension: String,
}

impl FrameFileStorage {
    /// 새 저장소 생성
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// 파일명 생성: `<prefix>_<YYYYMMDD_HHmmss>[_<n>].<ext>`
    fn file_name(&self, prefix: &str, timestamp: DateTime<Local>, collision: u32) -> String {
        let stamp = timestamp.format(TIMESTAMP_FORMAT);
        if collision == 0 {
            format!("{prefix}_{stamp}.{}", self.extension)
        } else {
            format!("{prefix}_{stamp}_{collision}.{}", self.extension)
        }
    }

    /// 이미지 저장 후 실제 파일 경로 반환
    ///
    /// 대상 디렉토리가 없으면 만든다.
    pub async fn save(
        &self,
        dir: &Path,
        prefix: &str,
        timestamp: DateTime<Local>,
        data: &[u8],
    ) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(dir).await.map_err(|e| {
            CoreError::Persist(format!("디렉토리 생성 실패: {}: {e}", dir.display()))
        })?;

        for collision in 0..=MAX_COLLISION_SUFFIX {
            let path = dir.join(self.file_name(prefix, timestamp, collision));

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(CoreError::Persist(format!(
                        "파일 생성 실패: {}: {e}",
                        path.display()
                    )))
                }
            };

            file.write_all(data).await.map_err(|e| {
                CoreError::Persist(format!("파일 쓰기 실패: {}: {e}", path.display()))
            })?;
            file.flush().await.map_err(|e| {
                CoreError::Persist(format!("파일 쓰기 실패: {}: {e}", path.display()))
            })?;

            debug!("이미지 저장: {} ({}bytes)", path.display(), data.len());
            return Ok(path);
        }

        Err(CoreError::Persist(format!(
            "파일명 충돌 한도 초과: {}",
            dir.join(self.file_name(prefix, timestamp, 0)).display()
        )))
    }
}
