//! 저장 위치 결정.
//!
//! 우선순위: 이번 실행의 세션 폴더 → 설정된 고정 폴더 → 플랫폼 기본 위치(데스크톱).

use std::path::{Path, PathBuf};

use autoshot_core::error::CoreError;
use autoshot_core::models::run::DestinationPolicy;
use chrono::{DateTime, Local};
use directories::UserDirs;
use tracing::{info, warn};

/// 파일명/세션 폴더명 타임스탬프 형식
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 플랫폼 기본 저장 위치
///
/// 데스크톱 → 홈 디렉토리 → 현재 디렉토리 순으로 폴백한다.
pub fn default_output_dir() -> PathBuf {
    match UserDirs::new() {
        Some(dirs) => dirs
            .desktop_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.home_dir().to_path_buf()),
        None => {
            warn!("사용자 디렉토리를 찾을 수 없음, 현재 디렉토리 사용");
            PathBuf::from(".")
        }
    }
}

/// 세션 폴더 이름 (`YYYYMMDD_HHmmss`)
pub fn session_folder_name(timestamp: DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// `base` 아래에 타임스탬프 이름의 세션 폴더 생성
pub async fn create_session_folder(
    base: &Path,
    timestamp: DateTime<Local>,
) -> Result<PathBuf, CoreError> {
    let folder = base.join(session_folder_name(timestamp));
    tokio::fs::create_dir_all(&folder)
        .await
        .map_err(|source| CoreError::SessionFolder {
            path: folder.clone(),
            source,
        })?;
    info!("세션 폴더 생성: {}", folder.display());
    Ok(folder)
}

/// 정책이 요구하면 세션 폴더를 만든다. 실패는 로그만 남기고 `None`.
pub async fn prepare_session_folder(
    policy: &DestinationPolicy,
    timestamp: DateTime<Local>,
) -> Option<PathBuf> {
    let DestinationPolicy::SessionSubfolder { base } = policy else {
        return None;
    };
    match create_session_folder(base, timestamp).await {
        Ok(folder) => Some(folder),
        Err(e) => {
            warn!("{e}: 기본 저장 위치 사용: {}", base.display());
            None
        }
    }
}

/// 실제 저장 디렉토리
pub fn resolve_destination(session_folder: Option<&Path>, policy: &DestinationPolicy) -> PathBuf {
    session_folder
        .map(Path::to_path_buf)
        .unwrap_or_else(|| policy.base_dir().to_path_buf())
}
