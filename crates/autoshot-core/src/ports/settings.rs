//! 설정 소스 포트.
//!
//! 구현: `ConfigManager`

use crate::config::AppConfig;

/// 설정 스냅샷 제공자
///
/// 캡처 루프는 `start()` 시점에 한 번만 호출하며 실행 도중 다시 읽지 않는다.
pub trait SettingsSource: Send + Sync {
    /// 현재 설정의 복제본
    fn snapshot(&self) -> AppConfig;
}
