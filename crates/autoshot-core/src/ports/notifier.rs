//! 알림 포트.
//!
//! 구현: `autoshot-app`의 `SoundNotifier` (터미널 벨, notify-rust)

use async_trait::async_trait;

use crate::config::NotificationConfig;
use crate::error::CoreError;
use crate::models::notification::NotificationEvent;

/// 소리/시각 알림 인터페이스
///
/// 이벤트를 실제 효과로 매핑하는 것은 구현체의 몫이다.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// 이벤트 알림
    async fn emit(&self, event: NotificationEvent) -> Result<(), CoreError>;

    /// 실행 시작 시점의 알림 설정 반영
    fn apply_settings(&self, _config: &NotificationConfig) {}
}
