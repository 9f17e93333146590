//! 알림 이벤트 모델.

use serde::{Deserialize, Serialize};

/// 캡처 루프가 발생시키는 알림 이벤트
///
/// 실제 소리/시각 효과로의 매핑은 `NotificationPort` 구현이 결정한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationEvent {
    /// 카운트다운 1초 경과
    CountdownTick,
    /// 실행 완료 (최대 횟수 도달 또는 중복 감지)
    Completed,
}

impl NotificationEvent {
    /// 이벤트 이름 (로그용)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountdownTick => "countdownTick",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
