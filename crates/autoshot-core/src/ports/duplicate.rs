//! 중복 판정 포트.
//!
//! 구현: `autoshot-vision` crate (`ExactMatchJudge`, `PerceptualJudge`)

use std::sync::Arc;

use crate::config::DuplicateStrategy;
use crate::models::frame::CapturedFrame;

/// 중복 판정기: 직전 프레임과 "같은지" 판정
///
/// 계약:
/// - `reset()` 직후 첫 `is_duplicate()`는 항상 `false`
/// - `is_duplicate()`는 결과와 무관하게 입력 프레임을 새 기준으로 기억한다
///   (항상 바로 앞 프레임과 비교)
/// - 임계값은 단조적이어야 한다: 작은 임계값이 큰 임계값보다
///   더 많은 쌍을 중복으로 판정해서는 안 된다
pub trait DuplicateJudge: Send + Sync {
    /// 기억한 프레임 초기화 (실행 시작마다 호출)
    fn reset(&mut self);

    /// 판정 민감도 설정 (의미는 전략별)
    fn set_threshold(&mut self, threshold: f64);

    /// 직전 프레임과 비교 후 현재 프레임을 기억
    fn is_duplicate(&mut self, frame: &CapturedFrame) -> bool;

    /// 전략 이름 (로그용)
    fn name(&self) -> &str;
}

/// 전략별 판정기 생성기 (실행마다 새 판정기를 만든다)
pub type JudgeFactory = Arc<dyn Fn(DuplicateStrategy) -> Box<dyn DuplicateJudge> + Send + Sync>;
