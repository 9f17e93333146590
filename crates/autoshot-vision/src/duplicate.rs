//! 중복 프레임 판정기.
//!
//! - [`ExactMatchJudge`]: PNG 인코딩 바이트 완전 일치 (기본)
//! - [`PerceptualJudge`]: 타일 변경 비율이 임계값 이하이면 중복
//!
//! 둘 다 "직전 프레임만 기억" 계약을 따른다.

use autoshot_core::config::DuplicateStrategy;
use autoshot_core::models::frame::CapturedFrame;
use autoshot_core::ports::duplicate::DuplicateJudge;
use tracing::{debug, warn};

use crate::delta::compute_delta;
use crate::encoder::encode_png;

// ============================================================
// ExactMatchJudge
// ============================================================

/// 완전 일치 판정기: 정규 PNG 인코딩을 바이트 단위로 비교
///
/// 임계값은 사용하지 않는다.
#[derive(Debug, Default)]
pub struct ExactMatchJudge {
    last_png: Option<Vec<u8>>,
}

impl ExactMatchJudge {
    /// 새 판정기 생성
    pub fn new() -> Self {
        Self::default()
    }
}

impl DuplicateJudge for ExactMatchJudge {
    fn reset(&mut self) {
        self.last_png = None;
    }

    fn set_threshold(&mut self, _threshold: f64) {}

    fn is_duplicate(&mut self, frame: &CapturedFrame) -> bool {
        let current = match encode_png(frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                // 비교 기준을 잃었으므로 다음 프레임도 중복이 아님
                warn!("중복 판정용 인코딩 실패: {e}");
                self.last_png = None;
                return false;
            }
        };

        let duplicate = self.last_png.as_deref() == Some(current.as_slice());
        self.last_png = Some(current);
        duplicate
    }

    fn name(&self) -> &str {
        "exact"
    }
}

// ============================================================
// PerceptualJudge
// ============================================================

/// 유사도 판정기: 16x16 타일 변경 비율 기반
///
/// 임계값 `t` (0.0 ~ 1.0):
/// - `t <= 0.0`: 픽셀 완전 일치만 중복
/// - `t > 0.0`: 같은 해상도이고 변경 타일 비율이 `t` 이하이면 중복
pub struct PerceptualJudge {
    threshold: f64,
    last_frame: Option<CapturedFrame>,
}

impl PerceptualJudge {
    /// 임계값을 지정해 생성
    pub fn new(threshold: f64) -> Self {
        let mut judge = Self {
            threshold: 0.0,
            last_frame: None,
        };
        judge.set_threshold(threshold);
        judge
    }

    /// 현재 임계값
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn judge(&self, prev: &CapturedFrame, curr: &CapturedFrame) -> bool {
        if prev.resolution() != curr.resolution() {
            return false;
        }
        if self.threshold <= 0.0 {
            return prev.pixels == curr.pixels;
        }
        let delta = compute_delta(prev, curr);
        debug!(
            changed_ratio = delta.changed_ratio,
            threshold = self.threshold,
            "유사도 판정"
        );
        delta.changed_ratio <= self.threshold
    }
}

impl Default for PerceptualJudge {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl DuplicateJudge for PerceptualJudge {
    fn reset(&mut self) {
        self.last_frame = None;
    }

    fn set_threshold(&mut self, threshold: f64) {
        self.threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn is_duplicate(&mut self, frame: &CapturedFrame) -> bool {
        let duplicate = self
            .last_frame
            .as_ref()
            .is_some_and(|prev| self.judge(prev, frame));
        self.last_frame = Some(frame.clone());
        duplicate
    }

    fn name(&self) -> &str {
        "perceptual"
    }
}

/// 설정된 전략의 판정기 생성
pub fn create_duplicate_judge(strategy: DuplicateStrategy) -> Box<dyn DuplicateJudge> {
    match strategy {
        DuplicateStrategy::Exact => Box::new(ExactMatchJudge::new()),
        DuplicateStrategy::Perceptual => Box::new(PerceptualJudge::default()),
    }
}
