//! 캡처 프레임 모델.
//!
//! 코어는 이미지 라이브러리에 의존하지 않으므로 RGBA8 원시 버퍼만 보관한다.
//! 인코딩/비교는 `autoshot-vision`이 담당한다.

use std::sync::Arc;

use chrono::{DateTime, Local};

/// 한 번의 스크린 캡처 결과 (RGBA8, 행 우선)
///
/// 픽셀 버퍼는 `Arc`로 공유되므로 복제 비용이 낮다.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// 너비 (픽셀)
    pub width: u32,
    /// 높이 (픽셀)
    pub height: u32,
    /// RGBA8 픽셀 데이터 (`width * height * 4` 바이트)
    pub pixels: Arc<Vec<u8>>,
    /// 캡처 시각 (파일명 타임스탬프에 사용)
    pub captured_at: DateTime<Local>,
}

impl CapturedFrame {
    /// 픽셀 버퍼로 프레임 생성. 버퍼 길이가 맞지 않으면 `None`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, captured_at: DateTime<Local>) -> Option<Self> {
        if pixels.len() != Self::expected_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
            captured_at,
        })
    }

    /// 단색 프레임 (테스트/더미 캡처용)
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::expected_len(width, height))
            .collect();
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
            captured_at: Local::now(),
        }
    }

    /// 해상도 (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}
