//! 프레임 간 변경 비율 계산.
//!
//! 16x16 타일 단위 비교. 타일 평균 RGB 차이가 허용치를 넘으면 변경 타일로 센다.
//! 시계 초침처럼 작은 영역만 바뀐 화면은 낮은 변경 비율을 갖는다.

use autoshot_core::models::frame::CapturedFrame;
use tracing::trace;

/// 타일 크기
const TILE_SIZE: u32 = 16;

/// 타일 변경 허용치 (픽셀당 RGB 차이 합의 평균)
const CHANGE_TOLERANCE: u64 = 30;

/// 변경 비율 요약
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaSummary {
    /// 변경된 타일 수
    pub changed_tiles: u32,
    /// 전체 타일 수
    pub total_tiles: u32,
    /// 전체 대비 변경 비율 (0.0 ~ 1.0)
    pub changed_ratio: f64,
}

/// 두 프레임 간 변경 비율 계산
///
/// 해상도가 다르면 전체 변경(1.0)으로 판단한다.
pub fn compute_delta(prev: &CapturedFrame, curr: &CapturedFrame) -> DeltaSummary {
    let (pw, ph) = prev.resolution();
    let (cw, ch) = curr.resolution();

    let tiles_x = cw.div_ceil(TILE_SIZE);
    let tiles_y = ch.div_ceil(TILE_SIZE);
    let total_tiles = tiles_x * tiles_y;

    if pw != cw || ph != ch {
        return DeltaSummary {
            changed_tiles: total_tiles,
            total_tiles,
            changed_ratio: 1.0,
        };
    }

    if total_tiles == 0 {
        return DeltaSummary {
            changed_tiles: 0,
            total_tiles: 0,
            changed_ratio: 0.0,
        };
    }

    let stride = pw as usize * 4;
    let mut changed_tiles = 0u32;

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let start_x = tx * TILE_SIZE;
            let start_y = ty * TILE_SIZE;
            let end_x = (start_x + TILE_SIZE).min(pw);
            let end_y = (start_y + TILE_SIZE).min(ph);

            if is_tile_changed(
                &prev.pixels,
                &curr.pixels,
                stride,
                (start_x, start_y),
                (end_x, end_y),
            ) {
                changed_tiles += 1;
            }
        }
    }

    let changed_ratio = changed_tiles as f64 / total_tiles as f64;
    trace!(
        "델타: {changed_tiles}/{total_tiles} 타일 변경 ({:.1}%)",
        changed_ratio * 100.0
    );

    DeltaSummary {
        changed_tiles,
        total_tiles,
        changed_ratio,
    }
}

/// 타일 변경 여부: 바이트 슬라이스 직접 접근
#[inline]
fn is_tile_changed(
    prev: &[u8],
    curr: &[u8],
    stride: usize,
    (start_x, start_y): (u32, u32),
    (end_x, end_y): (u32, u32),
) -> bool {
    let mut diff_sum = 0u64;
    let mut pixel_count = 0u64;

    for y in start_y as usize..end_y as usize {
        let row_offset = y * stride;
        for x in start_x as usize..end_x as usize {
            let offset = row_offset + x * 4;
            let p = &prev[offset..offset + 3];
            let c = &curr[offset..offset + 3];

            diff_sum += p
                .iter()
                .zip(c)
                .map(|(a, b)| (*a as i32 - *b as i32).unsigned_abs() as u64)
                .sum::<u64>();
            pixel_count += 1;
        }
    }

    if pixel_count == 0 {
        return false;
    }

    diff_sum / pixel_count > CHANGE_TOLERANCE
}
