//! PNG 인코더.
//!
//! 캡처 프레임의 정규 인코딩 형식은 PNG(RGBA8)이다.
//! 저장 파일과 완전 일치 중복 판정이 모두 이 인코딩을 사용한다.

use autoshot_core::error::CoreError;
use autoshot_core::models::frame::CapturedFrame;
use chrono::Local;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::debug;

/// 저장 파일 확장자
pub const PNG_EXTENSION: &str = "png";

/// 프레임을 PNG 바이트로 인코딩
pub fn encode_png(frame: &CapturedFrame) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::with_capacity(frame.pixels.len() / 4);
    PngEncoder::new(&mut buf)
        .write_image(
            &frame.pixels,
            frame.width,
            frame.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| CoreError::Encoding(format!("PNG 인코딩 실패: {e}")))?;

    debug!(
        "PNG 인코딩: {}x{} → {} bytes",
        frame.width,
        frame.height,
        buf.len()
    );

    Ok(buf)
}

/// PNG 바이트를 프레임으로 디코딩
///
/// 캡처 시각은 알 수 없으므로 현재 시각으로 채운다.
pub fn decode_png(bytes: &[u8]) -> Result<CapturedFrame, CoreError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| CoreError::Encoding(format!("PNG 디코딩 실패: {e}")))?
        .to_rgba8();
    let (width, height) = image.dimensions();

    CapturedFrame::new(width, height, image.into_raw(), Local::now())
        .ok_or_else(|| CoreError::Encoding("디코딩 버퍼 크기 불일치".to_string()))
}
