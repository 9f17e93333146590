//! # autoshot-vision
//!
//! 이미지 처리 크레이트.
//! 스크린 캡처(xcap), PNG 인코딩, 연속 프레임 중복 판정을 담당한다.

pub mod capture;
pub mod delta;
pub mod duplicate;
pub mod encoder;
