//! # autoshot-automation
//!
//! 캡처 루프 제어 크레이트.
//! `LoopController`가 카운트다운 → 캡처 → 중복 판정 → 저장 → 키 전송 → 대기를
//! 반복하며, 키보드 입력 드라이버와 입력 권한 확인 어댑터를 함께 제공한다.

pub mod controller;
pub mod input_driver;
pub mod permission;

pub use controller::LoopController;
