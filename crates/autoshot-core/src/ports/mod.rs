//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 각 어댑터 crate가 이 trait들을 구현하며,
//! `autoshot-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 캡처 루프 제어기(`LoopController`)는 이 포트들에만 의존하므로
//! 테스트에서는 가짜 구현으로 전체 루프를 검증할 수 있다.

pub mod action_sink;
pub mod capture;
pub mod duplicate;
pub mod input_driver;
pub mod notifier;
pub mod permission;
pub mod settings;
