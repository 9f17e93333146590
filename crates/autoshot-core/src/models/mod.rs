//! AUTOSHOT 도메인 모델.
//!
//! 캡처 루프와 어댑터가 공유하는 데이터 구조체를 정의한다.

pub mod frame;
pub mod notification;
pub mod run;
