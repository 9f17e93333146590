//! # autoshot-storage
//!
//! 로컬 저장소 어댑터.
//! 캡처 이미지를 `<prefix>_<YYYYMMDD_HHmmss>.<ext>` 이름으로 저장하고,
//! 실행별 세션 폴더 생성과 저장 위치 결정 규칙을 제공한다.
//!
//! ## 모듈
//! - `frame_storage`: 이미지 파일 저장소
//! - `destination`: 세션 폴더 → 설정 폴더 → 플랫폼 기본 위치 결정

pub mod destination;
pub mod frame_storage;
