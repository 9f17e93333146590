//! AUTOSHOT 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from] CoreError`로 래핑한다.
//! 캡처 루프에서 복구 가능한 에러(`Capture`, `Persist`, `SessionFolder`)는
//! 로그만 남기고 루프를 계속한다. 치명적인 것은 `PermissionDenied` 뿐이다.

use std::path::PathBuf;

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 입력 주입 권한 없음 (macOS 손쉬운 사용 등)
    #[error("권한 거부: {0}")]
    PermissionDenied(String),

    /// 세션 폴더 생성 실패: 기본 저장 위치로 폴백
    #[error("세션 폴더 생성 실패: {path}: {source}")]
    SessionFolder {
        /// 생성하려던 폴더 경로
        path: PathBuf,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 스크린 캡처 실패: 해당 반복 스킵
    #[error("캡처 실패: {0}")]
    Capture(String),

    /// 이미지 저장 실패: 루프는 계속
    #[error("저장 실패: {0}")]
    Persist(String),

    /// 이미지 인코딩 실패
    #[error("인코딩 실패: {0}")]
    Encoding(String),

    /// 입력 주입 실패
    #[error("입력 실패: {0}")]
    Input(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
