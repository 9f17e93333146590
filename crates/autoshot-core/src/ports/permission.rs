//! 입력 주입 권한 포트.
//!
//! 구현: `autoshot-automation` crate

/// 입력 주입 권한 확인
///
/// OS 권한 요청 프롬프트 외의 부수 효과가 없어야 한다.
pub trait PermissionCheck: Send + Sync {
    /// 권한이 부여되었는지 여부
    fn is_granted(&self) -> bool;
}
