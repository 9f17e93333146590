//! 입력 주입 권한 확인 어댑터.

use std::sync::atomic::{AtomicBool, Ordering};

use autoshot_core::ports::permission::PermissionCheck;

/// 항상 허용: 입력 주입 없는 빌드와 테스트용
pub struct AlwaysGranted;

impl PermissionCheck for AlwaysGranted {
    fn is_granted(&self) -> bool {
        true
    }
}

/// 한 번 허용되면 다시 확인하지 않는 권한 확인기
///
/// 거부 결과는 기억하지 않는다 (사용자가 나중에 허용할 수 있음).
pub struct StickyGrant<P> {
    inner: P,
    granted: AtomicBool,
}

impl<P: PermissionCheck> StickyGrant<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            granted: AtomicBool::new(false),
        }
    }
}

impl<P: PermissionCheck> PermissionCheck for StickyGrant<P> {
    fn is_granted(&self) -> bool {
        if self.granted.load(Ordering::Acquire) {
            return true;
        }
        let granted = self.inner.is_granted();
        if granted {
            self.granted.store(true, Ordering::Release);
        }
        granted
    }
}

/// enigo 초기화 가능 여부로 권한 판단 (입력 연결을 새로 연다)
///
/// macOS에서는 권한이 없으면 시스템 설정 프롬프트가 뜬다.
#[cfg(feature = "enigo")]
pub struct EnigoPermissionCheck;

#[cfg(feature = "enigo")]
impl PermissionCheck for EnigoPermissionCheck {
    fn is_granted(&self) -> bool {
        match enigo::Enigo::new(&enigo::Settings::default()) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("입력 주입 권한 없음: {e}");
                false
            }
        }
    }
}

/// 플랫폼별 권한 확인기 생성
pub fn create_permission_check() -> Box<dyn PermissionCheck> {
    #[cfg(feature = "enigo")]
    {
        Box::new(StickyGrant::new(EnigoPermissionCheck))
    }
    #[cfg(not(feature = "enigo"))]
    {
        Box::new(AlwaysGranted)
    }
}
