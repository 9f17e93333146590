//! 인터럽트 처리.
//!
//! SIGINT/SIGTERM(비 unix에서는 Ctrl+C)을 받을 때마다 처리 방식을 정한다.
//! 첫 시그널은 캡처 실행 중지, 그다음부터는 즉시 프로세스 종료.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

/// 강제 종료 시 종료 코드 (128 + SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

/// 시그널 하나에 대한 처리
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// 실행 중지 요청
    Stop,
    /// 실행 종료를 기다리지 않고 프로세스 종료
    Exit,
}

/// 수신한 시그널 수에 따라 처리를 결정하는 핸들러
#[derive(Debug, Default)]
pub struct InterruptHandler {
    received: AtomicU32,
}

impl InterruptHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 시그널 한 번 반영
    pub fn interrupt(&self) -> InterruptAction {
        if self.received.fetch_add(1, Ordering::SeqCst) == 0 {
            InterruptAction::Stop
        } else {
            InterruptAction::Exit
        }
    }

    /// OS 시그널을 계속 받아 `on_action`에 넘긴다
    ///
    /// 핸들러 등록에 실패했을 때만 반환한다.
    pub async fn listen(&self, mut on_action: impl FnMut(InterruptAction)) -> std::io::Result<()> {
        let mut signals = Signals::register()?;
        loop {
            let name = signals.recv().await?;
            let action = self.interrupt();
            info!(signal = name, ?action, "시그널 수신");
            on_action(action);
        }
    }
}

#[cfg(unix)]
struct Signals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> std::io::Result<&'static str> {
        Ok(tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        })
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}
