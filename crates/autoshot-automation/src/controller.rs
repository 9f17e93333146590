//! 캡처 루프 제어기.
//!
//! 상태 흐름: `Idle → Countdown → Capturing → (Persisting | Stopping) → Idle`
//!
//! 한 번의 실행(run)은 tokio 태스크 하나다. 취소는 `CancellationToken`으로 전달되며
//! 카운트다운 틱, 반복 간 대기, 캡처 전후, 키 전송 직전에서 확인한다.
//! 진행 중인 저장은 취소로 끊지 않는다.
//!
//! `is_running`은 `watch` 채널로 발행된다. `stop()`은 동기·비차단이며
//! 어느 컨텍스트에서든 호출할 수 있다. 실행 종료 보고도 `watch` 채널로 전달되어
//! `wait()` 중에도 `start()`가 이전 실행을 취소할 수 있다.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use autoshot_core::error::CoreError;
use autoshot_core::models::notification::NotificationEvent;
use autoshot_core::models::run::{RunConfig, RunOutcome, RunReport};
use autoshot_core::ports::action_sink::ActionSink;
use autoshot_core::ports::capture::CaptureSource;
use autoshot_core::ports::duplicate::{DuplicateJudge, JudgeFactory};
use autoshot_core::ports::notifier::NotificationPort;
use autoshot_core::ports::permission::PermissionCheck;
use autoshot_core::ports::settings::SettingsSource;
use autoshot_storage::destination::{prepare_session_folder, resolve_destination};

/// 카운트다운 틱 간격
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// 단발 캡처 전 고정 대기
const SINGLE_SHOT_DELAY: Duration = Duration::from_secs(1);

// ============================================================
// 포트 묶음
// ============================================================

/// 제어기가 의존하는 포트들
///
/// `autoshot-app`에서 실제 어댑터로, 테스트에서는 가짜 구현으로 채운다.
pub struct LoopPorts {
    pub capture: Arc<dyn CaptureSource>,
    pub actions: Arc<dyn ActionSink>,
    pub notifier: Arc<dyn NotificationPort>,
    pub permission: Arc<dyn PermissionCheck>,
    pub settings: Arc<dyn SettingsSource>,
    /// 실행마다 설정된 전략으로 새 판정기를 만든다
    pub judges: JudgeFactory,
}

/// 실행 태스크와 공유하는 상태
struct Shared {
    capture: Arc<dyn CaptureSource>,
    actions: Arc<dyn ActionSink>,
    notifier: Arc<dyn NotificationPort>,
    running: watch::Sender<bool>,
}

/// 한 번의 실행에 고정되는 값
struct Run {
    id: String,
    config: RunConfig,
    session_folder: Option<PathBuf>,
    destination: PathBuf,
    cancel: CancellationToken,
    judge: Box<dyn DuplicateJudge>,
}

/// 현재 실행 핸들
#[derive(Clone)]
struct ActiveRun {
    id: String,
    cancel: CancellationToken,
    /// 태스크가 끝나면 발신자가 닫힌다 (패닉이면 값 없이)
    done: watch::Receiver<Option<RunReport>>,
}

/// 실행 태스크 종료(정상/패닉/abort) 시 `is_running = false` 발행
struct RunningGuard(Arc<Shared>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.send_if_modified(|running| std::mem::replace(running, false));
    }
}

// ============================================================
// LoopController
// ============================================================

/// 캡처 루프 제어기
pub struct LoopController {
    shared: Arc<Shared>,
    permission: Arc<dyn PermissionCheck>,
    settings: Arc<dyn SettingsSource>,
    judges: JudgeFactory,
    /// 저장 폴더 미설정 시 사용할 플랫폼 기본 위치
    default_output_dir: PathBuf,
    /// 가장 최근 `start()`의 취소 토큰. `running = true` 발행도 이 잠금 아래에서 한다.
    cancel: Mutex<Option<CancellationToken>>,
    active: Mutex<Option<ActiveRun>>,
    /// `start()` 직렬화
    starting: tokio::sync::Mutex<()>,
}

impl LoopController {
    /// 새 제어기 생성
    pub fn new(ports: LoopPorts, default_output_dir: PathBuf) -> Self {
        let (running, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                capture: ports.capture,
                actions: ports.actions,
                notifier: ports.notifier,
                running,
            }),
            permission: ports.permission,
            settings: ports.settings,
            judges: ports.judges,
            default_output_dir,
            cancel: Mutex::new(None),
            active: Mutex::new(None),
            starting: tokio::sync::Mutex::new(()),
        }
    }

    /// 실행 중 여부
    pub fn is_running(&self) -> bool {
        *self.shared.running.borrow()
    }

    /// `is_running` 변경 구독
    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.shared.running.subscribe()
    }

    /// 캡처 루프 시작: 새 실행 ID 반환
    ///
    /// 권한이 없으면 아무 상태도 바꾸지 않고 `PermissionDenied`.
    /// 이미 실행 중이면 이전 실행을 취소하고 완전히 끝날 때까지 기다린 뒤 시작한다.
    /// 그 사이에 `stop()`이 호출되면 새 실행은 아무 부작용 없이 `Cancelled`로 끝난다.
    pub async fn start(&self) -> Result<String, CoreError> {
        self.ensure_permission()?;
        let _starting = self.starting.lock().await;

        let cancel = CancellationToken::new();
        let superseded = self.cancel.lock().replace(cancel.clone());
        if let Some(token) = superseded {
            token.cancel();
        }

        let previous = self.active.lock().take();
        if let Some(previous) = previous {
            info!(run_id = %previous.id, "이전 실행 취소 후 재시작");
            previous.cancel.cancel();
            if let Some(report) = finished(previous.done).await {
                debug!(run_id = %report.run_id, outcome = ?report.outcome, "이전 실행 정리 완료");
            }
        }

        let config = RunConfig::from_app_config(
            &self.settings.snapshot().sanitized(),
            &self.default_output_dir,
        );

        let mut judge = (self.judges)(config.duplicate_strategy);
        judge.reset();
        judge.set_threshold(config.duplicate_threshold);
        self.shared.notifier.apply_settings(&config.notification);

        let session_folder = if cancel.is_cancelled() {
            None
        } else {
            prepare_session_folder(&config.destination_policy, Local::now()).await
        };
        let destination = resolve_destination(session_folder.as_deref(), &config.destination_policy);

        let run_id = Uuid::new_v4().to_string();

        info!(
            run_id = %run_id,
            max = config.max_iterations,
            delay = config.initial_delay_secs,
            interval = config.interval_secs,
            key = %config.advance_key,
            duplicate = config.duplicate_detection_enabled,
            strategy = judge.name(),
            path = %destination.display(),
            "캡처 실행 시작"
        );

        {
            let _slot = self.cancel.lock();
            if cancel.is_cancelled() {
                info!(run_id = %run_id, "시작 도중 중지 요청됨");
            } else {
                self.shared.running.send_replace(true);
            }
        }

        let (report_tx, done) = watch::channel(None);
        let run = Run {
            id: run_id.clone(),
            config,
            session_folder,
            destination,
            cancel: cancel.clone(),
            judge,
        };
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let report = {
                let _guard = RunningGuard(Arc::clone(&shared));
                shared.execute(run).await
            };
            info!(
                run_id = %report.run_id,
                outcome = ?report.outcome,
                shot_count = report.shot_count,
                "캡처 실행 종료"
            );
            report_tx.send_replace(Some(report));
        });

        *self.active.lock() = Some(ActiveRun {
            id: run_id.clone(),
            cancel,
            done,
        });
        Ok(run_id)
    }

    /// 실행 중지: 유휴 상태에서는 아무 일도 하지 않음
    pub fn stop(&self) {
        {
            let mut slot = self.cancel.lock();
            if let Some(token) = slot.take() {
                token.cancel();
                info!("캡처 중지 요청");
            }
        }
        self.shared
            .running
            .send_if_modified(|running| std::mem::replace(running, false));
    }

    /// 현재 실행이 끝날 때까지 대기 후 요약 반환
    ///
    /// 실행이 없거나 이미 회수되었으면 `None`.
    pub async fn wait(&self) -> Option<RunReport> {
        let ActiveRun { id, done, .. } = self.active.lock().clone()?;
        let report = finished(done).await;

        {
            let mut active = self.active.lock();
            if active.as_ref().is_some_and(|run| run.id == id) {
                *active = None;
            }
        }
        if report.is_none() {
            error!(run_id = %id, "캡처 실행 태스크 비정상 종료");
        }
        report
    }

    /// 단발 캡처: 1초 대기 후 한 장 캡처·저장, 키 한 번 전송
    ///
    /// 중복 판정·카운터·`is_running`과 무관하며 실행 중인 루프와 독립적으로 동작한다.
    /// 태스크 결과는 저장된 파일 경로 (캡처/저장 실패 시 `None`).
    pub fn take_single_shot(&self) -> Result<JoinHandle<Option<PathBuf>>, CoreError> {
        self.ensure_permission()?;
        let config = RunConfig::from_app_config(
            &self.settings.snapshot().sanitized(),
            &self.default_output_dir,
        );
        let shared = Arc::clone(&self.shared);
        Ok(tokio::spawn(async move { shared.single_shot(config).await }))
    }

    fn ensure_permission(&self) -> Result<(), CoreError> {
        if self.permission.is_granted() {
            Ok(())
        } else {
            warn!("입력 주입 권한이 없어 캡처를 시작할 수 없음");
            Err(CoreError::PermissionDenied(
                "키 입력 주입 권한이 필요합니다".to_string(),
            ))
        }
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.get_mut().take() {
            token.cancel();
        }
    }
}

/// 실행 태스크가 끝날 때까지 대기 (패닉으로 끝났으면 `None`)
async fn finished(mut done: watch::Receiver<Option<RunReport>>) -> Option<RunReport> {
    while done.changed().await.is_ok() {}
    let report = done.borrow().clone();
    report
}

// ============================================================
// 실행 본체
// ============================================================

impl Shared {
    async fn execute(&self, mut run: Run) -> RunReport {
        let (outcome, shot_count) = if self.countdown(&run).await {
            self.capture_loop(&mut run).await
        } else {
            (RunOutcome::Cancelled, 0)
        };
        RunReport {
            run_id: run.id,
            outcome,
            shot_count,
            session_folder: run.session_folder,
        }
    }

    /// 카운트다운: 취소되면 `false`
    ///
    /// `floor(delay)`부터 0까지 매 초 틱을 알리고, 0 틱 직후 바로 캡처로 넘어간다.
    async fn countdown(&self, run: &Run) -> bool {
        if run.config.initial_delay_secs <= 0.0 {
            return true;
        }
        for remaining in (0..=run.config.countdown_secs()).rev() {
            if run.cancel.is_cancelled() {
                return false;
            }
            debug!(run_id = %run.id, remaining, "카운트다운");
            self.notify(NotificationEvent::CountdownTick).await;
            if remaining > 0 && !pause(&run.cancel, COUNTDOWN_TICK).await {
                return false;
            }
        }
        !run.cancel.is_cancelled()
    }

    async fn capture_loop(&self, run: &mut Run) -> (RunOutcome, u32) {
        let config = &run.config;
        let interval = config.interval();
        let mut shot_count = 0u32;

        loop {
            if run.cancel.is_cancelled() {
                return (RunOutcome::Cancelled, shot_count);
            }
            let captured = self.capture.capture_frame().await;
            if run.cancel.is_cancelled() {
                return (RunOutcome::Cancelled, shot_count);
            }

            match captured {
                Err(e) => {
                    warn!(run_id = %run.id, shot_count, "캡처 실패, 다음 반복으로: {e}");
                }
                Ok(frame) => {
                    if config.duplicate_detection_enabled && run.judge.is_duplicate(&frame) {
                        info!(run_id = %run.id, shot_count, "직전 화면과 동일: 실행 종료");
                        self.notify(NotificationEvent::Completed).await;
                        return (RunOutcome::DuplicateDetected, shot_count);
                    }

                    match self
                        .actions
                        .persist(
                            &frame,
                            &run.destination,
                            &config.filename_prefix,
                            frame.captured_at,
                        )
                        .await
                    {
                        Ok(path) => debug!(run_id = %run.id, path = %path.display(), "캡처 저장"),
                        Err(e) => warn!(run_id = %run.id, "캡처 저장 실패: {e}"),
                    }

                    if run.cancel.is_cancelled() {
                        return (RunOutcome::Cancelled, shot_count);
                    }
                    self.actions.send_advance_signal(config.advance_key).await;

                    shot_count += 1;
                    debug!(run_id = %run.id, shot_count, max = config.max_iterations, "반복 완료");
                    if shot_count >= config.max_iterations {
                        self.notify(NotificationEvent::Completed).await;
                        return (RunOutcome::Completed, shot_count);
                    }
                }
            }

            if interval.is_zero() {
                tokio::task::yield_now().await;
            } else if !pause(&run.cancel, interval).await {
                return (RunOutcome::Cancelled, shot_count);
            }
        }
    }

    async fn single_shot(&self, config: RunConfig) -> Option<PathBuf> {
        tokio::time::sleep(SINGLE_SHOT_DELAY).await;

        let saved = match self.capture.capture_frame().await {
            Ok(frame) => {
                let destination = config.destination_policy.base_dir();
                match self
                    .actions
                    .persist(&frame, destination, &config.filename_prefix, frame.captured_at)
                    .await
                {
                    Ok(path) => {
                        info!(path = %path.display(), "단발 캡처 저장");
                        Some(path)
                    }
                    Err(e) => {
                        warn!("단발 캡처 저장 실패: {e}");
                        None
                    }
                }
            }
            Err(e) => {
                warn!("단발 캡처 실패: {e}");
                None
            }
        };

        self.actions.send_advance_signal(config.advance_key).await;
        saved
    }

    async fn notify(&self, event: NotificationEvent) {
        if let Err(e) = self.notifier.emit(event).await {
            warn!("알림 실패 ({event}): {e}");
        }
    }
}

/// 취소 가능한 대기: 끝까지 기다렸으면 `true`
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

// ============================================================
// 테스트
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::path::Path;

    use async_trait::async_trait;
    use autoshot_core::config::{AppConfig, DuplicateStrategy, NotificationConfig, SOUND_NONE};
    use autoshot_core::models::frame::CapturedFrame;
    use autoshot_core::models::run::AdvanceKey;
    use chrono::{DateTime, Local};
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Tick,
        Completed,
        Capture,
        CaptureFailed,
        Persist(PathBuf),
        PersistFailed,
        Advance(AdvanceKey),
        Reset,
        Threshold(f64),
        Judge,
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    fn count(log: &Log, pred: impl Fn(&Event) -> bool) -> usize {
        log.lock().iter().filter(|e| pred(e)).count()
    }

    struct FakeCapture {
        log: Log,
        /// `false`면 해당 호출은 실패. 소진되면 계속 성공.
        script: Mutex<VecDeque<bool>>,
        calls: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl CaptureSource for FakeCapture {
        async fn capture_frame(&self) -> Result<CapturedFrame, CoreError> {
            let n = {
                let mut calls = self.calls.lock();
                calls.push(Instant::now());
                calls.len()
            };
            if !self.script.lock().pop_front().unwrap_or(true) {
                self.log.lock().push(Event::CaptureFailed);
                return Err(CoreError::Capture("화면 없음".to_string()));
            }
            self.log.lock().push(Event::Capture);
            Ok(CapturedFrame::solid(4, 4, [n as u8, 0, 0, 255]))
        }
    }

    struct FakeActions {
        log: Log,
        persist_fails: bool,
        persist_delay: Duration,
    }

    #[async_trait]
    impl ActionSink for FakeActions {
        async fn send_advance_signal(&self, key: AdvanceKey) {
            self.log.lock().push(Event::Advance(key));
        }

        async fn persist(
            &self,
            _frame: &CapturedFrame,
            destination: &Path,
            prefix: &str,
            _timestamp: DateTime<Local>,
        ) -> Result<PathBuf, CoreError> {
            if !self.persist_delay.is_zero() {
                tokio::time::sleep(self.persist_delay).await;
            }
            if self.persist_fails {
                self.log.lock().push(Event::PersistFailed);
                return Err(CoreError::Persist("디스크 가득 참".to_string()));
            }
            self.log.lock().push(Event::Persist(destination.to_path_buf()));
            Ok(destination.join(format!("{prefix}.png")))
        }
    }

    struct FakeNotifier {
        log: Log,
        applied: Mutex<Vec<NotificationConfig>>,
    }

    #[async_trait]
    impl NotificationPort for FakeNotifier {
        async fn emit(&self, event: NotificationEvent) -> Result<(), CoreError> {
            self.log.lock().push(match event {
                NotificationEvent::CountdownTick => Event::Tick,
                NotificationEvent::Completed => Event::Completed,
            });
            Ok(())
        }

        fn apply_settings(&self, config: &NotificationConfig) {
            self.applied.lock().push(config.clone());
        }
    }

    struct FakePermission(bool);

    impl PermissionCheck for FakePermission {
        fn is_granted(&self) -> bool {
            self.0
        }
    }

    struct FakeSettings(Mutex<AppConfig>);

    impl FakeSettings {
        fn set(&self, config: AppConfig) {
            *self.0.lock() = config;
        }
    }

    impl SettingsSource for FakeSettings {
        fn snapshot(&self) -> AppConfig {
            self.0.lock().clone()
        }
    }

    /// `duplicate_on`번째 호출(1부터)에서만 중복으로 판정
    struct FakeJudge {
        log: Log,
        duplicate_on: Option<usize>,
        calls: usize,
    }

    impl DuplicateJudge for FakeJudge {
        fn reset(&mut self) {
            self.calls = 0;
            self.log.lock().push(Event::Reset);
        }

        fn set_threshold(&mut self, threshold: f64) {
            self.log.lock().push(Event::Threshold(threshold));
        }

        fn is_duplicate(&mut self, _frame: &CapturedFrame) -> bool {
            self.calls += 1;
            self.log.lock().push(Event::Judge);
            self.duplicate_on == Some(self.calls)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[derive(Default)]
    struct Setup {
        denied: bool,
        duplicate_on: Option<usize>,
        capture_script: Vec<bool>,
        persist_fails: bool,
        persist_delay: Duration,
    }

    struct Harness {
        controller: LoopController,
        log: Log,
        capture: Arc<FakeCapture>,
        settings: Arc<FakeSettings>,
        notifier: Arc<FakeNotifier>,
        strategies: Arc<Mutex<Vec<DuplicateStrategy>>>,
        t0: Instant,
    }

    impl Harness {
        fn capture_offsets(&self) -> Vec<Duration> {
            self.capture
                .calls
                .lock()
                .iter()
                .map(|t| t.duration_since(self.t0))
                .collect()
        }
    }

    const DESKTOP: &str = "/fake/desktop";

    fn config(max: u32, delay: f64, interval: f64) -> AppConfig {
        let mut config = AppConfig::default_config();
        config.capture.max_count = max;
        config.capture.initial_delay_secs = delay;
        config.capture.interval_secs = interval;
        config
    }

    fn harness(config: AppConfig, setup: Setup) -> Harness {
        let log: Log = Arc::default();
        let capture = Arc::new(FakeCapture {
            log: Arc::clone(&log),
            script: Mutex::new(setup.capture_script.into()),
            calls: Mutex::default(),
        });
        let settings = Arc::new(FakeSettings(Mutex::new(config)));
        let notifier = Arc::new(FakeNotifier {
            log: Arc::clone(&log),
            applied: Mutex::default(),
        });
        let strategies: Arc<Mutex<Vec<DuplicateStrategy>>> = Arc::default();
        let judges: JudgeFactory = {
            let log = Arc::clone(&log);
            let strategies = Arc::clone(&strategies);
            let duplicate_on = setup.duplicate_on;
            Arc::new(
                move |strategy: DuplicateStrategy| -> Box<dyn DuplicateJudge> {
                    strategies.lock().push(strategy);
                    Box::new(FakeJudge {
                        log: Arc::clone(&log),
                        duplicate_on,
                        calls: 0,
                    })
                },
            )
        };
        let ports = LoopPorts {
            capture: capture.clone(),
            actions: Arc::new(FakeActions {
                log: Arc::clone(&log),
                persist_fails: setup.persist_fails,
                persist_delay: setup.persist_delay,
            }),
            notifier: notifier.clone(),
            permission: Arc::new(FakePermission(!setup.denied)),
            settings: settings.clone(),
            judges,
        };
        Harness {
            controller: LoopController::new(ports, PathBuf::from(DESKTOP)),
            log,
            capture,
            settings,
            notifier,
            strategies,
            t0: Instant::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_exactly_max_iterations() {
        let h = harness(config(3, 0.0, 1.0), Setup::default());

        h.controller.start().await.unwrap();
        assert!(h.controller.is_running());
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.shot_count, 3);
        assert!(report.session_folder.is_none());
        assert!(!h.controller.is_running());

        let desktop = PathBuf::from(DESKTOP);
        let mut expected = vec![Event::Reset, Event::Threshold(0.05)];
        for _ in 0..3 {
            expected.push(Event::Capture);
            expected.push(Event::Persist(desktop.clone()));
            expected.push(Event::Advance(AdvanceKey::Down));
        }
        expected.push(Event::Completed);
        assert_eq!(*h.log.lock(), expected);

        // 마지막 반복 뒤에는 대기하지 않음
        assert_eq!(
            h.capture_offsets(),
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_down_to_zero_then_captures() {
        let h = harness(config(1, 3.0, 0.0), Setup::default());

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(count(&h.log, |e| *e == Event::Tick), 4);
        let log = h.log.lock().clone();
        assert_eq!(
            log[2..7],
            [Event::Tick, Event::Tick, Event::Tick, Event::Tick, Event::Capture]
        );
        assert_eq!(h.capture_offsets(), vec![Duration::from_secs(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn fractional_delay_uses_whole_seconds() {
        let h = harness(config(1, 2.5, 0.0), Setup::default());

        h.controller.start().await.unwrap();
        h.controller.wait().await.unwrap();

        assert_eq!(count(&h.log, |e| *e == Event::Tick), 3);
        assert_eq!(h.capture_offsets(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_countdown_prevents_capture() {
        let h = harness(config(5, 5.0, 1.0), Setup::default());

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        h.controller.stop();
        assert!(!h.controller.is_running());

        let report = h.controller.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.shot_count, 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count(&h.log, |e| *e == Event::Tick), 2);
        assert_eq!(count(&h.log, |e| *e == Event::Capture), 0);
        assert_eq!(count(&h.log, |e| *e == Event::Completed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_interval_returns_immediately() {
        let h = harness(config(5, 0.0, 10.0), Setup::default());

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.controller.stop();

        let report = h.controller.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.shot_count, 1);
        assert!(h.t0.elapsed() < Duration::from_secs(2));
        assert_eq!(count(&h.log, |e| *e == Event::Completed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_stops_without_persist_or_advance() {
        let mut cfg = config(10, 0.0, 1.0);
        cfg.duplicate.enabled = true;
        let h = harness(
            cfg,
            Setup {
                duplicate_on: Some(3),
                ..Setup::default()
            },
        );

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::DuplicateDetected);
        assert_eq!(report.shot_count, 2);
        assert_eq!(count(&h.log, |e| *e == Event::Capture), 3);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Persist(_))), 2);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Advance(_))), 2);

        let log = h.log.lock();
        assert_eq!(
            log[log.len() - 3..],
            [Event::Capture, Event::Judge, Event::Completed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_detection_never_consults_judge() {
        let h = harness(
            config(3, 0.0, 0.0),
            Setup {
                duplicate_on: Some(1),
                ..Setup::default()
            },
        );

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.shot_count, 3);
        assert_eq!(count(&h.log, |e| *e == Event::Judge), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_failure_is_not_counted_and_interval_elapses() {
        let h = harness(
            config(2, 0.0, 1.0),
            Setup {
                capture_script: vec![false, true, true],
                ..Setup::default()
            },
        );

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.shot_count, 2);
        assert_eq!(count(&h.log, |e| *e == Event::CaptureFailed), 1);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Persist(_))), 2);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Advance(_))), 2);
        assert_eq!(
            h.capture_offsets(),
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persist_failure_still_advances_and_counts() {
        let h = harness(
            config(2, 0.0, 0.0),
            Setup {
                persist_fails: true,
                ..Setup::default()
            },
        );

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.shot_count, 2);
        assert_eq!(count(&h.log, |e| *e == Event::PersistFailed), 2);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Advance(_))), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_denied_changes_nothing() {
        let h = harness(
            config(3, 0.0, 0.0),
            Setup {
                denied: true,
                ..Setup::default()
            },
        );

        let err = h.controller.start().await.unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied(_)));
        assert!(!h.controller.is_running());
        assert!(h.controller.wait().await.is_none());

        assert!(matches!(
            h.controller.take_single_shot(),
            Err(CoreError::PermissionDenied(_))
        ));
        assert!(h.log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_awaits_previous_run() {
        let h = harness(config(100, 0.0, 1.0), Setup::default());

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        h.settings.set(config(2, 0.0, 1.0));
        h.controller.start().await.unwrap();
        assert!(h.controller.is_running());
        let report = h.controller.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.shot_count, 2);

        let log = h.log.lock();
        let resets: Vec<usize> = log
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == Event::Reset)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(resets.len(), 2);

        let (first, second) = log.split_at(resets[1]);
        assert_eq!(first.iter().filter(|e| **e == Event::Capture).count(), 3);
        assert_eq!(second.iter().filter(|e| **e == Event::Capture).count(), 2);
        assert_eq!(first.iter().filter(|e| **e == Event::Completed).count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_run_that_is_being_waited_on() {
        let h = harness(config(100, 0.0, 1.0), Setup::default());
        h.controller.start().await.unwrap();
        h.settings.set(config(2, 0.0, 1.0));

        let (first, restarted_at) = tokio::join!(h.controller.wait(), async {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            h.controller.start().await.unwrap();
            h.t0.elapsed()
        });

        let first = first.unwrap();
        assert_eq!(first.outcome, RunOutcome::Cancelled);
        assert_eq!(first.shot_count, 3);
        assert!(restarted_at < Duration::from_secs(3), "{restarted_at:?}");

        let second = h.controller.wait().await.unwrap();
        assert_eq!(second.outcome, RunOutcome::Completed);
        assert_eq!(second.shot_count, 2);
        assert_eq!(count(&h.log, |e| *e == Event::Capture), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_restart_cancels_new_run() {
        let h = harness(
            config(100, 0.0, 1.0),
            Setup {
                persist_delay: Duration::from_secs(5),
                ..Setup::default()
            },
        );
        h.controller.start().await.unwrap();
        // 첫 실행은 0초 캡처의 저장(5초) 도중
        tokio::time::sleep(Duration::from_secs(1)).await;

        let (restarted, ()) = tokio::join!(h.controller.start(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            h.controller.stop();
        });
        restarted.unwrap();
        assert!(!h.controller.is_running());

        let report = h.controller.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.shot_count, 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!h.controller.is_running());
        assert_eq!(count(&h.log, |e| *e == Event::Capture), 1);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Advance(_))), 0);
        assert_eq!(count(&h.log, |e| *e == Event::Completed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_interval_waits_until_stopped() {
        let h = harness(config(3, 0.0, 1e20), Setup::default());

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.controller.is_running());
        h.controller.stop();

        let report = h.controller.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.shot_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_shot_runs_beside_active_run() {
        let mut cfg = config(4, 0.0, 1.0);
        cfg.duplicate.enabled = true;
        let h = harness(cfg, Setup::default());

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let saved = h.controller.take_single_shot().unwrap().await.unwrap();
        assert_eq!(saved, Some(PathBuf::from(DESKTOP).join("capture.png")));
        assert!(h.controller.is_running());

        let report = h.controller.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.shot_count, 4);
        assert_eq!(count(&h.log, |e| *e == Event::Judge), 4);
        assert_eq!(count(&h.log, |e| *e == Event::Capture), 5);
        assert_eq!(count(&h.log, |e| matches!(e, Event::Advance(_))), 5);
        assert_eq!(
            h.capture_offsets(),
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_millis(2500),
                Duration::from_secs(3),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn each_start_takes_strategy_and_sounds_from_settings() {
        let h = harness(config(1, 0.0, 0.0), Setup::default());
        h.controller.start().await.unwrap();
        h.controller.wait().await.unwrap();

        let mut cfg = config(1, 0.0, 0.0);
        cfg.duplicate.strategy = DuplicateStrategy::Perceptual;
        cfg.notification.completion_sound = "Glass".to_string();
        h.settings.set(cfg);
        h.controller.start().await.unwrap();
        h.controller.wait().await.unwrap();

        assert_eq!(
            *h.strategies.lock(),
            vec![DuplicateStrategy::Exact, DuplicateStrategy::Perceptual]
        );
        let applied = h.notifier.applied.lock();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].completion_sound, SOUND_NONE);
        assert_eq!(applied[1].completion_sound, "Glass");
    }

    #[tokio::test(start_paused = true)]
    async fn running_state_is_published() {
        let h = harness(config(2, 0.0, 1.0), Setup::default());
        let mut rx = h.controller.subscribe_running();
        assert!(!*rx.borrow_and_update());

        h.controller.start().await.unwrap();
        assert!(*rx.borrow_and_update());

        h.controller.wait().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test(start_paused = true)]
    async fn settings_are_snapshotted_at_start() {
        let h = harness(config(2, 0.0, 1.0), Setup::default());

        h.controller.start().await.unwrap();
        h.settings.set(config(10, 0.0, 1.0));
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.shot_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_idle_is_noop() {
        let h = harness(config(2, 0.0, 1.0), Setup::default());
        h.controller.stop();
        assert!(!h.controller.is_running());
        assert!(h.controller.wait().await.is_none());
        assert!(h.log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn single_shot_captures_once_without_run_state() {
        let mut cfg = config(50, 5.0, 1.0);
        cfg.duplicate.enabled = true;
        let h = harness(cfg, Setup::default());

        let handle = h.controller.take_single_shot().unwrap();
        assert!(!h.controller.is_running());
        let saved = handle.await.unwrap();

        assert_eq!(saved, Some(PathBuf::from(DESKTOP).join("capture.png")));
        assert!(!h.controller.is_running());
        assert_eq!(
            *h.log.lock(),
            vec![
                Event::Capture,
                Event::Persist(PathBuf::from(DESKTOP)),
                Event::Advance(AdvanceKey::Down)
            ]
        );
        assert_eq!(h.capture_offsets(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn single_shot_capture_failure_still_advances() {
        let h = harness(
            config(50, 0.0, 1.0),
            Setup {
                capture_script: vec![false],
                ..Setup::default()
            },
        );

        let saved = h.controller.take_single_shot().unwrap().await.unwrap();

        assert!(saved.is_none());
        assert_eq!(
            *h.log.lock(),
            vec![Event::CaptureFailed, Event::Advance(AdvanceKey::Down)]
        );
    }

    #[tokio::test]
    async fn session_folder_is_created_under_save_folder() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = config(1, 0.0, 0.0);
        cfg.output.save_folder = dir.path().to_string_lossy().into_owned();
        cfg.output.auto_create_folder = true;
        let h = harness(cfg, Setup::default());

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        let folder = report.session_folder.unwrap();
        assert!(folder.is_dir());
        assert_eq!(folder.parent(), Some(dir.path()));
        assert!(h.log.lock().contains(&Event::Persist(folder)));
    }

    #[tokio::test]
    async fn session_folder_failure_falls_back_to_base() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut cfg = config(1, 0.0, 0.0);
        cfg.output.save_folder = blocker.to_string_lossy().into_owned();
        cfg.output.auto_create_folder = true;
        let h = harness(cfg, Setup::default());

        h.controller.start().await.unwrap();
        let report = h.controller.wait().await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(report.session_folder.is_none());
        assert!(h.log.lock().contains(&Event::Persist(blocker)));
    }
}
