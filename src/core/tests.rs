use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigOptions;
use crate::context::ServiceContext;
use crate::core::{Phase, Runner, RunnerConfig};
use crate::error::{BoxError, ServiceError};
use crate::events::{Event, EventKind};
use crate::service::{Health, HealthStatus, Service, ServiceRef};
use crate::subscribers::Subscribe;

#[derive(Clone, Copy)]
enum RunMode {
    Return,
    Fail(&'static str),
    SleepThenOk(Duration),
    UntilCancelled,
    Panic,
    IgnoreCancel,
}

struct Probe {
    name: &'static str,
    init_err: Option<&'static str>,
    mode: RunMode,
    shutdown_err: Option<&'static str>,
    shutdown_delay: Duration,
    inits: AtomicUsize,
    runs: AtomicUsize,
    shutdowns: AtomicUsize,
    saw_cancel: AtomicBool,
}

impl Probe {
    fn new(name: &'static str, mode: RunMode) -> Self {
        Self {
            name,
            init_err: None,
            mode,
            shutdown_err: None,
            shutdown_delay: Duration::ZERO,
            inits: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            saw_cancel: AtomicBool::new(false),
        }
    }

    fn failing_init(mut self, msg: &'static str) -> Self {
        self.init_err = Some(msg);
        self
    }

    fn failing_shutdown(mut self, msg: &'static str) -> Self {
        self.shutdown_err = Some(msg);
        self
    }

    fn slow_shutdown(mut self, d: Duration) -> Self {
        self.shutdown_delay = d;
        self
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.inits.load(Ordering::SeqCst),
            self.runs.load(Ordering::SeqCst),
            self.shutdowns.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl Service for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    async fn initialize(&self, _ctx: &ServiceContext) -> Result<(), BoxError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        match self.init_err {
            Some(msg) => Err(msg.into()),
            None => Ok(()),
        }
    }

    async fn run(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            RunMode::Return => Ok(()),
            RunMode::Fail(msg) => Err(msg.into()),
            RunMode::SleepThenOk(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
            RunMode::UntilCancelled => {
                ctx.cancelled().await;
                self.saw_cancel.store(true, Ordering::SeqCst);
                Ok(())
            }
            RunMode::Panic => panic!("run exploded"),
            RunMode::IgnoreCancel => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
        }
    }

    async fn shutdown(&self, _ctx: &ServiceContext) -> Result<(), BoxError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if !self.shutdown_delay.is_zero() {
            tokio::time::sleep(self.shutdown_delay).await;
        }
        match self.shutdown_err {
            Some(msg) => Err(msg.into()),
            None => Ok(()),
        }
    }

    fn health(&self) -> Health {
        Health::healthy()
    }
}

fn runner() -> Runner {
    runner_with(RunnerConfig::default())
}

fn runner_with(cfg: RunnerConfig) -> Runner {
    let cfg = cfg.with_config(ConfigOptions::default().with_env_vars(false));
    Runner::builder(cfg).build()
}

fn svc(probe: &Arc<Probe>) -> ServiceRef {
    Arc::clone(probe) as ServiceRef
}

#[tokio::test]
async fn test_clean_run_finishes() {
    let probe = Arc::new(Probe::new("clean", RunMode::Return));
    let runner = runner();

    let handle = runner.run(&CancellationToken::new(), svc(&probe));
    assert!(handle.wait().await.is_ok());
    assert_eq!(handle.phase(), Phase::Finished);
    assert!(handle.error().is_none());
    assert!(handle.is_terminated());
    assert!(handle.exit_seq().is_some());
    assert_eq!(probe.counts(), (1, 1, 1));
    assert_eq!(handle.health().status, HealthStatus::Healthy);
    assert_eq!(handle.to_string(), "clean @ 0.0.1");
}

#[tokio::test]
async fn test_name_without_ascii_runs_with_default_telemetry() {
    let probe = Arc::new(Probe::new("サービス", RunMode::Return));
    let runner = Runner::builder(RunnerConfig::default()).build();

    let handle = runner.run(&CancellationToken::new(), svc(&probe));
    assert!(handle.wait().await.is_ok());
    assert_eq!(handle.phase(), Phase::Finished);
    assert_eq!(probe.counts(), (1, 1, 1));
}

#[test]
fn test_default_runner_requires_runtime() {
    assert!(std::panic::catch_unwind(Runner::default).is_err());
}

#[tokio::test]
async fn test_default_runner_inside_runtime() {
    let runner = Runner::default();
    assert_eq!(runner.config().grace_limit(), None);
    runner.close().await;
}

#[tokio::test]
async fn test_initialize_error_skips_run() {
    let probe = Arc::new(Probe::new("init-fails", RunMode::Return).failing_init("no db"));
    let runner = runner();

    let handle = runner.run(&CancellationToken::new(), svc(&probe));
    let err = handle.wait().await.unwrap_err();
    assert_eq!(probe.counts(), (1, 0, 1));
    assert_eq!(handle.phase(), Phase::Failed);
    assert_eq!(err.primary().as_label(), "service_initialize_failed");
    assert_eq!(
        handle.error().map(|e| e.to_string()),
        Some("initialize failed: no db".to_string())
    );
}

#[tokio::test]
async fn test_concurrent_shutdown_runs_callback_once() {
    let probe = Arc::new(
        Probe::new("multi", RunMode::UntilCancelled)
            .failing_shutdown("test")
            .slow_shutdown(Duration::from_millis(20)),
    );
    let runner = runner();
    let handle = runner.run(&CancellationToken::new(), svc(&probe));

    let calls: Vec<_> = (0..8)
        .map(|_| {
            let h = handle.clone();
            tokio::spawn(async move { h.shutdown().await })
        })
        .collect();

    let mut results = Vec::new();
    for call in calls {
        results.push(call.await.unwrap());
    }

    assert_eq!(probe.shutdowns.load(Ordering::SeqCst), 1);
    let first = results[0].as_ref().unwrap_err();
    for res in &results {
        let err = res.as_ref().unwrap_err();
        assert!(Arc::ptr_eq(err.primary(), first.primary()));
        assert_eq!(err.to_string(), "shutdown failed: test");
    }
    assert!(probe.saw_cancel.load(Ordering::SeqCst));
    assert_eq!(handle.phase(), Phase::Failed);
}

#[tokio::test]
async fn test_dropped_shutdown_future_does_not_rearm_gate() {
    let probe = Arc::new(
        Probe::new("dropper", RunMode::UntilCancelled).slow_shutdown(Duration::from_millis(30)),
    );
    let runner = runner();
    let handle = runner.run(&CancellationToken::new(), svc(&probe));

    let aborted = tokio::time::timeout(Duration::from_millis(1), handle.shutdown()).await;
    assert!(aborted.is_err());

    assert!(handle.shutdown().await.is_ok());
    assert_eq!(probe.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_group_first_failure_cancels_siblings() {
    let a = Arc::new(Probe::new("a", RunMode::Fail("boom")));
    let b = Arc::new(Probe::new("b", RunMode::UntilCancelled));
    let runner = runner();

    let report = runner
        .run_group_and_wait(&CancellationToken::new(), vec![svc(&a), svc(&b)])
        .await;

    assert!(b.saw_cancel.load(Ordering::SeqCst));
    assert_eq!(report.exit_code(), 2);
    let order: Vec<&str> = report.exit_order().iter().map(|o| o.identity.name()).collect();
    assert_eq!(order, vec!["a", "b"]);

    let err = report.into_result().unwrap_err();
    assert_eq!(err.primary().to_string(), "run failed: boom");
}

#[tokio::test]
async fn test_group_aggregates_sibling_shutdown_errors() {
    let a = Arc::new(Probe::new("a", RunMode::Fail("boom")));
    let b = Arc::new(Probe::new("b", RunMode::UntilCancelled).failing_shutdown("cleanup"));
    let runner = runner();

    let err = runner
        .run_group_and_wait(&CancellationToken::new(), vec![svc(&b), svc(&a)])
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(err.primary().to_string(), "run failed: boom");
    let assoc: Vec<String> = err.associated().iter().map(|e| e.to_string()).collect();
    assert_eq!(assoc, vec!["shutdown failed: cleanup"]);
}

#[tokio::test]
async fn test_group_clean_exit_also_cancels() {
    let a = Arc::new(Probe::new("a", RunMode::Return));
    let b = Arc::new(Probe::new("b", RunMode::UntilCancelled));
    let runner = runner();

    let report = runner
        .run_group_and_wait(&CancellationToken::new(), vec![svc(&a), svc(&b)])
        .await;
    assert!(report.is_success());
    assert!(b.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_parallel_failure_does_not_cancel_siblings() {
    let a = Arc::new(Probe::new("a", RunMode::Fail("boom")));
    let b = Arc::new(Probe::new("b", RunMode::UntilCancelled));
    let runner = runner();
    let base = CancellationToken::new();

    let handles = runner.run_parallel(&base, vec![svc(&a), svc(&b)]);
    assert!(handles[0].wait().await.is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(handles[1].phase(), Phase::Running);
    assert!(!b.saw_cancel.load(Ordering::SeqCst));

    base.cancel();
    assert!(handles[1].wait().await.is_ok());
    assert!(b.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_wait_is_idempotent() {
    let probe = Arc::new(Probe::new("idem", RunMode::Fail("x")).failing_shutdown("y"));
    let runner = runner();
    let handle = runner.run(&CancellationToken::new(), svc(&probe));

    let first = handle.wait().await.unwrap_err();
    let second = handle.wait().await.unwrap_err();
    assert!(Arc::ptr_eq(first.primary(), second.primary()));
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.to_string(), "run failed: x (associated: shutdown failed: y)");
    assert_eq!(probe.counts(), (1, 1, 1));
}

#[tokio::test]
async fn test_shutdown_error_alone_fails_run() {
    let probe = Arc::new(
        Probe::new("example", RunMode::SleepThenOk(Duration::from_millis(50)))
            .failing_shutdown("test"),
    );
    let runner = runner();
    let mut rx = runner.bus().subscribe();

    let handle = runner.run(&CancellationToken::new(), svc(&probe));
    assert_eq!(handle.phase(), Phase::Waiting);
    let err = handle.wait().await.unwrap_err();

    assert!(err.associated().is_empty());
    match err.primary().as_ref() {
        ServiceError::Shutdown { source } => assert_eq!(source.to_string(), "test"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(handle.error().is_none());
    assert!(handle.shutdown_error().is_some());

    let mut phases = Vec::new();
    loop {
        let ev = rx.recv().await.unwrap();
        if ev.run_id.as_deref() != Some(handle.run_id()) {
            continue;
        }
        match ev.kind {
            EventKind::PhaseChanged => phases.push(ev.phase.unwrap()),
            EventKind::ServiceExited => break,
            _ => {}
        }
    }
    assert_eq!(
        phases,
        vec![
            Phase::Initializing,
            Phase::Running,
            Phase::ShuttingDown,
            Phase::Failed
        ]
    );
}

#[tokio::test]
async fn test_context_failure_never_invokes_service() {
    let probe = Arc::new(Probe::new("", RunMode::Return));
    let runner = runner();

    let handle = runner.run(&CancellationToken::new(), svc(&probe));
    assert!(handle.is_terminated());
    assert_eq!(handle.phase(), Phase::Failed);

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err.primary().as_ref(), ServiceError::Context { .. }));
    assert_eq!(err.exit_code(), 78);

    assert!(handle.shutdown().await.is_err());
    assert_eq!(probe.counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_context_failure_counts_as_first_group_exit() {
    let bad = Arc::new(Probe::new(" ", RunMode::Return));
    let b = Arc::new(Probe::new("b", RunMode::UntilCancelled));
    let runner = runner();

    let report = runner
        .run_group_and_wait(&CancellationToken::new(), vec![svc(&bad), svc(&b)])
        .await;

    assert!(b.saw_cancel.load(Ordering::SeqCst));
    assert_eq!(bad.counts(), (0, 0, 0));
    let err = report.into_result().unwrap_err();
    assert_eq!(err.primary().as_label(), "service_context_failed");
}

#[tokio::test]
async fn test_run_panic_is_recorded() {
    let probe = Arc::new(Probe::new("panicky", RunMode::Panic));
    let runner = runner();

    let handle = runner.run(&CancellationToken::new(), svc(&probe));
    let err = handle.wait().await.unwrap_err();
    assert!(matches!(
        err.primary().as_ref(),
        ServiceError::Panicked { phase: Phase::Running, message } if message == "run exploded"
    ));
    assert_eq!(probe.counts(), (1, 1, 1));
    assert_eq!(err.exit_code(), 101);
}

#[tokio::test]
async fn test_settle_without_signal_returns_worst_code() {
    let a = Arc::new(Probe::new("a", RunMode::Fail("boom")));
    let b = Arc::new(Probe::new("b", RunMode::Return).failing_init("bad"));
    let runner = runner();
    let base = CancellationToken::new();

    let handles = runner.run_parallel(&base, vec![svc(&a), svc(&b)]);
    let code = runner.settle(&base, &handles, std::future::pending()).await;
    assert_eq!(code, 3);
}

#[tokio::test]
async fn test_settle_on_signal_cancels_base() {
    let probe = Arc::new(Probe::new("waiter", RunMode::UntilCancelled));
    let runner = runner_with(RunnerConfig::default().with_grace(Duration::from_secs(5)));
    let base = CancellationToken::new();

    let handles = vec![runner.run(&base, svc(&probe))];
    let code = runner.settle(&base, &handles, async { "SIGTERM" }).await;
    assert_eq!(code, 0);
    assert!(base.is_cancelled());
    assert!(probe.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_settle_grace_exceeded() {
    let probe = Arc::new(Probe::new("stuck", RunMode::IgnoreCancel));
    let runner = runner_with(RunnerConfig::default().with_grace(Duration::from_millis(30)));
    let base = CancellationToken::new();
    let mut rx = runner.bus().subscribe();

    let handles = vec![runner.run(&base, svc(&probe))];
    let code = runner.settle(&base, &handles, async { "SIGINT" }).await;
    assert_eq!(code, crate::error::EXIT_GRACE_EXCEEDED);
    assert!(!handles[0].is_terminated());

    loop {
        let ev = rx.recv().await.unwrap();
        if ev.kind == EventKind::GraceExceeded {
            assert!(ev.reason.unwrap().contains(handles[0].run_id()));
            break;
        }
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(EventKind, Option<Phase>)>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push((ev.kind, ev.phase));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn test_close_drains_subscribers() {
    let rec = Arc::new(Recorder::default());
    let cfg = RunnerConfig::default().with_config(ConfigOptions::default().with_env_vars(false));
    let runner = Runner::builder(cfg)
        .with_subscriber(rec.clone() as Arc<dyn Subscribe>)
        .build();

    let probe = Arc::new(Probe::new("observed", RunMode::Return));
    let report = runner.run_and_wait(&CancellationToken::new(), svc(&probe)).await;
    assert!(report.is_success());
    runner.close().await;

    let seen = rec.0.lock().unwrap();
    assert!(seen.contains(&(EventKind::ShutdownRequested, None)));
    assert!(seen.contains(&(EventKind::ServiceExited, Some(Phase::Finished))));
}
