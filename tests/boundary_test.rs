use fittrack::boundary::{FAULT_MESSAGE, FaultBoundary, Phase, ReloadHost};
use fittrack::client::ApiError;
use fittrack::logger::{DiagnosticLogger, LogLevel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct Page {
    reloaded: AtomicBool,
}

impl ReloadHost for Page {
    fn reload(&self) {
        self.reloaded.store(true, Ordering::SeqCst);
    }
}

struct Dashboard {
    workouts: Vec<u32>,
}

impl Dashboard {
    fn render(&self) -> String {
        let best = self.workouts.iter().max().expect("dashboard needs at least one workout");
        format!("Best: {best} kcal")
    }
}

#[test]
fn test_sibling_boundaries_are_independent() {
    let logger = DiagnosticLogger::default();
    let page = Arc::new(Page::default());
    let mut stats = FaultBoundary::new("stats", logger.clone(), page.clone());
    let mut feed = FaultBoundary::new("feed", logger.clone(), page.clone());

    let empty = Dashboard { workouts: vec![] };
    let full = Dashboard { workouts: vec![320, 410] };

    assert!(stats.render(|| empty.render()).is_fallback());
    assert_eq!(feed.render(|| full.render()).content().as_deref(), Some("Best: 410 kcal"));

    assert_eq!(stats.state().phase, Phase::Errored);
    assert_eq!(feed.state().phase, Phase::Normal);

    let errors = logger.get_logs(Some(LogLevel::Error));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, FAULT_MESSAGE);
    assert_eq!(errors[0].data.as_ref().unwrap()["boundary"], "stats");

    stats.trigger_recovery();
    assert!(page.reloaded.load(Ordering::SeqCst));
}

#[test]
fn test_returned_errors_are_content_not_faults() {
    let logger = DiagnosticLogger::default();
    let mut boundary = FaultBoundary::new("profile", logger.clone(), Arc::new(Page::default()));

    let rendered = boundary.render(|| Err::<String, _>(ApiError::Timeout));
    assert!(matches!(rendered.content(), Some(Err(ApiError::Timeout))));
    assert!(!boundary.is_errored());
    assert!(logger.is_empty());
}

#[tokio::test]
async fn test_panic_in_spawned_task_is_not_intercepted() {
    let logger = DiagnosticLogger::default();
    let mut boundary = FaultBoundary::new("sync", logger.clone(), Arc::new(Page::default()));

    let handle = boundary
        .render(|| tokio::spawn(async { panic!("background sync failed") }))
        .content()
        .unwrap();

    let joined = handle.await;
    assert!(joined.unwrap_err().is_panic());
    assert!(!boundary.is_errored());
    assert!(logger.is_empty());
}
