use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use marksort_core::{BookmarkNode, ProgressState, RunRequest, RunSummary};
use marksort_engine::{
    Controller, EngineHandle, InMemoryBookmarkStore, LivenessProbe, ModelClient, OrganizeError,
    OrganizerConfig, Reorganizer, TransportError,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(marksort_logging::initialize_for_tests);
}

struct AlwaysAlive;

#[async_trait::async_trait]
impl LivenessProbe for AlwaysAlive {
    async fn check(&self, _url: &str) -> bool {
        true
    }
}

/// Replies with a fixed body after `delay`.
struct ScriptedModel {
    reply: Result<String, OrganizeError>,
    delay: Duration,
}

#[async_trait::async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, _credential: &str, _prompt: &str) -> Result<String, OrganizeError> {
        tokio::time::sleep(self.delay).await;
        self.reply.clone()
    }
}

fn bar_tree() -> BookmarkNode {
    BookmarkNode::folder(
        "0",
        "",
        vec![
            BookmarkNode::folder(
                "1",
                "Bookmarks Bar",
                vec![
                    BookmarkNode::bookmark("10", "Rust", "https://rust-lang.org"),
                    BookmarkNode::bookmark("11", "Tokio", "https://tokio.rs"),
                ],
            ),
            BookmarkNode::folder("2", "Other Bookmarks", vec![]),
        ],
    )
}

fn controller(
    store: Arc<InMemoryBookmarkStore>,
    reply: Result<String, OrganizeError>,
    delay: Duration,
) -> Controller {
    let reorganizer = Reorganizer::new(
        store,
        Arc::new(AlwaysAlive),
        Arc::new(ScriptedModel { reply, delay }),
        OrganizerConfig {
            today: Arc::new(|| "2026-10-19".to_string()),
            ..OrganizerConfig::default()
        },
    );
    Controller::new(EngineHandle::new(reorganizer).expect("engine"))
}

fn request() -> RunRequest {
    RunRequest {
        credential: "key".to_string(),
        max_folders: Some(3),
        validate_urls: true,
    }
}

fn wait_for_terminal(controller: &mut Controller) -> ProgressState {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let progress = controller.get_progress();
        if progress.is_terminal() {
            return progress;
        }
        assert!(Instant::now() < deadline, "run did not finish: {progress:?}");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn completed_run_reports_summary() {
    init_logging();
    let store = Arc::new(InMemoryBookmarkStore::new(bar_tree()));
    let mut controller = controller(
        store.clone(),
        Ok(r#"{"folders":[{"name":"Dev","bookmarks":[0,1]}]}"#.to_string()),
        Duration::ZERO,
    );

    controller.start(request());
    let progress = wait_for_terminal(&mut controller);

    assert!(progress.done);
    assert!(!progress.running);
    assert_eq!(progress.percent, 100);
    assert_eq!(
        progress.result,
        Some(RunSummary {
            organized: 2,
            folders: 1,
            dead: 0
        })
    );
    assert_eq!(
        progress.summary_message().as_deref(),
        Some("Organized 2 bookmarks into 1 folders.")
    );
    assert!(controller.last_outcome().is_some_and(|o| o.warnings.is_empty()));

    let root = store.snapshot();
    assert_eq!(root.children[0].children[0].title, "Dev");
    assert_eq!(root.children[1].children[0].title, "Backup 2026-10-19");
}

#[test]
fn failed_run_surfaces_message() {
    init_logging();
    let store = Arc::new(InMemoryBookmarkStore::new(bar_tree()));
    let mut controller = controller(
        store,
        Err(OrganizeError::Transport(TransportError::Status {
            status: 403,
            body: "API key not valid".to_string(),
        })),
        Duration::ZERO,
    );

    controller.start(request());
    let progress = wait_for_terminal(&mut controller);

    assert!(!progress.done);
    assert_eq!(
        progress.error.as_deref(),
        Some("API error (403): API key not valid")
    );
    assert!(controller.last_outcome().is_none());
}

#[test]
fn cancel_stops_before_backup() {
    init_logging();
    let original = bar_tree();
    let store = Arc::new(InMemoryBookmarkStore::new(original.clone()));
    let mut controller = controller(
        store.clone(),
        Ok(r#"{"folders":[{"name":"Dev","bookmarks":[0,1]}]}"#.to_string()),
        Duration::from_millis(200),
    );

    controller.start(request());
    thread::sleep(Duration::from_millis(50));
    controller.cancel();

    let progress = controller.get_progress();
    assert!(progress.cancelled);
    assert!(!progress.running);
    assert_eq!(progress.text, "Cancelled");

    // The model call still returns; the run then stops at the next checkpoint.
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.run_in_flight() {
        assert!(Instant::now() < deadline, "engine never reported the cancelled run");
        thread::sleep(Duration::from_millis(10));
    }
    let progress = controller.get_progress();
    assert!(progress.cancelled);
    assert!(!progress.done);
    assert_eq!(store.snapshot(), original);
}

#[test]
fn restart_waits_for_cancelled_run_to_stop() {
    init_logging();
    let store = Arc::new(InMemoryBookmarkStore::new(bar_tree()));
    let mut controller = controller(
        store.clone(),
        Ok(r#"{"folders":[{"name":"Dev","bookmarks":[0,1]}]}"#.to_string()),
        Duration::from_millis(200),
    );

    assert!(controller.start(request()));
    thread::sleep(Duration::from_millis(50));
    controller.cancel();

    assert!(controller.run_in_flight());
    assert!(!controller.start(request()));
    let progress = controller.get_progress();
    assert!(progress.cancelled);
    assert!(!progress.running);

    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.run_in_flight() {
        assert!(Instant::now() < deadline, "engine never reported the cancelled run");
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(store.snapshot(), bar_tree());

    assert!(controller.start(request()));
    let progress = wait_for_terminal(&mut controller);
    assert!(progress.done);
    let root = store.snapshot();
    assert_eq!(root.children[0].children.len(), 1);
    assert_eq!(root.children[1].children.len(), 1);
}

#[test]
fn reset_after_finish_returns_to_idle() {
    init_logging();
    let store = Arc::new(InMemoryBookmarkStore::new(BookmarkNode::folder(
        "0",
        "",
        vec![BookmarkNode::folder("1", "Bookmarks Bar", vec![])],
    )));
    let mut controller = controller(store, Ok(String::new()), Duration::ZERO);

    controller.start(request());
    let progress = wait_for_terminal(&mut controller);
    assert_eq!(progress.error.as_deref(), Some("No bookmarks found to organize"));

    controller.reset();
    assert_eq!(controller.get_progress(), ProgressState::default());
}
