use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clipdown_engine::{
    CapturedDocument, ConvertError, ConvertService, FileDownloader, MenuAction, MenuEvent,
    MenuHandler, Notifier, PageAgent, RouterDeps,
};
use tempfile::TempDir;

struct RecordingConverter {
    calls: AtomicUsize,
    received: Mutex<Vec<String>>,
}

impl RecordingConverter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl ConvertService for RecordingConverter {
    async fn convert(&self, html: &str) -> Result<String, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(html.to_string());
        Ok("# out\n".to_string())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn take(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.events
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

struct StubAgent {
    page: Option<CapturedDocument>,
    selector_failure: Option<String>,
}

impl PageAgent for StubAgent {
    fn capture_page(&self) -> Option<CapturedDocument> {
        self.page.clone()
    }

    fn page_title(&self) -> Option<String> {
        self.page.as_ref().map(|p| p.source_title.clone())
    }

    fn open_region_selector(&self) -> Result<(), String> {
        match &self.selector_failure {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}

struct Fixture {
    handler: MenuHandler,
    converter: Arc<RecordingConverter>,
    notifier: Arc<RecordingNotifier>,
    temp: TempDir,
}

fn fixture(agent: StubAgent) -> Fixture {
    let temp = TempDir::new().unwrap();
    let converter = RecordingConverter::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let deps = RouterDeps {
        converter: converter.clone(),
        downloader: Arc::new(FileDownloader::new(temp.path().to_path_buf())),
        notifier: notifier.clone(),
        date_stamp: Arc::new(|| "2026-08-07".to_string()),
    };
    Fixture {
        handler: MenuHandler::new(deps, Arc::new(agent)),
        converter,
        notifier,
        temp,
    }
}

fn event(action: MenuAction, selection_text: Option<&str>) -> MenuEvent {
    MenuEvent {
        action_id: action.id().to_string(),
        selection_text: selection_text.map(str::to_string),
    }
}

#[tokio::test]
async fn restricted_page_never_reaches_the_converter() {
    let fx = fixture(StubAgent {
        page: None,
        selector_failure: None,
    });

    fx.handler
        .handle(event(MenuAction::ConvertFullPage, None))
        .await;

    assert_eq!(fx.converter.calls.load(Ordering::SeqCst), 0);
    let events = fx.notifier.take();
    assert_eq!(events.len(), 1);
    assert!(events[0].1.contains("capture failed"));
}

#[tokio::test]
async fn full_page_flow_converts_and_downloads() {
    let fx = fixture(StubAgent {
        page: Some(CapturedDocument {
            html: "<html><body>doc</body></html>".to_string(),
            size_bytes: 30,
            source_title: "A Page".to_string(),
        }),
        selector_failure: None,
    });

    fx.handler
        .handle(event(MenuAction::ConvertFullPage, None))
        .await;

    let saved = fx.temp.path().join("2026-08-07_A_Page.md");
    assert!(saved.exists());
    assert!(fx.notifier.take().is_empty());
}

#[tokio::test]
async fn selection_flow_wraps_and_escapes_the_text() {
    let fx = fixture(StubAgent {
        page: Some(CapturedDocument {
            html: String::new(),
            size_bytes: 0,
            source_title: "A Page".to_string(),
        }),
        selector_failure: None,
    });

    fx.handler
        .handle(event(MenuAction::ConvertSelection, Some("1 < 2")))
        .await;

    let received = fx.converter.received.lock().unwrap().clone();
    assert_eq!(received, vec!["<div><p>1 &lt; 2</p></div>".to_string()]);
    assert!(fx.temp.path().join("2026-08-07_A_Page.md").exists());
}

#[tokio::test]
async fn empty_selection_is_reported_without_a_remote_call() {
    let fx = fixture(StubAgent {
        page: None,
        selector_failure: None,
    });

    fx.handler
        .handle(event(MenuAction::ConvertSelection, Some("   ")))
        .await;

    assert_eq!(fx.converter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.notifier.take().len(), 1);
}

#[tokio::test]
async fn selector_injection_failure_is_notified() {
    let fx = fixture(StubAgent {
        page: None,
        selector_failure: Some("page is restricted".to_string()),
    });

    fx.handler
        .handle(event(MenuAction::SelectRegions, None))
        .await;

    let events = fx.notifier.take();
    assert_eq!(events.len(), 1);
    assert!(events[0].1.contains("page is restricted"));
}

#[tokio::test]
async fn unknown_menu_action_is_notified() {
    let fx = fixture(StubAgent {
        page: None,
        selector_failure: None,
    });

    fx.handler
        .handle(MenuEvent {
            action_id: "clipdown-unknown".to_string(),
            selection_text: None,
        })
        .await;

    assert_eq!(fx.converter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.notifier.take().len(), 1);
}
