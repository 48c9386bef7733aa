use std::sync::Mutex;

use clipdown_page::{
    capture_page, AttachError, ConvertAction, Mark, Overlay, PageDocument, RegionSink,
    HOVER_CLASS, REGION_WRAPPER_CLASS, SELECTED_CLASS,
};
use pretty_assertions::assert_eq;

const FIXTURE: &str = r#"<html><head><title>Fixture Page</title><style>p { margin: 0 }</style></head>
<body>
  <article id="first"><p>First region</p></article>
  <section id="second"><p>Second region</p></section>
  <div id="tiny" width="10" height="10">too small</div>
  <div id="hidden" style="display: none"><p>unseen</p></div>
  <p id="third">Third region</p>
</body></html>"#;

#[derive(Default)]
struct RecordingSink {
    submissions: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<(String, String)> {
        self.submissions.lock().unwrap().drain(..).collect()
    }
}

impl RegionSink for RecordingSink {
    fn submit(&self, html: String, title: String) {
        self.submissions.lock().unwrap().push((html, title));
    }
}

fn attach() -> Overlay {
    Overlay::attach(FIXTURE).expect("attach")
}

fn one(overlay: &Overlay, selector: &str) -> clipdown_page::ElementId {
    let ids = overlay.find(selector);
    assert_eq!(ids.len(), 1, "selector {selector} should match once");
    ids[0]
}

#[test]
fn second_overlay_is_refused() {
    let overlay = attach();
    // The attached document now carries the panel; probing it again must
    // refuse a second overlay.
    let err = Overlay::attach(&overlay.document().document_html()).unwrap_err();
    assert_eq!(err, AttachError::AlreadyAttached);
}

#[test]
fn hover_and_selection_marks_follow_the_pointer() {
    let mut overlay = attach();
    let first = one(&overlay, "#first");
    let second = one(&overlay, "#second");

    overlay.pointer_enter(first);
    assert_eq!(overlay.mark(first), Some(Mark::Hovered));

    overlay.pointer_enter(second);
    assert_eq!(overlay.mark(first), None);
    assert_eq!(overlay.mark(second), Some(Mark::Hovered));

    overlay.click(second);
    assert_eq!(overlay.mark(second), Some(Mark::Selected));
    assert_eq!(overlay.panel().count_text, "1 regions selected");
    assert!(overlay.panel().convert_enabled);

    // Deselect with the pointer still over it: the hover mark returns.
    overlay.click(second);
    assert_eq!(overlay.mark(second), Some(Mark::Hovered));
    assert_eq!(overlay.panel().count_text, "0 regions selected");
    assert!(!overlay.panel().convert_enabled);
}

#[test]
fn excluded_elements_take_no_marks() {
    let mut overlay = attach();
    for selector in ["#tiny", "#hidden", "style", "#clipdown-panel", "#clipdown-convert"] {
        let id = one(&overlay, selector);
        overlay.pointer_enter(id);
        assert_eq!(overlay.mark(id), None, "{selector} must not hover");
        overlay.click(id);
        assert!(overlay.selection().is_empty(), "{selector} must not select");
    }
}

#[test]
fn convert_composes_one_wrapper_in_document_order() {
    let mut overlay = attach();
    let first = one(&overlay, "#first");
    let third = one(&overlay, "#third");

    // Select in reverse document order; composition is document order.
    overlay.click(third);
    overlay.click(first);

    let sink = RecordingSink::default();
    match overlay.convert(&sink) {
        ConvertAction::Submitted { confirmation } => {
            assert!(confirmation.contains("download"));
        }
        ConvertAction::NothingSelected(_) => panic!("selection was not empty"),
    }

    let submissions = sink.take();
    assert_eq!(submissions.len(), 1);
    let (html, title) = &submissions[0];
    assert_eq!(title, "Fixture Page");

    let composed = PageDocument::parse(html);
    let wrappers = composed.find(&format!("div.{REGION_WRAPPER_CLASS}"));
    assert_eq!(wrappers.len(), 1);
    let children = composed.find(&format!("div.{REGION_WRAPPER_CLASS} > *"));
    assert_eq!(children.len(), 2);
    let first_pos = html.find("First region").unwrap();
    let third_pos = html.find("Third region").unwrap();
    assert!(first_pos < third_pos);

    // Marker classes never reach the composed clones.
    assert!(!html.contains(HOVER_CLASS));
    assert!(!html.contains(SELECTED_CLASS));
}

#[test]
fn convert_with_empty_selection_sends_nothing() {
    let overlay = attach();
    let sink = RecordingSink::default();
    match overlay.convert(&sink) {
        ConvertAction::Submitted { .. } => panic!("nothing was selected"),
        ConvertAction::NothingSelected(overlay) => {
            // Still attached and usable.
            assert!(!overlay.panel().convert_enabled);
        }
    }
    assert!(sink.take().is_empty());
}

#[test]
fn cancel_sends_nothing() {
    let mut overlay = attach();
    let first = one(&overlay, "#first");
    overlay.click(first);

    let sink = RecordingSink::default();
    overlay.cancel();
    assert!(sink.take().is_empty());
}

#[test]
fn capture_reads_title_and_size() {
    let doc = PageDocument::parse(FIXTURE);
    let captured = capture_page(&doc).expect("capture");
    assert_eq!(captured.title, "Fixture Page");
    assert_eq!(captured.size_bytes, captured.html.len() as u64);
    assert!(captured.html.contains("First region"));
}

#[test]
fn capture_of_blank_page_returns_none() {
    let doc = PageDocument::parse("   \n  ");
    assert_eq!(capture_page(&doc), None);
}
