use std::sync::Arc;

use clip_logging::clip_info;

use crate::notify::Notifier as _;
use crate::router::{convert_and_download, RouterDeps};
use crate::{CapturedDocument, ConvertError, FailureKind};

/// Context a menu action binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    Page,
    Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ConvertFullPage,
    ConvertSelection,
    SelectRegions,
}

impl MenuAction {
    pub const ALL: [MenuAction; 3] = [
        MenuAction::ConvertFullPage,
        MenuAction::ConvertSelection,
        MenuAction::SelectRegions,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MenuAction::ConvertFullPage => "clipdown-convert-page",
            MenuAction::ConvertSelection => "clipdown-convert-selection",
            MenuAction::SelectRegions => "clipdown-select-regions",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            MenuAction::ConvertFullPage => "Convert page to Markdown",
            MenuAction::ConvertSelection => "Convert selection to Markdown",
            MenuAction::SelectRegions => "Select regions to convert",
        }
    }

    pub fn context(self) -> MenuContext {
        match self {
            MenuAction::ConvertSelection => MenuContext::Selection,
            _ => MenuContext::Page,
        }
    }
}

/// What the context-menu facility consumes at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRegistration {
    pub id: &'static str,
    pub title: &'static str,
    pub context: MenuContext,
}

pub fn registrations() -> Vec<MenuRegistration> {
    MenuAction::ALL
        .into_iter()
        .map(|action| MenuRegistration {
            id: action.id(),
            title: action.title(),
            context: action.context(),
        })
        .collect()
}

/// Invocation delivered by the menu facility: the action id, addressed at
/// the active page, plus the selected text for selection-context actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEvent {
    pub action_id: String,
    pub selection_text: Option<String>,
}

/// Injection seam into the active page, the capture interface consumed as an
/// external collaborator.
pub trait PageAgent: Send + Sync {
    /// One synchronous call returning captured markup or nothing.
    fn capture_page(&self) -> Option<CapturedDocument>;
    /// The page title, when one is known.
    fn page_title(&self) -> Option<String>;
    /// Opens the region-selection overlay in the page.
    fn open_region_selector(&self) -> Result<(), String>;
}

/// Dispatches context-menu invocations. Each flow carries its own
/// failure-notification path and never replies to anyone.
pub struct MenuHandler {
    deps: RouterDeps,
    agent: Arc<dyn PageAgent>,
}

impl MenuHandler {
    pub fn new(deps: RouterDeps, agent: Arc<dyn PageAgent>) -> Self {
        Self { deps, agent }
    }

    pub async fn handle(&self, event: MenuEvent) {
        let Some(action) = MenuAction::from_id(&event.action_id) else {
            self.deps.notifier.notify(
                "Clipdown",
                &ConvertError::new(
                    FailureKind::UnsupportedAction,
                    format!("unknown menu action \"{}\"", event.action_id),
                )
                .to_string(),
            );
            return;
        };
        clip_info!("context menu action: {}", action.id());

        match action {
            MenuAction::ConvertFullPage => match self.agent.capture_page() {
                // A restricted page is reported before any remote call.
                None => self.deps.notifier.notify(
                    "Clipdown",
                    &ConvertError::new(FailureKind::Capture, "page markup was unavailable")
                        .to_string(),
                ),
                Some(doc) => {
                    convert_and_download(&self.deps, &doc.html, &doc.source_title).await;
                }
            },
            MenuAction::ConvertSelection => {
                let text = event
                    .selection_text
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty());
                match text {
                    None => self.deps.notifier.notify(
                        "Clipdown",
                        &ConvertError::new(FailureKind::Capture, "no text is selected").to_string(),
                    ),
                    Some(text) => {
                        let html = selection_markup(text);
                        let title = self
                            .agent
                            .page_title()
                            .unwrap_or_else(|| "selection".to_string());
                        convert_and_download(&self.deps, &html, &title).await;
                    }
                }
            }
            MenuAction::SelectRegions => {
                if let Err(reason) = self.agent.open_region_selector() {
                    self.deps
                        .notifier
                        .notify("Clipdown", &format!("could not open the selector: {reason}"));
                }
            }
        }
    }
}

/// Plain selected text wrapped as minimal markup for the converter.
fn selection_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\n' => escaped.push_str("<br>"),
            other => escaped.push(other),
        }
    }
    format!("<div><p>{escaped}</p></div>")
}
