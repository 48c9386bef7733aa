use crate::view_model::build_view;
use crate::AppViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Capturing,
    Converting,
    Downloading,
    Succeeded,
    Failed,
}

impl WorkflowState {
    /// True while a stage of the workflow is still pending.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            WorkflowState::Capturing | WorkflowState::Converting | WorkflowState::Downloading
        )
    }
}

/// Markup captured from the page, remembered for the lifetime of one
/// conversion so a retry can skip re-capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage {
    pub html: String,
    pub size_bytes: u64,
    pub title: String,
}

/// The core's view of a failure kind, mapped from the background
/// orchestrator's serialized taxonomy at the context boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Capture,
    Connect,
    Network,
    Timeout,
    Server(u16),
    EmptyResponse,
    Protocol,
    UnsupportedAction,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ConvertFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    workflow: WorkflowState,
    captured: Option<CapturedPage>,
    failure: Option<ConvertFailure>,
    saved_to: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        build_view(self)
    }

    pub fn workflow(&self) -> WorkflowState {
        self.workflow
    }

    pub fn captured(&self) -> Option<&CapturedPage> {
        self.captured.as_ref()
    }

    pub fn failure(&self) -> Option<&ConvertFailure> {
        self.failure.as_ref()
    }

    pub fn saved_to(&self) -> Option<&str> {
        self.saved_to.as_deref()
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Enters the capture stage. The remembered document is cleared here and
    /// only here, so a failed conversion keeps it available for retry.
    pub(crate) fn begin_capture(&mut self) {
        self.workflow = WorkflowState::Capturing;
        self.captured = None;
        self.failure = None;
        self.saved_to = None;
        self.mark_dirty();
    }

    pub(crate) fn capture_succeeded(&mut self, page: CapturedPage) {
        self.captured = Some(page);
        self.workflow = WorkflowState::Converting;
        self.mark_dirty();
    }

    pub(crate) fn begin_convert(&mut self) {
        self.workflow = WorkflowState::Converting;
        self.failure = None;
        self.saved_to = None;
        self.mark_dirty();
    }

    pub(crate) fn begin_packaging(&mut self) {
        self.workflow = WorkflowState::Downloading;
        self.mark_dirty();
    }

    pub(crate) fn succeed(&mut self, saved_to: String) {
        self.workflow = WorkflowState::Succeeded;
        self.saved_to = Some(saved_to);
        self.failure = None;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, failure: ConvertFailure) {
        self.workflow = WorkflowState::Failed;
        self.failure = Some(failure);
        self.mark_dirty();
    }
}
