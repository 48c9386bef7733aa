use crate::{AppState, ConvertFailure, FailureKind, WorkflowState};

/// Captured pages above this size get a warning line while converting.
pub const WARN_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub const STEP_LABELS: [&str; 3] = ["Capture page", "Convert to Markdown", "Package file"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub label: &'static str,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfoView {
    pub title: String,
    pub size_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub workflow: WorkflowState,
    pub steps: [StepView; 3],
    pub page_info: Option<PageInfoView>,
    pub status: Option<StatusLine>,
    pub convert_enabled: bool,
    pub retry_visible: bool,
    pub dirty: bool,
}

pub(crate) fn build_view(state: &AppState) -> AppViewModel {
    let workflow = state.workflow();
    AppViewModel {
        workflow,
        steps: build_steps(workflow, state.failure()),
        page_info: state.captured().map(|page| PageInfoView {
            title: page.title.clone(),
            size_text: format!("{:.2} KB", page.size_bytes as f64 / 1024.0),
        }),
        status: build_status(state),
        convert_enabled: !workflow.is_busy(),
        retry_visible: workflow == WorkflowState::Failed,
        dirty: state.is_dirty(),
    }
}

/// Projects the workflow onto the three ordered step indicators. A failure
/// freezes the display at the step that was active when it happened.
fn build_steps(workflow: WorkflowState, failure: Option<&ConvertFailure>) -> [StepView; 3] {
    let active = match workflow {
        WorkflowState::Idle => None,
        WorkflowState::Capturing => Some(0),
        WorkflowState::Converting => Some(1),
        WorkflowState::Downloading => Some(2),
        WorkflowState::Succeeded => Some(3),
        WorkflowState::Failed => Some(failed_step(failure)),
    };
    let mut steps = STEP_LABELS.map(|label| StepView {
        label,
        status: StepStatus::Pending,
    });
    if let Some(active) = active {
        for (index, step) in steps.iter_mut().enumerate() {
            step.status = if index < active {
                StepStatus::Completed
            } else if index == active {
                StepStatus::Active
            } else {
                StepStatus::Pending
            };
        }
    }
    steps
}

fn failed_step(failure: Option<&ConvertFailure>) -> usize {
    match failure.map(|f| f.kind) {
        Some(FailureKind::Capture) => 0,
        Some(FailureKind::Download) => 2,
        _ => 1,
    }
}

fn build_status(state: &AppState) -> Option<StatusLine> {
    match state.workflow() {
        WorkflowState::Failed => state.failure().map(|failure| StatusLine {
            severity: Severity::Error,
            text: failure_text(failure),
        }),
        WorkflowState::Succeeded => Some(StatusLine {
            severity: Severity::Success,
            text: match state.saved_to() {
                Some(path) => format!("Conversion succeeded. Markdown saved to {path}"),
                None => "Conversion succeeded.".to_string(),
            },
        }),
        WorkflowState::Converting | WorkflowState::Downloading => state
            .captured()
            .filter(|page| page.size_bytes > WARN_SIZE_BYTES)
            .map(|_| StatusLine {
                severity: Severity::Warning,
                text: "Page exceeds 10 MB; conversion may be slow or fail.".to_string(),
            }),
        _ => None,
    }
}

/// Short classified text per failure kind. Specific server statuses get a
/// targeted hint appended.
fn failure_text(failure: &ConvertFailure) -> String {
    match failure.kind {
        FailureKind::Capture => {
            "Could not read the page content. The page may be empty or restricted.".to_string()
        }
        FailureKind::Connect => {
            "Could not reach the conversion service. Check your network connection.".to_string()
        }
        FailureKind::Network => format!(
            "Network failure while contacting the conversion service: {}",
            failure.message
        ),
        FailureKind::Timeout => {
            "The conversion service did not answer in time. Try again later or convert a smaller page."
                .to_string()
        }
        FailureKind::Server(status) => {
            let mut text = format!("Conversion service error {status}: {}", failure.message);
            if status == 413 {
                text.push_str(" (content too large for the conversion service)");
            }
            text
        }
        FailureKind::EmptyResponse => {
            "The conversion service returned an empty document.".to_string()
        }
        FailureKind::Protocol => format!(
            "Malformed reply from the background service: {}",
            failure.message
        ),
        FailureKind::UnsupportedAction => format!(
            "The background service rejected the request: {}",
            failure.message
        ),
        FailureKind::Download => format!("Could not save the Markdown file: {}", failure.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{update, AppState, CapturedPage, Msg};

    fn converting_state() -> AppState {
        let (state, _) = update(AppState::new(), Msg::ConvertClicked);
        let (state, _) = update(
            state,
            Msg::CaptureFinished {
                page: Some(CapturedPage {
                    html: "<html></html>".into(),
                    size_bytes: 512,
                    title: "Doc".into(),
                }),
            },
        );
        state
    }

    #[test]
    fn idle_shows_all_steps_pending() {
        let view = AppState::new().view();
        assert!(view
            .steps
            .iter()
            .all(|step| step.status == StepStatus::Pending));
        assert!(view.convert_enabled);
        assert!(!view.retry_visible);
    }

    #[test]
    fn converting_marks_capture_completed() {
        let view = converting_state().view();
        assert_eq!(view.steps[0].status, StepStatus::Completed);
        assert_eq!(view.steps[1].status, StepStatus::Active);
        assert_eq!(view.steps[2].status, StepStatus::Pending);
        assert!(!view.convert_enabled);
    }

    #[test]
    fn page_info_reports_size_in_kib() {
        let view = converting_state().view();
        let info = view.page_info.expect("page info");
        assert_eq!(info.title, "Doc");
        assert_eq!(info.size_text, "0.50 KB");
    }

    #[test]
    fn payload_too_large_gets_targeted_hint() {
        let failure = ConvertFailure::new(FailureKind::Server(413), "Payload Too Large");
        let text = failure_text(&failure);
        assert!(text.contains("413"));
        assert!(text.contains("content too large"));

        let other = ConvertFailure::new(FailureKind::Server(500), "boom");
        assert!(!failure_text(&other).contains("content too large"));
    }

    #[test]
    fn oversized_page_warns_while_converting() {
        let (state, _) = update(AppState::new(), Msg::ConvertClicked);
        let (state, _) = update(
            state,
            Msg::CaptureFinished {
                page: Some(CapturedPage {
                    html: "x".into(),
                    size_bytes: WARN_SIZE_BYTES + 1,
                    title: "Big".into(),
                }),
            },
        );
        let status = state.view().status.expect("warning line");
        assert_eq!(status.severity, Severity::Warning);
    }

    #[test]
    fn capture_failure_freezes_first_step() {
        let (state, _) = update(AppState::new(), Msg::ConvertClicked);
        let (state, _) = update(state, Msg::CaptureFinished { page: None });
        let view = state.view();
        assert_eq!(view.steps[0].status, StepStatus::Active);
        assert_eq!(view.steps[1].status, StepStatus::Pending);
        assert!(view.retry_visible);
    }
}
