use crate::{AppState, ConvertFailure, Effect, FailureKind, Msg, WorkflowState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ConvertClicked => start_capture(&mut state),
        Msg::RetryClicked => {
            if state.workflow() != WorkflowState::Failed {
                return (state, Vec::new());
            }
            // A remembered capture re-enters at the convert stage; without
            // one the whole flow runs again.
            match state.captured().cloned() {
                Some(page) => {
                    state.begin_convert();
                    vec![Effect::RequestConversion { html: page.html }]
                }
                None => start_capture(&mut state),
            }
        }
        Msg::CaptureFinished { page } => {
            if state.workflow() != WorkflowState::Capturing {
                // Stale reply from an abandoned flow.
                return (state, Vec::new());
            }
            match page {
                None => {
                    state.fail(ConvertFailure::new(
                        FailureKind::Capture,
                        "page markup was unavailable",
                    ));
                    Vec::new()
                }
                Some(page) => {
                    let html = page.html.clone();
                    state.capture_succeeded(page);
                    vec![Effect::RequestConversion { html }]
                }
            }
        }
        Msg::ConversionFinished { result } => {
            if state.workflow() != WorkflowState::Converting {
                return (state, Vec::new());
            }
            match result {
                Ok(markdown) => {
                    let title = state
                        .captured()
                        .map(|page| page.title.clone())
                        .unwrap_or_else(|| "untitled".to_string());
                    state.begin_packaging();
                    vec![Effect::PackageMarkdown { markdown, title }]
                }
                Err(failure) => {
                    state.fail(failure);
                    Vec::new()
                }
            }
        }
        Msg::DownloadFinished { result } => {
            if state.workflow() != WorkflowState::Downloading {
                return (state, Vec::new());
            }
            match result {
                Ok(saved_to) => state.succeed(saved_to),
                Err(message) => state.fail(ConvertFailure::new(FailureKind::Download, message)),
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_capture(state: &mut AppState) -> Vec<Effect> {
    // At most one conversion in flight per user action: the trigger is a
    // no-op while any stage is pending.
    if state.workflow().is_busy() {
        return Vec::new();
    }
    state.begin_capture();
    vec![Effect::CapturePage]
}
