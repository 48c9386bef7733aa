//! Clipdown core: pure conversion-workflow state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, CapturedPage, ConvertFailure, FailureKind, WorkflowState};
pub use update::update;
pub use view_model::{
    AppViewModel, PageInfoView, Severity, StatusLine, StepStatus, StepView, STEP_LABELS,
    WARN_SIZE_BYTES,
};
