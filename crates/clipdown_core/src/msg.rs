use crate::{CapturedPage, ConvertFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User triggered a fresh conversion of the current page.
    ConvertClicked,
    /// User asked to retry after a failure.
    RetryClicked,
    /// Capture agent finished; `None` means the page yielded no markup.
    CaptureFinished { page: Option<CapturedPage> },
    /// Reply from the background router for the in-flight conversion.
    ConversionFinished { result: Result<String, ConvertFailure> },
    /// Packaging/download finished; `Ok` carries the saved path for display.
    DownloadFinished { result: Result<String, String> },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
