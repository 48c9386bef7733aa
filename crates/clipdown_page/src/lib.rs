//! Clipdown page context: capture agent and region-selection overlay.
//!
//! Everything here runs inside the page's own execution context. Nothing in
//! this crate crosses to the background orchestrator except serialized
//! markup strings handed through the [`RegionSink`] seam.
mod capture;
mod document;
mod machine;
mod overlay;

pub use capture::{capture_page, CapturedMarkup};
pub use document::{
    ElementId, PageDocument, HOVER_CLASS, PANEL_ID, REGION_WRAPPER_CLASS, SELECTED_CLASS,
};
pub use machine::{apply, ElementInspector, SelectorEffect, SelectorEvent, SelectorState};
pub use overlay::{AttachError, ConvertAction, Mark, Overlay, PanelView, RegionSink};
