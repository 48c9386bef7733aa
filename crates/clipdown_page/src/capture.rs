use clip_logging::{clip_info, clip_warn};

use crate::PageDocument;

/// Markup read from the page, with the metadata the workflow UI displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMarkup {
    pub html: String,
    pub size_bytes: u64,
    pub title: String,
}

/// Synchronously reads the document's serialized markup.
///
/// Returns `None` for an empty document; never panics across the injection
/// boundary, so a caller cannot tell "retrievable but empty" from a failed
/// call at this layer. No side effects on the page.
pub fn capture_page(doc: &PageDocument) -> Option<CapturedMarkup> {
    if doc.is_blank() {
        clip_warn!("page capture produced no markup");
        return None;
    }
    let html = doc.document_html();
    if html.trim().is_empty() {
        clip_warn!("page capture produced no markup");
        return None;
    }
    let title = doc.title().unwrap_or_default();
    clip_info!(
        "captured page: title=\"{}\" size={:.2} KB",
        title,
        html.len() as f64 / 1024.0
    );
    Some(CapturedMarkup {
        size_bytes: html.len() as u64,
        html,
        title,
    })
}
