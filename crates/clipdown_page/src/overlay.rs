use std::collections::HashMap;

use clip_logging::{clip_debug, clip_info};
use thiserror::Error;

use crate::machine::{apply, ElementInspector, SelectorEffect, SelectorEvent, SelectorState};
use crate::{ElementId, PageDocument};

/// Markup for the overlay's control panel, injected into the page on attach.
/// Its id is the presence probe that keeps a document down to one overlay.
const PANEL_MARKUP: &str = concat!(
    r#"<div id="clipdown-panel">"#,
    r#"<h3>Select regions to convert</h3>"#,
    r#"<p>Hover highlights an element; click selects or deselects it.</p>"#,
    r#"<span id="clipdown-selected-count">0 regions selected</span>"#,
    r#"<button id="clipdown-convert" disabled>Convert selection</button>"#,
    r#"<button id="clipdown-cancel">Cancel</button>"#,
    "</div>"
);

/// Fire-and-forget hand-off of composed markup to the background router.
/// No reply channel exists on this path; the outcome arrives as a download
/// or a notification.
pub trait RegionSink {
    fn submit(&self, html: String, title: String);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachError {
    /// The presence probe found a panel already in the document.
    #[error("a selection overlay is already attached to this document")]
    AlreadyAttached,
}

/// Visual mark a host should render on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Hovered,
    Selected,
}

/// What the control panel currently displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub count_text: String,
    pub convert_enabled: bool,
}

/// Outcome of the convert control.
#[must_use]
pub enum ConvertAction {
    /// Markup was submitted and the overlay tore itself down; the host shows
    /// the self-dismissing confirmation.
    Submitted { confirmation: String },
    /// Empty selection: nothing was sent and the overlay stays attached.
    NothingSelected(Overlay),
}

/// Interactive region-selection overlay. Owns the parsed document, the
/// selection state, and the marker side-table for the lifetime of one
/// selection session; dropping it is the teardown.
#[derive(Debug)]
pub struct Overlay {
    doc: PageDocument,
    state: SelectorState,
    marks: HashMap<ElementId, Mark>,
    panel: PanelView,
}

impl Overlay {
    /// Parses the page and injects the control panel. Refuses to attach a
    /// second overlay to a document that already carries one.
    pub fn attach(markup: &str) -> Result<Self, AttachError> {
        if PageDocument::parse(markup).has_panel() {
            return Err(AttachError::AlreadyAttached);
        }
        let doc = PageDocument::parse(&inject_panel(markup));
        clip_info!("selection overlay attached");
        Ok(Self {
            doc,
            state: SelectorState::new(),
            marks: HashMap::new(),
            panel: PanelView {
                count_text: count_text(0),
                convert_enabled: false,
            },
        })
    }

    pub fn document(&self) -> &PageDocument {
        &self.doc
    }

    /// Element ids matching a CSS selector against the attached document.
    pub fn find(&self, selector: &str) -> Vec<ElementId> {
        self.doc.find(selector)
    }

    pub fn panel(&self) -> &PanelView {
        &self.panel
    }

    /// The mark a host should currently render on an element.
    pub fn mark(&self, id: ElementId) -> Option<Mark> {
        self.marks.get(&id).copied()
    }

    pub fn selection(&self) -> &[ElementId] {
        self.state.selection()
    }

    pub fn pointer_enter(&mut self, id: ElementId) {
        self.dispatch(SelectorEvent::PointerEnter(id));
    }

    pub fn pointer_leave(&mut self, id: ElementId) {
        self.dispatch(SelectorEvent::PointerLeave(id));
    }

    pub fn click(&mut self, id: ElementId) {
        self.dispatch(SelectorEvent::Click(id));
    }

    /// Composes the selection and submits it fire-and-forget, then tears the
    /// overlay down. A no-op returning the overlay when nothing is selected.
    pub fn convert(mut self, sink: &dyn RegionSink) -> ConvertAction {
        let effects = self.run(SelectorEvent::ConvertRequested);
        if effects.is_empty() {
            return ConvertAction::NothingSelected(self);
        }
        for effect in effects {
            match effect {
                SelectorEffect::ComposeRegions(ids) => {
                    if let Some(html) = self.doc.compose_regions(&ids) {
                        let title = self.doc.title().unwrap_or_default();
                        clip_info!(
                            "submitting {} selected region(s), {} bytes",
                            ids.len(),
                            html.len()
                        );
                        sink.submit(html, title);
                    }
                }
                SelectorEffect::Teardown { .. } => {}
                _ => self.apply_effect(effect),
            }
        }
        ConvertAction::Submitted {
            confirmation: "Selection sent for conversion; the Markdown file will download shortly."
                .to_string(),
        }
    }

    /// Tears the overlay down without sending anything.
    pub fn cancel(mut self) {
        let _ = self.run(SelectorEvent::CancelRequested);
        clip_info!("selection overlay cancelled");
    }

    fn dispatch(&mut self, event: SelectorEvent) {
        let effects = self.run(event);
        for effect in effects {
            self.apply_effect(effect);
        }
    }

    fn run(&mut self, event: SelectorEvent) -> Vec<SelectorEffect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = apply(state, event, &self.doc);
        self.state = state;
        effects
    }

    fn apply_effect(&mut self, effect: SelectorEffect) {
        match effect {
            SelectorEffect::MarkHover(id) => {
                self.marks.insert(id, Mark::Hovered);
            }
            SelectorEffect::ClearHover(id) => {
                if self.marks.get(&id) == Some(&Mark::Hovered) {
                    self.marks.remove(&id);
                }
            }
            SelectorEffect::MarkSelected(id) => {
                self.marks.insert(id, Mark::Selected);
            }
            SelectorEffect::ClearSelected(id) => {
                if self.marks.get(&id) == Some(&Mark::Selected) {
                    self.marks.remove(&id);
                }
            }
            SelectorEffect::SetSelectedCount(count) => {
                self.panel.count_text = count_text(count);
            }
            SelectorEffect::SetConvertEnabled(enabled) => {
                self.panel.convert_enabled = enabled;
            }
            SelectorEffect::ComposeRegions(_) | SelectorEffect::Teardown { .. } => {
                clip_debug!("composition effect outside the convert path ignored");
            }
        }
    }
}

impl ElementInspector for PageDocument {
    fn is_panel_member(&self, id: ElementId) -> bool {
        self.is_panel_element(id)
    }

    fn is_selectable(&self, id: ElementId) -> bool {
        self.is_selectable_element(id)
    }
}

fn count_text(count: usize) -> String {
    format!("{count} regions selected")
}

/// Splices the panel markup in before `</body>`, or appends it when the
/// markup has no closing body tag.
fn inject_panel(markup: &str) -> String {
    let lower = markup.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(index) => {
            let mut merged = String::with_capacity(markup.len() + PANEL_MARKUP.len());
            merged.push_str(&markup[..index]);
            merged.push_str(PANEL_MARKUP);
            merged.push_str(&markup[index..]);
            merged
        }
        None => format!("{markup}{PANEL_MARKUP}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PANEL_ID;

    #[test]
    fn panel_markup_carries_the_probe_id() {
        assert!(PANEL_MARKUP.contains(&format!("id=\"{PANEL_ID}\"")));
    }

    #[test]
    fn inject_panel_lands_inside_body() {
        let merged = inject_panel("<html><body><p>x</p></body></html>");
        let probe = merged.find(PANEL_ID).unwrap();
        assert!(probe < merged.find("</body>").unwrap());
    }

    #[test]
    fn inject_panel_appends_without_body_tag() {
        let merged = inject_panel("<p>x</p>");
        assert!(merged.ends_with("</div>"));
    }
}
