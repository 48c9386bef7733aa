use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

/// Identifies one element inside a [`PageDocument`]. Never crosses a context
/// boundary; only serialized markup does.
pub type ElementId = ego_tree::NodeId;

/// Id carried by the overlay's own control panel, doubling as the presence
/// probe for an already-attached overlay.
pub const PANEL_ID: &str = "clipdown-panel";
/// Class hosts apply to the element currently marked Hovered.
pub const HOVER_CLASS: &str = "clipdown-hover";
/// Class hosts apply to elements in the selection set.
pub const SELECTED_CLASS: &str = "clipdown-selected";
/// Class of the single container wrapping all composed region clones.
pub const REGION_WRAPPER_CLASS: &str = "clipdown-regions";

/// Tags that never qualify as selectable content regions.
const NON_CONTENT_TAGS: [&str; 6] = ["script", "style", "meta", "link", "html", "head"];

/// Elements with a rendered box smaller than this in either dimension are
/// ignored by the selection overlay.
const MIN_BOX_SIZE: f64 = 20.0;

/// A parsed page, the selection overlay's working surface.
///
/// Box size and visibility are read from explicit `width`/`height`
/// attributes and inline `style` declarations; a dimension the markup does
/// not state is treated as large enough.
#[derive(Debug)]
pub struct PageDocument {
    html: Html,
    blank: bool,
}

impl PageDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
            blank: markup.trim().is_empty(),
        }
    }

    /// True when the source markup was empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// The `<title>` text, if present and non-empty.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Serializes the whole document.
    pub fn document_html(&self) -> String {
        self.html.root_element().html()
    }

    /// Element ids matching a CSS selector, in document order.
    pub fn find(&self, selector: &str) -> Vec<ElementId> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .map(|element| element.id())
            .collect()
    }

    /// Presence probe for the overlay's control panel.
    pub fn has_panel(&self) -> bool {
        !self.find(&format!("#{PANEL_ID}")).is_empty()
    }

    /// Clones the selected subtrees in document order and wraps them in one
    /// container. Returns `None` for an empty selection.
    ///
    /// Document order matches how the original gathered marked nodes; marker
    /// state never lives in the document, so the clones carry no marker
    /// classes.
    pub fn compose_regions(&self, ids: &[ElementId]) -> Option<String> {
        if ids.is_empty() {
            return None;
        }
        let members: HashSet<ElementId> = ids.iter().copied().collect();
        let mut clones = String::new();
        for node in self.html.root_element().descendants() {
            if members.contains(&node.id()) {
                if let Some(element) = ElementRef::wrap(node) {
                    clones.push_str(&element.html());
                }
            }
        }
        Some(format!(
            "<div class=\"{REGION_WRAPPER_CLASS}\">{clones}</div>"
        ))
    }

    fn element(&self, id: ElementId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    pub(crate) fn is_panel_element(&self, id: ElementId) -> bool {
        let Some(node) = self.html.tree.get(id) else {
            return false;
        };
        std::iter::once(node)
            .chain(node.ancestors())
            .filter_map(ElementRef::wrap)
            .any(|element| element.value().attr("id") == Some(PANEL_ID))
    }

    pub(crate) fn is_selectable_element(&self, id: ElementId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if self.is_panel_element(id) {
            return false;
        }
        let tag = element.value().name().to_ascii_lowercase();
        if NON_CONTENT_TAGS.contains(&tag.as_str()) {
            return false;
        }
        let style = element.value().attr("style").unwrap_or("");
        if is_hidden(style) {
            return false;
        }
        let width = dimension(&element, style, "width");
        let height = dimension(&element, style, "height");
        if width.is_some_and(|w| w < MIN_BOX_SIZE) || height.is_some_and(|h| h < MIN_BOX_SIZE) {
            return false;
        }
        true
    }
}

fn is_hidden(style: &str) -> bool {
    matches!(style_property(style, "display"), Some(v) if v == "none")
        || matches!(style_property(style, "visibility"), Some(v) if v == "hidden")
        || matches!(style_property(style, "opacity"), Some(v) if v.parse::<f64>().is_ok_and(|o| o == 0.0))
}

/// Reads a declared dimension from the attribute or the inline style.
fn dimension(element: &ElementRef, style: &str, name: &str) -> Option<f64> {
    if let Some(value) = element.value().attr(name) {
        if let Some(px) = parse_px(value) {
            return Some(px);
        }
    }
    style_property(style, name).and_then(|value| parse_px(&value))
}

fn style_property(style: &str, name: &str) -> Option<String> {
    style.split(';').find_map(|declaration| {
        let (key, value) = declaration.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

fn parse_px(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse::<f64>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_property_finds_declarations() {
        let style = "display : none; width: 12px";
        assert_eq!(style_property(style, "display").as_deref(), Some("none"));
        assert_eq!(style_property(style, "width").as_deref(), Some("12px"));
        assert_eq!(style_property(style, "height"), None);
    }

    #[test]
    fn hidden_styles_are_recognized() {
        assert!(is_hidden("display:none"));
        assert!(is_hidden("visibility: hidden"));
        assert!(is_hidden("opacity: 0"));
        assert!(!is_hidden("opacity: 0.5"));
        assert!(!is_hidden(""));
    }

    #[test]
    fn blank_markup_is_flagged() {
        assert!(PageDocument::parse("  \n ").is_blank());
        assert!(!PageDocument::parse("<p>x</p>").is_blank());
    }
}
