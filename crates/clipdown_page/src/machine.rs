use crate::ElementId;

/// What the selection machine needs to know about page elements. Implemented
/// by [`crate::PageDocument`]; tests substitute a fixed table.
pub trait ElementInspector {
    /// True when the element belongs to the overlay's own control panel.
    fn is_panel_member(&self, id: ElementId) -> bool;
    /// Full exclusion predicate: panel membership, non-content tag,
    /// sub-20x20 box, or not rendered.
    fn is_selectable(&self, id: ElementId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorEvent {
    PointerEnter(ElementId),
    PointerLeave(ElementId),
    Click(ElementId),
    ConvertRequested,
    CancelRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEffect {
    MarkHover(ElementId),
    ClearHover(ElementId),
    MarkSelected(ElementId),
    ClearSelected(ElementId),
    SetSelectedCount(usize),
    SetConvertEnabled(bool),
    /// Compose the listed subtrees (insertion order; the overlay serializes
    /// them in document order) and submit the result fire-and-forget.
    ComposeRegions(Vec<ElementId>),
    Teardown { confirm: bool },
}

/// Selection state: the ordered selection set plus at most one tracked hover
/// element. Owned exclusively by one overlay instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorState {
    selection: Vec<ElementId>,
    hover: Option<ElementId>,
}

impl SelectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    pub fn hover(&self) -> Option<ElementId> {
        self.hover
    }

    fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }
}

/// Pure transition function: applies one pointer/control event and returns
/// the styling and composition effects for the overlay to carry out.
pub fn apply(
    mut state: SelectorState,
    event: SelectorEvent,
    page: &dyn ElementInspector,
) -> (SelectorState, Vec<SelectorEffect>) {
    let effects = match event {
        SelectorEvent::PointerEnter(target) => {
            // Re-entering the tracked element is a no-op.
            if state.hover == Some(target) {
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            if let Some(previous) = state.hover {
                if !state.is_selected(previous) {
                    effects.push(SelectorEffect::ClearHover(previous));
                }
            }
            if page.is_selectable(target) && !state.is_selected(target) {
                effects.push(SelectorEffect::MarkHover(target));
                state.hover = Some(target);
            } else {
                state.hover = None;
            }
            effects
        }
        SelectorEvent::PointerLeave(target) => {
            if state.hover == Some(target) && !state.is_selected(target) {
                state.hover = None;
                vec![SelectorEffect::ClearHover(target)]
            } else {
                Vec::new()
            }
        }
        SelectorEvent::Click(target) => {
            // Clicks inside the control panel belong to its own controls.
            if page.is_panel_member(target) {
                return (state, Vec::new());
            }
            if !page.is_selectable(target) {
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            if let Some(position) = state.selection.iter().position(|id| *id == target) {
                state.selection.remove(position);
                effects.push(SelectorEffect::ClearSelected(target));
                // Pointer still over the element: restore the hover mark.
                if state.hover == Some(target) {
                    effects.push(SelectorEffect::MarkHover(target));
                }
            } else {
                effects.push(SelectorEffect::ClearHover(target));
                effects.push(SelectorEffect::MarkSelected(target));
                state.selection.push(target);
                // The element stays tracked as the hover target so a
                // deselect under a motionless pointer restores its mark.
            }
            effects.push(SelectorEffect::SetSelectedCount(state.selection.len()));
            effects.push(SelectorEffect::SetConvertEnabled(!state.selection.is_empty()));
            effects
        }
        SelectorEvent::ConvertRequested => {
            if state.selection.is_empty() {
                Vec::new()
            } else {
                vec![
                    SelectorEffect::ComposeRegions(state.selection.clone()),
                    SelectorEffect::Teardown { confirm: true },
                ]
            }
        }
        SelectorEvent::CancelRequested => vec![SelectorEffect::Teardown { confirm: false }],
    };

    (state, effects)
}
