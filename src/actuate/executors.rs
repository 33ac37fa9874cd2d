//! The action table: one state-free executor per intent.
//!
//! Executors receive the control surface and the enriched entity view and
//! return whether the action took effect. They never panic on a missing or
//! mistyped target; "cannot execute" is the `false` return, reported by the
//! actuator as a paused action.

use crate::actuate::{ProcessedEntities, ResolvedSelection};
use crate::intent::intents;
use crate::surface::{ControlKind, ControlSurface, ScrollDirection};
use std::collections::HashMap;
use tracing::debug;

/// A single intent executor.
pub type Executor = fn(&mut ControlSurface, &ProcessedEntities) -> bool;

/// Dispatch table covering the built-in command vocabulary.
#[must_use]
pub fn default_action_table() -> HashMap<String, Executor> {
    let mut table: HashMap<String, Executor> = HashMap::new();
    table.insert(intents::CLICK_ELEMENT.to_owned(), exec_click);
    table.insert(intents::FILL_INPUT.to_owned(), exec_fill);
    table.insert(intents::CHECK_CHECKBOX.to_owned(), exec_check);
    table.insert(intents::CHECK_ALL.to_owned(), exec_check_all);
    table.insert(intents::SELECT_OPTION.to_owned(), exec_select);
    table.insert(intents::OPEN_DROPDOWN.to_owned(), exec_open_dropdown);
    table.insert(intents::SCROLL.to_owned(), exec_scroll);
    table.insert(intents::SCROLL_TO_ELEMENT.to_owned(), exec_scroll_to);
    table.insert(intents::NAVIGATE_BACK.to_owned(), exec_navigate_back);
    table
}

/// Click the resolved target. Buttons and links are plain presses; clicking
/// a checkbox toggles it, a radio selects it, a dropdown expands it.
fn exec_click(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    let Some(id) = processed.target() else {
        return false;
    };
    let Some(control) = surface.get(id) else {
        return false;
    };
    match control.kind {
        ControlKind::Button | ControlKind::Link => {
            debug!(name = %control.voice_name, "click");
            true
        }
        ControlKind::Checkbox { .. } => toggle_checkbox(surface, id),
        ControlKind::Radio { .. } => select_radio(surface, id),
        ControlKind::Dropdown { .. } => expand_dropdown(surface, id),
        ControlKind::TextInput { .. } => false,
    }
}

/// Write the normalized value into the resolved text input.
fn exec_fill(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    let Some(id) = processed.target() else {
        return false;
    };
    let Some(new_value) = processed.normalized_value() else {
        return false;
    };
    match surface.get_mut(id) {
        Some(control) => match &mut control.kind {
            ControlKind::TextInput { value, .. } => {
                *value = new_value.to_owned();
                true
            }
            _ => false,
        },
        None => false,
    }
}

fn exec_check(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    match processed.target() {
        Some(id) => toggle_checkbox(surface, id),
        None => false,
    }
}

/// Toggle every checkbox in the resolved set: all on unless every one is
/// already on, in which case all off.
fn exec_check_all(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    let targets = processed.targets();
    if targets.is_empty() {
        return false;
    }
    let all_checked = targets.iter().all(|id| {
        matches!(
            surface.get(*id).map(|c| &c.kind),
            Some(ControlKind::Checkbox { checked: true })
        )
    });
    let mut any = false;
    for id in targets {
        if let Some(control) = surface.get_mut(*id)
            && let ControlKind::Checkbox { checked } = &mut control.kind
        {
            *checked = !all_checked;
            any = true;
        }
    }
    any
}

/// Select the resolved group member or dropdown option.
fn exec_select(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    match processed.selection() {
        Some(ResolvedSelection::Member(id)) => select_radio(surface, *id),
        Some(ResolvedSelection::DropdownOption { dropdown, index }) => {
            match surface.get_mut(*dropdown) {
                Some(control) => match &mut control.kind {
                    ControlKind::Dropdown { options, selected, expanded } => {
                        if *index >= options.len() {
                            return false;
                        }
                        *selected = Some(*index);
                        *expanded = false;
                        true
                    }
                    _ => false,
                },
                None => false,
            }
        }
        None => false,
    }
}

/// Expand the resolved dropdown. When the target is not itself a dropdown
/// (a toggle button inside a combo widget), expand the dropdown sharing its
/// group instead.
fn exec_open_dropdown(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    let Some(id) = processed.target() else {
        return false;
    };
    if expand_dropdown(surface, id) {
        return true;
    }
    let group = surface.get(id).and_then(|c| c.group.clone());
    let Some(group) = group else {
        return false;
    };
    let nested = surface
        .controls_in_group(&group)
        .find(|c| matches!(c.kind, ControlKind::Dropdown { .. }))
        .map(|c| c.id);
    match nested {
        Some(dropdown) => expand_dropdown(surface, dropdown),
        None => false,
    }
}

/// Scroll the view in the spoken direction.
fn exec_scroll(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    let Some(word) = processed.entity("direction") else {
        return false;
    };
    match ScrollDirection::parse(word) {
        Some(direction) => {
            surface.scroll(direction);
            true
        }
        None => false,
    }
}

/// Bring the target into the viewport; a no-op success when it already is.
fn exec_scroll_to(surface: &mut ControlSurface, processed: &ProcessedEntities) -> bool {
    let Some(id) = processed.target() else {
        return false;
    };
    match surface.get(id) {
        Some(control) if control.in_viewport => true,
        Some(_) => surface.scroll_into_view(id),
        None => false,
    }
}

fn exec_navigate_back(surface: &mut ControlSurface, _processed: &ProcessedEntities) -> bool {
    surface.navigate_back()
}

// ── Shared control mutations ────────────────────────────────────────

fn toggle_checkbox(surface: &mut ControlSurface, id: crate::surface::ControlId) -> bool {
    match surface.get_mut(id) {
        Some(control) => match &mut control.kind {
            ControlKind::Checkbox { checked } => {
                *checked = !*checked;
                true
            }
            _ => false,
        },
        None => false,
    }
}

/// Select a radio and clear its group siblings.
fn select_radio(surface: &mut ControlSurface, id: crate::surface::ControlId) -> bool {
    let group = match surface.get(id) {
        Some(control) if matches!(control.kind, ControlKind::Radio { .. }) => {
            control.group.clone()
        }
        _ => return false,
    };
    for control in surface.controls_mut() {
        if let ControlKind::Radio { selected } = &mut control.kind
            && control.group == group
        {
            *selected = control.id == id;
        }
    }
    true
}

fn expand_dropdown(surface: &mut ControlSurface, id: crate::surface::ControlId) -> bool {
    match surface.get_mut(id) {
        Some(control) => match &mut control.kind {
            ControlKind::Dropdown { expanded, .. } => {
                *expanded = true;
                true
            }
            _ => false,
        },
        None => false,
    }
}
