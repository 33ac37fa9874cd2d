//! The addressable control surface.
//!
//! A host view registers its interactive controls here, each tagged with a
//! declared voice-name and, for grouped controls (radio sets, dropdowns), a
//! group identifier. The pipeline only ever queries and mutates controls
//! through this surface; the host owns creation and teardown.

pub mod resolver;

pub use resolver::{ElementResolver, MatchCandidate};

/// Stable handle to a control on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub u64);

/// What kind of value a text input carries. Drives normalizer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Date,
    Time,
    Number,
}

/// One option inside a dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Visible label ("Germany").
    pub label: String,
    /// Underlying value ("DE").
    pub value: String,
}

impl SelectOption {
    /// Option whose label and value are the same string.
    #[must_use]
    pub fn labeled(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            value: label.to_owned(),
        }
    }
}

/// Control behavior and state.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Button,
    Link,
    TextInput {
        input: InputKind,
        value: String,
        /// Declared minimum (dates/times/numbers), host format.
        min: Option<String>,
        /// Declared maximum.
        max: Option<String>,
    },
    Checkbox {
        checked: bool,
    },
    Radio {
        selected: bool,
    },
    Dropdown {
        options: Vec<SelectOption>,
        selected: Option<usize>,
        expanded: bool,
    },
}

/// A single addressable control.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub id: ControlId,
    /// Declared voice-name. Empty means not voice-addressable.
    pub voice_name: String,
    /// Group identifier for radio families and named dropdown groups.
    pub group: Option<String>,
    pub kind: ControlKind,
    /// Whether the control is currently visible in the host viewport.
    pub in_viewport: bool,
}

impl Control {
    /// Whether this control belongs to a grouped family (radio or dropdown).
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        matches!(self.kind, ControlKind::Radio { .. } | ControlKind::Dropdown { .. })
    }

    /// Current textual value, if the control has one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            ControlKind::TextInput { value, .. } => Some(value),
            ControlKind::Dropdown { options, selected, .. } => {
                selected.and_then(|i| options.get(i)).map(|o| o.value.as_str())
            }
            _ => None,
        }
    }
}

/// Scroll directions understood by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
}

impl ScrollDirection {
    /// Parse a spoken direction word.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Step size in logical pixels for one directional scroll.
const SCROLL_STEP: i64 = 320;

/// The set of controls in the active view, plus the view-level state the
/// executors touch (scroll position, navigation history).
#[derive(Debug, Default)]
pub struct ControlSurface {
    controls: Vec<Control>,
    next_id: u64,
    scroll_x: i64,
    scroll_y: i64,
    /// Views behind the current one; `navigate_back` pops into this.
    back_stack: Vec<String>,
    current_view: String,
}

impl ControlSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a control. The surface assigns the id.
    pub fn add(
        &mut self,
        voice_name: &str,
        group: Option<&str>,
        kind: ControlKind,
    ) -> ControlId {
        let id = ControlId(self.next_id);
        self.next_id += 1;
        self.controls.push(Control {
            id,
            voice_name: voice_name.to_owned(),
            group: group.map(str::to_owned),
            kind,
            in_viewport: true,
        });
        id
    }

    /// All controls, in registration order.
    #[must_use]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Voice-addressable controls only.
    pub fn addressable(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(|c| !c.voice_name.is_empty())
    }

    #[must_use]
    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.controls.iter_mut().find(|c| c.id == id)
    }

    /// Mutable view used by the action executors (radio selection clears
    /// siblings, "check all" walks a group).
    pub(crate) fn controls_mut(&mut self) -> &mut [Control] {
        &mut self.controls
    }

    /// Distinct group identifiers among grouped controls, in first-seen order.
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for c in &self.controls {
            if let Some(g) = c.group.as_deref()
                && c.is_grouped()
                && !names.contains(&g)
            {
                names.push(g);
            }
        }
        names
    }

    /// Controls belonging to the named group.
    pub fn controls_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Control> {
        self.controls
            .iter()
            .filter(move |c| c.group.as_deref() == Some(group))
    }

    // ── View-level operations used by the action executors ────────────

    /// Scroll the view by one step (or to an extreme).
    pub fn scroll(&mut self, direction: ScrollDirection) {
        match direction {
            ScrollDirection::Up => self.scroll_y = (self.scroll_y - SCROLL_STEP).max(0),
            ScrollDirection::Down => self.scroll_y += SCROLL_STEP,
            ScrollDirection::Left => self.scroll_x = (self.scroll_x - SCROLL_STEP).max(0),
            ScrollDirection::Right => self.scroll_x += SCROLL_STEP,
            ScrollDirection::Top => self.scroll_y = 0,
            ScrollDirection::Bottom => self.scroll_y = i64::MAX / 2,
        }
    }

    /// Current scroll offsets (x, y).
    #[must_use]
    pub fn scroll_offset(&self) -> (i64, i64) {
        (self.scroll_x, self.scroll_y)
    }

    /// Bring a control into the viewport. Returns `false` for unknown ids.
    pub fn scroll_into_view(&mut self, id: ControlId) -> bool {
        match self.get_mut(id) {
            Some(c) => {
                c.in_viewport = true;
                true
            }
            None => false,
        }
    }

    /// Name the current view and push the previous one onto the back stack.
    pub fn navigate_to(&mut self, view: &str) {
        if !self.current_view.is_empty() {
            let previous = std::mem::take(&mut self.current_view);
            self.back_stack.push(previous);
        }
        self.current_view = view.to_owned();
    }

    /// Return to the previous view. Returns `false` when there is none.
    pub fn navigate_back(&mut self) -> bool {
        match self.back_stack.pop() {
            Some(previous) => {
                self.current_view = previous;
                true
            }
            None => false,
        }
    }

    /// Name of the active view.
    #[must_use]
    pub fn current_view(&self) -> &str {
        &self.current_view
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn add_and_lookup() {
        let mut s = ControlSurface::new();
        let id = s.add("Submit", None, ControlKind::Button);
        assert_eq!(s.get(id).unwrap().voice_name, "Submit");
        assert!(s.get(ControlId(99)).is_none());
    }

    #[test]
    fn addressable_skips_unnamed() {
        let mut s = ControlSurface::new();
        s.add("Submit", None, ControlKind::Button);
        s.add("", None, ControlKind::Button);
        assert_eq!(s.addressable().count(), 1);
    }

    #[test]
    fn group_names_deduplicated() {
        let mut s = ControlSurface::new();
        s.add("Red", Some("color"), ControlKind::Radio { selected: false });
        s.add("Blue", Some("color"), ControlKind::Radio { selected: false });
        s.add("Country", Some("country"), ControlKind::Dropdown {
            options: vec![],
            selected: None,
            expanded: false,
        });
        assert_eq!(s.group_names(), vec!["color", "country"]);
    }

    #[test]
    fn checkbox_group_is_not_a_grouped_family() {
        // Checkboxes may share a group tag for "check all", but they do not
        // participate in grouped resolution the way radios/dropdowns do.
        let mut s = ControlSurface::new();
        s.add("Terms", Some("consents"), ControlKind::Checkbox { checked: false });
        assert!(s.group_names().is_empty());
        assert_eq!(s.controls_in_group("consents").count(), 1);
    }

    #[test]
    fn scroll_clamps_at_origin() {
        let mut s = ControlSurface::new();
        s.scroll(ScrollDirection::Up);
        assert_eq!(s.scroll_offset(), (0, 0));
        s.scroll(ScrollDirection::Down);
        s.scroll(ScrollDirection::Top);
        assert_eq!(s.scroll_offset().1, 0);
    }

    #[test]
    fn navigation_stack() {
        let mut s = ControlSurface::new();
        assert!(!s.navigate_back());
        s.navigate_to("home");
        s.navigate_to("settings");
        assert_eq!(s.current_view(), "settings");
        assert!(s.navigate_back());
        assert_eq!(s.current_view(), "home");
        assert!(!s.navigate_back());
    }

    #[test]
    fn direction_parsing() {
        assert_eq!(ScrollDirection::parse(" Down "), Some(ScrollDirection::Down));
        assert_eq!(ScrollDirection::parse("sideways"), None);
    }
}
