//! Command templates and the registry that holds them.
//!
//! A template binds an intent name to the utterance patterns that express it
//! and the entities those patterns extract. Placeholders are written
//! `(entity)` inside a pattern; the literal words around them are the
//! keywords fuzzy matching operates on.

use std::collections::BTreeMap;

/// Well-known intent names. The registry is open to additional intents via
/// [`CommandRegistry::register`], but the built-in action table covers these.
pub mod intents {
    pub const CLICK_ELEMENT: &str = "click_element";
    pub const FILL_INPUT: &str = "fill_input";
    pub const CHECK_CHECKBOX: &str = "check_checkbox";
    pub const CHECK_ALL: &str = "check_all";
    pub const SELECT_OPTION: &str = "select_option";
    pub const OPEN_DROPDOWN: &str = "open_dropdown";
    pub const SCROLL: &str = "scroll";
    pub const SCROLL_TO_ELEMENT: &str = "scroll_to_element";
    pub const NAVIGATE_BACK: &str = "navigate_back";
    pub const UNKNOWN: &str = "unknown";
}

/// One command template. Immutable after registration.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    /// Intent name this template recognizes.
    pub intent: String,
    /// Utterance patterns with `(entity)` placeholders.
    pub utterance_patterns: Vec<String>,
    /// Entities the patterns can produce, for the capability description.
    pub expected_entities: Vec<String>,
    /// Entities that absorb trailing free text beyond the matched segment
    /// (open-ended values like messages).
    pub raw_entities: Vec<String>,
    /// Entities restricted to a closed value set. A structural match that
    /// captures anything outside the set is rejected, which keeps patterns
    /// like `scroll to (direction)` from swallowing element names.
    pub closed_entities: Vec<(String, Vec<String>)>,
}

impl CommandTemplate {
    #[must_use]
    pub fn new(intent: &str, patterns: &[&str], entities: &[&str]) -> Self {
        Self {
            intent: intent.to_owned(),
            utterance_patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
            expected_entities: entities.iter().map(|e| (*e).to_owned()).collect(),
            raw_entities: Vec::new(),
            closed_entities: Vec::new(),
        }
    }

    /// Mark an entity as raw (absorbs trailing free text).
    #[must_use]
    pub fn with_raw(mut self, entity: &str) -> Self {
        self.raw_entities.push(entity.to_owned());
        self
    }

    /// Restrict an entity to a closed value set.
    #[must_use]
    pub fn with_closed(mut self, entity: &str, values: &[&str]) -> Self {
        self.closed_entities.push((
            entity.to_owned(),
            values.iter().map(|v| (*v).to_owned()).collect(),
        ));
        self
    }

    /// Whether the named entity is flagged raw.
    #[must_use]
    pub fn is_raw(&self, entity: &str) -> bool {
        self.raw_entities.iter().any(|e| e == entity)
    }

    /// Allowed values for a closed entity, if restricted.
    #[must_use]
    pub fn allowed_values(&self, entity: &str) -> Option<&[String]> {
        self.closed_entities
            .iter()
            .find(|(name, _)| name == entity)
            .map(|(_, values)| values.as_slice())
    }
}

/// Registry mapping intent name to template. Loaded once at recognizer
/// construction; mutated only by explicit [`register`](Self::register) calls.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    templates: BTreeMap<String, CommandTemplate>,
}

impl CommandRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in command vocabulary.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for template in default_templates() {
            registry.register(template);
        }
        registry
    }

    /// Register (or replace) a template.
    pub fn register(&mut self, template: CommandTemplate) {
        self.templates.insert(template.intent.clone(), template);
    }

    #[must_use]
    pub fn get(&self, intent: &str) -> Option<&CommandTemplate> {
        self.templates.get(intent)
    }

    /// All templates in intent-name order.
    pub fn templates(&self) -> impl Iterator<Item = &CommandTemplate> {
        self.templates.values()
    }

    /// Every literal (non-placeholder) keyword across all patterns,
    /// lower-cased and deduplicated. Used for input correction.
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for template in self.templates.values() {
            for pattern in &template.utterance_patterns {
                for word in crate::intent::pattern::pattern_keywords(pattern) {
                    if !out.contains(&word) {
                        out.push(word);
                    }
                }
            }
        }
        out
    }

    /// Render the capability description the LLM classifier embeds in its
    /// system prompt: intent names and entity semantics only, never the
    /// utterance patterns, so the model generalizes instead of parroting.
    #[must_use]
    pub fn capability_description(&self) -> String {
        let mut out = String::new();
        for template in self.templates.values() {
            if template.intent == intents::UNKNOWN {
                continue;
            }
            out.push_str("- ");
            out.push_str(&template.intent);
            if template.expected_entities.is_empty() {
                out.push_str(" (no entities)");
            } else {
                out.push_str(" (entities: ");
                out.push_str(&template.expected_entities.join(", "));
                out.push(')');
            }
            out.push('\n');
        }
        out
    }
}

/// The built-in command vocabulary.
fn default_templates() -> Vec<CommandTemplate> {
    use intents::*;
    vec![
        CommandTemplate::new(
            CLICK_ELEMENT,
            &[
                "click on the (target)",
                "click on (target)",
                "click the (target)",
                "click (target)",
                "press the (target)",
                "press (target)",
                "tap on (target)",
                "tap (target)",
            ],
            &["target"],
        ),
        CommandTemplate::new(
            FILL_INPUT,
            &[
                "fill (target) as (value)",
                "fill (target) with (value)",
                "fill the (target) with (value)",
                "type (value) in (target)",
                "type (value) into (target)",
                "enter (value) in (target)",
                "set (target) to (value)",
                "write (value) in (target)",
            ],
            &["target", "value"],
        )
        .with_raw("value"),
        CommandTemplate::new(
            CHECK_CHECKBOX,
            &[
                "check the (target)",
                "check (target)",
                "uncheck the (target)",
                "uncheck (target)",
                "tick (target)",
                "toggle (target)",
            ],
            &["target"],
        ),
        CommandTemplate::new(
            CHECK_ALL,
            &["check all (group)", "check all", "select all (group)", "select all"],
            &["group"],
        ),
        CommandTemplate::new(
            SELECT_OPTION,
            &[
                "select (target) from (group)",
                "select (target) in (group)",
                "choose (target) from (group)",
                "select (target)",
                "choose (target)",
                "pick (target)",
            ],
            &["target", "group"],
        ),
        CommandTemplate::new(
            OPEN_DROPDOWN,
            &[
                "open the (target) dropdown",
                "open (target) dropdown",
                "open (target)",
                "expand (target)",
            ],
            &["target"],
        ),
        CommandTemplate::new(
            SCROLL,
            &["scroll to the (direction)", "scroll to (direction)", "scroll (direction)"],
            &["direction"],
        )
        .with_closed("direction", &["up", "down", "left", "right", "top", "bottom"]),
        CommandTemplate::new(
            SCROLL_TO_ELEMENT,
            &["scroll to (target)", "go to the (target)", "go to (target)", "focus (target)", "focus on (target)"],
            &["target"],
        ),
        CommandTemplate::new(
            NAVIGATE_BACK,
            &["go back", "navigate back", "take me back", "back"],
            &[],
        ),
    ]
}
