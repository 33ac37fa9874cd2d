//! Intent actuation: resolve entities to controls, normalize spoken values,
//! and dispatch to the action table.
//!
//! Intents from one utterance run strictly in order, one at a time, with a
//! settle delay between them; the actuator's sequential dispatch is what
//! guarantees single-writer access to the control surface.

pub mod executors;
pub mod normalize;

pub use executors::{Executor, default_action_table};
pub use normalize::{ValueNormalizer, normalize_value};

use crate::config::ActuatorConfig;
use crate::events::{EventBus, SessionEvent};
use crate::intent::{EntityValue, IntentResult, intents};
use crate::surface::resolver::GroupMatch;
use crate::surface::{ControlId, ControlKind, ControlSurface, ElementResolver};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A resolved within-group selection, kept by id so it outlives the borrow
/// of the surface it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSelection {
    /// A member control of the group (radio family).
    Member(ControlId),
    /// An option inside a dropdown.
    DropdownOption { dropdown: ControlId, index: usize },
}

/// The per-execution view of an intent's entities, progressively enriched
/// with resolved control references and the normalized value.
///
/// Immutable between stages: each `with_*` step returns a new value, so a
/// test can inspect the output of any stage in isolation. Never persisted,
/// never shared across intents.
#[derive(Debug, Clone, Default)]
pub struct ProcessedEntities {
    entities: BTreeMap<String, EntityValue>,
    target: Option<ControlId>,
    targets: Vec<ControlId>,
    selection: Option<ResolvedSelection>,
    normalized_value: Option<String>,
}

impl ProcessedEntities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a recognized intent's entities.
    #[must_use]
    pub fn from_intent(intent: &IntentResult) -> Self {
        Self {
            entities: intent.entities.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_entity(mut self, name: &str, value: &str) -> Self {
        self.entities
            .insert(name.to_owned(), EntityValue::Plain(value.to_owned()));
        self
    }

    #[must_use]
    pub fn with_target(mut self, id: ControlId) -> Self {
        self.target = Some(id);
        self
    }

    #[must_use]
    pub fn with_targets(mut self, ids: Vec<ControlId>) -> Self {
        self.targets = ids;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: ResolvedSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    #[must_use]
    pub fn with_normalized_value(mut self, value: &str) -> Self {
        self.normalized_value = Some(value.to_owned());
        self
    }

    /// Canonical English value of a named entity.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(EntityValue::english)
    }

    /// The resolved primary target, when resolution found one.
    #[must_use]
    pub fn target(&self) -> Option<ControlId> {
        self.target
    }

    #[must_use]
    pub fn targets(&self) -> &[ControlId] {
        &self.targets
    }

    #[must_use]
    pub fn selection(&self) -> Option<&ResolvedSelection> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn normalized_value(&self) -> Option<&str> {
        self.normalized_value.as_deref()
    }

    /// Display forms of the entities, for outcome events.
    #[must_use]
    pub fn display_entities(&self) -> Vec<(String, String)> {
        self.entities
            .iter()
            .map(|(k, v)| (k.clone(), v.display().to_owned()))
            .collect()
    }
}

/// Dispatches recognized intents against a control surface.
pub struct Actuator {
    table: HashMap<String, Executor>,
    config: ActuatorConfig,
    bus: EventBus,
}

impl Actuator {
    /// Actuator with the built-in action table.
    #[must_use]
    pub fn new(config: ActuatorConfig, bus: EventBus) -> Self {
        Self {
            table: default_action_table(),
            config,
            bus,
        }
    }

    /// Register (or replace) an executor for an intent.
    pub fn register(&mut self, intent: &str, executor: Executor) {
        self.table.insert(intent.to_owned(), executor);
    }

    /// Execute a batch of intents strictly in order.
    ///
    /// Returns `true` only when every intent executed. Failures are
    /// per-intent: a missing executor, an unresolved target, or a refusing
    /// executor pauses that intent and the batch moves on after the settle
    /// delay.
    pub async fn perform_actions(
        &self,
        surface: &mut ControlSurface,
        intents: &[IntentResult],
    ) -> bool {
        let mut all_succeeded = true;
        for (index, intent) in intents.iter().enumerate() {
            if !self.perform_one(surface, intent) {
                all_succeeded = false;
            }
            // Let the host view settle before the next automated action.
            if index + 1 < intents.len() {
                tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
            }
        }
        all_succeeded
    }

    fn perform_one(&self, surface: &mut ControlSurface, intent: &IntentResult) -> bool {
        let Some(executor) = self.table.get(&intent.intent) else {
            warn!(intent = %intent.intent, "no executor registered");
            self.pause(intent, "no executor registered");
            return false;
        };

        let processed = self.enrich(surface, intent);
        if executor(surface, &processed) {
            info!(intent = %intent.intent, "action performed");
            self.bus.publish(SessionEvent::ActionPerformed {
                intent: intent.intent.clone(),
                entities: processed.display_entities(),
            });
            true
        } else {
            self.pause(intent, "action could not be executed");
            false
        }
    }

    fn pause(&self, intent: &IntentResult, reason: &str) {
        debug!(intent = %intent.intent, reason, "action paused");
        self.bus.publish(SessionEvent::ActionPaused {
            intent: intent.intent.clone(),
            reason: reason.to_owned(),
        });
    }

    /// Resolve the intent's entities against the surface.
    ///
    /// `select_option` goes through grouped resolution; `check_all` expands
    /// to the checkbox set of its group (or the whole view); every other
    /// intent with a `target` entity resolves it globally, and a resolved
    /// fill target also normalizes the spoken `value`.
    fn enrich(&self, surface: &ControlSurface, intent: &IntentResult) -> ProcessedEntities {
        let resolver = ElementResolver::new(surface);
        let mut processed = ProcessedEntities::from_intent(intent);

        match intent.intent.as_str() {
            intents::SELECT_OPTION => {
                if let Some(target) = processed.entity("target").map(str::to_owned) {
                    let group = processed.entity("group").map(str::to_owned);
                    let matched = resolver.resolve_in_group(
                        group.as_deref(),
                        &target,
                        self.config.group_score_floor,
                    );
                    processed = match matched {
                        Some(GroupMatch::Member(control)) => {
                            processed.with_selection(ResolvedSelection::Member(control.id))
                        }
                        Some(GroupMatch::DropdownOption { dropdown, index }) => processed
                            .with_selection(ResolvedSelection::DropdownOption {
                                dropdown: dropdown.id,
                                index,
                            }),
                        None => processed,
                    };
                }
            }
            intents::CHECK_ALL => {
                let members: Vec<ControlId> = match processed.entity("group").map(str::to_owned) {
                    Some(group) => surface
                        .controls_in_group(&group)
                        .filter(|c| matches!(c.kind, ControlKind::Checkbox { .. }))
                        .map(|c| c.id)
                        .collect(),
                    None => surface
                        .controls()
                        .iter()
                        .filter(|c| matches!(c.kind, ControlKind::Checkbox { .. }))
                        .map(|c| c.id)
                        .collect(),
                };
                processed = processed.with_targets(members);
            }
            _ => {
                if let Some(target) = processed.entity("target").map(str::to_owned)
                    && let Some(control) = resolver.resolve(&target)
                {
                    processed = processed.with_target(control.id);
                    if let Some(value) = processed.entity("value").map(str::to_owned) {
                        let normalized = normalize_value(control, &value);
                        processed = processed.with_normalized_value(&normalized);
                    }
                }
            }
        }

        processed
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::surface::InputKind;

    fn intent(name: &str, entities: &[(&str, &str)]) -> IntentResult {
        IntentResult {
            intent: name.to_owned(),
            confidence: 0.95,
            entities: entities
                .iter()
                .map(|(k, v)| ((*k).to_owned(), EntityValue::Plain((*v).to_owned())))
                .collect(),
        }
    }

    fn checkout_surface() -> ControlSurface {
        let mut s = ControlSurface::new();
        s.add("Submit", None, ControlKind::Button);
        s.add(
            "Email",
            None,
            ControlKind::TextInput {
                input: InputKind::Email,
                value: String::new(),
                min: None,
                max: None,
            },
        );
        s.add("Terms", Some("consents"), ControlKind::Checkbox { checked: false });
        s.add("Privacy", Some("consents"), ControlKind::Checkbox { checked: false });
        s
    }

    fn actuator() -> (Actuator, EventBus) {
        let bus = EventBus::new();
        (Actuator::new(ActuatorConfig::default(), bus.clone()), bus)
    }

    #[tokio::test]
    async fn click_end_to_end() {
        let (actuator, bus) = actuator();
        let mut rx = bus.subscribe();
        let mut surface = checkout_surface();
        let ok = actuator
            .perform_actions(
                &mut surface,
                &[intent(intents::CLICK_ELEMENT, &[("target", "submit button")])],
            )
            .await;
        assert!(ok);
        match rx.recv().await.unwrap() {
            SessionEvent::ActionPerformed { intent, entities } => {
                assert_eq!(intent, intents::CLICK_ELEMENT);
                assert_eq!(entities, vec![("target".to_owned(), "submit button".to_owned())]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fill_normalizes_before_writing() {
        let (actuator, _bus) = actuator();
        let mut surface = checkout_surface();
        let ok = actuator
            .perform_actions(
                &mut surface,
                &[intent(
                    intents::FILL_INPUT,
                    &[("target", "email"), ("value", "john at example dot com")],
                )],
            )
            .await;
        assert!(ok);
        let email = surface
            .controls()
            .iter()
            .find(|c| c.voice_name == "Email")
            .unwrap();
        assert_eq!(email.value(), Some("john@example.com"));
    }

    #[tokio::test]
    async fn missing_executor_pauses_and_continues() {
        let (actuator, bus) = actuator();
        let mut rx = bus.subscribe();
        let mut surface = checkout_surface();
        surface.navigate_to("home");
        surface.navigate_to("details");

        let ok = actuator
            .perform_actions(
                &mut surface,
                &[intent("levitate", &[]), intent(intents::NAVIGATE_BACK, &[])],
            )
            .await;
        assert!(!ok, "all-succeeded must be false");
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::ActionPaused { .. }));
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::ActionPerformed { .. }));
        assert_eq!(surface.current_view(), "home");
    }

    #[tokio::test]
    async fn unresolved_target_pauses() {
        let (actuator, bus) = actuator();
        let mut rx = bus.subscribe();
        let mut surface = checkout_surface();
        let ok = actuator
            .perform_actions(
                &mut surface,
                &[intent(intents::CLICK_ELEMENT, &[("target", "purple elephant")])],
            )
            .await;
        assert!(!ok);
        match rx.recv().await.unwrap() {
            SessionEvent::ActionPaused { intent, .. } => assert_eq!(intent, intents::CLICK_ELEMENT),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn check_all_without_group_hits_every_checkbox() {
        let (actuator, _bus) = actuator();
        let mut surface = checkout_surface();
        let ok = actuator
            .perform_actions(&mut surface, &[intent(intents::CHECK_ALL, &[])])
            .await;
        assert!(ok);
        let checked = surface
            .controls()
            .iter()
            .filter(|c| matches!(c.kind, ControlKind::Checkbox { checked: true }))
            .count();
        assert_eq!(checked, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_delay_separates_sequential_intents() {
        let (actuator, bus) = actuator();
        let mut rx = bus.subscribe();
        let mut surface = checkout_surface();
        surface.navigate_to("home");
        surface.navigate_to("details");

        let batch = [
            intent(intents::CHECK_ALL, &[("group", "consents")]),
            intent(intents::NAVIGATE_BACK, &[]),
        ];
        let started = tokio::time::Instant::now();
        let ok = actuator.perform_actions(&mut surface, &batch).await;
        assert!(ok);
        // Exactly one settle delay between the two intents, none after.
        assert_eq!(
            started.elapsed(),
            Duration::from_millis(ActuatorConfig::default().settle_delay_ms)
        );

        match rx.recv().await.unwrap() {
            SessionEvent::ActionPerformed { intent, .. } => assert_eq!(intent, intents::CHECK_ALL),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            SessionEvent::ActionPerformed { intent, .. } => {
                assert_eq!(intent, intents::NAVIGATE_BACK);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_executor_registration() {
        let (mut actuator, _bus) = actuator();
        fn exec_nothing(_: &mut ControlSurface, _: &ProcessedEntities) -> bool {
            true
        }
        actuator.register("wave", exec_nothing);
        let mut surface = ControlSurface::new();
        assert!(actuator.perform_actions(&mut surface, &[intent("wave", &[])]).await);
    }
}
