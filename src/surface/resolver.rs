//! Fuzzy resolution of spoken target names to controls.
//!
//! Scoring is a weighted sum of five signals computed on normalized token
//! forms. Exact equality dominates everything else so a verbatim name always
//! wins; the remaining signals rank partial and noisy references.

use crate::similarity::{
    contains_token_phrase, edit_similarity, normalize, token_order_similarity, token_overlap,
    tokenize,
};
use crate::surface::{Control, ControlId, ControlKind, ControlSurface};
use tracing::debug;

/// Signal weights. The exact-match weight exceeds the sum of all others.
const WEIGHT_EXACT: f32 = 100.0;
const WEIGHT_PHRASE: f32 = 40.0;
const WEIGHT_OVERLAP: f32 = 30.0;
const WEIGHT_ORDER: f32 = 50.0;
const WEIGHT_EDIT: f32 = 20.0;

/// Edit-distance similarity below this contributes nothing. Keeps entirely
/// unrelated names at a hard 0 instead of accumulating noise points.
const EDIT_FLOOR: f32 = 0.5;

/// A scored candidate produced during resolution. Transient; callers keep
/// only the winning control id.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub control: ControlId,
    pub score: f32,
    pub declared_name: String,
}

/// Resolves spoken names against a control surface.
pub struct ElementResolver<'a> {
    surface: &'a ControlSurface,
}

impl<'a> ElementResolver<'a> {
    #[must_use]
    pub fn new(surface: &'a ControlSurface) -> Self {
        Self { surface }
    }

    /// Score a spoken target name against a declared voice-name.
    #[must_use]
    pub fn score(target: &str, declared: &str) -> f32 {
        let target_norm = normalize(target);
        let declared_norm = normalize(declared);
        if target_norm.is_empty() || declared_norm.is_empty() {
            return 0.0;
        }

        let target_tokens = tokenize(target);
        let declared_tokens = tokenize(declared);

        let mut score = 0.0;
        if target_norm == declared_norm {
            score += WEIGHT_EXACT;
        }
        // One-directional on purpose: a short spoken form inside a longer
        // declared name earns the bonus, extra spoken words around a
        // declared name do not.
        if contains_token_phrase(&declared_tokens, &target_tokens) {
            score += WEIGHT_PHRASE;
        }
        score += token_overlap(&target_tokens, &declared_tokens) * WEIGHT_OVERLAP;
        score += token_order_similarity(&target_tokens, &declared_tokens) * WEIGHT_ORDER;

        let edit = edit_similarity(&target_norm, &declared_norm);
        if edit >= EDIT_FLOOR {
            score += edit * WEIGHT_EDIT;
        }

        score
    }

    /// Score every addressable candidate in `scope` and keep them ordered
    /// as encountered, so ties resolve to the first registered control.
    fn candidates<'b>(
        target: &str,
        scope: impl Iterator<Item = &'b Control>,
    ) -> Vec<MatchCandidate> {
        scope
            .map(|c| MatchCandidate {
                control: c.id,
                score: Self::score(target, &c.voice_name),
                declared_name: c.voice_name.clone(),
            })
            .collect()
    }

    fn best(candidates: &[MatchCandidate]) -> Option<&MatchCandidate> {
        let mut best: Option<&MatchCandidate> = None;
        for c in candidates {
            // Strict comparison keeps the first encountered on ties.
            if c.score > 0.0 && best.is_none_or(|b| c.score > b.score) {
                best = Some(c);
            }
        }
        best
    }

    /// Find the best-matching addressable control for a spoken name.
    #[must_use]
    pub fn resolve(&self, target: &str) -> Option<&'a Control> {
        let candidates = Self::candidates(target, self.surface.addressable());
        let winner = Self::best(&candidates)?;
        debug!(
            target,
            declared = %winner.declared_name,
            score = winner.score,
            "resolved target"
        );
        self.surface.get(winner.control)
    }

    /// All controls in the best-matching group, or empty when no group
    /// name scores above zero.
    #[must_use]
    pub fn resolve_group(&self, group_name: &str) -> Vec<&'a Control> {
        let mut best: Option<(&str, f32)> = None;
        for name in self.surface.group_names() {
            let s = Self::score(group_name, name);
            if s > 0.0 && best.is_none_or(|(_, b)| s > b) {
                best = Some((name, s));
            }
        }
        match best {
            Some((name, _)) => self.surface.controls_in_group(name).collect(),
            None => Vec::new(),
        }
    }

    /// Resolve a target inside a grouped family.
    ///
    /// The group is the explicitly named one, falling back to the view's
    /// single grouped family when no name was spoken. Within the group,
    /// radio members are matched by voice-name and a dropdown's options by
    /// label/value, and the winner must clear `score_floor`.
    #[must_use]
    pub fn resolve_in_group(
        &self,
        group_name: Option<&str>,
        target: &str,
        score_floor: f32,
    ) -> Option<GroupMatch<'a>> {
        let members: Vec<&Control> = match group_name {
            Some(name) => self.resolve_group(name),
            None => {
                let names = self.surface.group_names();
                // Auto-detection only applies when the group is unambiguous.
                if names.len() != 1 {
                    return None;
                }
                self.surface.controls_in_group(names[0]).collect()
            }
        };
        if members.is_empty() {
            return None;
        }

        // A dropdown family is a single control; search its options.
        if let [single] = members.as_slice()
            && let ControlKind::Dropdown { options, .. } = &single.kind
        {
            let mut best: Option<(usize, f32)> = None;
            for (i, option) in options.iter().enumerate() {
                let s = Self::score(target, &option.label)
                    .max(Self::score(target, &option.value));
                if s > score_floor && best.is_none_or(|(_, b)| s > b) {
                    best = Some((i, s));
                }
            }
            return best.map(|(index, _)| GroupMatch::DropdownOption {
                dropdown: single,
                index,
            });
        }

        let candidates = Self::candidates(target, members.into_iter());
        let winner = Self::best(&candidates)?;
        if winner.score <= score_floor {
            return None;
        }
        self.surface.get(winner.control).map(GroupMatch::Member)
    }
}

/// Outcome of a grouped resolution.
#[derive(Debug)]
pub enum GroupMatch<'a> {
    /// A member control of the group (radio family member).
    Member(&'a Control),
    /// An option inside a dropdown control.
    DropdownOption { dropdown: &'a Control, index: usize },
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::surface::SelectOption;

    fn surface_with_buttons(names: &[&str]) -> ControlSurface {
        let mut s = ControlSurface::new();
        for n in names {
            s.add(n, None, ControlKind::Button);
        }
        s
    }

    #[test]
    fn exact_name_dominates() {
        // score(a, a) must beat score(a, b) for every b != a.
        let others = ["submit order", "submit button below", "sub"];
        let exact = ElementResolver::score("submit", "submit");
        for b in others {
            assert!(exact > ElementResolver::score("submit", b), "b={b}");
        }
    }

    #[test]
    fn disjoint_names_score_zero() {
        assert_eq!(ElementResolver::score("volume slider", "privacy notice"), 0.0);
        assert_eq!(ElementResolver::score("submit", "cancel"), 0.0);
    }

    #[test]
    fn partial_reference_scores_positive() {
        // "submit" spoken against declared "Submit Order": token overlap,
        // phrase containment and order all contribute.
        let s = ElementResolver::score("submit", "Submit Order");
        assert!(s > 0.0, "score={s}");
    }

    #[test]
    fn phrase_bonus_is_one_directional() {
        // The remaining signals are symmetric, so the gap between the two
        // directions is exactly the phrase bonus.
        let spoken_inside_declared = ElementResolver::score("save", "Save Changes Now");
        let declared_inside_spoken = ElementResolver::score("save changes now", "Save");
        assert!(spoken_inside_declared > declared_inside_spoken);
        assert!(declared_inside_spoken < WEIGHT_PHRASE);
    }

    #[test]
    fn resolve_picks_best_and_is_idempotent() {
        let s = surface_with_buttons(&["Cancel", "Submit", "Submit All"]);
        let r = ElementResolver::new(&s);
        let first = r.resolve("submit").unwrap().id;
        assert_eq!(s.get(first).unwrap().voice_name, "Submit");
        // Unchanged surface, same spoken name, same control.
        assert_eq!(r.resolve("submit").unwrap().id, first);
    }

    #[test]
    fn ties_keep_first_encountered() {
        let s = surface_with_buttons(&["Go", "Go"]);
        let r = ElementResolver::new(&s);
        assert_eq!(r.resolve("go").unwrap().id, ControlId(0));
    }

    #[test]
    fn no_candidate_above_zero_is_none() {
        let s = surface_with_buttons(&["Cancel"]);
        let r = ElementResolver::new(&s);
        assert!(r.resolve("purple elephant").is_none());
    }

    #[test]
    fn fuzzy_tolerates_transcription_noise() {
        let s = surface_with_buttons(&["Submit Button"]);
        let r = ElementResolver::new(&s);
        // Edit similarity carries the misspelling.
        assert!(r.resolve("submit botton").is_some());
    }

    fn radio_surface() -> ControlSurface {
        let mut s = ControlSurface::new();
        s.add("Credit Card", Some("payment"), ControlKind::Radio { selected: false });
        s.add("Bank Transfer", Some("payment"), ControlKind::Radio { selected: false });
        s
    }

    #[test]
    fn group_resolution_by_name() {
        let s = radio_surface();
        let r = ElementResolver::new(&s);
        assert_eq!(r.resolve_group("payment").len(), 2);
        assert!(r.resolve_group("shipping").is_empty());
    }

    #[test]
    fn within_group_match_requires_floor() {
        let s = radio_surface();
        let r = ElementResolver::new(&s);
        let m = r.resolve_in_group(Some("payment"), "credit card", 50.0);
        match m {
            Some(GroupMatch::Member(c)) => assert_eq!(c.voice_name, "Credit Card"),
            other => panic!("unexpected match: {other:?}"),
        }
        // "wire" scores below the 50-point floor against both members.
        assert!(r.resolve_in_group(Some("payment"), "wire", 50.0).is_none());
    }

    #[test]
    fn single_group_auto_detected() {
        let s = radio_surface();
        let r = ElementResolver::new(&s);
        assert!(r.resolve_in_group(None, "bank transfer", 50.0).is_some());
    }

    #[test]
    fn ambiguous_auto_group_is_rejected() {
        let mut s = radio_surface();
        s.add("Country", Some("country"), ControlKind::Dropdown {
            options: vec![],
            selected: None,
            expanded: false,
        });
        let r = ElementResolver::new(&s);
        assert!(r.resolve_in_group(None, "bank transfer", 50.0).is_none());
    }

    #[test]
    fn dropdown_options_searched_by_label_and_value() {
        let mut s = ControlSurface::new();
        s.add(
            "Country",
            Some("country"),
            ControlKind::Dropdown {
                options: vec![
                    SelectOption { label: "Germany".into(), value: "DE".into() },
                    SelectOption { label: "France".into(), value: "FR".into() },
                ],
                selected: None,
                expanded: false,
            },
        );
        let r = ElementResolver::new(&s);
        match r.resolve_in_group(Some("country"), "germany", 50.0) {
            Some(GroupMatch::DropdownOption { index, .. }) => assert_eq!(index, 0),
            other => panic!("unexpected match: {other:?}"),
        }
    }
}
