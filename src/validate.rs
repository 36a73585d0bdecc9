// Validation engine
//
// Applies the three consistency checks to one candidate rule against the
// persisted rule set: self-redirect, duplicate source, transitive loop.
// Verdicts are returned, never thrown, so callers can surface them per field
// to the operator; only store failures travel as `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loops::would_loop;
use crate::redirect::{RedirectId, RedirectInput};
use crate::store::{RedirectStore, StoreError};

/// Why a candidate rule was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Self-redirect or transitive cycle.
    Loop,
    /// Another rule already claims this source.
    Duplicate,
}

/// A structured rejection with the operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationFailure {
    #[serde(rename = "type")]
    pub kind: FailureKind,
    pub message: String,
}

impl ValidationFailure {
    pub fn self_loop() -> Self {
        Self {
            kind: FailureKind::Loop,
            message: "Invalid redirect: The 'Source' and 'Destination' cannot be the same."
                .to_string(),
        }
    }

    pub fn duplicate() -> Self {
        Self {
            kind: FailureKind::Duplicate,
            message: "Duplicate redirect: A redirect with the same 'Source' already exists."
                .to_string(),
        }
    }

    pub fn transitive_loop() -> Self {
        Self {
            kind: FailureKind::Loop,
            message:
                "Redirect loop detected: The 'Destination' creates a loop back to the 'Source'."
                    .to_string(),
        }
    }
}

/// Accept/reject verdict for a candidate rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(ValidationFailure),
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected(failure) => Some(failure),
        }
    }
}

/// Validate one candidate rule against the persisted rule set.
///
/// Check order, first failure wins:
/// 1. self-redirect (`source == destination`) -> `LOOP`;
/// 2. duplicate source among persisted rules minus `exclude_id` -> `DUPLICATE`;
/// 3. transitive loop -> `LOOP`.
///
/// The duplicate and loop checks are both evaluated; when a candidate triggers
/// both, the duplicate verdict is the one surfaced. `exclude_id` is the id of
/// the rule being edited, so updating a rule never conflicts with itself.
pub fn validate(
    store: &dyn RedirectStore,
    candidate: &RedirectInput,
    exclude_id: Option<&RedirectId>,
) -> Result<ValidationOutcome, StoreError> {
    if candidate.source == candidate.destination {
        return Ok(ValidationOutcome::Rejected(ValidationFailure::self_loop()));
    }

    let has_duplicate = !store
        .find_by_source(&candidate.source, exclude_id)?
        .is_empty();
    let has_loop = would_loop(
        store,
        &candidate.source,
        &candidate.destination,
        exclude_id,
    )?;

    if has_duplicate {
        return Ok(ValidationOutcome::Rejected(ValidationFailure::duplicate()));
    }
    if has_loop {
        return Ok(ValidationOutcome::Rejected(
            ValidationFailure::transitive_loop(),
        ));
    }

    Ok(ValidationOutcome::Accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn input(source: &str, destination: &str) -> RedirectInput {
        RedirectInput::new(source, destination, false)
    }

    #[test]
    fn self_redirect_is_rejected_as_loop() {
        let store = MemoryStore::new();
        let outcome = validate(&store, &input("/a", "/a"), None).unwrap();
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Loop);
    }

    #[test]
    fn duplicate_source_is_rejected() {
        let store = MemoryStore::new();
        store.create(&input("/a", "/b")).unwrap();

        let outcome = validate(&store, &input("/a", "/c"), None).unwrap();
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Duplicate);
    }

    #[test]
    fn editing_a_rule_against_itself_is_allowed() {
        let store = MemoryStore::new();
        let existing = store.create(&input("/a", "/b")).unwrap();

        let outcome = validate(&store, &input("/a", "/c"), Some(&existing.id)).unwrap();
        assert!(outcome.is_ok());
    }

    #[test]
    fn two_hop_cycle_is_rejected_as_loop() {
        let store = MemoryStore::new();
        store.create(&input("/a", "/b")).unwrap();
        store.create(&input("/b", "/c")).unwrap();

        let outcome = validate(&store, &input("/c", "/a"), None).unwrap();
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Loop);
    }

    #[test]
    fn chain_without_cycle_is_accepted() {
        let store = MemoryStore::new();
        store.create(&input("/a", "/b")).unwrap();

        let outcome = validate(&store, &input("/c", "/a"), None).unwrap();
        assert!(outcome.is_ok());
    }

    #[test]
    fn duplicate_takes_priority_over_loop() {
        // /a -> /b plus /b -> /a are seeded directly; the candidate /a -> /b
        // is then both a duplicate and a cycle. The duplicate verdict wins.
        let store = MemoryStore::new();
        store.create(&input("/a", "/b")).unwrap();
        store.create(&input("/b", "/a")).unwrap();

        let outcome = validate(&store, &input("/a", "/b"), None).unwrap();
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Duplicate);
    }

    #[test]
    fn empty_store_accepts_any_well_formed_rule() {
        let store = MemoryStore::new();
        assert!(validate(&store, &input("/a", "/b"), None).unwrap().is_ok());
    }

    #[test]
    fn failure_kind_serializes_to_wire_strings() {
        assert_eq!(
            serde_json::to_value(FailureKind::Loop).unwrap(),
            serde_json::json!("LOOP")
        );
        assert_eq!(
            serde_json::to_value(FailureKind::Duplicate).unwrap(),
            serde_json::json!("DUPLICATE")
        );
    }
}
