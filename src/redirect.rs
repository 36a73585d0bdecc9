// Core redirect rule types
//
// This module defines the persisted redirect rule and its not-yet-persisted
// input form. A rule maps a source URL path to a destination URL path with a
// flag controlling whether the redirect is served as permanent (301) or
// temporary (302). The flag is semantic only and never affects validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted redirect rule.
/// Assigned by the store on create; a rule keeps its id across updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectId(Uuid);

impl RedirectId {
    /// Create a new random redirect id.
    pub fn new() -> Self {
        RedirectId(Uuid::new_v4())
    }

    /// Returns the underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Converts to a string representation.
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RedirectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RedirectId {
    fn from(uuid: Uuid) -> Self {
        RedirectId(uuid)
    }
}

impl std::fmt::Display for RedirectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate redirect rule, as submitted by an operator or an import row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectInput {
    /// URL path the redirect matches. Must be non-empty.
    pub source: String,
    /// URL path the redirect points at. Must be non-empty.
    pub destination: String,
    /// Serve as permanent (301) rather than temporary (302).
    pub permanent: bool,
}

impl RedirectInput {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, permanent: bool) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            permanent,
        }
    }
}

/// A persisted redirect rule.
///
/// The boundary serialization carries exactly `{id, source, destination,
/// permanent}`; the timestamps are store bookkeeping and are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub id: RedirectId,
    pub source: String,
    pub destination: String,
    pub permanent: bool,
    #[serde(skip_serializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Redirect {
    /// Materialize a persisted rule from an input, stamping a fresh id.
    pub fn from_input(input: &RedirectInput) -> Self {
        let now = Utc::now();
        Self {
            id: RedirectId::new(),
            source: input.source.clone(),
            destination: input.destination.clone(),
            permanent: input.permanent,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the mutable fields from an input, bumping `updated_at`.
    pub fn apply(&mut self, input: &RedirectInput) {
        self.source = input.source.clone();
        self.destination = input.destination.clone();
        self.permanent = input.permanent;
        self.updated_at = Utc::now();
    }

    /// The input form of this rule.
    pub fn as_input(&self) -> RedirectInput {
        RedirectInput {
            source: self.source.clone(),
            destination: self.destination.clone(),
            permanent: self.permanent,
        }
    }
}
