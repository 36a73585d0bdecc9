// Import reconciler
//
// Consumes an ordered batch of screened candidate rows and reconciles each
// one against the persisted store: pre-flagged INVALID rows pass through,
// every other row is re-validated against the store as of that row, then
// either updates the rule already holding its source or creates a new one.
//
// Rows are processed strictly in order; later rows see the persisted effects
// of earlier rows. A store failure marks that row ERROR and the batch keeps
// going. The function itself never fails: all failure information is carried
// in the row's result.

use serde::{Deserialize, Serialize};

use crate::csv_import::{RowDetail, ScreenedRow};
use crate::redirect::{Redirect, RedirectId, RedirectInput};
use crate::store::{RedirectStore, StoreError};
use crate::validate::{validate, FailureKind, ValidationFailure, ValidationOutcome};

/// Per-row outcome of a batch import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    /// A new rule was persisted.
    Created,
    /// The rule already holding this source was updated in place.
    Updated,
    /// Rejected by the batch pre-check or by store-side validation.
    Invalid,
    /// The persistence call failed; the row is a no-op.
    Error,
}

/// Detail tag carried alongside the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportDetail {
    Created,
    Updated,
    Loop,
    Duplicate,
    LoopDetected,
    New,
}

impl From<FailureKind> for ImportDetail {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Loop => ImportDetail::Loop,
            FailureKind::Duplicate => ImportDetail::Duplicate,
        }
    }
}

impl From<RowDetail> for ImportDetail {
    fn from(detail: RowDetail) -> Self {
        match detail {
            RowDetail::New => ImportDetail::New,
            RowDetail::LoopDetected => ImportDetail::LoopDetected,
            RowDetail::Duplicate => ImportDetail::Duplicate,
        }
    }
}

/// Result for one input row, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(flatten)]
    pub input: RedirectInput,
    pub status: ImportStatus,
    /// Id of the created/updated rule, when one was persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RedirectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ImportDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResult {
    fn created(redirect: &Redirect) -> Self {
        Self {
            input: redirect.as_input(),
            status: ImportStatus::Created,
            id: Some(redirect.id),
            reason: None,
            details: Some(ImportDetail::Created),
            error: None,
        }
    }

    fn updated(redirect: &Redirect) -> Self {
        Self {
            input: redirect.as_input(),
            status: ImportStatus::Updated,
            id: Some(redirect.id),
            reason: None,
            details: Some(ImportDetail::Updated),
            error: None,
        }
    }

    fn invalid(input: RedirectInput, failure: ValidationFailure) -> Self {
        Self {
            input,
            status: ImportStatus::Invalid,
            id: None,
            reason: Some(failure.message),
            details: Some(failure.kind.into()),
            error: None,
        }
    }

    /// Pre-flagged row, passed through unchanged.
    fn passthrough(row: ScreenedRow) -> Self {
        Self {
            input: row.input,
            status: ImportStatus::Invalid,
            id: None,
            reason: row.reason,
            details: Some(row.details.into()),
            error: None,
        }
    }

    fn errored(input: RedirectInput, message: String) -> Self {
        Self {
            input,
            status: ImportStatus::Error,
            id: None,
            reason: None,
            details: None,
            error: Some(message),
        }
    }
}

/// Reconcile an ordered batch of screened rows against the store.
///
/// One result per row, in input order. Never panics and never aborts the
/// batch: a failing row carries its failure in the result and processing
/// continues.
pub fn import_batch(store: &dyn RedirectStore, rows: Vec<ScreenedRow>) -> Vec<ImportResult> {
    let mut results = Vec::with_capacity(rows.len());

    for row in rows {
        if row.is_invalid() {
            results.push(ImportResult::passthrough(row));
            continue;
        }
        results.push(reconcile_row(store, row.input));
    }

    results
}

fn reconcile_row(store: &dyn RedirectStore, input: RedirectInput) -> ImportResult {
    match try_reconcile(store, &input) {
        Ok(result) => result,
        // The store-level uniqueness backstop fired after validation passed
        // (e.g. a concurrent writer claimed the source). Report it as the
        // duplicate rejection rather than a generic storage error.
        Err(StoreError::DuplicateSource(_)) => {
            ImportResult::invalid(input, ValidationFailure::duplicate())
        }
        Err(err) => {
            log::error!("Error during import of '{}': {}", input.source, err);
            ImportResult::errored(input, err.to_string())
        }
    }
}

fn try_reconcile(
    store: &dyn RedirectStore,
    input: &RedirectInput,
) -> Result<ImportResult, StoreError> {
    // An existing rule with the same source is the update target, so it is
    // excluded from validation. Without the exclusion a re-imported row would
    // always trip the duplicate check and UPDATED could never happen.
    let existing = store
        .find_by_source(&input.source, None)?
        .into_iter()
        .next();

    let outcome = validate(store, input, existing.as_ref().map(|r| &r.id))?;
    if let ValidationOutcome::Rejected(failure) = outcome {
        return Ok(ImportResult::invalid(input.clone(), failure));
    }

    match existing {
        Some(target) => {
            let updated = store.update(&target.id, input)?;
            Ok(ImportResult::updated(&updated))
        }
        None => {
            let created = store.create(input)?;
            Ok(ImportResult::created(&created))
        }
    }
}
