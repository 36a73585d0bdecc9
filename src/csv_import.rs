// CSV import parsing and batch-level pre-check
//
// Turns operator-supplied CSV text (`source,destination,permanent`) into
// candidate rows, then screens the batch against itself: immediate loops,
// sources duplicating an earlier row, and chains inside the batch that loop.
// The screening verdict is advisory and UI-facing; the import reconciler
// re-validates every row against the store and never trusts it.
//
// Malformed rows are this module's responsibility, not the engine's: missing
// fields and unparseable `permanent` values are parse errors, so screened
// rows always carry well-formed inputs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loops::traverse;
use crate::redirect::RedirectInput;

/// CSV parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("CSV parse error: {0}")]
    Malformed(String),

    #[error("Row {row}: missing or empty '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("Row {row}: 'permanent' must be \"true\" or \"false\", got '{value}'")]
    InvalidPermanent { row: usize, value: String },
}

/// Batch-local screening verdict for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Valid,
    Invalid,
}

/// Detail tag attached to a screened row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowDetail {
    /// No batch-local problem found.
    New,
    /// Immediate or chained loop inside the batch.
    LoopDetected,
    /// Source already used by an earlier row.
    Duplicate,
}

/// One candidate row with its batch-local screening verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenedRow {
    #[serde(flatten)]
    pub input: RedirectInput,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub details: RowDetail,
}

impl ScreenedRow {
    /// A row the pre-check found nothing wrong with.
    pub fn valid(input: RedirectInput) -> Self {
        Self {
            input,
            status: RowStatus::Valid,
            reason: None,
            details: RowDetail::New,
        }
    }

    fn invalid(input: RedirectInput, reason: &str, details: RowDetail) -> Self {
        Self {
            input,
            status: RowStatus::Invalid,
            reason: Some(reason.to_string()),
            details,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.status == RowStatus::Invalid
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    source: String,
    destination: String,
    permanent: String,
}

/// Parse CSV text with a `source,destination,permanent` header into candidate
/// rows. `permanent` is matched case-insensitively against "true"/"false".
pub fn parse(text: &str) -> Result<Vec<RedirectInput>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<RawRow>().enumerate() {
        let row = idx + 1;
        let raw = record.map_err(|e| ParseError::Malformed(e.to_string()))?;

        if raw.source.is_empty() {
            return Err(ParseError::MissingField {
                row,
                field: "source",
            });
        }
        if raw.destination.is_empty() {
            return Err(ParseError::MissingField {
                row,
                field: "destination",
            });
        }

        let permanent = match raw.permanent.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(ParseError::InvalidPermanent {
                    row,
                    value: other.to_string(),
                })
            }
        };

        rows.push(RedirectInput {
            source: raw.source,
            destination: raw.destination,
            permanent,
        });
    }

    Ok(rows)
}

/// Screen a batch against itself, in order.
///
/// A row is flagged INVALID when its source equals its destination, when its
/// source duplicates an earlier row (the first occurrence stays valid), or
/// when it chains into a loop through the *other* rows of the batch. The loop
/// walk is the same traversal the store-backed detector uses, over the
/// in-batch edge set.
pub fn screen(rows: Vec<RedirectInput>) -> Vec<ScreenedRow> {
    let mut screened = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if row.source == row.destination {
            screened.push(ScreenedRow::invalid(
                row.clone(),
                "Immediate loop detected",
                RowDetail::LoopDetected,
            ));
            continue;
        }

        if rows[..index].iter().any(|r| r.source == row.source) {
            screened.push(ScreenedRow::invalid(
                row.clone(),
                "Duplicate redirect",
                RowDetail::Duplicate,
            ));
            continue;
        }

        if loops_within_batch(&rows, index) {
            screened.push(ScreenedRow::invalid(
                row.clone(),
                "Indirect loop detected",
                RowDetail::LoopDetected,
            ));
            continue;
        }

        screened.push(ScreenedRow::valid(row.clone()));
    }

    screened
}

/// Parse and screen in one go.
pub fn parse_and_screen(text: &str) -> Result<Vec<ScreenedRow>, ParseError> {
    Ok(screen(parse(text)?))
}

/// Does `rows[index]` close a loop through the other rows of the batch?
fn loops_within_batch(rows: &[RedirectInput], index: usize) -> bool {
    let row = &rows[index];
    let walk = traverse::<std::convert::Infallible, _>(&row.source, &row.destination, |url| {
        Ok(rows
            .iter()
            .enumerate()
            .filter(|(i, r)| *i != index && r.source == url)
            .map(|(_, r)| r.destination.clone())
            .collect())
    });
    match walk {
        Ok(looping) => looping,
        Err(never) => match never {},
    }
}
