//! # Redirect Engine
//!
//! Validation and bulk-import reconciliation for URL redirect rules.
//!
//! Operators define `source -> destination` rules; this crate keeps the rule
//! set internally consistent: no rule redirects to itself, no two rules share
//! a source, and no chain of rules loops back on itself. Persistence is
//! reached through the narrow [`RedirectStore`] trait, so the engine works
//! against whatever backend the host platform provides; [`MemoryStore`] is
//! the in-process reference implementation.
//!
//! The pieces compose one way, with no feedback in the control flow:
//! CSV text -> `csv_import` (parse + batch pre-check) -> `import` (per-row
//! reconciliation) -> `validate` -> `loops` -> store.

pub mod csv_import;
pub mod import;
pub mod loops;
pub mod redirect;
pub mod service;
pub mod settings;
pub mod store;
pub mod validate;

pub use redirect::{Redirect, RedirectId, RedirectInput};

pub use store::{
    MemoryStore, RedirectPage, RedirectQuery, RedirectStore, SortDir, SortKey, StoreError,
};

pub use loops::would_loop;

pub use validate::{validate, FailureKind, ValidationFailure, ValidationOutcome};

pub use import::{import_batch, ImportDetail, ImportResult, ImportStatus};

pub use csv_import::{
    parse,            // CSV text -> candidate rows
    parse_and_screen, // parse + batch pre-check
    screen,           // batch-local pre-check
    ParseError,
    RowDetail,
    RowStatus,
    ScreenedRow,
};

pub use service::{RedirectService, ServiceError};

pub use settings::{format_url, LifecycleSetting, LifecycleSettings, SettingUpdate};
