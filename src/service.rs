// Controller-facing redirect service
//
// Thin orchestration over an injected store: CRUD with validation on the
// write paths, plus batch import. The HTTP/admin layer sits above this and
// turns `ServiceError::Rejected` into a per-field operator message and
// `ServiceError::Store` into a generic failure.

use std::sync::Arc;

use thiserror::Error;

use crate::csv_import::{self, ParseError, ScreenedRow};
use crate::import::{import_batch, ImportResult};
use crate::redirect::{Redirect, RedirectId, RedirectInput};
use crate::store::{RedirectPage, RedirectQuery, RedirectStore, StoreError};
use crate::validate::{validate, ValidationFailure, ValidationOutcome};

/// Failures surfaced to the controller layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The candidate failed validation; carries the operator-facing verdict.
    #[error("{0}")]
    Rejected(ValidationFailure),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Redirect CRUD and import over an injected store.
pub struct RedirectService {
    store: Arc<dyn RedirectStore>,
}

impl RedirectService {
    pub fn new(store: Arc<dyn RedirectStore>) -> Self {
        Self { store }
    }

    pub fn find_one(&self, id: &RedirectId) -> Result<Option<Redirect>, ServiceError> {
        Ok(self.store.find_one(id)?)
    }

    pub fn find_all(&self, query: &RedirectQuery) -> Result<RedirectPage, ServiceError> {
        Ok(self.store.find_all(query)?)
    }

    /// Validate and persist a new rule.
    pub fn create(&self, input: &RedirectInput) -> Result<Redirect, ServiceError> {
        if let ValidationOutcome::Rejected(failure) = validate(self.store.as_ref(), input, None)? {
            return Err(ServiceError::Rejected(failure));
        }
        self.store.create(input).map_err(Self::map_write_error)
    }

    /// Validate and update an existing rule, excluding it from its own
    /// duplicate/loop checks.
    pub fn update(&self, id: &RedirectId, input: &RedirectInput) -> Result<Redirect, ServiceError> {
        if let ValidationOutcome::Rejected(failure) =
            validate(self.store.as_ref(), input, Some(id))?
        {
            return Err(ServiceError::Rejected(failure));
        }
        self.store.update(id, input).map_err(Self::map_write_error)
    }

    pub fn delete(&self, id: &RedirectId) -> Result<Option<Redirect>, ServiceError> {
        Ok(self.store.delete(id)?)
    }

    /// Reconcile a screened batch. Infallible; per-row outcomes carry all
    /// failure information.
    pub fn import(&self, rows: Vec<ScreenedRow>) -> Vec<ImportResult> {
        import_batch(self.store.as_ref(), rows)
    }

    /// Parse CSV text, screen the batch against itself, then reconcile it.
    pub fn import_csv(&self, text: &str) -> Result<Vec<ImportResult>, ParseError> {
        Ok(self.import(csv_import::parse_and_screen(text)?))
    }

    /// A uniqueness-constraint violation from the store means validation
    /// raced a concurrent writer; report it as the duplicate rejection.
    fn map_write_error(err: StoreError) -> ServiceError {
        match err {
            StoreError::DuplicateSource(_) => {
                ServiceError::Rejected(ValidationFailure::duplicate())
            }
            other => ServiceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportStatus;
    use crate::store::MemoryStore;
    use crate::validate::FailureKind;

    fn service() -> RedirectService {
        RedirectService::new(Arc::new(MemoryStore::new()))
    }

    fn input(source: &str, destination: &str) -> RedirectInput {
        RedirectInput::new(source, destination, false)
    }

    #[test]
    fn create_persists_a_valid_rule() {
        let service = service();
        let created = service.create(&input("/a", "/b")).unwrap();
        assert_eq!(
            service.find_one(&created.id).unwrap().map(|r| r.source),
            Some("/a".to_string())
        );
    }

    #[test]
    fn create_rejects_duplicates_and_loops() {
        let service = service();
        service.create(&input("/a", "/b")).unwrap();

        let err = service.create(&input("/a", "/c")).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Rejected(ValidationFailure {
                kind: FailureKind::Duplicate,
                ..
            })
        ));

        let err = service.create(&input("/b", "/a")).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Rejected(ValidationFailure {
                kind: FailureKind::Loop,
                ..
            })
        ));
    }

    #[test]
    fn update_excludes_the_edited_rule_from_its_own_checks() {
        let service = service();
        let created = service.create(&input("/a", "/b")).unwrap();

        let updated = service.update(&created.id, &input("/a", "/c")).unwrap();
        assert_eq!(updated.destination, "/c");
    }

    #[test]
    fn update_of_unknown_rule_is_a_store_error() {
        let service = service();
        let missing = RedirectId::new();
        let err = service.update(&missing, &input("/a", "/b")).unwrap_err();
        assert_eq!(err, ServiceError::Store(StoreError::NotFound(missing)));
    }

    #[test]
    fn delete_returns_the_removed_rule_or_none() {
        let service = service();
        let created = service.create(&input("/a", "/b")).unwrap();

        assert!(service.delete(&created.id).unwrap().is_some());
        assert!(service.delete(&created.id).unwrap().is_none());
    }

    #[test]
    fn import_csv_runs_end_to_end() {
        let service = service();
        let text = "source,destination,permanent\n/a,/b,true\n/a,/c,false\n/c,/d,false\n";

        let results = service.import_csv(text).unwrap();
        assert_eq!(results[0].status, ImportStatus::Created);
        // Second row duplicates the first within the batch.
        assert_eq!(results[1].status, ImportStatus::Invalid);
        assert_eq!(results[2].status, ImportStatus::Created);
    }
}
