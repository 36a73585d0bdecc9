// Rule store collaborator
//
// The validation engine reaches persistence through the narrow `RedirectStore`
// trait. Backends are free to be whatever the host platform uses (document
// store, SQL, ...); `MemoryStore` is the reference implementation used by the
// engine's tests and by embedders that keep the rule set in process.
//
// `MemoryStore` maintains a source -> id index alongside the primary id index.
// The index doubles as a uniqueness constraint: `create` and `update` refuse a
// source another rule already claims, a store-level backstop for the
// application-level duplicate check, which is racy under concurrent writers.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::redirect::{Redirect, RedirectId, RedirectInput};

/// Store operation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Redirect {0} not found")]
    NotFound(RedirectId),

    #[error("A redirect with source '{0}' already exists")]
    DuplicateSource(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Sort field for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Source,
    Destination,
    #[default]
    CreatedAt,
}

/// Sort direction for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

/// Fluent query builder for listing and searching redirects.
#[derive(Debug, Clone, Default)]
pub struct RedirectQuery {
    /// Substring match against source or destination.
    pub search: Option<String>,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
}

impl RedirectQuery {
    /// Create a query with default sort (newest first) and paging (10 per page).
    pub fn new() -> Self {
        Self {
            search: None,
            sort_key: SortKey::default(),
            sort_dir: SortDir::default(),
            page: 1,
            page_size: 10,
        }
    }

    /// Filter to rules whose source or destination contains `term`.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Set the sort field and direction.
    pub fn sorted_by(mut self, key: SortKey, dir: SortDir) -> Self {
        self.sort_key = key;
        self.sort_dir = dir;
        self
    }

    /// Set the 1-based page and page size.
    pub fn paged(mut self, page: usize, page_size: usize) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.max(1);
        self
    }
}

/// One page of listing results plus the filtered total.
#[derive(Debug, Clone)]
pub struct RedirectPage {
    pub redirects: Vec<Redirect>,
    /// Number of rules matching the filter across all pages.
    pub total: usize,
}

/// Narrow persistence contract consumed by the validation engine and the
/// import reconciler.
pub trait RedirectStore: Send + Sync {
    /// Fetch a single rule by id.
    fn find_one(&self, id: &RedirectId) -> Result<Option<Redirect>, StoreError>;

    /// Rules whose `source` equals `url`, optionally excluding one id.
    fn find_by_source(
        &self,
        url: &str,
        exclude_id: Option<&RedirectId>,
    ) -> Result<Vec<Redirect>, StoreError>;

    /// Listing/search with filters, sort and pagination. Used by the
    /// surrounding CRUD surface, not by validation.
    fn find_all(&self, query: &RedirectQuery) -> Result<RedirectPage, StoreError>;

    fn create(&self, input: &RedirectInput) -> Result<Redirect, StoreError>;

    fn update(&self, id: &RedirectId, input: &RedirectInput) -> Result<Redirect, StoreError>;

    /// Delete a rule, returning it if it existed.
    fn delete(&self, id: &RedirectId) -> Result<Option<Redirect>, StoreError>;
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Primary index: id -> rule.
    by_id: HashMap<RedirectId, Redirect>,
    /// Secondary index: source -> id. Enforces source uniqueness.
    by_source: HashMap<String, RedirectId>,
}

/// In-memory reference store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of persisted rules.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RedirectStore for MemoryStore {
    fn find_one(&self, id: &RedirectId) -> Result<Option<Redirect>, StoreError> {
        Ok(self.inner.read().by_id.get(id).cloned())
    }

    fn find_by_source(
        &self,
        url: &str,
        exclude_id: Option<&RedirectId>,
    ) -> Result<Vec<Redirect>, StoreError> {
        let inner = self.inner.read();
        let hit = inner
            .by_source
            .get(url)
            .filter(|id| exclude_id != Some(*id))
            .and_then(|id| inner.by_id.get(id))
            .cloned();
        Ok(hit.into_iter().collect())
    }

    fn find_all(&self, query: &RedirectQuery) -> Result<RedirectPage, StoreError> {
        let inner = self.inner.read();
        let mut matches: Vec<Redirect> = inner
            .by_id
            .values()
            .filter(|r| match &query.search {
                Some(term) => r.source.contains(term) || r.destination.contains(term),
                None => true,
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ord = match query.sort_key {
                SortKey::Source => a.source.cmp(&b.source),
                SortKey::Destination => a.destination.cmp(&b.destination),
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            match query.sort_dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });

        let total = matches.len();
        let start = (query.page.max(1) - 1) * query.page_size;
        let redirects = matches
            .into_iter()
            .skip(start)
            .take(query.page_size)
            .collect();

        Ok(RedirectPage { redirects, total })
    }

    fn create(&self, input: &RedirectInput) -> Result<Redirect, StoreError> {
        let mut inner = self.inner.write();
        if inner.by_source.contains_key(&input.source) {
            return Err(StoreError::DuplicateSource(input.source.clone()));
        }

        let redirect = Redirect::from_input(input);
        inner
            .by_source
            .insert(redirect.source.clone(), redirect.id);
        inner.by_id.insert(redirect.id, redirect.clone());
        Ok(redirect)
    }

    fn update(&self, id: &RedirectId, input: &RedirectInput) -> Result<Redirect, StoreError> {
        let mut inner = self.inner.write();

        match inner.by_source.get(&input.source) {
            Some(owner) if owner != id => {
                return Err(StoreError::DuplicateSource(input.source.clone()))
            }
            _ => {}
        }

        let mut redirect = inner
            .by_id
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))?;

        inner.by_source.remove(&redirect.source);
        redirect.apply(input);
        inner
            .by_source
            .insert(redirect.source.clone(), redirect.id);
        inner.by_id.insert(*id, redirect.clone());
        Ok(redirect)
    }

    fn delete(&self, id: &RedirectId) -> Result<Option<Redirect>, StoreError> {
        let mut inner = self.inner.write();
        let removed = inner.by_id.remove(id);
        if let Some(redirect) = &removed {
            inner.by_source.remove(&redirect.source);
        }
        Ok(removed)
    }
}
