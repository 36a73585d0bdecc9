// Loop detector
//
// Graph-reachability primitive over the redirect edge set: does following
// destinations transitively from a candidate edge lead back to its origin?
//
// The walk is iterative with an explicit work list and a visited-URL set, so
// work is bounded by the number of rules regardless of chain length, and the
// traversal terminates even if the existing data already contains a cycle
// unrelated to the candidate. A visited URL is never re-expanded.

use std::collections::HashSet;

use crate::redirect::RedirectId;
use crate::store::{RedirectStore, StoreError};

/// Walk the edge set from `candidate_destination`, expanding each URL through
/// `outgoing` (the destinations of all rules whose source equals that URL).
/// Returns true iff the walk reaches `origin_source`.
///
/// `origin_source == candidate_destination` is an immediate loop. The visited
/// set is seeded with the candidate destination.
pub(crate) fn traverse<E, F>(
    origin_source: &str,
    candidate_destination: &str,
    mut outgoing: F,
) -> Result<bool, E>
where
    F: FnMut(&str) -> Result<Vec<String>, E>,
{
    if origin_source == candidate_destination {
        return Ok(true);
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(candidate_destination.to_string());
    let mut work = vec![candidate_destination.to_string()];

    while let Some(current) = work.pop() {
        for destination in outgoing(&current)? {
            if destination == origin_source {
                return Ok(true);
            }
            if visited.insert(destination.clone()) {
                work.push(destination);
            }
        }
    }

    Ok(false)
}

/// Would persisting the candidate edge `origin_source -> candidate_destination`
/// close a cycle over the persisted rule set?
///
/// `exclude_id` drops one rule from consideration, used when validating an
/// update of an existing rule against itself. Pure: reads the store, writes
/// nothing.
pub fn would_loop(
    store: &dyn RedirectStore,
    origin_source: &str,
    candidate_destination: &str,
    exclude_id: Option<&RedirectId>,
) -> Result<bool, StoreError> {
    traverse(origin_source, candidate_destination, |url| {
        Ok(store
            .find_by_source(url, exclude_id)?
            .into_iter()
            .map(|r| r.destination)
            .collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::RedirectInput;
    use crate::store::MemoryStore;

    fn seeded(rules: &[(&str, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (source, destination) in rules {
            store
                .create(&RedirectInput::new(*source, *destination, false))
                .unwrap();
        }
        store
    }

    #[test]
    fn same_source_and_destination_is_an_immediate_loop() {
        let store = seeded(&[]);
        assert!(would_loop(&store, "/a", "/a", None).unwrap());
    }

    #[test]
    fn direct_back_edge_is_a_loop() {
        let store = seeded(&[("/b", "/a")]);
        assert!(would_loop(&store, "/a", "/b", None).unwrap());
    }

    #[test]
    fn two_hop_chain_closing_back_is_a_loop() {
        // Candidate /c -> /a closes a -> b -> c -> a.
        let store = seeded(&[("/a", "/b"), ("/b", "/c")]);
        assert!(would_loop(&store, "/c", "/a", None).unwrap());
    }

    #[test]
    fn chain_that_does_not_return_is_not_a_loop() {
        // Candidate /c -> /a yields c -> a -> b, a plain chain.
        let store = seeded(&[("/a", "/b")]);
        assert!(!would_loop(&store, "/c", "/a", None).unwrap());
    }

    #[test]
    fn excluded_rule_does_not_count() {
        let store = seeded(&[("/b", "/a")]);
        let rules = store.find_by_source("/b", None).unwrap();
        assert!(!would_loop(&store, "/a", "/b", Some(&rules[0].id)).unwrap());
    }

    #[test]
    fn terminates_over_a_pre_existing_unrelated_cycle() {
        // /x and /y already form a cycle the candidate never touches; the
        // visited set must stop the walk from spinning on it.
        let store = MemoryStore::new();
        store
            .create(&RedirectInput::new("/x", "/y", false))
            .unwrap();
        // Bypass would-be validation: the store itself allows this edge.
        store
            .create(&RedirectInput::new("/y", "/x", false))
            .unwrap();
        store
            .create(&RedirectInput::new("/a", "/x", false))
            .unwrap();

        assert!(!would_loop(&store, "/q", "/a", None).unwrap());
    }

    #[test]
    fn store_errors_propagate() {
        struct Failing;
        impl RedirectStore for Failing {
            fn find_one(
                &self,
                _: &RedirectId,
            ) -> Result<Option<crate::redirect::Redirect>, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            fn find_by_source(
                &self,
                _: &str,
                _: Option<&RedirectId>,
            ) -> Result<Vec<crate::redirect::Redirect>, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            fn find_all(
                &self,
                _: &crate::store::RedirectQuery,
            ) -> Result<crate::store::RedirectPage, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            fn create(
                &self,
                _: &RedirectInput,
            ) -> Result<crate::redirect::Redirect, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            fn update(
                &self,
                _: &RedirectId,
                _: &RedirectInput,
            ) -> Result<crate::redirect::Redirect, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            fn delete(
                &self,
                _: &RedirectId,
            ) -> Result<Option<crate::redirect::Redirect>, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
        }

        let err = would_loop(&Failing, "/a", "/b", None).unwrap_err();
        assert_eq!(err, StoreError::Backend("down".to_string()));
    }
}
