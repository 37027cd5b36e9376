//! Process-wide specialization caches.
//!
//! Each derivation keeps one cache mapping type identity to the compiled
//! per-type plan, plus a secondary table mapping concrete runtime subtypes
//! to their dispatch plans. Insertion is publish-safe: a plan installed by
//! one thread is either visible in its entirety to all others or not at
//! all. Duplicate synthesis under races is tolerated; the first insertion
//! wins and later ones are discarded. Plans are immutable once installed
//! and only the explicit override operations replace them.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::metadata::token::TypeToken;

/// One derivation's cache: specialized plans keyed by static type, dispatch
/// plans keyed by concrete runtime type
pub(crate) struct SpecializationCache<P> {
    /// Compiled plans by the type they were synthesized for
    specialized: SkipMap<TypeToken, Arc<P>>,
    /// Downcast-and-delegate plans by concrete runtime type
    dispatch: DashMap<TypeToken, Arc<P>>,
}

impl<P: Send + Sync + 'static> SpecializationCache<P> {
    /// Create an empty cache
    pub(crate) fn new() -> Self {
        SpecializationCache {
            specialized: SkipMap::new(),
            dispatch: DashMap::new(),
        }
    }

    /// Look up the installed plan for a type
    pub(crate) fn get(&self, token: TypeToken) -> Option<Arc<P>> {
        self.specialized
            .get(&token)
            .map(|entry| entry.value().clone())
    }

    /// Install a plan unless one is already present; returns the winner.
    ///
    /// The assignment is deliberately separate from synthesis: plans are
    /// published only after construction completes, so mutually recursive
    /// types can synthesize against each other without deadlock.
    pub(crate) fn publish(&self, token: TypeToken, plan: P) -> Arc<P> {
        self.specialized
            .get_or_insert(token, Arc::new(plan))
            .value()
            .clone()
    }

    /// Replace the plan for a type, last write wins. Used only by the
    /// explicit override operations.
    pub(crate) fn replace(&self, token: TypeToken, plan: P) {
        self.specialized.insert(token, Arc::new(plan));
        self.dispatch.remove(&token);
    }

    /// Look up the dispatch plan for a concrete runtime type
    pub(crate) fn get_dispatch(&self, runtime: TypeToken) -> Option<Arc<P>> {
        self.dispatch.get(&runtime).map(|entry| entry.value().clone())
    }

    /// Install a dispatch plan unless one is already present; returns the
    /// winner
    pub(crate) fn publish_dispatch(&self, runtime: TypeToken, plan: Arc<P>) -> Arc<P> {
        self.dispatch.entry(runtime).or_insert(plan).value().clone()
    }
}
