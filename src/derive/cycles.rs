//! Per-type structural acyclicity analysis.
//!
//! The question answered here is about *declared types*, not about runtime
//! instances: can some path through declared fields and element types lead
//! back to a type already on the path, or to a supertype of one? The
//! supertype rule captures polymorphic fields: a field typed at the platform
//! root, or at any base of the current type, could be filled with the
//! current type at runtime.
//!
//! The result feeds the walkers' fast paths: an acyclic type never needs
//! the reference map or the visited-pair set for cycle breaking.

use std::sync::Arc;

use dashmap::DashMap;
use strum::Display;

use crate::{
    introspect::Introspector,
    metadata::{token::TypeToken, typesystem::TypeKind},
};

/// Structural acyclicity classification of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Cycles {
    /// No path through the declared field graph can revisit a type
    No,
    /// The declared types permit cyclic instances
    Yes,
}

/// Derives and caches acyclicity results
pub(crate) struct CycleDetector {
    /// Metadata queries
    introspector: Arc<Introspector>,
    /// Memoized per-type results
    cache: DashMap<TypeToken, Cycles>,
}

impl CycleDetector {
    /// Create a detector over the given introspector
    pub(crate) fn new(introspector: Arc<Introspector>) -> Self {
        CycleDetector {
            introspector,
            cache: DashMap::new(),
        }
    }

    /// The acyclicity classification of a type, derived at first request.
    ///
    /// Only the top-level result is memoized: intermediate answers depend on
    /// the ancestor stack (the supertype rule is relative to the path), so
    /// caching them would be unsound.
    pub(crate) fn cycles(&self, token: TypeToken) -> Cycles {
        if let Some(cached) = self.cache.get(&token) {
            return *cached;
        }
        let mut stack = Vec::new();
        let result = self.visit(token, &mut stack);
        *self.cache.entry(token).or_insert(result)
    }

    /// Depth-first walk over the field graph with the ancestor stack
    fn visit(&self, token: TypeToken, stack: &mut Vec<TypeToken>) -> Cycles {
        let registry = self.introspector.registry();
        let Some(ty) = registry.get(token) else {
            return Cycles::No;
        };

        // Primitives and enums terminate
        if ty.kind().is_primitive() || *ty.kind() == TypeKind::Enum {
            return Cycles::No;
        }

        // Entry matching an ancestor, or being a supertype of one, closes a
        // cycle. Any infinite path must repeat a type, so this check also
        // bounds the recursion.
        if stack
            .iter()
            .any(|ancestor| *ancestor == token || registry.is_assignable(*ancestor, token))
        {
            return Cycles::Yes;
        }

        stack.push(token);
        let result = if ty.kind().has_element() {
            ty.element()
                .map_or(Cycles::No, |element| self.visit(element, stack))
        } else {
            let mut result = Cycles::No;
            for field in self.introspector.fields_of(token) {
                if self.visit(field.field_type, stack) == Cycles::Yes {
                    result = Cycles::Yes;
                    break;
                }
            }
            result
        };
        stack.pop();
        result
    }
}
