//! Per-type mutability classification and the instance-level residual check.
//!
//! Classification is conservative and tri-valued: `Immutable` when no
//! instance of the type can ever be observed to change, `Mutable` when every
//! instance can, and `Maybe` when the answer depends on runtime state (a
//! field statically typed at a non-final type, a polymorphic slot). For
//! `Maybe` types the analyzer also compiles a *residual predicate*: the list
//! of field slots whose runtime values decide the question, evaluated by
//! [`MutabilityAnalyzer::is_mutable`] with a visited set cutting cycles.
//!
//! The classification is monotone in the field graph: any `Mutable` field
//! forces `Mutable`, any `Maybe` field forces at least `Maybe`.

use std::sync::Arc;

use strum::Display;

use crate::{
    introspect::Introspector,
    metadata::{
        token::TypeToken,
        typesystem::{wellknown, TypeKind},
    },
    derive::cache::SpecializationCache,
    value::{Value, VisitedSet},
    Result,
};

/// Static mutability classification of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Mutability {
    /// No instance can ever be observed to change
    Immutable,
    /// Every instance can change
    Mutable,
    /// Depends on runtime state; consult the residual predicate
    Maybe,
}

impl Mutability {
    /// Monotone join: `Mutable` dominates `Maybe` dominates `Immutable`
    #[must_use]
    pub fn join(self, other: Mutability) -> Mutability {
        match (self, other) {
            (Mutability::Mutable, _) | (_, Mutability::Mutable) => Mutability::Mutable,
            (Mutability::Maybe, _) | (_, Mutability::Maybe) => Mutability::Maybe,
            _ => Mutability::Immutable,
        }
    }
}

/// One residual field of a `Maybe` plan
#[derive(Debug)]
pub(crate) struct ResidualField {
    /// Slot index in the instance layout
    pub slot: usize,
    /// Statically declared field type
    pub field_type: TypeToken,
}

/// The compiled per-type mutability specialization
#[derive(Debug)]
pub(crate) struct MutabilityPlan {
    /// The static classification
    pub classification: Mutability,
    /// Residual fields, populated only when the classification is `Maybe`
    pub residual: Vec<ResidualField>,
}

impl MutabilityPlan {
    fn constant(classification: Mutability) -> Self {
        MutabilityPlan {
            classification,
            residual: Vec::new(),
        }
    }
}

/// Derives and caches mutability specializations
pub(crate) struct MutabilityAnalyzer {
    /// Metadata queries
    introspector: Arc<Introspector>,
    /// Per-type plans plus runtime dispatch table
    cache: SpecializationCache<MutabilityPlan>,
}

impl MutabilityAnalyzer {
    /// Create an analyzer over the given introspector
    pub(crate) fn new(introspector: Arc<Introspector>) -> Self {
        MutabilityAnalyzer {
            introspector,
            cache: SpecializationCache::new(),
        }
    }

    /// The static classification of a type
    pub(crate) fn classify(&self, token: TypeToken) -> Mutability {
        self.plan(token).classification
    }

    /// The compiled plan for a type, synthesized at first request
    pub(crate) fn plan(&self, token: TypeToken) -> Arc<MutabilityPlan> {
        if let Some(plan) = self.cache.get(token) {
            return plan;
        }
        let mut in_progress = Vec::new();
        self.plan_with(token, &mut in_progress)
    }

    /// Classification threading the in-progress stack. Re-entering a type
    /// currently being classified yields a provisional `Maybe`, which keeps
    /// the derivation terminating on mutually recursive graphs while the
    /// instance-level check stays exact.
    fn classify_with(&self, token: TypeToken, in_progress: &mut Vec<TypeToken>) -> Mutability {
        if let Some(plan) = self.cache.get(token) {
            return plan.classification;
        }
        if in_progress.contains(&token) {
            return Mutability::Maybe;
        }
        self.plan_with(token, in_progress).classification
    }

    fn plan_with(
        &self,
        token: TypeToken,
        in_progress: &mut Vec<TypeToken>,
    ) -> Arc<MutabilityPlan> {
        in_progress.push(token);
        let plan = self.derive(token, in_progress);
        in_progress.pop();
        // Lazy assignment: the publish happens only after derivation
        // completes; racing threads keep the first winner
        self.cache.publish(token, plan)
    }

    /// The derivation proper: whitelist, blacklist, then the transitive walk
    fn derive(&self, token: TypeToken, in_progress: &mut Vec<TypeToken>) -> MutabilityPlan {
        let registry = self.introspector.registry();
        let Some(ty) = registry.get(token) else {
            // Unknown metadata: nothing can be ruled out
            return MutabilityPlan::constant(Mutability::Mutable);
        };

        // Whitelist: primitives, enums, purity-attributed types, and the
        // reflection/expression families are immutable without inspection
        if ty.kind().is_primitive()
            || *ty.kind() == TypeKind::Enum
            || ty.pure
            || wellknown::is_metadata_type(token)
            || wellknown::is_expression_type(token)
        {
            return MutabilityPlan::constant(Mutability::Immutable);
        }

        // Blacklist: arrays and function values are always mutable
        match ty.kind() {
            TypeKind::Array | TypeKind::Function | TypeKind::Pointer | TypeKind::ByRef => {
                return MutabilityPlan::constant(Mutability::Mutable);
            }
            // Nullable-of-U inherits the mutability of U; the instance check
            // dispatches on the unwrapped runtime type
            TypeKind::Nullable => {
                let classification = ty
                    .element()
                    .map_or(Mutability::Mutable, |element| {
                        self.classify_with(element, in_progress)
                    });
                return MutabilityPlan::constant(classification);
            }
            _ => {}
        }

        // Transitive walk. Non-final types may be subclassed with mutable
        // state, so they start at Maybe.
        let mut result = if ty.is_sealed() {
            Mutability::Immutable
        } else {
            Mutability::Maybe
        };
        let mut residual = Vec::new();

        // A writable field only stays benign when nothing in the method
        // surface of the whole ancestry could flip it
        let all_pure = registry
            .ancestry(token)
            .iter()
            .all(|ancestor| self.introspector.all_methods_pure(ancestor.token));

        for (slot, field) in self.introspector.fields_of(token).iter().enumerate() {
            if !field.is_init_only() && (field.is_public() || !all_pure) {
                return MutabilityPlan::constant(Mutability::Mutable);
            }
            match self.classify_with(field.field_type, in_progress) {
                Mutability::Mutable => {
                    return MutabilityPlan::constant(Mutability::Mutable);
                }
                Mutability::Maybe => {
                    result = result.join(Mutability::Maybe);
                    residual.push(ResidualField {
                        slot,
                        field_type: field.field_type,
                    });
                }
                Mutability::Immutable => {}
            }
        }

        if result == Mutability::Maybe {
            MutabilityPlan {
                classification: Mutability::Maybe,
                residual,
            }
        } else {
            MutabilityPlan::constant(result)
        }
    }

    /// Instance-level mutability check.
    ///
    /// Total for every classification: constant for `Immutable`/`Mutable`
    /// types, residual evaluation with runtime dispatch for `Maybe`.
    pub(crate) fn is_mutable(&self, token: TypeToken, value: &Value) -> Result<bool> {
        let mut visited = VisitedSet::new();
        self.is_mutable_inner(token, value, &mut visited)
    }

    fn is_mutable_inner(
        &self,
        token: TypeToken,
        value: &Value,
        visited: &mut VisitedSet,
    ) -> Result<bool> {
        match self.classify(token) {
            Mutability::Immutable => Ok(false),
            Mutability::Mutable => Ok(true),
            Mutability::Maybe => {
                if value.is_null() {
                    return Ok(false);
                }
                let Some(runtime) = value.type_token() else {
                    return Ok(false);
                };
                if runtime == token {
                    self.run_residual(token, value, visited)
                } else {
                    // Fetch or synthesize the downcast thunk for the
                    // concrete runtime type, memoized per type
                    let plan = self.dispatch_plan(runtime)?;
                    match plan.classification {
                        Mutability::Immutable => Ok(false),
                        Mutability::Mutable => Ok(true),
                        Mutability::Maybe => self.run_residual(runtime, value, visited),
                    }
                }
            }
        }
    }

    fn run_residual(
        &self,
        token: TypeToken,
        value: &Value,
        visited: &mut VisitedSet,
    ) -> Result<bool> {
        // Value types are never tracked; they have no identity
        if !self.introspector.is_value_type(token) && !visited.insert(value) {
            return Ok(false);
        }
        let Value::Object(object) = value else {
            return Ok(false);
        };
        let plan = self.plan(token);
        for field in &plan.residual {
            if self.is_mutable_inner(field.field_type, &object.get(field.slot), visited)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Memoized dispatch plan for a concrete runtime type
    fn dispatch_plan(&self, runtime: TypeToken) -> Result<Arc<MutabilityPlan>> {
        if let Some(plan) = self.cache.get_dispatch(runtime) {
            return Ok(plan);
        }
        if self.introspector.registry().get(runtime).is_none() {
            return Err(crate::Error::DispatchMissing {
                type_name: format!("{runtime}"),
            });
        }
        let plan = self.plan(runtime);
        Ok(self.cache.publish_dispatch(runtime, plan))
    }
}
