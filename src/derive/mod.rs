//! The derivation pipeline and its public surface.
//!
//! An [`Engine`] owns one specialization cache per derivation (mutability,
//! cycles, copy, equality) over one shared [`crate::TypeRegistry`]. Each
//! specialization is synthesized at the first request for its type and
//! reused for the remaining lifetime of the process; concurrent first
//! requests tolerate duplicate synthesis with a single winner. The deep
//! copier consults the mutability analyzer to pass immutable subgraphs
//! through untouched, and both instance-level walkers dispatch on concrete
//! runtime subtypes through memoized downcast thunks.
//!
//! # Examples
//!
//! ```rust
//! use structwalk::{Engine, TypeBuilder, TypeRegistry, Value, Mutability, Cycles, wellknown};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::new()?);
//! let engine = Engine::new(registry.clone());
//!
//! assert_eq!(engine.mutability(wellknown::I4), Mutability::Immutable);
//! assert_eq!(engine.cycles(wellknown::STRING), Cycles::No);
//!
//! let copied = engine.copy(wellknown::I4, &Value::from_i32(42))?;
//! assert_eq!(copied, Value::from_i32(42));
//! # Ok::<(), structwalk::Error>(())
//! ```

pub(crate) mod cache;
pub(crate) mod construct;
pub(crate) mod copy;
pub(crate) mod cycles;
pub(crate) mod equality;
pub(crate) mod mutability;

pub use construct::Constructor;
pub use copy::{CopyHook, CreateHook};
pub use cycles::Cycles;
pub use equality::EqualityHook;
pub use mutability::Mutability;

use std::sync::Arc;

use crate::{
    introspect::Introspector,
    metadata::{token::TypeToken, typesystem::TypeRegistry},
    value::{RefMap, Value},
    Result,
};

use copy::DeepCopier;
use cycles::CycleDetector;
use equality::StructuralEquality;
use mutability::MutabilityAnalyzer;

/// The type-directed structural induction engine.
///
/// One engine serves one descriptor graph. All operations are safe under
/// concurrent access from multiple threads; the per-call bookkeeping
/// (reference maps, visited sets) is never shared.
pub struct Engine {
    /// The descriptor graph this engine derives over
    registry: Arc<TypeRegistry>,
    /// Metadata query facade shared by the derivations
    introspector: Arc<Introspector>,
    /// Mutability classification and residual predicates
    mutability: Arc<MutabilityAnalyzer>,
    /// Structural acyclicity analysis
    cycles: CycleDetector,
    /// Deep-copy walkers
    copier: DeepCopier,
    /// Structural-equality walkers and platform-standard equality
    equality: StructuralEquality,
}

impl Engine {
    /// Create an engine over the given registry
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        let introspector = Arc::new(Introspector::new(registry.clone()));
        let mutability = Arc::new(MutabilityAnalyzer::new(introspector.clone()));
        Engine {
            registry,
            cycles: CycleDetector::new(introspector.clone()),
            copier: DeepCopier::new(introspector.clone(), mutability.clone()),
            equality: StructuralEquality::new(introspector.clone()),
            mutability,
            introspector,
        }
    }

    /// The registry this engine derives over
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The metadata query facade
    #[must_use]
    pub fn introspector(&self) -> &Arc<Introspector> {
        &self.introspector
    }

    /// The static mutability classification of a type
    #[must_use]
    pub fn mutability(&self, token: TypeToken) -> Mutability {
        self.mutability.classify(token)
    }

    /// The instance-level mutability check.
    ///
    /// Constant for `Immutable`/`Mutable` types; for `Maybe` types the
    /// residual predicate runs over the instance, dispatching on the
    /// concrete runtime type where it differs from the static one.
    ///
    /// # Errors
    /// Fails only when a runtime type has no descriptor, so no dispatch
    /// thunk can be synthesized for it.
    pub fn is_mutable(&self, token: TypeToken, value: &Value) -> Result<bool> {
        self.mutability.is_mutable(token, value)
    }

    /// The structural acyclicity classification of a type
    #[must_use]
    pub fn cycles(&self, token: TypeToken) -> Cycles {
        self.cycles.cycles(token)
    }

    /// Deep copy preserving sharing and cycles. Immutable values are
    /// returned unchanged.
    ///
    /// # Errors
    /// Fails when copy synthesis for a reachable type cannot absorb its
    /// read-only fields, or when a value's runtime type does not fit the
    /// requested static type.
    pub fn copy(&self, token: TypeToken, value: &Value) -> Result<Value> {
        self.copier.copy(token, value)
    }

    /// The recursive copy form threading an explicit reference map
    ///
    /// # Errors
    /// Same conditions as [`Engine::copy`].
    pub fn copy_with(
        &self,
        token: TypeToken,
        value: &Value,
        refs: &mut RefMap,
    ) -> Result<Value> {
        self.copier.copy_with(token, value, refs)
    }

    /// Structural equality on the `T`-visible shape; terminates on cyclic
    /// graphs and never fails
    #[must_use]
    pub fn structural_equals(&self, token: TypeToken, a: &Value, b: &Value) -> bool {
        self.equality.structural_equals(token, a, b)
    }

    /// Replace the copier of a type; effects persist for the rest of the
    /// process. Writers do not synchronize against concurrent readers, so
    /// overrides are expected during startup.
    pub fn override_copier(&self, token: TypeToken, hook: CopyHook) {
        self.copier.override_copier(token, hook);
    }

    /// Replace the zero-argument construction of a type
    pub fn override_create(&self, token: TypeToken, hook: CreateHook) {
        self.copier.override_create(token, hook);
    }

    /// Register the copy implementation of a type that opts into the
    /// copier-capable interface
    pub fn register_self_copier(&self, token: TypeToken, hook: CopyHook) {
        self.copier.register_self_copier(token, hook);
    }

    /// Register the open instance equality method of a reference type
    /// implementing the equatable interface on itself; preferred by
    /// [`Engine::default_equals`].
    ///
    /// # Errors
    /// Fails when the type is not a reference type implementing the
    /// equatable contract.
    pub fn register_equatable(&self, token: TypeToken, hook: EqualityHook) -> Result<()> {
        self.equality.register_equatable(token, hook)
    }

    /// Platform-standard equality on two values of a type
    #[must_use]
    pub fn default_equals(&self, token: TypeToken, a: &Value, b: &Value) -> bool {
        self.equality.default_equals(token, a, b)
    }

    /// Platform-standard hash consistent with [`Engine::default_equals`]
    #[must_use]
    pub fn default_hash(&self, token: TypeToken, value: &Value) -> u64 {
        self.equality.default_hash(token, value)
    }

    /// Return a callable invoking the constructor of a type that matches
    /// the given parameter signature. Array types get a single-length
    /// pseudo-constructor.
    ///
    /// # Errors
    /// Fails when the type is unknown or no declared constructor matches.
    pub fn constructor(&self, token: TypeToken, params: &[TypeToken]) -> Result<Constructor> {
        construct::invoker(&self.introspector, token, params)
    }
}
