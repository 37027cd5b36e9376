//! Per-type deep-copy walkers.
//!
//! Each type gets a [`CopyPlan`] synthesized at first use and interpreted at
//! call time. The plan captures everything decided statically: whether the
//! type is passed through unchanged, walked element-wise, copied by a
//! registered hook, or reconstructed field by field with a validated
//! constructor binding for its read-only fields. The cache assignment
//! happens only after synthesis completes, so mutually recursive types
//! derive without infinite regress.
//!
//! # Sharing and cycles
//!
//! A freshly allocated shell is registered in the per-call [`RefMap`]
//! *before* its children are copied. Any later path reaching the same
//! original resolves to that single copy, which preserves aliasing and
//! terminates cyclic graphs. Read-only fields do not break this: the
//! constructor binding is validated at synthesis time, while the values
//! flow into the already-registered shell afterwards.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    derive::{
        cache::SpecializationCache,
        construct::{bind_best_fit, CtorBinding, InitializerEntry},
        mutability::{Mutability, MutabilityAnalyzer},
    },
    introspect::Introspector,
    metadata::{
        token::TypeToken,
        typesystem::{wellknown, TypeKind, TypeRc},
    },
    value::{ArrayInstance, FunctionInstance, ObjectInstance, RefMap, Value},
    Result,
};

/// A client-supplied copy walker: receives the original and the per-call
/// reference map, returns the copy
pub type CopyHook = Arc<dyn Fn(&Value, &mut RefMap) -> Result<Value> + Send + Sync>;

/// A client-supplied replacement for zero-argument construction
pub type CreateHook = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// Built-in shapes with hand-written walkers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WellKnownShape {
    /// Growable list: slots are the elements
    List,
    /// Two-slot key/value aggregate with value semantics
    KeyValuePair,
    /// Read-only wrapper around one inner collection
    ReadOnly,
}

/// One field step of a synthesized walker
#[derive(Debug)]
pub(crate) struct FieldCopy {
    /// Slot index in the instance layout
    pub slot: usize,
    /// Statically declared field type
    pub field_type: TypeToken,
    /// Index into the initializer entries when the field routes through the
    /// constructor, None when it is directly assignable
    pub initializer: Option<usize>,
}

/// The synthesized constructor-driven walker
#[derive(Debug)]
pub(crate) struct FieldsPlan {
    /// Instances have value semantics (no identity, no refs registration)
    pub value_type: bool,
    /// One step per inherited instance field, slot order
    pub fields: Vec<FieldCopy>,
    /// The read-only initializer entries, empty when all fields assign
    pub initializers: Vec<InitializerEntry>,
    /// The validated constructor binding, present iff initializers exist
    pub binding: Option<CtorBinding>,
}

/// The compiled per-type copy specialization
pub(crate) enum CopyPlan {
    /// Immutable value: returned unchanged
    Identity,
    /// Array: element-wise walk
    Array,
    /// Function value: closure reconstructed around a copied capture
    Function,
    /// Client-registered walker (self-copy opt-in or override)
    Hook(CopyHook),
    /// Built-in collection shape
    WellKnown(WellKnownShape),
    /// Constructor-driven field walk
    Fields(FieldsPlan),
    /// Interface or abstract static type: the call-time dispatcher downcasts
    Dispatch,
}

impl std::fmt::Debug for CopyPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyPlan::Identity => write!(f, "Identity"),
            CopyPlan::Array => write!(f, "Array"),
            CopyPlan::Function => write!(f, "Function"),
            CopyPlan::Hook(_) => write!(f, "Hook"),
            CopyPlan::WellKnown(shape) => write!(f, "WellKnown({shape:?})"),
            CopyPlan::Fields(plan) => write!(f, "Fields({} fields)", plan.fields.len()),
            CopyPlan::Dispatch => write!(f, "Dispatch"),
        }
    }
}

/// Derives and caches deep-copy specializations
pub(crate) struct DeepCopier {
    /// Metadata queries
    introspector: Arc<Introspector>,
    /// Static mutability results, consulted to skip immutable subgraphs
    mutability: Arc<MutabilityAnalyzer>,
    /// Per-type plans plus runtime dispatch table
    cache: SpecializationCache<CopyPlan>,
    /// Self-copy hooks for types implementing the copier-capable interface
    self_hooks: DashMap<TypeToken, CopyHook>,
    /// Zero-argument construction overrides
    create_overrides: DashMap<TypeToken, CreateHook>,
}

impl DeepCopier {
    /// Create a copier over the given introspector and mutability analyzer
    pub(crate) fn new(introspector: Arc<Introspector>, mutability: Arc<MutabilityAnalyzer>) -> Self {
        DeepCopier {
            introspector,
            mutability,
            cache: SpecializationCache::new(),
            self_hooks: DashMap::new(),
            create_overrides: DashMap::new(),
        }
    }

    /// Top-level copy: threads a fresh reference map
    pub(crate) fn copy(&self, token: TypeToken, value: &Value) -> Result<Value> {
        let mut refs = RefMap::new();
        self.copy_with(token, value, &mut refs)
    }

    /// Recursive copy form threading the caller's reference map
    pub(crate) fn copy_with(
        &self,
        token: TypeToken,
        value: &Value,
        refs: &mut RefMap,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if self.mutability.classify(token) == Mutability::Immutable {
            // Identity-preserving: immutable values are never re-allocated
            return Ok(value.clone());
        }

        // A nullable static type delegates to its element; the value is
        // already the unwrapped representation
        let target = match self.introspector.registry().get(token) {
            Some(ty) if *ty.kind() == TypeKind::Nullable => {
                ty.element().unwrap_or(token)
            }
            _ => token,
        };

        let runtime = value
            .type_token()
            .unwrap_or(target);

        if let Some(existing) = refs.get(value) {
            return Ok(existing);
        }

        if runtime == target {
            let plan = self.plan(target)?;
            self.run_plan(&plan, target, value, refs)
        } else {
            if !self.introspector.subtypes(runtime, target) {
                return Err(self.mismatch(target, runtime));
            }
            // Strict subtype: fetch or synthesize the downcast thunk for
            // the concrete runtime type, memoized per type
            let plan = self.dispatch_plan(runtime)?;
            self.run_plan(&plan, runtime, value, refs)
        }
    }

    /// Replace the copier for a type; effects persist for the rest of the
    /// process
    pub(crate) fn override_copier(&self, token: TypeToken, hook: CopyHook) {
        self.cache.replace(token, CopyPlan::Hook(hook));
    }

    /// Replace the zero-argument construction of a type
    pub(crate) fn override_create(&self, token: TypeToken, hook: CreateHook) {
        self.create_overrides.insert(token, hook);
    }

    /// Register the copy implementation of a copier-capable type. Consulted
    /// at synthesis for types implementing the opt-in interface.
    pub(crate) fn register_self_copier(&self, token: TypeToken, hook: CopyHook) {
        self.self_hooks.insert(token, hook);
    }

    fn mismatch(&self, expected: TypeToken, found: TypeToken) -> crate::Error {
        let name = |token: TypeToken| {
            self.introspector
                .registry()
                .get(token)
                .map_or_else(|| format!("{token}"), |ty| ty.fullname())
        };
        crate::Error::TypeMismatch {
            expected: name(expected),
            found: name(found),
        }
    }

    /// The compiled plan for a type, synthesized at first request. Failures
    /// propagate to the caller and leave the cache slot empty so a later
    /// override can still populate it.
    fn plan(&self, token: TypeToken) -> Result<Arc<CopyPlan>> {
        if let Some(plan) = self.cache.get(token) {
            return Ok(plan);
        }
        let plan = self.synthesize(token)?;
        // Lazy assignment after synthesis completes
        Ok(self.cache.publish(token, plan))
    }

    /// Memoized dispatch plan for a concrete runtime type
    fn dispatch_plan(&self, runtime: TypeToken) -> Result<Arc<CopyPlan>> {
        if let Some(plan) = self.cache.get_dispatch(runtime) {
            return Ok(plan);
        }
        let plan = self.plan(runtime)?;
        Ok(self.cache.publish_dispatch(runtime, plan))
    }

    /// Per-type derivation
    fn synthesize(&self, token: TypeToken) -> Result<CopyPlan> {
        let ty = self.introspector.registry().resolve(token)?;

        if self.mutability.classify(token) == Mutability::Immutable {
            return Ok(CopyPlan::Identity);
        }

        if ty.is_abstract() {
            return Ok(CopyPlan::Dispatch);
        }

        // Self-copy capability binds before structural synthesis
        if self.introspector.is_self_copying(token) {
            return match self.self_hooks.get(&token).map(|entry| entry.value().clone()) {
                Some(hook) => Ok(CopyPlan::Hook(hook)),
                None => Err(synthesis_error!(
                    "'{}' implements the copier-capable interface but no copy hook is registered",
                    ty.fullname()
                )),
            };
        }

        match ty.kind() {
            TypeKind::Array => Ok(CopyPlan::Array),
            TypeKind::Function => Ok(CopyPlan::Function),
            TypeKind::Nullable => Ok(CopyPlan::Dispatch),
            TypeKind::GenericInstance => match ty.definition() {
                Some(wellknown::LIST) => Ok(CopyPlan::WellKnown(WellKnownShape::List)),
                Some(wellknown::KEY_VALUE_PAIR) => {
                    Ok(CopyPlan::WellKnown(WellKnownShape::KeyValuePair))
                }
                Some(wellknown::READ_ONLY_LIST) => {
                    Ok(CopyPlan::WellKnown(WellKnownShape::ReadOnly))
                }
                _ => self.synthesize_fields(&ty),
            },
            _ => self.synthesize_fields(&ty),
        }
    }

    /// Synthesize the constructor-driven field walker
    fn synthesize_fields(&self, ty: &TypeRc) -> Result<CopyPlan> {
        let token = ty.token;
        let constructible = self.introspector.has_no_arg_constructor(token)
            || self.create_overrides.contains_key(&token);

        let mut fields = Vec::new();
        let mut initializers = Vec::new();
        for (slot, field) in self.introspector.fields_of(token).iter().enumerate() {
            let read_only = field.is_init_only() || !constructible;
            let initializer = if read_only {
                let key = self
                    .introspector
                    .normalize_field_name(field)
                    .to_lowercase();
                initializers.push(InitializerEntry {
                    key,
                    field_type: field.field_type,
                    slot,
                });
                Some(initializers.len() - 1)
            } else {
                None
            };
            fields.push(FieldCopy {
                slot,
                field_type: field.field_type,
                initializer,
            });
        }

        let binding = if initializers.is_empty() {
            None
        } else {
            Some(bind_best_fit(
                self.introspector.registry(),
                ty,
                &initializers,
            )?)
        };

        Ok(CopyPlan::Fields(FieldsPlan {
            value_type: self.introspector.is_value_type(token),
            fields,
            initializers,
            binding,
        }))
    }

    /// Interpret one plan over one value
    fn run_plan(
        &self,
        plan: &CopyPlan,
        token: TypeToken,
        value: &Value,
        refs: &mut RefMap,
    ) -> Result<Value> {
        match plan {
            CopyPlan::Identity => Ok(value.clone()),
            CopyPlan::Array => self.run_array(token, value, refs),
            CopyPlan::Function => self.run_function(token, value, refs),
            CopyPlan::Hook(hook) => hook(value, refs),
            CopyPlan::WellKnown(shape) => self.run_well_known(*shape, token, value, refs),
            CopyPlan::Fields(fields_plan) => self.run_fields(fields_plan, token, value, refs),
            CopyPlan::Dispatch => Err(synthesis_error!(
                "no concrete copier for abstract type {}",
                token
            )),
        }
    }

    fn run_array(&self, token: TypeToken, value: &Value, refs: &mut RefMap) -> Result<Value> {
        let Value::Array(array) = value else {
            return Err(self.mismatch(token, value.type_token().unwrap_or(token)));
        };
        let length = array.len();
        let copy = ArrayInstance::new(array.array_type(), array.element_type(), length);
        let copy_value = Value::Array(copy.clone());
        // Register before children so aliases and cycles resolve to the copy
        refs.insert(value, copy_value.clone());
        for index in 0..length {
            let element = self.copy_with(array.element_type(), &array.get(index), refs)?;
            copy.set(index, element);
        }
        Ok(copy_value)
    }

    fn run_function(&self, token: TypeToken, value: &Value, refs: &mut RefMap) -> Result<Value> {
        let Value::Function(function) = value else {
            return Err(self.mismatch(token, value.type_token().unwrap_or(token)));
        };
        // Reconstruct the closure around a copied capture; the shell is
        // registered first so a self-capturing closure closes over its copy
        let copy = FunctionInstance::new(function.function_type(), Value::Null);
        let copy_value = Value::Function(copy.clone());
        refs.insert(value, copy_value.clone());
        let capture = function.capture();
        let copied_capture = match capture.type_token() {
            Some(capture_type) => self.copy_with(capture_type, &capture, refs)?,
            None => Value::Null,
        };
        copy.set_capture(copied_capture);
        Ok(copy_value)
    }

    fn run_well_known(
        &self,
        shape: WellKnownShape,
        token: TypeToken,
        value: &Value,
        refs: &mut RefMap,
    ) -> Result<Value> {
        let Value::Object(object) = value else {
            return Err(self.mismatch(token, value.type_token().unwrap_or(token)));
        };
        let ty = self.introspector.registry().resolve(token)?;
        let arg = |index: usize| {
            ty.generic_args
                .get(index)
                .copied()
                .unwrap_or(wellknown::OBJECT)
        };

        match shape {
            WellKnownShape::List => {
                let length = object.slot_count();
                let copy = ObjectInstance::new(object.runtime_type(), length);
                let copy_value = Value::Object(copy.clone());
                refs.insert(value, copy_value.clone());
                for index in 0..length {
                    let element = self.copy_with(arg(0), &object.get(index), refs)?;
                    copy.set(index, element);
                }
                Ok(copy_value)
            }
            WellKnownShape::KeyValuePair => {
                // Value semantics: no identity to register
                let key = self.copy_with(arg(0), &object.get(0), refs)?;
                let val = self.copy_with(arg(1), &object.get(1), refs)?;
                Ok(Value::Object(ObjectInstance::with_slots(
                    object.runtime_type(),
                    vec![key, val],
                )))
            }
            WellKnownShape::ReadOnly => {
                let copy = ObjectInstance::new(object.runtime_type(), 1);
                let copy_value = Value::Object(copy.clone());
                refs.insert(value, copy_value.clone());
                let inner = object.get(0);
                let copied_inner = match inner.type_token() {
                    Some(inner_type) => self.copy_with(inner_type, &inner, refs)?,
                    None => Value::Null,
                };
                copy.set(0, copied_inner);
                Ok(copy_value)
            }
        }
    }

    fn run_fields(
        &self,
        plan: &FieldsPlan,
        token: TypeToken,
        value: &Value,
        refs: &mut RefMap,
    ) -> Result<Value> {
        let Value::Object(object) = value else {
            return Err(self.mismatch(token, value.type_token().unwrap_or(token)));
        };

        let create = self
            .create_overrides
            .get(&token)
            .map(|entry| entry.value().clone());
        let shell = match create {
            Some(hook) => match hook()? {
                Value::Object(created) => created,
                other => {
                    return Err(self.mismatch(token, other.type_token().unwrap_or(token)));
                }
            },
            None => ObjectInstance::new(token, plan.fields.len()),
        };
        let shell_value = Value::Object(shell.clone());

        if !plan.value_type {
            // Child-to-parent back-references must resolve to the copy
            refs.insert(value, shell_value.clone());
        }

        let mut staged: Vec<Option<Value>> = vec![None; plan.initializers.len()];
        for field in &plan.fields {
            let copied = self.copy_with(field.field_type, &object.get(field.slot), refs)?;
            match field.initializer {
                Some(index) => staged[index] = Some(copied),
                None => shell.set(field.slot, copied),
            }
        }

        // Constructor invocation: the binding fixed at synthesis decides
        // which entries flow through parameters; the excused self-reference
        // (already resolved through the reference map) is written afterwards
        if let Some(binding) = &plan.binding {
            for &source in &binding.param_sources {
                if let Some(copied) = staged[source].take() {
                    shell.set(plan.initializers[source].slot, copied);
                }
            }
            if let Some(self_reference) = binding.self_reference {
                if let Some(copied) = staged[self_reference].take() {
                    shell.set(plan.initializers[self_reference].slot, copied);
                }
            }
        }

        Ok(shell_value)
    }
}
