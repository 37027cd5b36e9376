//! Constructor binding for read-only fields.
//!
//! When a type has init-only fields (or no zero-argument constructor at
//! all), the deep copier cannot assign the copied values into the new
//! instance; they must flow through a constructor. At synthesis time the
//! copier collects the affected fields into a *read-only initializer map*
//! (lowercased, normalized name to copied value) and this module selects
//! the one declared constructor able to absorb it.
//!
//! Selection is deterministic: each parameter binds by lowercased name
//! first, then to the first unused entry whose declared type is assignable
//! to the parameter type. A candidate survives only if every parameter is
//! bound *and* every initializer is consumed; a single unconsumed entry
//! typed at the declaring type itself is excused as the self-reference when
//! the constructor has fewer such parameters than the map has such entries.
//! Zero surviving candidates fail synthesis, and so do two or more: a
//! shorter constructor that would silently produce a partially initialized
//! copy is never chosen.

use std::sync::Arc;

use crate::{
    introspect::Introspector,
    metadata::{
        token::TypeToken,
        typesystem::{TypeDescriptor, TypeKind, TypeRegistry},
    },
    value::{ArrayInstance, ObjectInstance, Value},
    Result,
};

/// A bound constructor: takes the argument values, returns the new instance
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// One entry of the read-only initializer map, fixed at synthesis time
#[derive(Debug, Clone)]
pub(crate) struct InitializerEntry {
    /// Lowercased, normalized field name
    pub key: String,
    /// Statically declared field type
    pub field_type: TypeToken,
    /// Slot index the value is written to after construction
    pub slot: usize,
}

/// The selected constructor's parameter bindings
#[derive(Debug)]
pub(crate) struct CtorBinding {
    /// For each parameter, the index of the initializer entry bound to it
    pub param_sources: Vec<usize>,
    /// Initializer entry assumed to be the self-reference, if one was excused
    pub self_reference: Option<usize>,
}

/// Select the constructor that absorbs the read-only initializer map.
///
/// # Errors
/// [`crate::Error::NoBindableConstructor`] when no declared constructor
/// binds, [`crate::Error::AmbiguousConstructor`] when more than one does.
pub(crate) fn bind_best_fit(
    registry: &TypeRegistry,
    ty: &TypeDescriptor,
    entries: &[InitializerEntry],
) -> Result<CtorBinding> {
    let self_typed_entries = entries
        .iter()
        .filter(|entry| entry.field_type == ty.token)
        .count();

    let mut survivors: Vec<CtorBinding> = Vec::new();
    for (_, ctor) in ty.ctors.iter() {
        if let Some(binding) = try_bind(registry, ty, &ctor.params, entries, self_typed_entries) {
            survivors.push(binding);
        }
    }

    match survivors.len() {
        0 => Err(crate::Error::NoBindableConstructor {
            type_name: ty.fullname(),
            fields: entries
                .iter()
                .map(|entry| entry.key.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
        1 => Ok(survivors.into_iter().next().expect("one survivor")),
        _ => Err(crate::Error::AmbiguousConstructor {
            type_name: ty.fullname(),
        }),
    }
}

/// Return a callable that invokes the constructor of `target` matching the
/// given parameter signature.
///
/// Array types are treated as having a single-length pseudo-constructor:
/// the one argument is the length and the result is a null-filled array.
/// For aggregates, the matching declared constructor's parameters are
/// mapped to field slots by lowercased normalized name; arguments without
/// a matching field are dropped.
///
/// # Errors
/// Fails when the target is unknown or no declared constructor matches the
/// signature.
pub(crate) fn invoker(
    introspector: &Arc<Introspector>,
    target: TypeToken,
    params: &[TypeToken],
) -> Result<Constructor> {
    let registry = introspector.registry();
    let ty = registry.resolve(target)?;

    if *ty.kind() == TypeKind::Array {
        let element = ty.element().ok_or(crate::Error::TypeNotFound(target))?;
        if params.len() != 1 {
            return Err(synthesis_error!(
                "array pseudo-constructor of '{}' takes exactly one length argument",
                ty.fullname()
            ));
        }
        return Ok(Arc::new(move |args: Vec<Value>| {
            let length = args
                .first()
                .and_then(|v| v.as_prim())
                .and_then(|p| p.as_i64())
                .ok_or_else(|| synthesis_error!("array length must be an integer"))?;
            let length = usize::try_from(length)
                .map_err(|_| synthesis_error!("array length must be non-negative"))?;
            Ok(Value::Array(ArrayInstance::new(target, element, length)))
        }));
    }

    let fields = introspector.fields_of(target);
    let slot_of = |name: &str| -> Option<usize> {
        let wanted = name.to_lowercase();
        fields
            .iter()
            .position(|field| introspector.normalize_field_name(field).to_lowercase() == wanted)
    };

    for (_, ctor) in ty.ctors.iter() {
        if ctor.params.len() != params.len() {
            continue;
        }
        let signature_matches = ctor
            .params
            .iter()
            .zip(params.iter())
            .all(|(declared, given)| registry.is_assignable(*given, declared.param_type));
        if !signature_matches {
            continue;
        }

        let slots: Vec<Option<usize>> = ctor
            .params
            .iter()
            .map(|param| slot_of(&param.name))
            .collect();
        let slot_count = fields.len();
        return Ok(Arc::new(move |args: Vec<Value>| {
            let instance = ObjectInstance::new(target, slot_count);
            for (index, value) in args.into_iter().enumerate() {
                if let Some(Some(slot)) = slots.get(index) {
                    instance.set(*slot, value);
                }
            }
            Ok(Value::Object(instance))
        }));
    }

    Err(synthesis_error!(
        "no constructor of '{}' matches the requested signature",
        ty.fullname()
    ))
}

fn try_bind(
    registry: &TypeRegistry,
    ty: &TypeDescriptor,
    params: &[crate::metadata::typesystem::ParamDescriptor],
    entries: &[InitializerEntry],
    self_typed_entries: usize,
) -> Option<CtorBinding> {
    let mut used = vec![false; entries.len()];
    let mut param_sources = Vec::with_capacity(params.len());

    for param in params {
        let wanted = param.name.to_lowercase();
        // Name match first
        let by_name = entries
            .iter()
            .enumerate()
            .find(|(index, entry)| !used[*index] && entry.key == wanted);
        // Then first unused entry with an assignable type
        let source = by_name.or_else(|| {
            entries.iter().enumerate().find(|(index, entry)| {
                !used[*index] && registry.is_assignable(entry.field_type, param.param_type)
            })
        });
        match source {
            Some((index, _)) => {
                used[index] = true;
                param_sources.push(index);
            }
            None => return None,
        }
    }

    let unused: Vec<usize> = (0..entries.len()).filter(|i| !used[*i]).collect();
    match unused.as_slice() {
        [] => Some(CtorBinding {
            param_sources,
            self_reference: None,
        }),
        // A single leftover typed at the declaring type is the assumed
        // self-reference, but only when the constructor genuinely has fewer
        // such parameters than the map has such entries
        [single] if entries[*single].field_type == ty.token => {
            let self_typed_params = params
                .iter()
                .filter(|param| param.param_type == ty.token)
                .count();
            if self_typed_params < self_typed_entries {
                Some(CtorBinding {
                    param_sources,
                    self_reference: Some(*single),
                })
            } else {
                None
            }
        }
        _ => None,
    }
}
