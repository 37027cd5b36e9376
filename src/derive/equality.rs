//! Per-type structural equality walkers, plus platform-standard equality
//! and hashing.
//!
//! Equality is nominal on the requested static type: two values compare
//! through the fields visible on `T`, whatever their concrete runtime types
//! are. There is deliberately no subtype dispatch here. The walker
//! terminates on cyclic graphs through a visited-pair set closed under
//! swap, with pairs recorded *before* recursing into their fields; a pair
//! seen again is treated as equal, which is the coinductive reading of
//! equality on infinite unfoldings.
//!
//! Synthesis never fails and the walkers never error: shape differences
//! simply compare unequal.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    derive::cache::SpecializationCache,
    introspect::Introspector,
    metadata::{
        token::TypeToken,
        typesystem::{wellknown, TypeKind},
    },
    value::{IdentityKey, PairSet, Value},
    Result,
};

/// A client-supplied equality implementation for an equatable type
pub type EqualityHook = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// The compiled per-type equality specialization
#[derive(Debug)]
pub(crate) enum EqPlan {
    /// Platform-standard equality (primitives, enums, functions, unknowns)
    Default,
    /// Arrays: length then element-wise recursion
    Array,
    /// Nullable: null-aware comparison of the unwrapped element
    Nullable(TypeToken),
    /// Well-known list: slots are elements of the given static type
    Sequence(TypeToken),
    /// Well-known read-only wrapper: one inner collection at slot zero
    WrappedInner,
    /// Well-known pair: two slots with their argument types
    Pair(TypeToken, TypeToken),
    /// Aggregate: field-wise recursion over the `T`-visible fields
    Aggregate {
        /// Value semantics: skip the identity and pair-set machinery
        value_type: bool,
        /// Slot index and static type per field
        fields: Vec<(usize, TypeToken)>,
    },
}

/// Derives and caches structural-equality specializations
pub(crate) struct StructuralEquality {
    /// Metadata queries
    introspector: Arc<Introspector>,
    /// Per-type plans
    cache: SpecializationCache<EqPlan>,
    /// Registered open instance equality methods for equatable types
    equality_hooks: DashMap<TypeToken, EqualityHook>,
}

impl StructuralEquality {
    /// Create an equality deriver over the given introspector
    pub(crate) fn new(introspector: Arc<Introspector>) -> Self {
        StructuralEquality {
            introspector,
            cache: SpecializationCache::new(),
            equality_hooks: DashMap::new(),
        }
    }

    /// Structural equality on the `T`-visible shape of two values
    pub(crate) fn structural_equals(&self, token: TypeToken, a: &Value, b: &Value) -> bool {
        let mut visited = PairSet::new();
        self.eq_inner(token, a, b, &mut visited)
    }

    /// Register the open instance equality method of a type implementing
    /// the equatable interface on itself.
    ///
    /// # Errors
    /// Fails when the type is not a reference type implementing the
    /// equatable contract.
    pub(crate) fn register_equatable(&self, token: TypeToken, hook: EqualityHook) -> Result<()> {
        let registry = self.introspector.registry();
        let ty = registry.resolve(token)?;
        if self.introspector.is_value_type(token) {
            return Err(synthesis_error!(
                "'{}' is a value type; the open-method refinement applies to reference types",
                ty.fullname()
            ));
        }
        let equatable_self = registry.instantiate(wellknown::EQUATABLE, &[token])?;
        let implements_equatable = self
            .introspector
            .interfaces_of(token)
            .iter()
            .any(|iface| *iface == wellknown::EQUATABLE || *iface == equatable_self.token);
        if !implements_equatable {
            return Err(synthesis_error!(
                "'{}' does not implement the equatable interface on itself",
                ty.fullname()
            ));
        }
        self.equality_hooks.insert(token, hook);
        Ok(())
    }

    /// The compiled plan for a type, synthesized at first request. The
    /// assignment is lazy (after synthesis) to support mutually recursive
    /// types; synthesis itself cannot fail.
    fn plan(&self, token: TypeToken) -> Arc<EqPlan> {
        if let Some(plan) = self.cache.get(token) {
            return plan;
        }
        let plan = self.synthesize(token);
        self.cache.publish(token, plan)
    }

    fn synthesize(&self, token: TypeToken) -> EqPlan {
        let Some(ty) = self.introspector.registry().get(token) else {
            return EqPlan::Default;
        };

        match ty.kind() {
            TypeKind::Primitive(_) | TypeKind::Enum => EqPlan::Default,
            TypeKind::Array => EqPlan::Array,
            TypeKind::Nullable => ty
                .element()
                .map_or(EqPlan::Default, EqPlan::Nullable),
            TypeKind::Function | TypeKind::Pointer | TypeKind::ByRef => EqPlan::Default,
            TypeKind::GenericInstance => {
                let arg = |index: usize| {
                    ty.generic_args
                        .get(index)
                        .copied()
                        .unwrap_or(wellknown::OBJECT)
                };
                match ty.definition() {
                    Some(wellknown::LIST) => EqPlan::Sequence(arg(0)),
                    Some(wellknown::READ_ONLY_LIST) => EqPlan::WrappedInner,
                    Some(wellknown::KEY_VALUE_PAIR) => EqPlan::Pair(arg(0), arg(1)),
                    _ => self.synthesize_aggregate(token),
                }
            }
            _ => self.synthesize_aggregate(token),
        }
    }

    fn synthesize_aggregate(&self, token: TypeToken) -> EqPlan {
        let fields = self
            .introspector
            .fields_of(token)
            .iter()
            .enumerate()
            .map(|(slot, field)| (slot, field.field_type))
            .collect();
        EqPlan::Aggregate {
            value_type: self.introspector.is_value_type(token),
            fields,
        }
    }

    fn eq_inner(&self, token: TypeToken, a: &Value, b: &Value, visited: &mut PairSet) -> bool {
        let plan = self.plan(token);
        match &*plan {
            EqPlan::Default => self.default_equals(token, a, b),
            EqPlan::Array => self.eq_array(a, b, visited),
            EqPlan::Nullable(element) => match (a.is_null(), b.is_null()) {
                (true, true) => true,
                (true, false) | (false, true) => false,
                (false, false) => self.eq_inner(*element, a, b, visited),
            },
            EqPlan::Sequence(element) => {
                self.eq_reference_slots(a, b, visited, |x, y, visited| {
                    let count = x.slot_count();
                    if count != y.slot_count() {
                        return false;
                    }
                    (0..count).all(|i| self.eq_inner(*element, &x.get(i), &y.get(i), visited))
                })
            }
            EqPlan::WrappedInner => self.eq_reference_slots(a, b, visited, |x, y, visited| {
                let (inner_a, inner_b) = (x.get(0), y.get(0));
                match (inner_a.is_null(), inner_b.is_null()) {
                    (true, true) => true,
                    (true, false) | (false, true) => false,
                    (false, false) => {
                        let inner_type = inner_a
                            .type_token()
                            .unwrap_or(wellknown::OBJECT);
                        self.eq_inner(inner_type, &inner_a, &inner_b, visited)
                    }
                }
            }),
            EqPlan::Pair(key_type, value_type) => {
                let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
                    return false;
                };
                self.eq_inner(*key_type, &x.get(0), &y.get(0), visited)
                    && self.eq_inner(*value_type, &x.get(1), &y.get(1), visited)
            }
            EqPlan::Aggregate { value_type, fields } => {
                self.eq_aggregate(*value_type, fields, a, b, visited)
            }
        }
    }

    fn eq_array(&self, a: &Value, b: &Value, visited: &mut PairSet) -> bool {
        if Value::same_instance(a, b) || (a.is_null() && b.is_null()) {
            return true;
        }
        if a.is_null() || b.is_null() {
            return false;
        }
        let (Some(x), Some(y)) = (a.as_array(), b.as_array()) else {
            return false;
        };
        if x.len() != y.len() {
            return false;
        }
        if visited.contains(a, b) {
            return true;
        }
        visited.insert(a, b);
        (0..x.len()).all(|i| self.eq_inner(x.element_type(), &x.get(i), &y.get(i), visited))
    }

    /// Reference semantics shared by the slot-carrying well-known shapes
    fn eq_reference_slots<F>(&self, a: &Value, b: &Value, visited: &mut PairSet, compare: F) -> bool
    where
        F: FnOnce(&crate::value::ObjectRc, &crate::value::ObjectRc, &mut PairSet) -> bool,
    {
        if Value::same_instance(a, b) || (a.is_null() && b.is_null()) {
            return true;
        }
        if a.is_null() || b.is_null() {
            return false;
        }
        let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
            return false;
        };
        if visited.contains(a, b) {
            return true;
        }
        visited.insert(a, b);
        compare(x, y, visited)
    }

    fn eq_aggregate(
        &self,
        value_type: bool,
        fields: &[(usize, TypeToken)],
        a: &Value,
        b: &Value,
        visited: &mut PairSet,
    ) -> bool {
        if value_type {
            if a.is_null() && b.is_null() {
                return true;
            }
            if a.is_null() || b.is_null() {
                return false;
            }
        } else {
            if Value::same_instance(a, b) || (a.is_null() && b.is_null()) {
                return true;
            }
            if a.is_null() || b.is_null() {
                return false;
            }
            // Empty reference aggregates fall back to null-aware reference
            // equality, which already failed above
            if fields.is_empty() {
                return false;
            }
            if visited.contains(a, b) {
                return true;
            }
            // Record the pair before recursing so cycles short-circuit
            visited.insert(a, b);
        }

        let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
            return false;
        };
        fields
            .iter()
            .all(|(slot, field_type)| self.eq_inner(*field_type, &x.get(*slot), &y.get(*slot), visited))
    }

    /// Platform-standard equality: content for identity-free leaves,
    /// identity for heap values, with the open-method refinement for
    /// registered equatable reference types
    pub(crate) fn default_equals(&self, token: TypeToken, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Prim(x), Value::Prim(y)) => x == y,
            (Value::Enum { ty: tx, value: vx }, Value::Enum { ty: ty_, value: vy }) => {
                tx == ty_ && vx == vy
            }
            _ => {
                let hook = self
                    .equality_hooks
                    .get(&token)
                    .map(|entry| entry.value().clone());
                if let Some(hook) = hook {
                    return hook(a, b);
                }
                Value::same_instance(a, b)
            }
        }
    }

    /// Platform-standard hash consistent with [`Self::default_equals`]
    pub(crate) fn default_hash(&self, token: TypeToken, value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        match value {
            Value::Null => 0u8.hash(&mut hasher),
            Value::Prim(prim) => prim.hash(&mut hasher),
            Value::Enum { ty, value } => {
                ty.hash(&mut hasher);
                value.hash(&mut hasher);
            }
            _ => match IdentityKey::of(value) {
                Some(key) => key.bits().hash(&mut hasher),
                None => 1u8.hash(&mut hasher),
            },
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{TypeBuilder, TypeRegistry};
    use crate::value::{ArrayInstance, ObjectInstance};

    fn setup() -> (Arc<TypeRegistry>, StructuralEquality) {
        let registry = Arc::new(TypeRegistry::new().unwrap());
        let equality = StructuralEquality::new(Arc::new(Introspector::new(registry.clone())));
        (registry, equality)
    }

    #[test]
    fn test_primitive_equality() {
        let (_, equality) = setup();
        assert!(equality.structural_equals(wellknown::I4, &Value::from_i32(1), &Value::from_i32(1)));
        assert!(!equality.structural_equals(
            wellknown::I4,
            &Value::from_i32(1),
            &Value::from_i32(2)
        ));
    }

    #[test]
    fn test_array_elementwise() {
        let (registry, equality) = setup();
        let ints = registry.array_of(wellknown::I4).unwrap();
        let make = |values: &[i32]| {
            Value::Array(ArrayInstance::with_elements(
                ints.token,
                wellknown::I4,
                values.iter().map(|v| Value::from_i32(*v)).collect(),
            ))
        };
        assert!(equality.structural_equals(ints.token, &make(&[1, 2]), &make(&[1, 2])));
        assert!(!equality.structural_equals(ints.token, &make(&[1, 2]), &make(&[1, 3])));
        assert!(!equality.structural_equals(ints.token, &make(&[1, 2]), &make(&[1])));
    }

    #[test]
    fn test_aggregate_fieldwise() {
        let (registry, equality) = setup();
        let point = TypeBuilder::new(registry)
            .value_type("demo", "Point")
            .unwrap()
            .init_only_field("x", wellknown::I4)
            .unwrap()
            .init_only_field("y", wellknown::I4)
            .unwrap()
            .ctor(&[("x", wellknown::I4), ("y", wellknown::I4)])
            .unwrap()
            .finish()
            .unwrap();
        let make = |x: i32, y: i32| {
            Value::Object(ObjectInstance::with_slots(
                point.token,
                vec![Value::from_i32(x), Value::from_i32(y)],
            ))
        };
        assert!(equality.structural_equals(point.token, &make(1, 2), &make(1, 2)));
        assert!(!equality.structural_equals(point.token, &make(1, 2), &make(1, 3)));
    }

    #[test]
    fn test_reference_aggregate_null_handling() {
        let (registry, equality) = setup();
        let node = TypeBuilder::new(registry)
            .class("demo", "Box")
            .unwrap()
            .sealed()
            .unwrap()
            .field("v", wellknown::I4)
            .unwrap()
            .finish()
            .unwrap();
        let instance = Value::Object(ObjectInstance::with_slots(
            node.token,
            vec![Value::from_i32(1)],
        ));
        assert!(equality.structural_equals(node.token, &Value::Null, &Value::Null));
        assert!(!equality.structural_equals(node.token, &instance, &Value::Null));
        assert!(equality.structural_equals(node.token, &instance, &instance));
    }

    #[test]
    fn test_empty_reference_class_is_identity() {
        let (registry, equality) = setup();
        let empty = TypeBuilder::new(registry)
            .class("demo", "Empty")
            .unwrap()
            .sealed()
            .unwrap()
            .finish()
            .unwrap();
        let a = Value::Object(ObjectInstance::new(empty.token, 0));
        let b = Value::Object(ObjectInstance::new(empty.token, 0));
        assert!(equality.structural_equals(empty.token, &a, &a));
        assert!(!equality.structural_equals(empty.token, &a, &b));
    }

    #[test]
    fn test_cyclic_graphs_compare_equal() {
        let (registry, equality) = setup();
        let mut builder = TypeBuilder::new(registry).class("demo", "Node").unwrap();
        let token = builder.token().unwrap();
        let node = builder
            .field("next", token)
            .unwrap()
            .field("v", wellknown::I4)
            .unwrap()
            .finish()
            .unwrap();

        let make_cycle = |v: i32| {
            let instance = ObjectInstance::new(node.token, 2);
            instance.set(0, Value::Object(instance.clone()));
            instance.set(1, Value::from_i32(v));
            Value::Object(instance)
        };
        assert!(equality.structural_equals(node.token, &make_cycle(7), &make_cycle(7)));
        assert!(!equality.structural_equals(node.token, &make_cycle(7), &make_cycle(8)));
    }

    #[test]
    fn test_symmetry() {
        let (registry, equality) = setup();
        let pair = TypeBuilder::new(registry)
            .class("demo", "Wrap")
            .unwrap()
            .sealed()
            .unwrap()
            .field("s", wellknown::STRING)
            .unwrap()
            .finish()
            .unwrap();
        let a = Value::Object(ObjectInstance::with_slots(
            pair.token,
            vec![Value::from_str_value("x")],
        ));
        let b = Value::Object(ObjectInstance::with_slots(
            pair.token,
            vec![Value::from_str_value("x")],
        ));
        assert_eq!(
            equality.structural_equals(pair.token, &a, &b),
            equality.structural_equals(pair.token, &b, &a)
        );
    }

    #[test]
    fn test_nullable_plan() {
        let (registry, equality) = setup();
        let nullable = registry.nullable_of(wellknown::I4).unwrap();
        assert!(equality.structural_equals(nullable.token, &Value::Null, &Value::Null));
        assert!(!equality.structural_equals(
            nullable.token,
            &Value::Null,
            &Value::from_i32(1)
        ));
        assert!(equality.structural_equals(
            nullable.token,
            &Value::from_i32(1),
            &Value::from_i32(1)
        ));
    }

    #[test]
    fn test_default_hash_agrees_with_default_equals() {
        let (_, equality) = setup();
        let a = Value::from_str_value("hello");
        let b = Value::from_str_value("hello");
        assert!(equality.default_equals(wellknown::STRING, &a, &b));
        assert_eq!(
            equality.default_hash(wellknown::STRING, &a),
            equality.default_hash(wellknown::STRING, &b)
        );
    }

    #[test]
    fn test_equatable_hook_preferred() {
        let (registry, equality) = setup();
        let mut builder = TypeBuilder::new(registry.clone())
            .class("demo", "CaseInsensitive")
            .unwrap();
        let token = builder.token().unwrap();
        let equatable_self = registry
            .instantiate(wellknown::EQUATABLE, &[token])
            .unwrap();
        builder
            .implements(equatable_self.token)
            .unwrap()
            .field("tag", wellknown::STRING)
            .unwrap()
            .finish()
            .unwrap();

        equality
            .register_equatable(
                token,
                Arc::new(|a, b| {
                    let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
                        return false;
                    };
                    match (x.get(0).as_prim().cloned(), y.get(0).as_prim().cloned()) {
                        (Some(px), Some(py)) => match (px.as_str(), py.as_str()) {
                            (Some(sx), Some(sy)) => sx.eq_ignore_ascii_case(sy),
                            _ => false,
                        },
                        _ => false,
                    }
                }),
            )
            .unwrap();

        let a = Value::Object(ObjectInstance::with_slots(
            token,
            vec![Value::from_str_value("HELLO")],
        ));
        let b = Value::Object(ObjectInstance::with_slots(
            token,
            vec![Value::from_str_value("hello")],
        ));
        assert!(equality.default_equals(token, &a, &b));
    }

    #[test]
    fn test_register_equatable_rejects_non_implementor() {
        let (registry, equality) = setup();
        let plain = TypeBuilder::new(registry)
            .class("demo", "Plain")
            .unwrap()
            .finish()
            .unwrap();
        assert!(equality
            .register_equatable(plain.token, Arc::new(|_, _| true))
            .is_err());
    }
}
