//! Uniform, total view over the descriptor graph.
//!
//! The [`Introspector`] is the seam between the static metadata and the
//! derivation pipeline: every query the analyzers make about a type goes
//! through here. All operations are pure and never fail; missing data is
//! reported as empty sequences or `false`, so the walkers above can be
//! written without error paths for malformed metadata.
//!
//! # Field ordering
//!
//! [`Introspector::fields_of`] returns the *inherited* instance fields of a
//! type: every ancestor's declared fields back to the root, base classes
//! first, declaration order within each declaring type. Instance slot layout
//! follows this order, which gives the nominal-equality walker a stable
//! prefix property: the fields visible through a base type occupy the same
//! leading slots in every subtype.

mod purity;

use std::sync::Arc;

use crate::metadata::token::TypeToken;
use crate::metadata::typesystem::{
    wellknown, CtorRc, FieldDescriptor, FieldRc, PrimitiveKind, TypeKind, TypeRegistry,
};

/// Suffix of compiler-generated auto-property backing fields
const BACKING_FIELD_SUFFIX: &str = ">k__BackingField";

/// Pure query facade over a [`TypeRegistry`]
pub struct Introspector {
    /// The registry holding the descriptor graph
    registry: Arc<TypeRegistry>,
}

impl Introspector {
    /// Create an introspector over the given registry
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Introspector { registry }
    }

    /// Access the underlying registry
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The inherited instance fields of a type, base classes first,
    /// declaration order within each declaring type. Unknown tokens yield an
    /// empty sequence.
    #[must_use]
    pub fn fields_of(&self, token: TypeToken) -> Vec<FieldRc> {
        let mut fields = Vec::new();
        for ancestor in self.registry.ancestry(token) {
            for field in ancestor.instance_fields() {
                fields.push(field);
            }
        }
        fields
    }

    /// Returns true if the type cannot be subclassed
    #[must_use]
    pub fn is_sealed(&self, token: TypeToken) -> bool {
        self.registry
            .get(token)
            .is_some_and(|ty| ty.is_sealed())
    }

    /// Returns true if instances of the type have value semantics (no
    /// reference identity)
    #[must_use]
    pub fn is_value_type(&self, token: TypeToken) -> bool {
        let Some(ty) = self.registry.get(token) else {
            return false;
        };
        match ty.kind() {
            TypeKind::ValueType | TypeKind::Enum | TypeKind::Nullable => true,
            TypeKind::Primitive(kind) => kind.is_value_kind(),
            TypeKind::GenericInstance => ty
                .definition()
                .is_some_and(|definition| self.is_value_type(definition)),
            _ => false,
        }
    }

    /// Returns true if the type is an array type
    #[must_use]
    pub fn is_array(&self, token: TypeToken) -> bool {
        self.registry
            .get(token)
            .is_some_and(|ty| *ty.kind() == TypeKind::Array)
    }

    /// The element type of an array, pointer, by-ref, or nullable
    #[must_use]
    pub fn element_type(&self, token: TypeToken) -> Option<TypeToken> {
        self.registry.get(token).and_then(|ty| ty.element())
    }

    /// Returns true if the type is a built-in primitive leaf
    #[must_use]
    pub fn is_primitive(&self, token: TypeToken) -> bool {
        self.registry
            .get(token)
            .is_some_and(|ty| ty.kind().is_primitive())
    }

    /// The primitive kind of the type, if it is one
    #[must_use]
    pub fn primitive_kind(&self, token: TypeToken) -> Option<PrimitiveKind> {
        self.registry.get(token).and_then(|ty| match ty.kind() {
            TypeKind::Primitive(kind) => Some(*kind),
            _ => None,
        })
    }

    /// Returns true if the type exposes an accessible zero-argument
    /// constructor (value types always do)
    #[must_use]
    pub fn has_no_arg_constructor(&self, token: TypeToken) -> bool {
        self.registry
            .get(token)
            .is_some_and(|ty| ty.has_no_arg_ctor())
    }

    /// The declared constructors of the type, in declaration order
    #[must_use]
    pub fn constructors_of(&self, token: TypeToken) -> Vec<CtorRc> {
        self.registry
            .get(token)
            .map(|ty| ty.ctors.iter().map(|(_, c)| c.clone()).collect())
            .unwrap_or_default()
    }

    /// The set of interfaces the type implements, including those inherited
    /// through its base chain and generic instantiations
    #[must_use]
    pub fn interfaces_of(&self, token: TypeToken) -> Vec<TypeToken> {
        let mut interfaces = Vec::new();
        for ancestor in self.registry.ancestry(token) {
            for (_, interface) in ancestor.interfaces.iter() {
                if !interfaces.contains(interface) {
                    interfaces.push(*interface);
                }
            }
        }
        interfaces
    }

    /// Returns true if `s` is assignable to `t`
    #[must_use]
    pub fn subtypes(&self, s: TypeToken, t: TypeToken) -> bool {
        self.registry.is_assignable(s, t)
    }

    /// Returns true if the field is a compiler-generated auto-property
    /// backing field.
    ///
    /// The naming convention alone (leading `<`, trailing
    /// `>k__BackingField`) is not trusted; the compiler-generated marker
    /// must also be present on the field.
    #[must_use]
    pub fn is_backing_field(&self, field: &FieldDescriptor) -> bool {
        field.compiler_generated
            && field.name.starts_with('<')
            && field.name.ends_with(BACKING_FIELD_SUFFIX)
    }

    /// The property name behind a backing field, or the raw field name when
    /// the convention (plus marker) does not hold
    #[must_use]
    pub fn normalize_field_name(&self, field: &FieldDescriptor) -> String {
        if self.is_backing_field(field) {
            field.name[1..field.name.len() - BACKING_FIELD_SUFFIX.len()].to_string()
        } else {
            field.name.clone()
        }
    }

    /// Returns true if the type declares the purity attribute
    #[must_use]
    pub fn is_pure_type(&self, token: TypeToken) -> bool {
        self.registry.get(token).is_some_and(|ty| ty.pure)
    }

    /// Returns true if every declared method of the type is observation-only
    #[must_use]
    pub fn all_methods_pure(&self, token: TypeToken) -> bool {
        self.registry
            .get(token)
            .is_some_and(|ty| purity::all_methods_pure(&self.registry, &ty))
    }

    /// Returns true if the type opts into supplying its own copy walker by
    /// implementing the copier-capable interface
    #[must_use]
    pub fn is_self_copying(&self, token: TypeToken) -> bool {
        self.interfaces_of(token).contains(&wellknown::REPLICABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{FieldAttributes, TypeBuilder};

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new().unwrap())
    }

    #[test]
    fn test_fields_of_base_first() {
        let registry = registry();
        let base = TypeBuilder::new(registry.clone())
            .class("demo", "Base")
            .unwrap()
            .field("first", wellknown::I4)
            .unwrap()
            .finish()
            .unwrap();
        let derived = TypeBuilder::new(registry.clone())
            .class("demo", "Derived")
            .unwrap()
            .base(base.token)
            .unwrap()
            .field("second", wellknown::I4)
            .unwrap()
            .finish()
            .unwrap();

        let introspector = Introspector::new(registry);
        let names: Vec<_> = introspector
            .fields_of(derived.token)
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(names, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_unknown_token_is_empty_and_false() {
        let introspector = Introspector::new(registry());
        let ghost = TypeToken::new(0xBEEF);
        assert!(introspector.fields_of(ghost).is_empty());
        assert!(!introspector.is_sealed(ghost));
        assert!(!introspector.is_array(ghost));
        assert!(introspector.element_type(ghost).is_none());
        assert!(introspector.constructors_of(ghost).is_empty());
    }

    #[test]
    fn test_value_type_classification() {
        let registry = registry();
        let introspector = Introspector::new(registry.clone());
        assert!(introspector.is_value_type(wellknown::I4));
        assert!(introspector.is_value_type(wellknown::DECIMAL));
        assert!(!introspector.is_value_type(wellknown::STRING));
        assert!(!introspector.is_value_type(wellknown::OBJECT));

        let nullable = registry.nullable_of(wellknown::I4).unwrap();
        assert!(introspector.is_value_type(nullable.token));

        let pair = registry
            .instantiate(wellknown::KEY_VALUE_PAIR, &[wellknown::I4, wellknown::STRING])
            .unwrap();
        assert!(introspector.is_value_type(pair.token));
    }

    #[test]
    fn test_backing_field_requires_marker() {
        let introspector = Introspector::new(registry());
        let marked = FieldDescriptor {
            name: "<Name>k__BackingField".into(),
            flags: FieldAttributes::PRIVATE,
            field_type: wellknown::STRING,
            compiler_generated: true,
        };
        assert!(introspector.is_backing_field(&marked));
        assert_eq!(introspector.normalize_field_name(&marked), "Name");

        // Convention without the marker: treated as an ordinary field
        let unmarked = FieldDescriptor {
            name: "<Name>k__BackingField".into(),
            flags: FieldAttributes::PRIVATE,
            field_type: wellknown::STRING,
            compiler_generated: false,
        };
        assert!(!introspector.is_backing_field(&unmarked));
        assert_eq!(
            introspector.normalize_field_name(&unmarked),
            "<Name>k__BackingField"
        );
    }

    #[test]
    fn test_interfaces_inherited_through_base() {
        let registry = registry();
        let base = TypeBuilder::new(registry.clone())
            .class("demo", "Base")
            .unwrap()
            .implements(wellknown::FORMATTABLE)
            .unwrap()
            .finish()
            .unwrap();
        let derived = TypeBuilder::new(registry.clone())
            .class("demo", "Derived")
            .unwrap()
            .base(base.token)
            .unwrap()
            .implements(wellknown::CLONEABLE)
            .unwrap()
            .finish()
            .unwrap();

        let introspector = Introspector::new(registry);
        let interfaces = introspector.interfaces_of(derived.token);
        assert!(interfaces.contains(&wellknown::FORMATTABLE));
        assert!(interfaces.contains(&wellknown::CLONEABLE));
    }

    #[test]
    fn test_self_copying_detection() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Replica")
            .unwrap()
            .implements(wellknown::REPLICABLE)
            .unwrap()
            .finish()
            .unwrap();
        let introspector = Introspector::new(registry);
        assert!(introspector.is_self_copying(ty.token));
        assert!(!introspector.is_self_copying(wellknown::STRING));
    }
}
