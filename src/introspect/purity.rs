//! Method purity rules.
//!
//! The mutability analyzer downgrades a type to `Mutable` when a writable
//! field is paired with *any* method that could observe or mutate state in a
//! way the engine cannot rule out. A type's method surface is considered
//! observation-only when every declared method satisfies one of the closed
//! rules below; the curated interface table lists the platform contracts
//! whose members never mutate their receiver.

use crate::metadata::typesystem::{
    wellknown, MethodDescriptor, MethodTraits, TypeDescriptor, TypeRegistry,
};

/// Returns true if every declared method of the type is pure under the
/// closed rule set. Types without methods are trivially pure.
#[must_use]
pub(crate) fn all_methods_pure(registry: &TypeRegistry, ty: &TypeDescriptor) -> bool {
    ty.methods
        .iter()
        .all(|(_, method)| is_pure_method(registry, ty, method))
}

/// One method is pure when it is:
/// (a) an implementation of a curated observation-only interface contract,
/// (b) marked with the purity attribute,
/// (c) an auto-generated property getter,
/// (d) a private auto-generated property setter, or
/// (e) a static method that does not accept the declaring type as any
///     parameter.
#[must_use]
pub(crate) fn is_pure_method(
    registry: &TypeRegistry,
    ty: &TypeDescriptor,
    method: &MethodDescriptor,
) -> bool {
    if let Some(origin) = method.origin {
        if is_curated_interface(registry, origin) {
            return true;
        }
    }

    if method.traits.contains(MethodTraits::PURE) {
        return true;
    }

    if method.traits.contains(MethodTraits::COMPILER_GENERATED) {
        if method.traits.contains(MethodTraits::GETTER) {
            return true;
        }
        if method.traits.contains(MethodTraits::SETTER) && method.is_private() {
            return true;
        }
    }

    method.is_static() && !method.accepts(ty.token)
}

/// Check a contract origin against the curated table, resolving generic
/// instantiations (e.g. an equatable-of-self application) back to their
/// definitions first.
#[must_use]
fn is_curated_interface(registry: &TypeRegistry, origin: crate::TypeToken) -> bool {
    let resolved = registry
        .get(origin)
        .and_then(|d| d.definition())
        .unwrap_or(origin);
    wellknown::CURATED_INTERFACES.contains(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeBuilder;
    use std::sync::Arc;

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new().unwrap())
    }

    #[test]
    fn test_no_methods_is_pure() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Empty")
            .unwrap()
            .declare()
            .unwrap()
            .finish()
            .unwrap();
        assert!(all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_pure_attribute_method() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Observer")
            .unwrap()
            .pure_method("Inspect")
            .unwrap()
            .finish()
            .unwrap();
        assert!(all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_unmarked_method_is_impure() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Toucher")
            .unwrap()
            .impure_method("Poke")
            .unwrap()
            .finish()
            .unwrap();
        assert!(!all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_curated_interface_implementation() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Printable")
            .unwrap()
            .implements(wellknown::FORMATTABLE)
            .unwrap()
            .interface_method("ToString", wellknown::FORMATTABLE)
            .unwrap()
            .finish()
            .unwrap();
        assert!(all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_equatable_of_self_instantiation() {
        let registry = registry();
        let mut builder = TypeBuilder::new(registry.clone())
            .class("demo", "Id")
            .unwrap();
        let token = builder.token().unwrap();
        let equatable_of_self = registry
            .instantiate(wellknown::EQUATABLE, &[token])
            .unwrap();
        let ty = builder
            .implements(equatable_of_self.token)
            .unwrap()
            .interface_method("Equals", equatable_of_self.token)
            .unwrap()
            .finish()
            .unwrap();
        assert!(all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_static_method_accepting_self_is_impure() {
        let registry = registry();
        let mut builder = TypeBuilder::new(registry.clone())
            .class("demo", "Mixer")
            .unwrap();
        let token = builder.token().unwrap();
        let ty = builder
            .static_method("Merge", &[("other", token)])
            .unwrap()
            .finish()
            .unwrap();
        assert!(!all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_static_method_not_accepting_self_is_pure() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Factory")
            .unwrap()
            .static_method("Create", &[("seed", wellknown::I4)])
            .unwrap()
            .finish()
            .unwrap();
        assert!(all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_private_auto_setter_is_pure() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Sheltered")
            .unwrap()
            .auto_property_private_set("Name", wellknown::STRING)
            .unwrap()
            .finish()
            .unwrap();
        assert!(all_methods_pure(&registry, &ty));
    }

    #[test]
    fn test_public_auto_setter_is_impure() {
        let registry = registry();
        let ty = TypeBuilder::new(registry.clone())
            .class("demo", "Open")
            .unwrap()
            .auto_property("Name", wellknown::STRING)
            .unwrap()
            .finish()
            .unwrap();
        assert!(!all_methods_pure(&registry, &ty));
    }
}
