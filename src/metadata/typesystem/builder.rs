//! Builder for type descriptors.
//!
//! This module provides the [`TypeBuilder`] struct, which offers a fluent API for describing
//! client types to the registry: classes, value types, interfaces, enumerations, function
//! types, and generic definitions, together with their fields, auto-properties, constructors,
//! methods, and interface lists. Descriptors are declared into the registry as soon as their
//! identity is fixed, so mutually recursive graphs can be described by declaring all types
//! first and adding members afterwards.
//!
//! # Example
//!
//! ```rust
//! use structwalk::{TypeBuilder, TypeRegistry, wellknown};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::new()?);
//!
//! let mut node = TypeBuilder::new(registry.clone()).class("demo", "Node")?;
//! let node_token = node.token()?;
//! let node = node.field("next", node_token)?.no_arg_ctor()?.finish()?;
//!
//! assert_eq!(node.fullname(), "demo.Node");
//! # Ok::<(), structwalk::Error>(())
//! ```

use std::sync::Arc;

use crate::{
    metadata::{
        token::TypeToken,
        typesystem::{
            registry::wellknown, CtorDescriptor, FieldAttributes, FieldDescriptor,
            MethodAttributes, MethodDescriptor, MethodTraits, ParamDescriptor, TypeAttributes,
            TypeDescriptor, TypeKind, TypeRc, TypeRegistry,
        },
    },
    Result,
};

/// Provides a fluent API for describing type descriptors
pub struct TypeBuilder {
    /// Type registry the descriptor is declared into
    registry: Arc<TypeRegistry>,
    /// Pending namespace
    namespace: String,
    /// Pending name
    name: String,
    /// Pending kind
    kind: Option<TypeKind>,
    /// Pending attribute flags
    flags: u32,
    /// Pending base link
    base: Option<TypeToken>,
    /// Pending purity attribute
    pure: bool,
    /// Pending generic parameter names
    generic_params: Vec<String>,
    /// The declared descriptor, once identity is fixed
    declared: Option<TypeRc>,
}

impl TypeBuilder {
    /// Create a new builder with the given registry
    ///
    /// ## Arguments
    /// * `registry` - The type registry to declare into
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        TypeBuilder {
            registry,
            namespace: String::new(),
            name: String::new(),
            kind: None,
            flags: TypeAttributes::PUBLIC,
            base: None,
            pure: false,
            generic_params: Vec::new(),
            declared: None,
        }
    }

    fn identity(mut self, namespace: &str, name: &str, kind: TypeKind) -> Self {
        self.namespace = namespace.to_string();
        self.name = name.to_string();
        self.kind = Some(kind);
        self
    }

    /// Start describing a class with the given name
    ///
    /// ## Arguments
    /// * `namespace` - Namespace for the class
    /// * `name` - Name for the class
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be declared.
    pub fn class(self, namespace: &str, name: &str) -> Result<Self> {
        let mut builder = self.identity(namespace, name, TypeKind::Class);
        builder.base = builder.base.or(Some(wellknown::OBJECT));
        Ok(builder)
    }

    /// Start describing a value type with the given name
    ///
    /// ## Arguments
    /// * `namespace` - Namespace for the value type
    /// * `name` - Name for the value type
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be declared.
    pub fn value_type(self, namespace: &str, name: &str) -> Result<Self> {
        let mut builder = self.identity(namespace, name, TypeKind::ValueType);
        builder.base = Some(wellknown::VALUE_TYPE_ROOT);
        builder.flags |= TypeAttributes::SEALED;
        Ok(builder)
    }

    /// Start describing an interface with the given name
    ///
    /// ## Arguments
    /// * `namespace` - Namespace for the interface
    /// * `name` - Name for the interface
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be declared.
    pub fn interface(self, namespace: &str, name: &str) -> Result<Self> {
        let mut builder = self.identity(namespace, name, TypeKind::Interface);
        builder.flags |= TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT;
        Ok(builder)
    }

    /// Start describing an enumeration with the given name
    ///
    /// ## Arguments
    /// * `namespace` - Namespace for the enumeration
    /// * `name` - Name for the enumeration
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be declared.
    pub fn enumeration(self, namespace: &str, name: &str) -> Result<Self> {
        let mut builder = self.identity(namespace, name, TypeKind::Enum);
        builder.base = Some(wellknown::ENUM_ROOT);
        builder.flags |= TypeAttributes::SEALED;
        Ok(builder)
    }

    /// Start describing a function (delegate/closure) type with the given name
    ///
    /// ## Arguments
    /// * `namespace` - Namespace for the function type
    /// * `name` - Name for the function type
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be declared.
    pub fn function(self, namespace: &str, name: &str) -> Result<Self> {
        let mut builder = self.identity(namespace, name, TypeKind::Function);
        builder.base = Some(wellknown::FUNCTION_ROOT);
        builder.flags |= TypeAttributes::SEALED;
        Ok(builder)
    }

    /// Start describing an unbound generic definition with the given name
    ///
    /// ## Arguments
    /// * `namespace` - Namespace for the definition
    /// * `name` - Name for the definition
    /// * `params` - Generic parameter names, in declaration order
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be declared.
    pub fn generic_definition(self, namespace: &str, name: &str, params: &[&str]) -> Result<Self> {
        let mut builder = self.identity(namespace, name, TypeKind::GenericDefinition);
        builder.base = Some(wellknown::OBJECT);
        builder.generic_params = params.iter().map(|p| (*p).to_string()).collect();
        Ok(builder)
    }

    /// Mark the type as sealed (not subclassable)
    ///
    /// # Errors
    /// Returns an error if the descriptor was already declared.
    pub fn sealed(mut self) -> Result<Self> {
        self.pending_mut("sealed")?;
        self.flags |= TypeAttributes::SEALED;
        Ok(self)
    }

    /// Mark the type as abstract
    ///
    /// # Errors
    /// Returns an error if the descriptor was already declared.
    pub fn abstract_type(mut self) -> Result<Self> {
        self.pending_mut("abstract")?;
        self.flags |= TypeAttributes::ABSTRACT;
        Ok(self)
    }

    /// Attach the purity attribute to the type
    ///
    /// # Errors
    /// Returns an error if the descriptor was already declared.
    pub fn pure(mut self) -> Result<Self> {
        self.pending_mut("pure")?;
        self.pure = true;
        Ok(self)
    }

    /// Set the base type of the descriptor
    ///
    /// # Errors
    /// Returns an error if the descriptor was already declared.
    pub fn base(mut self, base: TypeToken) -> Result<Self> {
        self.pending_mut("base")?;
        self.base = Some(base);
        Ok(self)
    }

    fn pending_mut(&self, what: &str) -> Result<()> {
        if self.declared.is_some() {
            return Err(synthesis_error!(
                "cannot change '{}' of '{}' after declaration",
                what,
                self.name
            ));
        }
        Ok(())
    }

    /// Declare the descriptor into the registry, fixing its identity and
    /// token. Member additions declare implicitly on first use.
    ///
    /// # Errors
    /// Returns an error if no identity was chosen or registration fails.
    pub fn declare(mut self) -> Result<Self> {
        self.ensure_declared()?;
        Ok(self)
    }

    fn ensure_declared(&mut self) -> Result<&TypeRc> {
        if self.declared.is_none() {
            let Some(kind) = self.kind else {
                return Err(synthesis_error!(
                    "no identity chosen for builder of '{}'",
                    self.name
                ));
            };
            let token = self.registry.alloc_token();
            let mut descriptor = TypeDescriptor::new(
                token,
                self.namespace.clone(),
                self.name.clone(),
                self.flags,
                Some(kind),
                self.base,
            );
            descriptor.pure = self.pure;
            for param in &self.generic_params {
                descriptor.generic_params.push(param.clone());
            }
            let rc = self.registry.insert_descriptor(descriptor)?;
            self.declared = Some(rc);
        }
        // Declared above; the expect can never fire
        Ok(self.declared.as_ref().expect("descriptor just declared"))
    }

    /// The token of the descriptor, declaring it if needed. Use this for
    /// self-referential fields.
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn token(&mut self) -> Result<TypeToken> {
        Ok(self.ensure_declared()?.token)
    }

    /// Add an interface to the descriptor's implemented set
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn implements(mut self, interface: TypeToken) -> Result<Self> {
        self.ensure_declared()?.interfaces.push(interface);
        Ok(self)
    }

    fn push_field(&mut self, name: &str, field_type: TypeToken, flags: u32) -> Result<()> {
        self.ensure_declared()?.fields.push(Arc::new(FieldDescriptor {
            name: name.to_string(),
            flags,
            field_type,
            compiler_generated: false,
        }));
        Ok(())
    }

    /// Add a public mutable instance field
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn field(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_field(name, field_type, FieldAttributes::PUBLIC)?;
        Ok(self)
    }

    /// Add a private mutable instance field
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn private_field(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_field(name, field_type, FieldAttributes::PRIVATE)?;
        Ok(self)
    }

    /// Add a public init-only instance field
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn init_only_field(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_field(
            name,
            field_type,
            FieldAttributes::PUBLIC | FieldAttributes::INIT_ONLY,
        )?;
        Ok(self)
    }

    /// Add a static field (ignored by the structural walkers)
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn static_field(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_field(
            name,
            field_type,
            FieldAttributes::PRIVATE | FieldAttributes::STATIC,
        )?;
        Ok(self)
    }

    fn push_accessor(
        &mut self,
        prefix: &str,
        property: &str,
        flags: u32,
        traits: MethodTraits,
    ) -> Result<()> {
        self.ensure_declared()?.methods.push(Arc::new(MethodDescriptor {
            name: format!("{prefix}_{property}"),
            flags: flags | MethodAttributes::SPECIAL_NAME,
            traits: traits | MethodTraits::COMPILER_GENERATED,
            params: Vec::new(),
            origin: None,
        }));
        Ok(())
    }

    fn push_backing_field(&mut self, property: &str, field_type: TypeToken, init_only: bool) -> Result<()> {
        let mut flags = FieldAttributes::PRIVATE;
        if init_only {
            flags |= FieldAttributes::INIT_ONLY;
        }
        self.ensure_declared()?.fields.push(Arc::new(FieldDescriptor {
            name: format!("<{property}>k__BackingField"),
            flags,
            field_type,
            compiler_generated: true,
        }));
        Ok(())
    }

    /// Add an auto-property with public get and public set accessors.
    ///
    /// The backing field follows the compiler naming convention and carries
    /// the compiler-generated marker.
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn auto_property(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_backing_field(name, field_type, false)?;
        self.push_accessor("get", name, MethodAttributes::PUBLIC, MethodTraits::GETTER)?;
        self.push_accessor("set", name, MethodAttributes::PUBLIC, MethodTraits::SETTER)?;
        Ok(self)
    }

    /// Add an auto-property with a public get and a private set accessor
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn auto_property_private_set(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_backing_field(name, field_type, false)?;
        self.push_accessor("get", name, MethodAttributes::PUBLIC, MethodTraits::GETTER)?;
        self.push_accessor("set", name, MethodAttributes::PRIVATE, MethodTraits::SETTER)?;
        Ok(self)
    }

    /// Add a get-only auto-property backed by an init-only field
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn read_only_auto_property(mut self, name: &str, field_type: TypeToken) -> Result<Self> {
        self.push_backing_field(name, field_type, true)?;
        self.push_accessor("get", name, MethodAttributes::PUBLIC, MethodTraits::GETTER)?;
        Ok(self)
    }

    /// Add a constructor with the given named parameters
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn ctor(mut self, params: &[(&str, TypeToken)]) -> Result<Self> {
        self.ensure_declared()?.ctors.push(Arc::new(CtorDescriptor {
            flags: MethodAttributes::PUBLIC,
            params: params
                .iter()
                .map(|(name, ty)| ParamDescriptor {
                    name: (*name).to_string(),
                    param_type: *ty,
                })
                .collect(),
        }));
        Ok(self)
    }

    /// Add a public no-argument constructor
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn no_arg_ctor(self) -> Result<Self> {
        self.ctor(&[])
    }

    /// Add an instance method carrying the purity attribute
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn pure_method(mut self, name: &str) -> Result<Self> {
        self.ensure_declared()?.methods.push(Arc::new(MethodDescriptor {
            name: name.to_string(),
            flags: MethodAttributes::PUBLIC,
            traits: MethodTraits::PURE,
            params: Vec::new(),
            origin: None,
        }));
        Ok(self)
    }

    /// Add an instance method with no purity evidence
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn impure_method(mut self, name: &str) -> Result<Self> {
        self.ensure_declared()?.methods.push(Arc::new(MethodDescriptor {
            name: name.to_string(),
            flags: MethodAttributes::PUBLIC,
            traits: MethodTraits::empty(),
            params: Vec::new(),
            origin: None,
        }));
        Ok(self)
    }

    /// Add a static method with the given parameters
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn static_method(mut self, name: &str, params: &[(&str, TypeToken)]) -> Result<Self> {
        self.ensure_declared()?.methods.push(Arc::new(MethodDescriptor {
            name: name.to_string(),
            flags: MethodAttributes::PUBLIC | MethodAttributes::STATIC,
            traits: MethodTraits::empty(),
            params: params
                .iter()
                .map(|(name, ty)| ParamDescriptor {
                    name: (*name).to_string(),
                    param_type: *ty,
                })
                .collect(),
            origin: None,
        }));
        Ok(self)
    }

    /// Add a method fulfilling an interface contract
    ///
    /// # Errors
    /// Returns an error if declaration fails.
    pub fn interface_method(mut self, name: &str, origin: TypeToken) -> Result<Self> {
        self.ensure_declared()?.methods.push(Arc::new(MethodDescriptor {
            name: name.to_string(),
            flags: MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL,
            traits: MethodTraits::empty(),
            params: Vec::new(),
            origin: Some(origin),
        }));
        Ok(self)
    }

    /// Finish the description: validate that every referenced token resolves
    /// and return the descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if a field, base, interface, or
    /// parameter references an unregistered token.
    pub fn finish(mut self) -> Result<TypeRc> {
        self.ensure_declared()?;
        // Drop the borrow before validation
        let rc = self.declared.clone().expect("descriptor just declared");

        if let Some(base) = rc.base() {
            self.registry.resolve(base)?;
        }
        for (_, interface) in rc.interfaces.iter() {
            self.registry.resolve(*interface)?;
        }
        for (_, field) in rc.fields.iter() {
            self.registry.resolve(field.field_type)?;
        }
        for (_, ctor) in rc.ctors.iter() {
            for param in &ctor.params {
                self.registry.resolve(param.param_type)?;
            }
        }
        for (_, method) in rc.methods.iter() {
            for param in &method.params {
                self.registry.resolve(param.param_type)?;
            }
        }
        Ok(rc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::PrimitiveKind;

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new().unwrap())
    }

    #[test]
    fn test_class_with_self_reference() {
        let registry = registry();
        let mut builder = TypeBuilder::new(registry.clone()).class("demo", "Node").unwrap();
        let token = builder.token().unwrap();
        let node = builder
            .field("next", token)
            .unwrap()
            .no_arg_ctor()
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(node.fullname(), "demo.Node");
        assert_eq!(node.fields.count(), 1);
        assert!(node.has_no_arg_ctor());
    }

    #[test]
    fn test_value_type_sealed_by_default() {
        let registry = registry();
        let int_token = registry.primitive(PrimitiveKind::I4).token;
        let point = TypeBuilder::new(registry)
            .value_type("demo", "Point")
            .unwrap()
            .init_only_field("x", int_token)
            .unwrap()
            .finish()
            .unwrap();
        assert!(point.is_sealed());
        assert_eq!(*point.kind(), TypeKind::ValueType);
    }

    #[test]
    fn test_auto_property_emits_backing_field() {
        let registry = registry();
        let string_token = registry.primitive(PrimitiveKind::String).token;
        let person = TypeBuilder::new(registry)
            .class("demo", "Person")
            .unwrap()
            .auto_property("Name", string_token)
            .unwrap()
            .no_arg_ctor()
            .unwrap()
            .finish()
            .unwrap();
        let (_, field) = person.fields.iter().next().unwrap();
        assert_eq!(field.name, "<Name>k__BackingField");
        assert!(field.compiler_generated);
        assert_eq!(person.methods.count(), 2);
    }

    #[test]
    fn test_finish_rejects_dangling_field() {
        let registry = registry();
        let result = TypeBuilder::new(registry)
            .class("demo", "Broken")
            .unwrap()
            .field("ghost", TypeToken::new(0xDEAD))
            .unwrap()
            .finish();
        assert!(matches!(result, Err(crate::Error::TypeNotFound(_))));
    }

    #[test]
    fn test_modifier_after_declaration_fails() {
        let registry = registry();
        let mut builder = TypeBuilder::new(registry).class("demo", "Late").unwrap();
        let _ = builder.token().unwrap();
        assert!(builder.sealed().is_err());
    }

    #[test]
    fn test_mutually_recursive_pair() {
        let registry = registry();
        let mut a_builder = TypeBuilder::new(registry.clone()).class("demo", "A").unwrap();
        let mut b_builder = TypeBuilder::new(registry.clone()).class("demo", "B").unwrap();
        let a_token = a_builder.token().unwrap();
        let b_token = b_builder.token().unwrap();

        let a = a_builder
            .field("b", b_token)
            .unwrap()
            .no_arg_ctor()
            .unwrap()
            .finish()
            .unwrap();
        let b = b_builder
            .field("a", a_token)
            .unwrap()
            .no_arg_ctor()
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(a.fields.iter().next().unwrap().1.field_type, b.token);
        assert_eq!(b.fields.iter().next().unwrap().1.field_type, a.token);
    }
}
