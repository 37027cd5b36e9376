//! Descriptor-based type system driving the derivations.
//!
//! This module provides the static description of types the engine inducts
//! over: immutable [`TypeDescriptor`] metadata held in a [`TypeRegistry`],
//! constructed through the fluent [`TypeBuilder`]. It corresponds to what a
//! reflective host platform would expose about each type: fields with
//! read-only markers, base types, declared interfaces, constructors, method
//! surfaces with purity markers, and the kind taxonomy.
//!
//! # Key Components
//!
//! - [`TypeDescriptor`]: Core descriptor combining identity, kind, and members
//! - [`TypeRegistry`]: Central registry with built-in primitives and
//!   well-known types preregistered
//! - [`TypeBuilder`]: Builder pattern for describing client types
//! - [`PrimitiveKind`] / [`PrimitiveValue`]: Built-in leaf types and values
//! - [`TypeKind`]: Kind classification consumed by the walkers
//!
//! # Examples
//!
//! ```rust
//! use structwalk::{TypeBuilder, TypeRegistry, PrimitiveKind};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::new()?);
//! let int_token = registry.primitive(PrimitiveKind::I4).token;
//!
//! let point = TypeBuilder::new(registry.clone())
//!     .value_type("demo", "Point")?
//!     .init_only_field("x", int_token)?
//!     .init_only_field("y", int_token)?
//!     .ctor(&[("x", int_token), ("y", int_token)])?
//!     .finish()?;
//! assert_eq!(point.fullname(), "demo.Point");
//! # Ok::<(), structwalk::Error>(())
//! ```

mod base;
mod builder;
mod hashsig;
mod primitives;
mod registry;

use std::sync::{Arc, OnceLock};

pub use base::{
    CtorDescriptor, CtorList, CtorRc, FieldAttributes, FieldDescriptor, FieldList, FieldRc,
    MethodAttributes, MethodDescriptor, MethodList, MethodRc, MethodTraits, ParamDescriptor,
    TokenList, TypeAttributes, TypeKind,
};
pub use builder::TypeBuilder;
pub use primitives::{PrimitiveKind, PrimitiveValue};
pub use registry::{wellknown, TypeRegistry};

pub(crate) use hashsig::SignatureHash;

use crate::metadata::token::TypeToken;

/// Reference to a [`TypeDescriptor`]
pub type TypeRc = Arc<TypeDescriptor>;

/// Immutable metadata about one declared type.
///
/// A descriptor combines everything the derivation pipeline needs to know
/// about a type: identity (token, namespace, name), kind, attribute flags,
/// declared members, the base link, implemented interfaces, and the element
/// or definition links for constructed types. Descriptors are created by the
/// registry (built-ins, synthesized arrays and instantiations) or by clients
/// through [`TypeBuilder`], and never change after registration; the
/// `OnceLock` links exist only to allow forward references while a graph of
/// mutually recursive types is being described.
pub struct TypeDescriptor {
    /// Token identifying this descriptor in its registry
    pub token: TypeToken,
    /// Namespace (can be empty)
    pub namespace: String,
    /// Simple type name
    pub name: String,
    /// Bitmask of type [`TypeAttributes`]
    pub flags: u32,
    /// Computed type kind - lazily determined from flags and links
    kind: OnceLock<TypeKind>,
    /// This type's base aka 'extends' link
    base: OnceLock<TypeToken>,
    /// Element type for arrays, pointers, by-refs, and nullables
    element: OnceLock<TypeToken>,
    /// Generic definition this instantiation was built from
    definition: OnceLock<TypeToken>,
    /// All declared fields (instance and static)
    pub fields: FieldList,
    /// All declared methods (constructors excluded)
    pub methods: MethodList,
    /// All declared constructors
    pub ctors: CtorList,
    /// All interfaces this type implements directly
    pub interfaces: TokenList,
    /// Names of declared generic parameters (definitions only)
    pub generic_params: Arc<boxcar::Vec<String>>,
    /// Generic arguments (instantiations only)
    pub generic_args: TokenList,
    /// The type declares a purity attribute
    pub pure: bool,
}

impl TypeDescriptor {
    /// Create a new descriptor.
    ///
    /// ## Arguments
    /// * `token` - The token for this type
    /// * `namespace` - The namespace of the type
    /// * `name` - The name of the type
    /// * `flags` - Type attribute flags
    /// * `kind` - Optional explicit kind. If None, the kind will be computed lazily
    /// * `base` - Base type link if known at construction time
    #[must_use]
    pub(crate) fn new(
        token: TypeToken,
        namespace: String,
        name: String,
        flags: u32,
        kind: Option<TypeKind>,
        base: Option<TypeToken>,
    ) -> Self {
        let kind_lock = OnceLock::new();
        if let Some(explicit_kind) = kind {
            kind_lock.set(explicit_kind).ok();
        }

        let base_lock = OnceLock::new();
        if let Some(base_value) = base {
            base_lock.set(base_value).ok();
        }

        TypeDescriptor {
            token,
            namespace,
            name,
            flags,
            kind: kind_lock,
            base: base_lock,
            element: OnceLock::new(),
            definition: OnceLock::new(),
            fields: Arc::new(boxcar::Vec::new()),
            methods: Arc::new(boxcar::Vec::new()),
            ctors: Arc::new(boxcar::Vec::new()),
            interfaces: Arc::new(boxcar::Vec::new()),
            generic_params: Arc::new(boxcar::Vec::new()),
            generic_args: Arc::new(boxcar::Vec::new()),
            pure: false,
        }
    }

    /// Set the base type of this type.
    ///
    /// # Errors
    ///
    /// Returns `Err(base)` if a base type was already set for this type.
    pub fn set_base(&self, base: TypeToken) -> Result<(), TypeToken> {
        self.base.set(base)
    }

    /// Access the base type link of this type, if it exists
    #[must_use]
    pub fn base(&self) -> Option<TypeToken> {
        self.base.get().copied()
    }

    /// Set the element type of this type (arrays, pointers, by-refs, nullables).
    ///
    /// # Errors
    ///
    /// Returns `Err(element)` if an element type was already set.
    pub fn set_element(&self, element: TypeToken) -> Result<(), TypeToken> {
        self.element.set(element)
    }

    /// Access the element type link, if it exists
    #[must_use]
    pub fn element(&self) -> Option<TypeToken> {
        self.element.get().copied()
    }

    /// Set the generic definition this instantiation was built from.
    ///
    /// # Errors
    ///
    /// Returns `Err(definition)` if a definition was already set.
    pub fn set_definition(&self, definition: TypeToken) -> Result<(), TypeToken> {
        self.definition.set(definition)
    }

    /// Access the generic definition link, if it exists
    #[must_use]
    pub fn definition(&self) -> Option<TypeToken> {
        self.definition.get().copied()
    }

    /// Get the computed type kind - determined lazily from flags and links
    pub fn kind(&self) -> &TypeKind {
        self.kind.get_or_init(|| self.compute_kind())
    }

    /// Compute the type kind based on flags and links
    fn compute_kind(&self) -> TypeKind {
        // 1. Interface flag has highest priority
        if self.flags & TypeAttributes::INTERFACE != 0 {
            return TypeKind::Interface;
        }

        // 2. Constructed types carry an element link
        if self.element.get().is_some() {
            return TypeKind::Array;
        }

        // 3. Classify through the base link against the well-known roots
        match self.base() {
            Some(base) if base == wellknown::ENUM_ROOT => TypeKind::Enum,
            Some(base) if base == wellknown::VALUE_TYPE_ROOT => TypeKind::ValueType,
            Some(base) if base == wellknown::FUNCTION_ROOT => TypeKind::Function,
            _ if self.generic_params.count() > 0 => TypeKind::GenericDefinition,
            _ => TypeKind::Class,
        }
    }

    /// Returns the full name (Namespace.Name) of the descriptor
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// Returns true if the type cannot be subclassed.
    ///
    /// Value types, enums, primitives, arrays, and functions are sealed by
    /// construction; classes are sealed when they carry the flag.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        if self.flags & TypeAttributes::SEALED != 0 {
            return true;
        }
        matches!(
            self.kind(),
            TypeKind::Primitive(_)
                | TypeKind::Enum
                | TypeKind::ValueType
                | TypeKind::Array
                | TypeKind::Nullable
                | TypeKind::Function
        )
    }

    /// Returns true if the type is abstract or an interface
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0 || *self.kind() == TypeKind::Interface
    }

    /// Iterate the declared instance fields, skipping statics and literals
    pub fn instance_fields(&self) -> impl Iterator<Item = FieldRc> + '_ {
        self.fields.iter().map(|(_, f)| f.clone()).filter(|f| {
            !f.is_static() && f.flags & FieldAttributes::LITERAL == 0
        })
    }

    /// Returns true if the descriptor declares an accessible no-argument
    /// constructor. Value-kind descriptors always have an implicit one.
    #[must_use]
    pub fn has_no_arg_ctor(&self) -> bool {
        match self.kind() {
            TypeKind::Primitive(_)
            | TypeKind::Enum
            | TypeKind::ValueType
            | TypeKind::Nullable => true,
            _ => self
                .ctors
                .iter()
                .any(|(_, c)| c.is_no_arg() && c.is_accessible()),
        }
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeDescriptor({} @ {})", self.fullname(), self.token)
    }
}
