//! # Type System Base Types
//!
//! Foundational building blocks of the descriptor model: the kind taxonomy,
//! field/method/constructor descriptors, and the attribute bitmask modules.
//! Everything here is immutable metadata; descriptors are built once through
//! [`crate::TypeBuilder`] and shared behind `Arc` for the lifetime of the
//! registry.
//!
//! ## Core Components
//!
//! - [`TypeKind`] - Categorizes types (primitives, arrays, classes, generic
//!   definitions and applications, pointers, managed references, ...)
//! - [`FieldDescriptor`] - One declared field: name, flags, declared type
//! - [`MethodDescriptor`] - One declared method with its purity-relevant traits
//! - [`CtorDescriptor`] - One declared constructor with its parameter list
//! - [`TypeAttributes`] / [`FieldAttributes`] / [`MethodAttributes`] -
//!   raw bitmask constants
//!
//! ## Kind Taxonomy
//!
//! The derivations never inspect a concrete host runtime; they are driven by
//! the kind of each descriptor plus its fields and element links. The kind
//! distinguishes exactly the cases the walkers treat differently: primitives
//! terminate, arrays and functions are blacklisted mutable, value types carry
//! no identity, nullables delegate to their element, and interfaces/abstract
//! classes defer to runtime dispatch.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use strum::Display;

use crate::metadata::token::TypeToken;
use crate::metadata::typesystem::PrimitiveKind;

/// A vector that holds field descriptors
pub type FieldList = Arc<boxcar::Vec<FieldRc>>;
/// Reference to a [`FieldDescriptor`]
pub type FieldRc = Arc<FieldDescriptor>;
/// A vector that holds method descriptors
pub type MethodList = Arc<boxcar::Vec<MethodRc>>;
/// Reference to a [`MethodDescriptor`]
pub type MethodRc = Arc<MethodDescriptor>;
/// A vector that holds constructor descriptors
pub type CtorList = Arc<boxcar::Vec<CtorRc>>;
/// Reference to a [`CtorDescriptor`]
pub type CtorRc = Arc<CtorDescriptor>;
/// A vector of type tokens (interface lists, generic argument lists)
pub type TokenList = Arc<boxcar::Vec<TypeToken>>;

#[allow(non_snake_case)]
/// All possible flags for type descriptors
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Use this mask to retrieve class semantics information
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// Type is a class
    pub const CLASS: u32 = 0x0000_0000;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Type is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Type cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Type name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
}

#[allow(non_snake_case)]
/// All possible flags for field descriptors
pub mod FieldAttributes {
    /// Use this mask to retrieve accessibility information
    pub const ACCESS_MASK: u32 = 0x0000_0007;
    /// Field is accessible only by the declaring type
    pub const PRIVATE: u32 = 0x0000_0001;
    /// Field is accessible by derived types
    pub const FAMILY: u32 = 0x0000_0004;
    /// Field is accessible by all code
    pub const PUBLIC: u32 = 0x0000_0006;
    /// Field belongs to the type rather than to instances
    pub const STATIC: u32 = 0x0000_0010;
    /// Field is assignable only from a constructor of the declaring type
    pub const INIT_ONLY: u32 = 0x0000_0020;
    /// Field is a compile-time constant
    pub const LITERAL: u32 = 0x0000_0040;
}

#[allow(non_snake_case)]
/// All possible flags for method descriptors
pub mod MethodAttributes {
    /// Use this mask to retrieve accessibility information
    pub const ACCESS_MASK: u32 = 0x0000_0007;
    /// Method is accessible only by the declaring type
    pub const PRIVATE: u32 = 0x0000_0001;
    /// Method is accessible by derived types
    pub const FAMILY: u32 = 0x0000_0004;
    /// Method is accessible by all code
    pub const PUBLIC: u32 = 0x0000_0006;
    /// Method belongs to the type rather than to instances
    pub const STATIC: u32 = 0x0000_0010;
    /// Method is virtual
    pub const VIRTUAL: u32 = 0x0000_0040;
    /// Method name is special (accessors, operators)
    pub const SPECIAL_NAME: u32 = 0x0000_0800;
}

bitflags! {
    /// Purity-relevant markers a method descriptor carries beyond its raw
    /// attribute flags. These correspond to custom attributes and
    /// compiler-emitted markers on the original member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodTraits: u8 {
        /// The member was emitted by the compiler (accessor bodies, closures)
        const COMPILER_GENERATED = 0b0000_0001;
        /// The member declares a purity attribute
        const PURE               = 0b0000_0010;
        /// The member is a property get accessor
        const GETTER             = 0b0000_0100;
        /// The member is a property set accessor
        const SETTER             = 0b0000_1000;
    }
}

/// Categorizes a type descriptor for the derivation walkers.
///
/// The taxonomy covers the full kind classification: plain types, generic
/// definitions (unbound) and applications (bound), pointers, managed
/// references, type parameters, plus the structural kinds the walkers
/// special-case (arrays, nullables, functions, primitives, enums).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TypeKind {
    /// An unbound generic type parameter
    Parameter,
    /// A built-in primitive leaf
    Primitive(PrimitiveKind),
    /// An enumeration subtype
    Enum,
    /// A user-declared value type
    ValueType,
    /// A plain reference type
    Class,
    /// An interface type
    Interface,
    /// An unbound generic type definition
    GenericDefinition,
    /// A bound generic type application
    GenericInstance,
    /// A single-dimensional array; element on the descriptor
    Array,
    /// An unmanaged pointer; element on the descriptor
    Pointer,
    /// A managed by-reference; element on the descriptor
    ByRef,
    /// A nullable wrapper around a value type; element on the descriptor
    Nullable,
    /// A function or closure type
    Function,
}

impl TypeKind {
    /// Returns true if this kind is a built-in primitive leaf
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeKind::Primitive(_))
    }

    /// Returns true if instances of this kind carry reference identity
    #[must_use]
    pub fn is_reference_kind(&self) -> bool {
        match self {
            TypeKind::Class
            | TypeKind::Interface
            | TypeKind::Array
            | TypeKind::Function
            | TypeKind::GenericDefinition => true,
            TypeKind::Primitive(kind) => !kind.is_value_kind(),
            // Generic instances depend on their definition; the descriptor
            // query resolves through the base chain
            _ => false,
        }
    }

    /// Returns true if this kind carries an element type on the descriptor
    #[must_use]
    pub fn has_element(&self) -> bool {
        matches!(
            self,
            TypeKind::Array | TypeKind::Pointer | TypeKind::ByRef | TypeKind::Nullable
        )
    }
}

/// One declared field of a type descriptor.
///
/// Carries exactly the metadata the derivations consume: the declared name
/// (possibly a compiler-generated backing-field name), the attribute flags,
/// the declared field type, and the compiler-generated marker used to
/// validate backing-field name normalization.
pub struct FieldDescriptor {
    /// Declared field name, including any backing-field mangling
    pub name: String,
    /// Bitmask of type [`FieldAttributes`]
    pub flags: u32,
    /// Token of the declared field type
    pub field_type: TypeToken,
    /// The compiler-generated marker attribute is present on this field
    pub compiler_generated: bool,
}

impl FieldDescriptor {
    /// Returns true if the field belongs to the type rather than to instances
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }

    /// Returns true if the field is assignable only from a constructor
    #[must_use]
    pub fn is_init_only(&self) -> bool {
        self.flags & FieldAttributes::INIT_ONLY != 0
    }

    /// Returns true if the field is accessible by all code
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags & FieldAttributes::ACCESS_MASK == FieldAttributes::PUBLIC
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldDescriptor({} : {}{}{})",
            self.name,
            self.field_type,
            if self.is_init_only() { ", init-only" } else { "" },
            if self.is_static() { ", static" } else { "" },
        )
    }
}

/// One declared parameter of a constructor or method
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    /// Declared parameter name
    pub name: String,
    /// Token of the declared parameter type
    pub param_type: TypeToken,
}

/// One declared constructor of a type descriptor
#[derive(Debug)]
pub struct CtorDescriptor {
    /// Bitmask of type [`MethodAttributes`]
    pub flags: u32,
    /// Ordered parameter list
    pub params: Vec<ParamDescriptor>,
}

impl CtorDescriptor {
    /// Returns true if this constructor takes no parameters
    #[must_use]
    pub fn is_no_arg(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns true if the constructor is accessible outside the declaring type
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.flags & MethodAttributes::ACCESS_MASK != MethodAttributes::PRIVATE
    }
}

/// One declared method of a type descriptor.
///
/// Only the purity-relevant surface is modeled: name, attribute flags, the
/// trait markers, the parameter types, and the interface whose contract the
/// method fulfills (if it is an interface implementation).
#[derive(Debug)]
pub struct MethodDescriptor {
    /// Declared method name
    pub name: String,
    /// Bitmask of type [`MethodAttributes`]
    pub flags: u32,
    /// Purity-relevant markers
    pub traits: MethodTraits,
    /// Ordered parameter list
    pub params: Vec<ParamDescriptor>,
    /// Token of the interface whose contract this method fulfills, if any
    pub origin: Option<TypeToken>,
}

impl MethodDescriptor {
    /// Returns true if the method belongs to the type rather than to instances
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & MethodAttributes::STATIC != 0
    }

    /// Returns true if the method is accessible only by the declaring type
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.flags & MethodAttributes::ACCESS_MASK == MethodAttributes::PRIVATE
    }

    /// Returns true if any parameter is declared with the given type
    #[must_use]
    pub fn accepts(&self, token: TypeToken) -> bool {
        self.params.iter().any(|p| p.param_type == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_flags() {
        let field = FieldDescriptor {
            name: "value".into(),
            flags: FieldAttributes::PUBLIC | FieldAttributes::INIT_ONLY,
            field_type: TypeToken::new(1),
            compiler_generated: false,
        };
        assert!(field.is_public());
        assert!(field.is_init_only());
        assert!(!field.is_static());
    }

    #[test]
    fn test_private_field_not_public() {
        let field = FieldDescriptor {
            name: "state".into(),
            flags: FieldAttributes::PRIVATE,
            field_type: TypeToken::new(1),
            compiler_generated: false,
        };
        assert!(!field.is_public());
    }

    #[test]
    fn test_kind_predicates() {
        assert!(TypeKind::Primitive(PrimitiveKind::I4).is_primitive());
        assert!(!TypeKind::Class.is_primitive());
        assert!(TypeKind::Array.is_reference_kind());
        assert!(TypeKind::Array.has_element());
        assert!(!TypeKind::ValueType.is_reference_kind());
        assert!(TypeKind::Primitive(PrimitiveKind::String).is_reference_kind());
        assert!(!TypeKind::Primitive(PrimitiveKind::I4).is_reference_kind());
    }

    #[test]
    fn test_method_accepts() {
        let method = MethodDescriptor {
            name: "Combine".into(),
            flags: MethodAttributes::PUBLIC | MethodAttributes::STATIC,
            traits: MethodTraits::empty(),
            params: vec![ParamDescriptor {
                name: "other".into(),
                param_type: TypeToken::new(9),
            }],
            origin: None,
        };
        assert!(method.accepts(TypeToken::new(9)));
        assert!(!method.accepts(TypeToken::new(10)));
        assert!(method.is_static());
    }

    #[test]
    fn test_ctor_no_arg() {
        let ctor = CtorDescriptor {
            flags: MethodAttributes::PUBLIC,
            params: Vec::new(),
        };
        assert!(ctor.is_no_arg());
        assert!(ctor.is_accessible());

        let private = CtorDescriptor {
            flags: MethodAttributes::PRIVATE,
            params: Vec::new(),
        };
        assert!(!private.is_accessible());
    }
}
