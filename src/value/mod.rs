//! Tagged-union instance model.
//!
//! The engine derives walkers from static descriptors, but the walkers run
//! over *instances*. Since no host reflection exists, instances are modeled
//! as a tagged union: primitive leaves without identity, enum values,
//! heap-allocated objects/arrays/functions with reference identity, and an
//! explicit null. Nullable values need no variant of their own: an empty
//! nullable is [`Value::Null`] and a present one is the unwrapped element
//! value, mirroring how the platform boxes nullables.
//!
//! # Identity
//!
//! [`Value::same_instance`] is reference equality: true exactly when two
//! values are the same heap allocation (and for identity-free leaves, never).
//! The deep copier's reference map and the equality walker's visited-pair
//! set key on this identity.

mod identity;
mod object;

pub use identity::{IdentityKey, PairSet, RefMap, VisitedSet};
pub use object::{ArrayInstance, ArrayRc, FunctionInstance, FunctionRc, ObjectInstance, ObjectRc};

use std::sync::Arc;

use crate::metadata::token::TypeToken;
use crate::metadata::typesystem::{wellknown, PrimitiveKind, PrimitiveValue};

/// One instance value of the tagged-union model
#[derive(Debug, Clone)]
pub enum Value {
    /// The null reference (also the empty nullable)
    Null,
    /// A primitive leaf without identity
    Prim(PrimitiveValue),
    /// An enumeration value: declaring type plus discriminant
    Enum {
        /// Token of the enum type
        ty: TypeToken,
        /// Underlying discriminant
        value: i64,
    },
    /// An aggregate instance with reference identity
    Object(ObjectRc),
    /// An array instance with reference identity
    Array(ArrayRc),
    /// A function value with reference identity and a captured environment
    Function(FunctionRc),
}

impl Value {
    /// Shorthand for a 32-bit integer value
    #[must_use]
    pub fn from_i32(value: i32) -> Self {
        Value::Prim(PrimitiveValue::I4(value))
    }

    /// Shorthand for a 64-bit integer value
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Value::Prim(PrimitiveValue::I8(value))
    }

    /// Shorthand for a boolean value
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Value::Prim(PrimitiveValue::Boolean(value))
    }

    /// Shorthand for a string value
    #[must_use]
    pub fn from_str_value(value: &str) -> Self {
        Value::Prim(PrimitiveValue::String(value.to_string()))
    }

    /// Returns true if this is the null reference
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the primitive payload, if this is a primitive leaf
    #[must_use]
    pub fn as_prim(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Prim(prim) => Some(prim),
            _ => None,
        }
    }

    /// Borrow the object handle, if this is an object
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRc> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the array handle, if this is an array
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayRc> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Borrow the function handle, if this is a function value
    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionRc> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// The token of this value's runtime type, if it has one.
    ///
    /// Null has no runtime type; everything else maps to its concrete
    /// descriptor (primitives to the built-in tokens).
    #[must_use]
    pub fn type_token(&self) -> Option<TypeToken> {
        match self {
            Value::Null => None,
            Value::Prim(prim) => Some(primitive_token(prim.kind())),
            Value::Enum { ty, .. } => Some(*ty),
            Value::Object(object) => Some(object.runtime_type()),
            Value::Array(array) => Some(array.array_type()),
            Value::Function(function) => Some(function.function_type()),
        }
    }

    /// Reference equality: true exactly when both values are the same heap
    /// allocation. Identity-free leaves (null, primitives, enums) are never
    /// the same instance.
    #[must_use]
    pub fn same_instance(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
            (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
            (Value::Function(x), Value::Function(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

/// Map a primitive kind to its reserved registry token
#[must_use]
pub(crate) fn primitive_token(kind: PrimitiveKind) -> TypeToken {
    match kind {
        PrimitiveKind::Boolean => wellknown::BOOLEAN,
        PrimitiveKind::Char => wellknown::CHAR,
        PrimitiveKind::I1 => wellknown::I1,
        PrimitiveKind::U1 => wellknown::U1,
        PrimitiveKind::I2 => wellknown::I2,
        PrimitiveKind::U2 => wellknown::U2,
        PrimitiveKind::I4 => wellknown::I4,
        PrimitiveKind::U4 => wellknown::U4,
        PrimitiveKind::I8 => wellknown::I8,
        PrimitiveKind::U8 => wellknown::U8,
        PrimitiveKind::I => wellknown::I,
        PrimitiveKind::U => wellknown::U,
        PrimitiveKind::R4 => wellknown::R4,
        PrimitiveKind::R8 => wellknown::R8,
        PrimitiveKind::String => wellknown::STRING,
        PrimitiveKind::Decimal => wellknown::DECIMAL,
        PrimitiveKind::Date => wellknown::DATE,
        PrimitiveKind::TimeSpan => wellknown::TIME_SPAN,
        PrimitiveKind::DateOffset => wellknown::DATE_OFFSET,
        PrimitiveKind::TimeZone => wellknown::TIME_ZONE,
    }
}

impl PartialEq for Value {
    /// Shallow equality: primitives and enums by content, heap values by
    /// identity. Structural comparison lives in the equality walker, not
    /// here.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Prim(a), Value::Prim(b)) => a == b,
            (
                Value::Enum { ty: ta, value: va },
                Value::Enum { ty: tb, value: vb },
            ) => ta == tb && va == vb,
            _ => Value::same_instance(self, other),
        }
    }
}

impl From<PrimitiveValue> for Value {
    fn from(prim: PrimitiveValue) -> Self {
        Value::Prim(prim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shallow_equality_primitives() {
        assert_eq!(Value::from_i32(1), Value::from_i32(1));
        assert_ne!(Value::from_i32(1), Value::from_i32(2));
        assert_ne!(Value::from_i32(1), Value::from_i64(1));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_shallow_equality_objects_by_identity() {
        let object = ObjectInstance::new(TypeToken::new(0x200), 0);
        let same = Value::Object(object.clone());
        let other = Value::Object(ObjectInstance::new(TypeToken::new(0x200), 0));
        assert_eq!(Value::Object(object), same.clone());
        assert_ne!(same, other);
    }

    #[test]
    fn test_type_token_of_primitives() {
        assert_eq!(Value::from_i32(1).type_token(), Some(wellknown::I4));
        assert_eq!(
            Value::from_str_value("x").type_token(),
            Some(wellknown::STRING)
        );
        assert_eq!(Value::Null.type_token(), None);
    }

    #[test]
    fn test_same_instance_never_for_leaves() {
        assert!(!Value::same_instance(
            &Value::from_i32(1),
            &Value::from_i32(1)
        ));
        assert!(!Value::same_instance(&Value::Null, &Value::Null));
    }
}
