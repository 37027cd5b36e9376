//! # structwalk Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the structwalk library. Import this module to get quick access to the
//! essential types for describing type graphs and running the derivations.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all structwalk operations
pub use crate::Error;

/// The result type used throughout structwalk
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The derivation engine
pub use crate::Engine;

/// Central registry of type descriptors
pub use crate::metadata::typesystem::TypeRegistry;

/// Fluent description of client types
pub use crate::metadata::typesystem::TypeBuilder;

// ================================================================================================
// Metadata System - Core Types
// ================================================================================================

/// Identity token for descriptors
pub use crate::metadata::token::TypeToken;

/// Descriptor, kind taxonomy, and member descriptors
pub use crate::metadata::typesystem::{
    CtorDescriptor, FieldAttributes, FieldDescriptor, MethodAttributes, MethodDescriptor,
    MethodTraits, ParamDescriptor, TypeAttributes, TypeDescriptor, TypeKind,
};

/// Built-in primitives and the reserved well-known tokens
pub use crate::metadata::typesystem::{wellknown, PrimitiveKind, PrimitiveValue};

// ================================================================================================
// Introspection
// ================================================================================================

/// Pure, total query facade over the descriptor graph
pub use crate::introspect::Introspector;

// ================================================================================================
// Value Model
// ================================================================================================

/// The tagged-union instance model
pub use crate::value::Value;

/// Heap instances with reference identity
pub use crate::value::{ArrayInstance, FunctionInstance, ObjectInstance};

/// Per-call bookkeeping: reference map and visited sets
pub use crate::value::{IdentityKey, PairSet, RefMap, VisitedSet};

// ================================================================================================
// Derivations
// ================================================================================================

/// Classification results
pub use crate::derive::{Cycles, Mutability};

/// Client-supplied hooks and bound constructors
pub use crate::derive::{Constructor, CopyHook, CreateHook, EqualityHook};
