// Copyright 2025-2026 structwalk contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # structwalk
//!
//! A type-directed structural induction engine. Given a static description of an
//! aggregate data type, `structwalk` derives four procedures specialized to it:
//! a mutability classifier (static and instance-level), an acyclicity test over
//! the declared field graph, a deep copy that preserves sharing and cycles, and
//! a structural equality that terminates on cyclic graphs. Each derivation is
//! synthesized at first use and memoized for the remaining lifetime of the
//! process.
//!
//! # Architecture
//!
//! The library is organized into layers that mirror the flow from metadata to
//! derived walkers:
//!
//! - **Metadata Layer**: Type descriptors, the registry, and the builder:
//!   everything a reflective host would expose about a type (fields with
//!   read-only markers, base types, interfaces, purity attributes,
//!   compiler-generated markers), modeled explicitly
//! - **Introspection Layer**: A total, pure query facade the derivations are
//!   written against
//! - **Value Layer**: The tagged-union instance model with reference identity
//!   for objects, arrays, and function values
//! - **Derivation Layer**: The four analyzers with their process-wide
//!   specialization caches and runtime subtype dispatch
//!
//! ## Key Components
//!
//! - [`Engine`] - Main entry point: requests derivations and runs the walkers
//! - [`TypeRegistry`] - Central registry of descriptors with built-in
//!   primitives and well-known types
//! - [`TypeBuilder`] - Fluent description of client types
//! - [`Value`] - The instance model the walkers run over
//! - [`crate::prelude`] - Convenient re-exports of commonly used types
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! # Features
//!
//! - **Conservative mutability analysis** - Whitelists, blacklists, and a
//!   transitive field walk with a compiled residual predicate for the
//!   undecided cases
//! - **Structural acyclicity** - Ancestor-stack search over declared fields
//!   with a supertype rule for polymorphic slots
//! - **Sharing- and cycle-preserving deep copy** - Identity-keyed reference
//!   map, constructor binding for read-only fields, runtime subtype dispatch
//! - **Cycle-safe structural equality** - Visited-pair set closed under swap,
//!   nominal on the requested type
//! - **Thread safe** - Publish-safe specialization caches; no locks on the
//!   per-call paths
//!
//! # Usage Examples
//!
//! ```rust
//! use structwalk::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::new()?);
//! let engine = Engine::new(registry.clone());
//!
//! // Describe a self-referential node type
//! let mut builder = TypeBuilder::new(registry).class("demo", "Node")?;
//! let node = builder.token()?;
//! builder.field("next", node)?.no_arg_ctor()?.finish()?;
//!
//! assert_eq!(engine.cycles(node), Cycles::Yes);
//!
//! // Build a one-node cycle and copy it
//! let instance = ObjectInstance::new(node, 1);
//! instance.set(0, Value::Object(instance.clone()));
//! let copy = engine.copy(node, &Value::Object(instance))?;
//!
//! // The copy closes its own cycle
//! let copied = copy.as_object().unwrap();
//! assert!(Value::same_instance(&copied.get(0), &copy));
//! # Ok::<(), structwalk::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Static type metadata: tokens, descriptors, registry, and builder.
pub mod metadata;

/// Pure, total query facade over the descriptor graph.
pub mod introspect;

/// The tagged-union instance model and per-call bookkeeping.
pub mod value;

/// The derivation pipeline: mutability, cycles, copy, equality.
pub mod derive;

/// Convenient re-exports of the commonly used surface.
pub mod prelude;

/// `structwalk` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is
/// always [`crate::Error`]. Used consistently throughout the crate for all
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `structwalk` Error type.
///
/// The main error type for all operations in this crate. Provides detailed
/// error information for descriptor registration and derivation synthesis.
pub use error::Error;

/// Main entry point: one engine per descriptor graph.
pub use derive::Engine;

/// Static mutability classification of a type.
pub use derive::Mutability;

/// Structural acyclicity classification of a type.
pub use derive::Cycles;

/// Client-supplied copy walker for overrides and copier-capable types.
pub use derive::CopyHook;

/// Client-supplied replacement for zero-argument construction.
pub use derive::CreateHook;

/// Client-supplied equality implementation for equatable types.
pub use derive::EqualityHook;

/// A bound constructor returned by [`Engine::constructor`].
pub use derive::Constructor;

/// Identity token of one descriptor in a registry.
pub use metadata::token::TypeToken;

/// Central registry of type descriptors.
pub use metadata::typesystem::TypeRegistry;

/// Fluent description of client types.
pub use metadata::typesystem::TypeBuilder;

/// Immutable metadata about one declared type.
pub use metadata::typesystem::TypeDescriptor;

/// Kind taxonomy consumed by the derivations.
pub use metadata::typesystem::TypeKind;

/// Built-in primitive kinds.
pub use metadata::typesystem::PrimitiveKind;

/// Primitive instance values.
pub use metadata::typesystem::PrimitiveValue;

/// Reserved tokens of the built-in descriptors.
pub use metadata::typesystem::wellknown;

/// The tagged-union instance model.
pub use value::Value;
