//! Static type metadata: tokens and the descriptor-based type system.
//!
//! Everything the derivation pipeline knows about a type flows through this
//! module. Clients describe their types once (via
//! [`crate::TypeBuilder`]) and the engine reads the resulting
//! [`typesystem::TypeDescriptor`] graph; nothing here ever touches instance
//! data.

/// Opaque descriptor tokens used to identify registered types.
pub mod token;
pub mod typesystem;
