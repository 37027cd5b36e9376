//! Descriptor signature hashing for instantiation deduplication.
//!
//! Synthesized descriptors (arrays, pointers, nullables, generic
//! applications) are structural: requesting `array-of-int` twice must yield
//! the same token. The registry keys its dedup table by a signature hash
//! computed here. Sequential FNV-1a style mixing keeps the hash sensitive to
//! component order and avoids the self-cancellation of XOR combination.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::metadata::token::TypeToken;
use crate::metadata::typesystem::TypeKind;

/// Hash builder for synthesized-descriptor signatures.
pub(crate) struct SignatureHash {
    /// Current hash state
    state: u64,
}

impl SignatureHash {
    /// Create a new signature hash builder seeded with the FNV-1a offset basis
    #[must_use]
    pub(crate) fn new() -> Self {
        SignatureHash {
            state: 0xcbf2_9ce4_8422_2325_u64,
        }
    }

    /// Mix a 64-bit value into the hash state
    fn mix(&mut self, value: u64) {
        self.state ^= value;
        self.state = self.state.wrapping_mul(0x0100_0000_01b3_u64);
        self.state ^= self.state >> 33;
        self.state = self.state.wrapping_mul(0xff51_afd7_ed55_8ccd_u64);
        self.state ^= self.state >> 33;
    }

    /// Add any hashable component to the signature
    #[must_use]
    pub(crate) fn add_component<T: Hash + ?Sized>(mut self, component: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        self.mix(hasher.finish());
        self
    }

    /// Add the kind of the synthesized descriptor
    #[must_use]
    pub(crate) fn add_kind(self, kind: &TypeKind) -> Self {
        self.add_component(kind)
    }

    /// Add a referenced token (element type, definition, generic argument)
    #[must_use]
    pub(crate) fn add_token(self, token: TypeToken) -> Self {
        self.add_component(&token.value())
    }

    /// Finalize the hash and return the computed signature
    #[must_use]
    pub(crate) fn finalize(self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let first = SignatureHash::new()
            .add_kind(&TypeKind::Array)
            .add_token(TypeToken::new(7))
            .finalize();
        let second = SignatureHash::new()
            .add_kind(&TypeKind::Array)
            .add_token(TypeToken::new(7))
            .finalize();
        assert_eq!(first, second, "hash should be deterministic");
    }

    #[test]
    fn test_hash_order_sensitive() {
        let first = SignatureHash::new()
            .add_token(TypeToken::new(1))
            .add_token(TypeToken::new(2))
            .finalize();
        let second = SignatureHash::new()
            .add_token(TypeToken::new(2))
            .add_token(TypeToken::new(1))
            .finalize();
        assert_ne!(first, second, "hash should be order-sensitive");
    }

    #[test]
    fn test_kind_differentiation() {
        let array = SignatureHash::new()
            .add_kind(&TypeKind::Array)
            .add_token(TypeToken::new(7))
            .finalize();
        let pointer = SignatureHash::new()
            .add_kind(&TypeKind::Pointer)
            .add_token(TypeToken::new(7))
            .finalize();
        assert_ne!(
            array, pointer,
            "different kinds over the same element should differ"
        );
    }
}
