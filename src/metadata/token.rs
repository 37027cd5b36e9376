use std::fmt;
use std::hash::{Hash, Hasher};

/// Token value below which descriptors are reserved for the built-in
/// primitives and well-known types preregistered by the registry.
pub const RESERVED_TOKEN_LIMIT: u32 = 0x0000_0100;

/// An identity token referencing one type descriptor in a registry.
///
/// Tokens are dense 32-bit values:
/// - Values below [`RESERVED_TOKEN_LIMIT`] are reserved for built-in
///   primitives and well-known types installed by the registry itself
/// - Values at or above the limit are allocated sequentially for
///   client-registered descriptors and synthesized instantiations
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeToken(pub u32);

impl TypeToken {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        TypeToken(value)
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns true if this token lies in the reserved built-in range
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0 < RESERVED_TOKEN_LIMIT
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for TypeToken {
    fn from(value: u32) -> Self {
        TypeToken(value)
    }
}

impl From<TypeToken> for u32 {
    fn from(token: TypeToken) -> Self {
        token.0
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypeToken(0x{:08x}{})",
            self.0,
            if self.is_reserved() { ", reserved" } else { "" }
        )
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_token_new() {
        let token = TypeToken::new(0x0000_0142);
        assert_eq!(token.value(), 0x0000_0142);
    }

    #[test]
    fn test_token_reserved() {
        assert!(TypeToken::new(0x0000_0001).is_reserved());
        assert!(TypeToken::new(0x0000_00FF).is_reserved());
        assert!(!TypeToken::new(RESERVED_TOKEN_LIMIT).is_reserved());
    }

    #[test]
    fn test_token_null() {
        assert!(TypeToken::new(0).is_null());
        assert!(!TypeToken::new(1).is_null());
    }

    #[test]
    fn test_token_conversions() {
        let token: TypeToken = 0x0000_0200u32.into();
        assert_eq!(token.value(), 0x0000_0200);
        let raw: u32 = token.into();
        assert_eq!(raw, 0x0000_0200);
    }

    #[test]
    fn test_token_as_map_key() {
        let mut map = HashMap::new();
        map.insert(TypeToken::new(7), "seven");
        assert_eq!(map.get(&TypeToken::new(7)), Some(&"seven"));
        assert_eq!(map.get(&TypeToken::new(8)), None);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(format!("{}", TypeToken::new(0x1F)), "0x0000001f");
    }
}
