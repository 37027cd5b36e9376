use std::fmt;
use std::hash::{Hash, Hasher};

use strum::Display;

/// The closed set of built-in leaf types the engine treats as primitives.
///
/// Every kind in this enumeration is whitelisted as immutable by the
/// mutability analyzer and terminates the structural walks: none of them has
/// fields, and their values carry no reference identity. The numeric kinds
/// mirror the usual machine widths; the remaining kinds cover the immutable
/// platform leaves the derivations must recognize without inspecting
/// structure (strings, decimals, and the time family).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum PrimitiveKind {
    /// Boolean value
    Boolean,
    /// Unicode character
    Char,
    /// 8-bit signed integer
    I1,
    /// 8-bit unsigned integer
    U1,
    /// 16-bit signed integer
    I2,
    /// 16-bit unsigned integer
    U2,
    /// 32-bit signed integer
    I4,
    /// 32-bit unsigned integer
    U4,
    /// 64-bit signed integer
    I8,
    /// 64-bit unsigned integer
    U8,
    /// Platform-sized signed integer
    I,
    /// Platform-sized unsigned integer
    U,
    /// 32-bit floating point
    R4,
    /// 64-bit floating point
    R8,
    /// Immutable character string
    String,
    /// 128-bit scaled decimal
    Decimal,
    /// Calendar date with time-of-day (ticks since epoch)
    Date,
    /// Elapsed-time span (ticks)
    TimeSpan,
    /// Date with an explicit UTC offset
    DateOffset,
    /// Time-zone identity
    TimeZone,
}

impl PrimitiveKind {
    /// Returns true for the integral and floating numeric kinds
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::I1
                | PrimitiveKind::U1
                | PrimitiveKind::I2
                | PrimitiveKind::U2
                | PrimitiveKind::I4
                | PrimitiveKind::U4
                | PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::I
                | PrimitiveKind::U
                | PrimitiveKind::R4
                | PrimitiveKind::R8
        )
    }

    /// Returns true for the kinds that are value types on the platform
    /// (everything except strings and time-zone identities, which are
    /// immutable reference types)
    #[must_use]
    pub fn is_value_kind(&self) -> bool {
        !matches!(self, PrimitiveKind::String | PrimitiveKind::TimeZone)
    }

    /// The simple name of the primitive, as exposed through registry lookups
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::I1 => "SByte",
            PrimitiveKind::U1 => "Byte",
            PrimitiveKind::I2 => "Int16",
            PrimitiveKind::U2 => "UInt16",
            PrimitiveKind::I4 => "Int32",
            PrimitiveKind::U4 => "UInt32",
            PrimitiveKind::I8 => "Int64",
            PrimitiveKind::U8 => "UInt64",
            PrimitiveKind::I => "IntPtr",
            PrimitiveKind::U => "UIntPtr",
            PrimitiveKind::R4 => "Single",
            PrimitiveKind::R8 => "Double",
            PrimitiveKind::String => "String",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::Date => "DateTime",
            PrimitiveKind::TimeSpan => "TimeSpan",
            PrimitiveKind::DateOffset => "DateTimeOffset",
            PrimitiveKind::TimeZone => "TimeZoneInfo",
        }
    }
}

/// A primitive instance value.
///
/// This is the leaf case of the tagged-union value model: no identity, no
/// fields, compared by content. The variants correspond one-to-one with
/// [`PrimitiveKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// Boolean value
    Boolean(bool),
    /// Character value
    Char(char),
    /// 8-bit signed integer
    I1(i8),
    /// 8-bit unsigned integer
    U1(u8),
    /// 16-bit signed integer
    I2(i16),
    /// 16-bit unsigned integer
    U2(u16),
    /// 32-bit signed integer
    I4(i32),
    /// 32-bit unsigned integer
    U4(u32),
    /// 64-bit signed integer
    I8(i64),
    /// 64-bit unsigned integer
    U8(u64),
    /// platform isize
    I(isize),
    /// platform usize
    U(usize),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// String value
    String(String),
    /// Scaled 128-bit decimal: `mantissa * 10^(-scale)`
    Decimal {
        /// Unscaled integer mantissa
        mantissa: i128,
        /// Number of decimal digits to the right of the point
        scale: u8,
    },
    /// Date value in ticks since the platform epoch
    Date(i64),
    /// Time span in ticks
    TimeSpan(i64),
    /// Date with explicit offset from UTC
    DateOffset {
        /// Ticks since the platform epoch
        ticks: i64,
        /// Offset from UTC in minutes
        offset_minutes: i16,
    },
    /// Time-zone identity by canonical identifier
    TimeZone(String),
}

impl PrimitiveValue {
    /// The kind of this primitive value
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Boolean(_) => PrimitiveKind::Boolean,
            PrimitiveValue::Char(_) => PrimitiveKind::Char,
            PrimitiveValue::I1(_) => PrimitiveKind::I1,
            PrimitiveValue::U1(_) => PrimitiveKind::U1,
            PrimitiveValue::I2(_) => PrimitiveKind::I2,
            PrimitiveValue::U2(_) => PrimitiveKind::U2,
            PrimitiveValue::I4(_) => PrimitiveKind::I4,
            PrimitiveValue::U4(_) => PrimitiveKind::U4,
            PrimitiveValue::I8(_) => PrimitiveKind::I8,
            PrimitiveValue::U8(_) => PrimitiveKind::U8,
            PrimitiveValue::I(_) => PrimitiveKind::I,
            PrimitiveValue::U(_) => PrimitiveKind::U,
            PrimitiveValue::R4(_) => PrimitiveKind::R4,
            PrimitiveValue::R8(_) => PrimitiveKind::R8,
            PrimitiveValue::String(_) => PrimitiveKind::String,
            PrimitiveValue::Decimal { .. } => PrimitiveKind::Decimal,
            PrimitiveValue::Date(_) => PrimitiveKind::Date,
            PrimitiveValue::TimeSpan(_) => PrimitiveKind::TimeSpan,
            PrimitiveValue::DateOffset { .. } => PrimitiveKind::DateOffset,
            PrimitiveValue::TimeZone(_) => PrimitiveKind::TimeZone,
        }
    }

    /// Try to convert to a boolean value
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Boolean(value) => Some(*value),
            PrimitiveValue::I4(value) => Some(*value != 0),
            PrimitiveValue::U4(value) => Some(*value != 0),
            PrimitiveValue::I8(value) => Some(*value != 0),
            PrimitiveValue::U8(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Try to convert to a 64-bit integer value
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Boolean(value) => Some(i64::from(*value)),
            PrimitiveValue::Char(value) => Some(i64::from(u32::from(*value))),
            PrimitiveValue::I1(value) => Some(i64::from(*value)),
            PrimitiveValue::U1(value) => Some(i64::from(*value)),
            PrimitiveValue::I2(value) => Some(i64::from(*value)),
            PrimitiveValue::U2(value) => Some(i64::from(*value)),
            PrimitiveValue::I4(value) => Some(i64::from(*value)),
            PrimitiveValue::U4(value) => Some(i64::from(*value)),
            PrimitiveValue::I8(value) => Some(*value),
            PrimitiveValue::U8(value) => i64::try_from(*value).ok(),
            PrimitiveValue::I(value) => i64::try_from(*value).ok(),
            PrimitiveValue::U(value) => i64::try_from(*value).ok(),
            PrimitiveValue::Date(value) | PrimitiveValue::TimeSpan(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a 64-bit floating point value
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PrimitiveValue::R4(value) => Some(f64::from(*value)),
            PrimitiveValue::R8(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Borrow the string content, if this is a string or time-zone value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(value) | PrimitiveValue::TimeZone(value) => Some(value),
            _ => None,
        }
    }
}

impl Hash for PrimitiveValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            PrimitiveValue::Boolean(value) => value.hash(state),
            PrimitiveValue::Char(value) => value.hash(state),
            PrimitiveValue::I1(value) => value.hash(state),
            PrimitiveValue::U1(value) => value.hash(state),
            PrimitiveValue::I2(value) => value.hash(state),
            PrimitiveValue::U2(value) => value.hash(state),
            PrimitiveValue::I4(value) => value.hash(state),
            PrimitiveValue::U4(value) => value.hash(state),
            PrimitiveValue::I8(value) => value.hash(state),
            PrimitiveValue::U8(value) => value.hash(state),
            PrimitiveValue::I(value) => value.hash(state),
            PrimitiveValue::U(value) => value.hash(state),
            // NaN hashes like NaN; equality already treats it as unequal
            PrimitiveValue::R4(value) => value.to_bits().hash(state),
            PrimitiveValue::R8(value) => value.to_bits().hash(state),
            PrimitiveValue::String(value) | PrimitiveValue::TimeZone(value) => value.hash(state),
            PrimitiveValue::Decimal { mantissa, scale } => {
                mantissa.hash(state);
                scale.hash(state);
            }
            PrimitiveValue::Date(value) | PrimitiveValue::TimeSpan(value) => value.hash(state),
            PrimitiveValue::DateOffset {
                ticks,
                offset_minutes,
            } => {
                ticks.hash(state);
                offset_minutes.hash(state);
            }
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(value) => write!(f, "{value}"),
            PrimitiveValue::Char(value) => write!(f, "'{value}'"),
            PrimitiveValue::I1(value) => write!(f, "{value}"),
            PrimitiveValue::U1(value) => write!(f, "{value}"),
            PrimitiveValue::I2(value) => write!(f, "{value}"),
            PrimitiveValue::U2(value) => write!(f, "{value}"),
            PrimitiveValue::I4(value) => write!(f, "{value}"),
            PrimitiveValue::U4(value) => write!(f, "{value}"),
            PrimitiveValue::I8(value) => write!(f, "{value}"),
            PrimitiveValue::U8(value) => write!(f, "{value}"),
            PrimitiveValue::I(value) => write!(f, "{value}"),
            PrimitiveValue::U(value) => write!(f, "{value}"),
            PrimitiveValue::R4(value) => write!(f, "{value}"),
            PrimitiveValue::R8(value) => write!(f, "{value}"),
            PrimitiveValue::String(value) => write!(f, "\"{value}\""),
            PrimitiveValue::Decimal { mantissa, scale } => {
                write!(f, "{mantissa}e-{scale}")
            }
            PrimitiveValue::Date(value) => write!(f, "date({value})"),
            PrimitiveValue::TimeSpan(value) => write!(f, "timespan({value})"),
            PrimitiveValue::DateOffset {
                ticks,
                offset_minutes,
            } => write!(f, "dateoffset({ticks}, {offset_minutes}m)"),
            PrimitiveValue::TimeZone(value) => write!(f, "timezone({value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &PrimitiveValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(PrimitiveValue::I4(42).kind(), PrimitiveKind::I4);
        assert_eq!(
            PrimitiveValue::String("x".into()).kind(),
            PrimitiveKind::String
        );
        assert_eq!(
            PrimitiveValue::Decimal {
                mantissa: 1,
                scale: 2
            }
            .kind(),
            PrimitiveKind::Decimal
        );
    }

    #[test]
    fn test_as_boolean() {
        assert_eq!(PrimitiveValue::Boolean(true).as_boolean(), Some(true));
        assert_eq!(PrimitiveValue::I4(0).as_boolean(), Some(false));
        assert_eq!(PrimitiveValue::I4(7).as_boolean(), Some(true));
        assert_eq!(PrimitiveValue::String("x".into()).as_boolean(), None);
    }

    #[test]
    fn test_as_i64_widening() {
        assert_eq!(PrimitiveValue::I1(-5).as_i64(), Some(-5));
        assert_eq!(PrimitiveValue::U8(u64::MAX).as_i64(), None);
        assert_eq!(PrimitiveValue::Char('A').as_i64(), Some(65));
    }

    #[test]
    fn test_value_kind_classification() {
        assert!(PrimitiveKind::I4.is_value_kind());
        assert!(PrimitiveKind::Decimal.is_value_kind());
        assert!(!PrimitiveKind::String.is_value_kind());
        assert!(!PrimitiveKind::TimeZone.is_value_kind());
    }

    #[test]
    fn test_hash_distinguishes_kinds() {
        // Same payload bits, different kinds
        let a = PrimitiveValue::I4(1);
        let b = PrimitiveValue::U4(1);
        assert_ne!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_hash_equal_values_agree() {
        let a = PrimitiveValue::Decimal {
            mantissa: 12345,
            scale: 2,
        };
        let b = PrimitiveValue::Decimal {
            mantissa: 12345,
            scale: 2,
        };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }
}
