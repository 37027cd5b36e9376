//! Central registry of type descriptors.
//!
//! The registry owns every descriptor the engine can reason about: the
//! built-in primitives and well-known types installed at construction time,
//! the client types registered through [`crate::TypeBuilder`], and the
//! synthesized constructed types (arrays, pointers, by-refs, nullables,
//! generic instantiations) created on demand and deduplicated by signature
//! hash. All lookups and insertions are safe under concurrent access:
//! descriptors live in a lock-free ordered map, secondary name indexes in
//! hash maps, and a value installed by one thread is visible in its entirety
//! to all others.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    metadata::{
        token::{TypeToken, RESERVED_TOKEN_LIMIT},
        typesystem::{
            PrimitiveKind, SignatureHash, TypeAttributes, TypeDescriptor, TypeKind, TypeRc,
        },
    },
    Error::{TypeInsert, TypeNotFound},
    Result,
};

/// Tokens of the built-in descriptors every registry preregisters.
///
/// The reserved range is split by role: primitives, the inheritance roots,
/// the curated observation-only interfaces consumed by the purity analysis,
/// the reflection-metadata and expression families (whitelisted immutable),
/// and the well-known generic definitions with hand-written copy walkers.
#[allow(missing_docs)]
pub mod wellknown {
    use crate::metadata::token::TypeToken;

    // Primitives (tokens mirror the PrimitiveKind declaration order)
    pub const BOOLEAN: TypeToken = TypeToken(0x01);
    pub const CHAR: TypeToken = TypeToken(0x02);
    pub const I1: TypeToken = TypeToken(0x03);
    pub const U1: TypeToken = TypeToken(0x04);
    pub const I2: TypeToken = TypeToken(0x05);
    pub const U2: TypeToken = TypeToken(0x06);
    pub const I4: TypeToken = TypeToken(0x07);
    pub const U4: TypeToken = TypeToken(0x08);
    pub const I8: TypeToken = TypeToken(0x09);
    pub const U8: TypeToken = TypeToken(0x0A);
    pub const I: TypeToken = TypeToken(0x0B);
    pub const U: TypeToken = TypeToken(0x0C);
    pub const R4: TypeToken = TypeToken(0x0D);
    pub const R8: TypeToken = TypeToken(0x0E);
    pub const STRING: TypeToken = TypeToken(0x0F);
    pub const DECIMAL: TypeToken = TypeToken(0x10);
    pub const DATE: TypeToken = TypeToken(0x11);
    pub const TIME_SPAN: TypeToken = TypeToken(0x12);
    pub const DATE_OFFSET: TypeToken = TypeToken(0x13);
    pub const TIME_ZONE: TypeToken = TypeToken(0x14);

    // Inheritance roots
    pub const OBJECT: TypeToken = TypeToken(0x20);
    pub const VALUE_TYPE_ROOT: TypeToken = TypeToken(0x21);
    pub const ENUM_ROOT: TypeToken = TypeToken(0x22);
    pub const FUNCTION_ROOT: TypeToken = TypeToken(0x23);

    // Curated observation-only interfaces consumed by the purity analysis
    pub const FORMATTABLE: TypeToken = TypeToken(0x30);
    pub const CONVERTIBLE: TypeToken = TypeToken(0x31);
    pub const CLONEABLE: TypeToken = TypeToken(0x32);
    pub const COMPARABLE: TypeToken = TypeToken(0x33);
    pub const EQUATABLE: TypeToken = TypeToken(0x34);
    pub const COMPARER: TypeToken = TypeToken(0x35);
    pub const ORDERED_QUERYABLE: TypeToken = TypeToken(0x36);
    pub const ORDERED_ENUMERABLE: TypeToken = TypeToken(0x37);
    pub const QUERYABLE: TypeToken = TypeToken(0x38);
    pub const REFLECT: TypeToken = TypeToken(0x39);
    pub const SERVICE_PROVIDER: TypeToken = TypeToken(0x3A);
    pub const STRUCTURAL_EQUATABLE: TypeToken = TypeToken(0x3B);
    pub const STRUCTURAL_COMPARABLE: TypeToken = TypeToken(0x3C);
    pub const TUPLE: TypeToken = TypeToken(0x3D);
    /// Copier-capable opt-in interface: a type implementing it supplies its
    /// own `copy(refs)` through a registered hook
    pub const REPLICABLE: TypeToken = TypeToken(0x3E);

    // Reflection-metadata family (whitelisted immutable)
    pub const MEMBER_INFO: TypeToken = TypeToken(0x40);
    pub const FIELD_INFO: TypeToken = TypeToken(0x41);
    pub const METHOD_INFO: TypeToken = TypeToken(0x42);
    pub const PROPERTY_INFO: TypeToken = TypeToken(0x43);
    pub const TYPE_INFO: TypeToken = TypeToken(0x44);

    // First-class expression/AST family (whitelisted immutable)
    pub const EXPRESSION: TypeToken = TypeToken(0x48);
    pub const LAMBDA_EXPRESSION: TypeToken = TypeToken(0x49);

    // Well-known generic definitions with hand-written walkers
    pub const LIST: TypeToken = TypeToken(0x50);
    pub const KEY_VALUE_PAIR: TypeToken = TypeToken(0x51);
    pub const READ_ONLY_LIST: TypeToken = TypeToken(0x52);
    pub const NULLABLE: TypeToken = TypeToken(0x53);
    pub const ENUMERABLE: TypeToken = TypeToken(0x54);

    /// The curated interfaces whose methods are considered observation-only
    pub const CURATED_INTERFACES: &[TypeToken] = &[
        FORMATTABLE,
        CONVERTIBLE,
        CLONEABLE,
        COMPARABLE,
        EQUATABLE,
        COMPARER,
        ORDERED_QUERYABLE,
        ORDERED_ENUMERABLE,
        QUERYABLE,
        REFLECT,
        SERVICE_PROVIDER,
        STRUCTURAL_EQUATABLE,
        STRUCTURAL_COMPARABLE,
        TUPLE,
        OBJECT,
        VALUE_TYPE_ROOT,
    ];

    /// Returns true if the token belongs to the reflection-metadata family
    #[must_use]
    pub fn is_metadata_type(token: TypeToken) -> bool {
        (MEMBER_INFO.value()..=TYPE_INFO.value()).contains(&token.value())
    }

    /// Returns true if the token belongs to the expression/AST family
    #[must_use]
    pub fn is_expression_type(token: TypeToken) -> bool {
        token == EXPRESSION || token == LAMBDA_EXPRESSION
    }
}

/// Manages registration, lookup, and deduplication of type descriptors
pub struct TypeRegistry {
    /// Main storage for all descriptors by their token
    types: SkipMap<TypeToken, TypeRc>,
    /// Next available token for new descriptors
    next_token: AtomicU32,
    /// Cache of synthesized-descriptor signature hashes to tokens
    signature_cache: DashMap<u64, TypeToken>,
    /// Descriptors by name qualified with namespace
    by_fullname: DashMap<String, Vec<TypeToken>>,
    /// Descriptors by simple name (may have duplicates across namespaces)
    by_name: DashMap<String, Vec<TypeToken>>,
    /// Descriptors by namespace
    by_namespace: DashMap<String, Vec<TypeToken>>,
}

impl TypeRegistry {
    /// Create a new registry with the built-in descriptors preregistered.
    ///
    /// # Errors
    /// Returns an error if the built-in descriptors cannot be installed,
    /// which only happens if the reserved token layout is inconsistent.
    pub fn new() -> Result<Self> {
        let registry = TypeRegistry {
            types: SkipMap::new(),
            next_token: AtomicU32::new(RESERVED_TOKEN_LIMIT),
            signature_cache: DashMap::new(),
            by_fullname: DashMap::new(),
            by_name: DashMap::new(),
            by_namespace: DashMap::new(),
        };
        registry.install_builtins()?;
        Ok(registry)
    }

    /// Install primitives, roots, curated interfaces, and well-known
    /// definitions at their reserved tokens
    fn install_builtins(&self) -> Result<()> {
        use wellknown as wk;

        let primitives = [
            (wk::BOOLEAN, PrimitiveKind::Boolean),
            (wk::CHAR, PrimitiveKind::Char),
            (wk::I1, PrimitiveKind::I1),
            (wk::U1, PrimitiveKind::U1),
            (wk::I2, PrimitiveKind::I2),
            (wk::U2, PrimitiveKind::U2),
            (wk::I4, PrimitiveKind::I4),
            (wk::U4, PrimitiveKind::U4),
            (wk::I8, PrimitiveKind::I8),
            (wk::U8, PrimitiveKind::U8),
            (wk::I, PrimitiveKind::I),
            (wk::U, PrimitiveKind::U),
            (wk::R4, PrimitiveKind::R4),
            (wk::R8, PrimitiveKind::R8),
            (wk::STRING, PrimitiveKind::String),
            (wk::DECIMAL, PrimitiveKind::Decimal),
            (wk::DATE, PrimitiveKind::Date),
            (wk::TIME_SPAN, PrimitiveKind::TimeSpan),
            (wk::DATE_OFFSET, PrimitiveKind::DateOffset),
            (wk::TIME_ZONE, PrimitiveKind::TimeZone),
        ];
        for (token, kind) in primitives {
            self.insert_descriptor(TypeDescriptor::new(
                token,
                "System".into(),
                kind.name().into(),
                TypeAttributes::PUBLIC | TypeAttributes::SEALED,
                Some(TypeKind::Primitive(kind)),
                None,
            ))?;
        }

        let roots = [
            (wk::OBJECT, "Object", TypeKind::Class, None),
            (
                wk::VALUE_TYPE_ROOT,
                "ValueType",
                TypeKind::Class,
                Some(wk::OBJECT),
            ),
            (
                wk::ENUM_ROOT,
                "Enum",
                TypeKind::Class,
                Some(wk::VALUE_TYPE_ROOT),
            ),
            (
                wk::FUNCTION_ROOT,
                "MulticastDelegate",
                TypeKind::Class,
                Some(wk::OBJECT),
            ),
        ];
        for (token, name, kind, base) in roots {
            self.insert_descriptor(TypeDescriptor::new(
                token,
                "System".into(),
                name.into(),
                TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT,
                Some(kind),
                base,
            ))?;
        }

        let interfaces: [(TypeToken, &str, u32); 16] = [
            (wk::FORMATTABLE, "IFormattable", 0),
            (wk::CONVERTIBLE, "IConvertible", 0),
            (wk::CLONEABLE, "ICloneable", 0),
            (wk::COMPARABLE, "IComparable", 0),
            (wk::EQUATABLE, "IEquatable", 1),
            (wk::COMPARER, "IComparer", 1),
            (wk::ORDERED_QUERYABLE, "IOrderedQueryable", 1),
            (wk::ORDERED_ENUMERABLE, "IOrderedEnumerable", 1),
            (wk::QUERYABLE, "IQueryable", 1),
            (wk::REFLECT, "IReflect", 0),
            (wk::SERVICE_PROVIDER, "IServiceProvider", 0),
            (wk::STRUCTURAL_EQUATABLE, "IStructuralEquatable", 0),
            (wk::STRUCTURAL_COMPARABLE, "IStructuralComparable", 0),
            (wk::TUPLE, "ITuple", 0),
            (wk::REPLICABLE, "IReplicable", 0),
            (wk::ENUMERABLE, "IEnumerable", 1),
        ];
        for (token, name, arity) in interfaces {
            let descriptor = TypeDescriptor::new(
                token,
                "System".into(),
                name.into(),
                TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
                Some(TypeKind::Interface),
                None,
            );
            for index in 0..arity {
                descriptor.generic_params.push(format!("T{index}"));
            }
            self.insert_descriptor(descriptor)?;
        }

        let metadata_family = [
            (wk::MEMBER_INFO, "MemberInfo", None),
            (wk::FIELD_INFO, "FieldInfo", Some(wk::MEMBER_INFO)),
            (wk::METHOD_INFO, "MethodInfo", Some(wk::MEMBER_INFO)),
            (wk::PROPERTY_INFO, "PropertyInfo", Some(wk::MEMBER_INFO)),
            (wk::TYPE_INFO, "TypeInfo", Some(wk::MEMBER_INFO)),
            (wk::EXPRESSION, "Expression", None),
            (wk::LAMBDA_EXPRESSION, "LambdaExpression", Some(wk::EXPRESSION)),
        ];
        for (token, name, base) in metadata_family {
            self.insert_descriptor(TypeDescriptor::new(
                token,
                "System.Reflection".into(),
                name.into(),
                TypeAttributes::PUBLIC,
                Some(TypeKind::Class),
                base.or(Some(wk::OBJECT)),
            ))?;
        }

        let generic_defs = [
            (wk::LIST, "List", TypeKind::Class, wk::OBJECT, 1u32),
            (
                wk::KEY_VALUE_PAIR,
                "KeyValuePair",
                TypeKind::ValueType,
                wk::VALUE_TYPE_ROOT,
                2,
            ),
            (
                wk::READ_ONLY_LIST,
                "ReadOnlyCollection",
                TypeKind::Class,
                wk::OBJECT,
                1,
            ),
            (
                wk::NULLABLE,
                "Nullable",
                TypeKind::ValueType,
                wk::VALUE_TYPE_ROOT,
                1,
            ),
        ];
        for (token, name, kind, base, arity) in generic_defs {
            let descriptor = TypeDescriptor::new(
                token,
                "System.Collections.Generic".into(),
                name.into(),
                TypeAttributes::PUBLIC | TypeAttributes::SEALED,
                Some(kind),
                Some(base),
            );
            for index in 0..arity {
                descriptor.generic_params.push(format!("T{index}"));
            }
            self.install_wellknown_members(&descriptor);
            self.insert_descriptor(descriptor)?;
        }

        Ok(())
    }

    /// Give the well-known generic definitions the structural surface the
    /// mutability analysis needs. Field slots line up with the value layout
    /// the hand-written walkers use (pair: key then value; read-only
    /// wrapper: the inner collection at slot zero).
    fn install_wellknown_members(&self, descriptor: &TypeDescriptor) {
        use crate::metadata::typesystem::{
            FieldAttributes, FieldDescriptor, MethodAttributes, MethodDescriptor, MethodTraits,
        };

        let push_field = |name: &str, flags: u32| {
            descriptor.fields.push(Arc::new(FieldDescriptor {
                name: name.to_string(),
                flags,
                field_type: wellknown::OBJECT,
                compiler_generated: false,
            }));
        };

        match descriptor.token {
            wellknown::LIST => {
                push_field("_items", FieldAttributes::PRIVATE);
                descriptor.methods.push(Arc::new(MethodDescriptor {
                    name: "Add".into(),
                    flags: MethodAttributes::PUBLIC,
                    traits: MethodTraits::empty(),
                    params: Vec::new(),
                    origin: None,
                }));
            }
            wellknown::KEY_VALUE_PAIR => {
                push_field("key", FieldAttributes::PRIVATE | FieldAttributes::INIT_ONLY);
                push_field(
                    "value",
                    FieldAttributes::PRIVATE | FieldAttributes::INIT_ONLY,
                );
            }
            wellknown::READ_ONLY_LIST => {
                push_field("list", FieldAttributes::PRIVATE | FieldAttributes::INIT_ONLY);
            }
            _ => {}
        }
    }

    /// Allocate the next free token for a client or synthesized descriptor
    pub(crate) fn alloc_token(&self) -> TypeToken {
        TypeToken::new(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a fully built descriptor.
    ///
    /// # Errors
    /// Returns [`TypeInsert`] if the descriptor's token is already occupied.
    pub(crate) fn insert_descriptor(&self, descriptor: TypeDescriptor) -> Result<TypeRc> {
        let token = descriptor.token;
        if self.types.contains_key(&token) {
            return Err(TypeInsert(token));
        }
        let rc: TypeRc = Arc::new(descriptor);
        self.types.insert(token, rc.clone());

        self.by_fullname
            .entry(rc.fullname())
            .or_default()
            .push(token);
        self.by_name.entry(rc.name.clone()).or_default().push(token);
        self.by_namespace
            .entry(rc.namespace.clone())
            .or_default()
            .push(token);
        Ok(rc)
    }

    /// Look up a descriptor by token
    #[must_use]
    pub fn get(&self, token: TypeToken) -> Option<TypeRc> {
        self.types.get(&token).map(|entry| entry.value().clone())
    }

    /// Look up a descriptor by token, failing with [`TypeNotFound`]
    pub fn resolve(&self, token: TypeToken) -> Result<TypeRc> {
        self.get(token).ok_or(TypeNotFound(token))
    }

    /// Look up the built-in descriptor for a primitive kind
    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeRc {
        use wellknown as wk;
        let token = match kind {
            PrimitiveKind::Boolean => wk::BOOLEAN,
            PrimitiveKind::Char => wk::CHAR,
            PrimitiveKind::I1 => wk::I1,
            PrimitiveKind::U1 => wk::U1,
            PrimitiveKind::I2 => wk::I2,
            PrimitiveKind::U2 => wk::U2,
            PrimitiveKind::I4 => wk::I4,
            PrimitiveKind::U4 => wk::U4,
            PrimitiveKind::I8 => wk::I8,
            PrimitiveKind::U8 => wk::U8,
            PrimitiveKind::I => wk::I,
            PrimitiveKind::U => wk::U,
            PrimitiveKind::R4 => wk::R4,
            PrimitiveKind::R8 => wk::R8,
            PrimitiveKind::String => wk::STRING,
            PrimitiveKind::Decimal => wk::DECIMAL,
            PrimitiveKind::Date => wk::DATE,
            PrimitiveKind::TimeSpan => wk::TIME_SPAN,
            PrimitiveKind::DateOffset => wk::DATE_OFFSET,
            PrimitiveKind::TimeZone => wk::TIME_ZONE,
        };
        // Installed in new(); a missing entry is a layout bug caught in tests
        self.get(token).unwrap_or_else(|| {
            unreachable!("primitive descriptor {token} missing from registry")
        })
    }

    /// All descriptors registered under a qualified name
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Vec<TypeRc> {
        self.tokens_to_types(self.by_fullname.get(fullname))
    }

    /// All descriptors registered under a simple name
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Vec<TypeRc> {
        self.tokens_to_types(self.by_name.get(name))
    }

    /// All descriptors registered in a namespace
    #[must_use]
    pub fn get_by_namespace(&self, namespace: &str) -> Vec<TypeRc> {
        self.tokens_to_types(self.by_namespace.get(namespace))
    }

    fn tokens_to_types(
        &self,
        tokens: Option<dashmap::mapref::one::Ref<'_, String, Vec<TypeToken>>>,
    ) -> Vec<TypeRc> {
        tokens
            .map(|entry| entry.iter().filter_map(|t| self.get(*t)).collect())
            .unwrap_or_default()
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no descriptors are registered (never the case after
    /// construction; the built-ins are always present)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get or synthesize a deduplicated constructed descriptor.
    ///
    /// The builder closure runs outside any lock; the signature-cache entry
    /// decides the winner under races and losers discard their build.
    fn intern_synthesized<F>(&self, signature: u64, build: F) -> Result<TypeRc>
    where
        F: FnOnce(TypeToken) -> Result<TypeDescriptor>,
    {
        if let Some(existing) = self.signature_cache.get(&signature) {
            return self.resolve(*existing);
        }

        let token = self.alloc_token();
        let descriptor = build(token)?;
        match self.signature_cache.entry(signature) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                // Another thread won the race; discard our build
                self.resolve(*entry.get())
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let rc = self.insert_descriptor(descriptor)?;
                entry.insert(token);
                Ok(rc)
            }
        }
    }

    /// Get or create the single-dimensional array descriptor over an element.
    ///
    /// # Errors
    /// Returns [`TypeNotFound`] if the element token is not registered.
    pub fn array_of(&self, element: TypeToken) -> Result<TypeRc> {
        let elem = self.resolve(element)?;
        let signature = SignatureHash::new()
            .add_kind(&TypeKind::Array)
            .add_token(element)
            .finalize();
        self.intern_synthesized(signature, |token| {
            let descriptor = TypeDescriptor::new(
                token,
                elem.namespace.clone(),
                format!("{}[]", elem.name),
                TypeAttributes::PUBLIC | TypeAttributes::SEALED,
                Some(TypeKind::Array),
                Some(wellknown::OBJECT),
            );
            descriptor.set_element(element).ok();
            Ok(descriptor)
        })
    }

    /// Get or create the pointer descriptor over an element.
    ///
    /// # Errors
    /// Returns [`TypeNotFound`] if the element token is not registered.
    pub fn pointer_to(&self, element: TypeToken) -> Result<TypeRc> {
        self.constructed(element, TypeKind::Pointer, "*")
    }

    /// Get or create the managed by-reference descriptor over an element.
    ///
    /// # Errors
    /// Returns [`TypeNotFound`] if the element token is not registered.
    pub fn byref_of(&self, element: TypeToken) -> Result<TypeRc> {
        self.constructed(element, TypeKind::ByRef, "&")
    }

    fn constructed(&self, element: TypeToken, kind: TypeKind, suffix: &str) -> Result<TypeRc> {
        let elem = self.resolve(element)?;
        let signature = SignatureHash::new()
            .add_kind(&kind)
            .add_token(element)
            .finalize();
        self.intern_synthesized(signature, |token| {
            let descriptor = TypeDescriptor::new(
                token,
                elem.namespace.clone(),
                format!("{}{suffix}", elem.name),
                TypeAttributes::PUBLIC | TypeAttributes::SEALED,
                Some(kind),
                None,
            );
            descriptor.set_element(element).ok();
            Ok(descriptor)
        })
    }

    /// Get or create the nullable descriptor wrapping a value type.
    ///
    /// # Errors
    /// Returns [`TypeNotFound`] if the element token is not registered.
    pub fn nullable_of(&self, element: TypeToken) -> Result<TypeRc> {
        self.instantiate(wellknown::NULLABLE, &[element])
    }

    /// Get or create a generic application of a definition.
    ///
    /// Instantiations are nominal: they carry the definition link and the
    /// argument list, inherit the definition's base, and are deduplicated by
    /// signature. The nullable definition is special-cased into the
    /// [`TypeKind::Nullable`] kind with its element link set.
    ///
    /// # Errors
    /// Returns [`TypeNotFound`] for dangling tokens and a synthesis error if
    /// the argument count does not match the definition's arity.
    pub fn instantiate(&self, definition: TypeToken, args: &[TypeToken]) -> Result<TypeRc> {
        let def = self.resolve(definition)?;
        let arity = def.generic_params.count();
        if arity != args.len() {
            return Err(synthesis_error!(
                "'{}' expects {} generic arguments, got {}",
                def.fullname(),
                arity,
                args.len()
            ));
        }
        for arg in args {
            self.resolve(*arg)?;
        }

        let mut signature = SignatureHash::new()
            .add_kind(&TypeKind::GenericInstance)
            .add_token(definition);
        for arg in args {
            signature = signature.add_token(*arg);
        }

        let kind = if definition == wellknown::NULLABLE {
            TypeKind::Nullable
        } else {
            TypeKind::GenericInstance
        };

        self.intern_synthesized(signature.finalize(), |token| {
            let descriptor = TypeDescriptor::new(
                token,
                def.namespace.clone(),
                format!("{}`{}", def.name, args.len()),
                def.flags,
                Some(kind),
                def.base(),
            );
            descriptor.set_definition(definition).ok();
            for arg in args {
                descriptor.generic_args.push(*arg);
            }
            if kind == TypeKind::Nullable {
                descriptor.set_element(args[0]).ok();
            } else {
                // Instantiations are nominal but carry their definition's
                // member surface so the structural analyses see it
                for (_, field) in def.fields.iter() {
                    descriptor.fields.push(field.clone());
                }
                for (_, method) in def.methods.iter() {
                    descriptor.methods.push(method.clone());
                }
            }
            Ok(descriptor)
        })
    }

    /// The inheritance chain of a type, ordered root first, ending with the
    /// type itself. Broken links terminate the chain silently; the
    /// introspector never fails.
    #[must_use]
    pub fn ancestry(&self, token: TypeToken) -> Vec<TypeRc> {
        let mut chain = Vec::new();
        let mut current = self.get(token);
        while let Some(ty) = current {
            current = ty.base().and_then(|b| self.get(b));
            chain.push(ty);
            if chain.len() > 64 {
                // Inheritance chains are short; a longer one is a malformed
                // graph with a base cycle
                break;
            }
        }
        chain.reverse();
        chain
    }

    /// Check whether `s` is assignable to `t`: identity, inheritance,
    /// interface implementation, or boxing to the platform root.
    #[must_use]
    pub fn is_assignable(&self, s: TypeToken, t: TypeToken) -> bool {
        if s == t {
            return true;
        }
        if t == wellknown::OBJECT && self.types.contains_key(&s) {
            return true;
        }
        let Some(sd) = self.get(s) else {
            return false;
        };

        let mut current = sd.base();
        while let Some(base) = current {
            if base == t {
                return true;
            }
            current = self.get(base).and_then(|d| d.base());
        }

        self.implements(s, t)
    }

    /// Check whether `s` implements interface `t`, directly or through its
    /// base chain
    #[must_use]
    pub fn implements(&self, s: TypeToken, t: TypeToken) -> bool {
        let Some(sd) = self.get(s) else {
            return false;
        };
        for (_, iface) in sd.interfaces.iter() {
            if *iface == t {
                return true;
            }
        }
        match sd.base() {
            Some(base) => self.implements(base, t),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let registry = TypeRegistry::new().unwrap();
        assert_eq!(
            registry.primitive(PrimitiveKind::I4).token,
            wellknown::I4
        );
        assert!(registry.get(wellknown::OBJECT).is_some());
        assert!(registry.get(wellknown::LIST).is_some());
        for token in wellknown::CURATED_INTERFACES {
            assert!(registry.get(*token).is_some(), "missing {token}");
        }
    }

    #[test]
    fn test_array_deduplication() {
        let registry = TypeRegistry::new().unwrap();
        let first = registry.array_of(wellknown::I4).unwrap();
        let second = registry.array_of(wellknown::I4).unwrap();
        assert_eq!(first.token, second.token);
        assert_eq!(first.name, "Int32[]");
        assert_eq!(first.element(), Some(wellknown::I4));
    }

    #[test]
    fn test_distinct_arrays_distinct_tokens() {
        let registry = TypeRegistry::new().unwrap();
        let ints = registry.array_of(wellknown::I4).unwrap();
        let strings = registry.array_of(wellknown::STRING).unwrap();
        assert_ne!(ints.token, strings.token);
    }

    #[test]
    fn test_instantiate_arity_check() {
        let registry = TypeRegistry::new().unwrap();
        let err = registry.instantiate(wellknown::LIST, &[]);
        assert!(err.is_err());
    }

    #[test]
    fn test_instantiate_dedup_and_links() {
        let registry = TypeRegistry::new().unwrap();
        let first = registry
            .instantiate(wellknown::LIST, &[wellknown::STRING])
            .unwrap();
        let second = registry
            .instantiate(wellknown::LIST, &[wellknown::STRING])
            .unwrap();
        assert_eq!(first.token, second.token);
        assert_eq!(first.definition(), Some(wellknown::LIST));
        assert_eq!(first.generic_args.count(), 1);
    }

    #[test]
    fn test_nullable_kind() {
        let registry = TypeRegistry::new().unwrap();
        let nullable = registry.nullable_of(wellknown::I4).unwrap();
        assert_eq!(*nullable.kind(), TypeKind::Nullable);
        assert_eq!(nullable.element(), Some(wellknown::I4));
    }

    #[test]
    fn test_assignability_to_root() {
        let registry = TypeRegistry::new().unwrap();
        assert!(registry.is_assignable(wellknown::STRING, wellknown::OBJECT));
        assert!(registry.is_assignable(wellknown::ENUM_ROOT, wellknown::VALUE_TYPE_ROOT));
        assert!(!registry.is_assignable(wellknown::OBJECT, wellknown::STRING));
    }

    #[test]
    fn test_ancestry_root_first() {
        let registry = TypeRegistry::new().unwrap();
        let chain = registry.ancestry(wellknown::ENUM_ROOT);
        let names: Vec<_> = chain.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["Object", "ValueType", "Enum"]);
    }

    #[test]
    fn test_fullname_index() {
        let registry = TypeRegistry::new().unwrap();
        let hits = registry.get_by_fullname("System.String");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].token, wellknown::STRING);
    }
}
