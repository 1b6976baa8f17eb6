//! Slot descriptions
//!
//! Every slot of a [`Serializable`](super::Serializable) is described by a
//! [`PropertyInfo`]: element name and namespace, flags and the declared type
//! used when the incoming element carries no `xsi:type`.

use std::fmt;
use std::ops::BitOr;

/// Slot flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: PropertyFlags = PropertyFlags(0);
    /// Never written
    pub const TRANSIENT: PropertyFlags = PropertyFlags(1);
    /// Always written as an `href` to a shared instance
    pub const MULTI_REF: PropertyFlags = PropertyFlags(2);
    /// Only ever travels as an `href`; an inline value is rejected
    pub const REF_ONLY: PropertyFlags = PropertyFlags(4);

    #[inline]
    pub fn contains(self, other: PropertyFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for PropertyFlags {
    type Output = PropertyFlags;

    fn bitor(self, rhs: PropertyFlags) -> PropertyFlags {
        PropertyFlags(self.0 | rhs.0)
    }
}

/// Native type of a slot or value, the key of the registry's write side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeKey {
    /// No declared type; resolves to `xsd:anyType`
    #[default]
    Any,
    String,
    Int,
    Long,
    Boolean,
    Float,
    Double,
    Decimal,
    Bytes,
    DateTime,
    Vector,
    Map,
    SoapObject,
    SoapPrimitive,
    /// A domain type implementing `Serializable`
    Custom(String),
}

impl TypeKey {
    /// Key for a domain type
    pub fn custom(name: impl Into<String>) -> Self {
        TypeKey::Custom(name.into())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Custom(name) => f.write_str(name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Description of one slot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyInfo {
    /// Element name; `None` falls back to the value's type name
    pub name: Option<String>,
    /// Element namespace; `None` matches any namespace on read
    pub namespace: Option<String>,
    pub flags: PropertyFlags,
    pub type_key: TypeKey,
    /// Item description for vector slots
    pub element_type: Option<Box<PropertyInfo>>,
}

impl PropertyInfo {
    /// Untyped slot description, used where nothing is declared
    pub fn object() -> Self {
        PropertyInfo::default()
    }

    pub fn new(name: &str, type_key: TypeKey) -> Self {
        PropertyInfo {
            name: Some(name.to_string()),
            type_key,
            ..PropertyInfo::default()
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_element_type(mut self, element_type: PropertyInfo) -> Self {
        self.element_type = Some(Box::new(element_type));
        self
    }

    pub fn is_transient(&self) -> bool {
        self.flags.contains(PropertyFlags::TRANSIENT)
    }

    pub fn is_multi_ref(&self) -> bool {
        self.flags.contains(PropertyFlags::MULTI_REF)
    }

    pub fn is_ref_only(&self) -> bool {
        self.flags.contains(PropertyFlags::REF_ONLY)
    }

    /// Whether an element `{namespace}name` belongs in this slot
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.name.as_deref() == Some(name) && self.namespace.as_deref().map_or(true, |ns| ns == namespace)
    }
}
