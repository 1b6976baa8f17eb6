//! Object graph values
//!
//! [`Value`] is what the mapping engine reads and writes: scalars, primitive
//! wrappers and shared handles to objects, vectors and maps. Handles are
//! reference counted so one instance can sit in several slots; the writer
//! uses handle identity to emit `href` references and the reader hands the
//! same handle to every slot that references one id.

use super::marshal::DATE_TIME_FORMAT;
use super::object::Serializable;
use super::primitive::SoapPrimitive;
use super::property::TypeKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an object with slots
pub type ObjectRef = Rc<RefCell<dyn Serializable>>;
/// Shared handle to a sequence
pub type VectorRef = Rc<RefCell<Vec<Value>>>;
/// Shared handle to an ordered key/value list
pub type MapRef = Rc<RefCell<Vec<(Value, Value)>>>;

/// A node of the object graph
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Written as a nil element
    #[default]
    Null,
    /// Not written at all
    Skip,
    String(String),
    Int(i32),
    Long(i64),
    Boolean(bool),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Primitive(SoapPrimitive),
    Object(ObjectRef),
    Vector(VectorRef),
    Map(MapRef),
}

impl Value {
    /// Wrap an object in a new shared handle
    pub fn object<T: Serializable + 'static>(object: T) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_skip(&self) -> bool {
        matches!(self, Value::Skip)
    }

    /// Native type, as looked up in the registry when writing
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Null | Value::Skip => TypeKey::Any,
            Value::String(_) => TypeKey::String,
            Value::Int(_) => TypeKey::Int,
            Value::Long(_) => TypeKey::Long,
            Value::Boolean(_) => TypeKey::Boolean,
            Value::Float(_) => TypeKey::Float,
            Value::Double(_) => TypeKey::Double,
            Value::Decimal(_) => TypeKey::Decimal,
            Value::Bytes(_) => TypeKey::Bytes,
            Value::DateTime(_) => TypeKey::DateTime,
            Value::Primitive(_) => TypeKey::SoapPrimitive,
            Value::Object(o) => o.borrow().type_key(),
            Value::Vector(_) => TypeKey::Vector,
            Value::Map(_) => TypeKey::Map,
        }
    }

    /// Address of the shared instance behind a handle
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(o) => Some(Rc::as_ptr(o) as *const () as usize),
            Value::Vector(v) => Some(Rc::as_ptr(v) as *const () as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as *const () as usize),
            _ => None,
        }
    }

    /// Whether both values are handles to the same instance
    pub fn same_instance(&self, other: &Value) -> bool {
        self.identity().is_some() && self.identity() == other.identity()
    }

    /// Text of a string or primitive wrapper
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Primitive(p) => Some(p.value()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            Value::Int(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorRef> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this is a handle to a generic [`SoapObject`](super::SoapObject)
    pub fn is_soap_object(&self) -> bool {
        matches!(self, Value::Object(o) if o.borrow().as_soap_object().is_some())
    }
}

/// Structural equality of two objects: generic objects compare as such,
/// other types by type key and slot values
fn objects_equal(a: &dyn Serializable, b: &dyn Serializable) -> bool {
    match (a.as_soap_object(), b.as_soap_object()) {
        (Some(x), Some(y)) => x == y,
        (None, None) => {
            a.type_key() == b.type_key()
                && a.property_count() == b.property_count()
                && (0..a.property_count()).all(|i| a.property(i) == b.property(i))
        }
        _ => false,
    }
}

impl PartialEq for Value {
    /// Scalars by value, handles by identity or else by structure.
    /// Structural comparison does not terminate on cyclic graphs.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Skip, Value::Skip) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || objects_equal(&*a.borrow(), &*b.borrow()),
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

/// `label{slot=value; ...}`, nested generic objects inline without a slot name
pub(crate) fn fmt_object(object: &dyn Serializable, label: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{{", label)?;
    for i in 0..object.property_count() {
        let info = object.property_info(i);
        let value = object.property(i);
        match info.name {
            Some(name) => write!(f, "{}={}; ", name, value)?,
            None => write!(f, "{}", value)?,
        }
    }
    f.write_str("}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Skip => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Float(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Decimal(n) => write!(f, "{}", n),
            Value::Bytes(b) => f.write_str(&STANDARD.encode(b)),
            Value::DateTime(d) => write!(f, "{}", d.format(DATE_TIME_FORMAT)),
            Value::Primitive(p) => write!(f, "{}", p),
            Value::Object(o) => {
                let object = o.borrow();
                match object.as_soap_object() {
                    Some(so) => write!(f, "{}", so),
                    None => fmt_object(&*object, &object.type_key().to_string(), f),
                }
            }
            Value::Vector(v) => {
                f.write_str("[")?;
                for (i, item) in v.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (key, value)) in m.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Decimal(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::DateTime(d)
    }
}

impl From<SoapPrimitive> for Value {
    fn from(p: SoapPrimitive) -> Self {
        Value::Primitive(p)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
