//! Type registry
//!
//! Maps qualified XML type names to native types, templates and codecs for
//! the read path, and native types back to qualified names for the write
//! path. One registry is built per SOAP version; it is immutable while a
//! message is being read or written and can be shared between threads once
//! set up.

use super::marshal::DefaultMarshal;
use super::object::{Serializable, SoapObject, SoapObjectTemplate};
use super::property::{PropertyInfo, TypeKey};
use super::read::SoapReader;
use super::value::{ObjectRef, Value};
use super::write::SoapWriter;
use crate::error::Result;
use crate::soap::SoapVersion;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Codec that takes full control of reading and writing one type's content
pub trait Marshal: fmt::Debug + Send + Sync {
    /// Read the element the parser is positioned on. Called on its start
    /// tag; must return on its end tag.
    fn read_instance(
        &self,
        reader: &mut SoapReader<'_>,
        namespace: &str,
        name: &str,
        expected: &PropertyInfo,
    ) -> Result<Value>;

    /// Write attributes and content of `value` inside an open start tag
    fn write_instance(&self, writer: &mut SoapWriter<'_>, value: &Value) -> Result<()>;

    /// `(namespace, name, type)` triples this codec handles
    fn mappings(&self, registry: &TypeRegistry) -> Vec<(String, String, TypeKey)>;
}

/// Constructor of a registered native type
pub type Factory = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// What a qualified type name reads into
#[derive(Clone)]
pub enum Mapping {
    /// Native type; without a factory only the built-in generic object and
    /// vector types can be read
    Type { key: TypeKey, factory: Option<Factory> },
    /// Expected shape of a generic object
    Template(Arc<SoapObjectTemplate>),
    Marshal(Arc<dyn Marshal>),
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::Type { key, factory } => f
                .debug_struct("Type")
                .field("key", key)
                .field("factory", &factory.is_some())
                .finish(),
            Mapping::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Mapping::Marshal(marshal) => f.debug_tuple("Marshal").field(marshal).finish(),
        }
    }
}

/// Qualified name and codec a native type is written with
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub namespace: String,
    pub name: String,
    pub marshal: Option<Arc<dyn Marshal>>,
}

/// Bidirectional map between qualified XML type names and native types
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    version: SoapVersion,
    by_qname: HashMap<(String, String), Mapping>,
    by_type: HashMap<TypeKey, TypeEntry>,
    default_marshal: Arc<dyn Marshal>,
}

impl TypeRegistry {
    /// Registry with the SOAP-ENC array type and the default scalar codec
    pub fn new(version: SoapVersion) -> Self {
        let default_marshal: Arc<dyn Marshal> = Arc::new(DefaultMarshal);
        let mut registry = TypeRegistry {
            version,
            by_qname: HashMap::new(),
            by_type: HashMap::new(),
            default_marshal: default_marshal.clone(),
        };
        registry.add_mapping(version.enc(), "Array", TypeKey::Vector);
        registry.register_marshal(default_marshal);
        registry
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// Schema namespace of this registry's SOAP version
    pub fn xsd(&self) -> &'static str {
        self.version.xsd()
    }

    pub fn xsi(&self) -> &'static str {
        self.version.xsi()
    }

    pub fn enc(&self) -> &'static str {
        self.version.enc()
    }

    /// Codec for text-only values: strings, ints, longs, booleans and
    /// primitive wrappers
    pub fn default_marshal(&self) -> &Arc<dyn Marshal> {
        &self.default_marshal
    }

    /// Map `{namespace}name` to a native type in both directions
    pub fn add_mapping(&mut self, namespace: &str, name: &str, key: TypeKey) {
        self.by_qname.insert(
            (namespace.to_string(), name.to_string()),
            Mapping::Type {
                key: key.clone(),
                factory: None,
            },
        );
        self.by_type.insert(
            key,
            TypeEntry {
                namespace: namespace.to_string(),
                name: name.to_string(),
                marshal: None,
            },
        );
    }

    /// Map `{namespace}name` to a domain type built with `Default`
    pub fn add_type<T>(&mut self, namespace: &str, name: &str)
    where
        T: Serializable + Default + 'static,
    {
        let key = T::default().type_key();
        self.add_factory(namespace, name, key, || -> ObjectRef { Rc::new(RefCell::new(T::default())) });
    }

    /// Map `{namespace}name` to a type produced by `factory`
    pub fn add_factory<F>(&mut self, namespace: &str, name: &str, key: TypeKey, factory: F)
    where
        F: Fn() -> ObjectRef + Send + Sync + 'static,
    {
        self.by_qname.insert(
            (namespace.to_string(), name.to_string()),
            Mapping::Type {
                key: key.clone(),
                factory: Some(Arc::new(factory)),
            },
        );
        self.by_type.insert(
            key,
            TypeEntry {
                namespace: namespace.to_string(),
                name: name.to_string(),
                marshal: None,
            },
        );
    }

    /// Register the shape of a generic object as the template for its
    /// qualified name. Read side only.
    pub fn add_template(&mut self, template: &SoapObject) {
        self.by_qname.insert(
            (template.namespace().to_string(), template.name().to_string()),
            Mapping::Template(Arc::new(template.to_template())),
        );
    }

    /// Register a codec under every name it reports
    pub fn add_marshal<M: Marshal + 'static>(&mut self, marshal: M) {
        self.register_marshal(Arc::new(marshal));
    }

    fn register_marshal(&mut self, marshal: Arc<dyn Marshal>) {
        for (namespace, name, key) in marshal.mappings(self) {
            self.by_qname
                .insert((namespace.clone(), name.clone()), Mapping::Marshal(marshal.clone()));
            self.by_type.insert(
                key,
                TypeEntry {
                    namespace,
                    name,
                    marshal: Some(marshal.clone()),
                },
            );
        }
    }

    /// Read-side entry for `{namespace}name`
    pub fn lookup(&self, namespace: &str, name: &str) -> Option<&Mapping> {
        self.by_qname.get(&(namespace.to_string(), name.to_string()))
    }

    /// Write-side entry for a native type
    pub fn entry_for_type(&self, key: &TypeKey) -> Option<&TypeEntry> {
        self.by_type.get(key)
    }

    /// Qualified name a native type is written as
    pub fn qname_for_type(&self, key: &TypeKey) -> Option<(&str, &str)> {
        self.by_type
            .get(key)
            .map(|entry| (entry.namespace.as_str(), entry.name.as_str()))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new(SoapVersion::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::marshal::FloatMarshal;
    use crate::soap::ns;

    #[derive(Debug, Default)]
    struct Point {
        x: i32,
    }

    impl Serializable for Point {
        fn type_key(&self) -> TypeKey {
            TypeKey::custom("Point")
        }

        fn property_count(&self) -> usize {
            1
        }

        fn property(&self, _index: usize) -> Value {
            Value::Int(self.x)
        }

        fn set_property(&mut self, _index: usize, value: Value) {
            self.x = value.as_int().unwrap_or_default();
        }

        fn property_info(&self, _index: usize) -> PropertyInfo {
            PropertyInfo::new("x", TypeKey::Int)
        }
    }

    #[test]
    fn test_builtin_mappings() {
        let registry = TypeRegistry::new(SoapVersion::V11);
        assert!(matches!(
            registry.lookup(ns::ENC, "Array"),
            Some(Mapping::Type { key: TypeKey::Vector, .. })
        ));
        assert!(matches!(registry.lookup(ns::XSD, "string"), Some(Mapping::Marshal(_))));
        assert_eq!(registry.qname_for_type(&TypeKey::Int), Some((ns::XSD, "int")));
        assert_eq!(registry.qname_for_type(&TypeKey::Double), None);
    }

    #[test]
    fn test_version_specific_schema() {
        let registry = TypeRegistry::new(SoapVersion::V10);
        assert_eq!(registry.qname_for_type(&TypeKey::String), Some((ns::XSD1999, "string")));
        assert!(registry.lookup(ns::XSD, "string").is_none());
    }

    #[test]
    fn test_opt_in_marshal() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        registry.add_marshal(FloatMarshal);
        assert_eq!(registry.qname_for_type(&TypeKey::Double), Some((ns::XSD, "double")));
        assert!(registry.entry_for_type(&TypeKey::Decimal).unwrap().marshal.is_some());
    }

    #[test]
    fn test_native_type_factory() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        registry.add_type::<Point>("urn:geo", "Point");

        let Some(Mapping::Type { key, factory: Some(factory) }) = registry.lookup("urn:geo", "Point") else {
            panic!("Point not registered");
        };
        assert_eq!(*key, TypeKey::custom("Point"));
        assert_eq!(factory().borrow().property_count(), 1);
        assert_eq!(registry.qname_for_type(&TypeKey::custom("Point")), Some(("urn:geo", "Point")));
    }

    #[test]
    fn test_template_is_read_only() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        let mut shape = SoapObject::new("urn:t", "Reply");
        shape.add_property("code", 0);
        registry.add_template(&shape);

        assert!(matches!(registry.lookup("urn:t", "Reply"), Some(Mapping::Template(_))));
        assert_eq!(registry.qname_for_type(&TypeKey::SoapObject), None);
    }
}
