//! Property model
//!
//! [`Serializable`] is the indexable slot provider the mapping engine walks:
//! a fixed number of slots, each with a [`PropertyInfo`] and a [`Value`].
//! Domain types implement it by hand; [`SoapObject`] is the dynamically
//! shaped implementation used for unknown types and response templates.

use super::attributes::{AttributeContainer, AttributeInfo};
use super::property::{PropertyInfo, TypeKey};
use super::value::{fmt_object, Value};
use crate::error::{Error, Result};
use std::fmt;

/// An object the mapping engine can read and write slot by slot
pub trait Serializable: fmt::Debug {
    /// Native type, resolved to a qualified XML type name by the registry
    fn type_key(&self) -> TypeKey;

    fn property_count(&self) -> usize;

    /// Value of slot `index`
    fn property(&self, index: usize) -> Value;

    fn set_property(&mut self, index: usize, value: Value);

    /// Name, namespace, flags and declared type of slot `index`
    fn property_info(&self, index: usize) -> PropertyInfo;

    /// XML attributes, for types that carry them
    fn attributes(&self) -> Option<&AttributeContainer> {
        None
    }

    fn attributes_mut(&mut self) -> Option<&mut AttributeContainer> {
        None
    }

    /// Character data next to the slots
    fn inner_text(&self) -> Option<&str> {
        None
    }

    fn set_inner_text(&mut self, _text: String) {}

    /// Downcast to the generic implementation
    fn as_soap_object(&self) -> Option<&SoapObject> {
        None
    }

    fn as_soap_object_mut(&mut self) -> Option<&mut SoapObject> {
        None
    }
}

#[derive(Debug, Clone)]
struct Property {
    info: PropertyInfo,
    value: Value,
}

impl Property {
    /// Slot name, or the type name of a nested generic object
    fn effective_name(&self) -> Option<String> {
        if let Some(name) = &self.info.name {
            return Some(name.clone());
        }
        match &self.value {
            Value::Object(o) => o.borrow().as_soap_object().map(|so| so.name.clone()),
            _ => None,
        }
    }
}

/// Generic object node: a qualified type name and an ordered list of slots
#[derive(Debug, Clone, Default)]
pub struct SoapObject {
    namespace: String,
    name: String,
    properties: Vec<Property>,
    attributes: AttributeContainer,
    inner_text: Option<String>,
}

impl SoapObject {
    pub fn new(namespace: &str, name: &str) -> Self {
        SoapObject {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..SoapObject::default()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a slot named `name`; its declared type is the value's type
    pub fn add_property(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let info = PropertyInfo::new(name, value.type_key());
        self.add_property_info(info, value)
    }

    pub fn add_property_with_namespace(&mut self, namespace: &str, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let info = PropertyInfo::new(name, value.type_key()).with_namespace(namespace);
        self.add_property_info(info, value)
    }

    /// Append a slot only when a value is present
    pub fn add_property_if_value(&mut self, name: &str, value: Option<Value>) -> &mut Self {
        if let Some(value) = value {
            self.add_property(name, value);
        }
        self
    }

    pub fn add_property_info(&mut self, info: PropertyInfo, value: Value) -> &mut Self {
        self.properties.push(Property { info, value });
        self
    }

    /// Append a nested generic object, written under its own type name
    pub fn add_soap_object(&mut self, object: SoapObject) -> &mut Self {
        let info = PropertyInfo {
            type_key: TypeKey::SoapObject,
            ..PropertyInfo::default()
        };
        self.add_property_info(info, Value::object(object))
    }

    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| p.effective_name().as_deref() == Some(name))
    }

    fn property_index_ns(&self, namespace: &str, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| p.info.matches(namespace, name))
    }

    /// Value of the first slot named `name`
    pub fn property_by_name(&self, name: &str) -> Result<Value> {
        self.property_safely(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))
    }

    pub fn property_by_ns(&self, namespace: &str, name: &str) -> Result<Value> {
        self.property_index_ns(namespace, name)
            .map(|i| self.properties[i].value.clone())
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))
    }

    pub fn property_safely(&self, name: &str) -> Option<Value> {
        self.property_index(name).map(|i| self.properties[i].value.clone())
    }

    pub fn property_safely_or(&self, name: &str, default: Value) -> Value {
        self.property_safely(name).unwrap_or(default)
    }

    /// Text of slot `name`, or an empty string when absent or null
    pub fn property_safely_as_string(&self, name: &str) -> String {
        match self.property_safely(name) {
            Some(Value::Null) | None => String::new(),
            Some(value) => value.to_string(),
        }
    }

    /// Slot `name` when it holds a scalar rather than an object or container
    pub fn primitive_property(&self, name: &str) -> Result<Value> {
        let value = self.property_by_name(name)?;
        Ok(match value {
            Value::Object(_) | Value::Vector(_) | Value::Map(_) => Value::Null,
            other => other,
        })
    }

    /// Text of a scalar slot, or an empty string
    pub fn primitive_property_as_string(&self, name: &str) -> String {
        match self.primitive_property(name) {
            Ok(Value::Null) | Err(_) => String::new(),
            Ok(value) => value.to_string(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property_index(name).is_some()
    }

    pub fn has_property_ns(&self, namespace: &str, name: &str) -> bool {
        self.property_index_ns(namespace, name).is_some()
    }

    /// Replace the value of slot `name`
    pub fn set_property_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .property_index(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))?;
        self.properties[index].value = value.into();
        Ok(())
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeContainer {
        &mut self.attributes
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) -> &mut Self {
        self.attributes.add(name, value);
        self
    }

    pub fn inner_text(&self) -> Option<&str> {
        self.inner_text.as_deref()
    }

    pub fn set_inner_text(&mut self, text: impl Into<String>) {
        self.inner_text = Some(text.into());
    }

    /// Copy with the same slots; nested generic objects are copied too,
    /// other handles stay shared
    pub fn new_instance(&self) -> SoapObject {
        let properties = self
            .properties
            .iter()
            .map(|p| {
                let value = match (&p.info.name, &p.value) {
                    (None, Value::Object(o)) => match o.borrow().as_soap_object() {
                        Some(nested) => Value::object(nested.new_instance()),
                        None => p.value.clone(),
                    },
                    _ => p.value.clone(),
                };
                Property {
                    info: p.info.clone(),
                    value,
                }
            })
            .collect();

        SoapObject {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            properties,
            attributes: self.attributes.clone(),
            inner_text: self.inner_text.clone(),
        }
    }

    /// Shape of this object, shareable across threads
    pub fn to_template(&self) -> SoapObjectTemplate {
        SoapObjectTemplate::from(self)
    }
}

impl Serializable for SoapObject {
    fn type_key(&self) -> TypeKey {
        TypeKey::SoapObject
    }

    fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn property(&self, index: usize) -> Value {
        self.properties
            .get(index)
            .map(|p| p.value.clone())
            .unwrap_or_default()
    }

    fn set_property(&mut self, index: usize, value: Value) {
        if let Some(p) = self.properties.get_mut(index) {
            p.value = value;
        }
    }

    fn property_info(&self, index: usize) -> PropertyInfo {
        self.properties
            .get(index)
            .map(|p| p.info.clone())
            .unwrap_or_default()
    }

    fn attributes(&self) -> Option<&AttributeContainer> {
        Some(&self.attributes)
    }

    fn attributes_mut(&mut self) -> Option<&mut AttributeContainer> {
        Some(&mut self.attributes)
    }

    fn inner_text(&self) -> Option<&str> {
        self.inner_text.as_deref()
    }

    fn set_inner_text(&mut self, text: String) {
        self.inner_text = Some(text);
    }

    fn as_soap_object(&self) -> Option<&SoapObject> {
        Some(self)
    }

    fn as_soap_object_mut(&mut self) -> Option<&mut SoapObject> {
        Some(self)
    }
}

impl PartialEq for SoapObject {
    /// Same qualified name, same slots in the same order and equal attributes
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .zip(&other.properties)
                .all(|(a, b)| a.effective_name() == b.effective_name() && a.value == b.value)
            && self.attributes == other.attributes
    }
}

impl fmt::Display for SoapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_object(self, &self.name, f)
    }
}

impl From<SoapObject> for Value {
    fn from(object: SoapObject) -> Self {
        Value::object(object)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TemplateSlot {
    Property(PropertyInfo),
    Nested(SoapObjectTemplate),
}

/// Expected response shape registered for a qualified name.
///
/// Holds slot descriptions only; each instantiation starts with null slots
/// that the reader fills by element name.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapObjectTemplate {
    namespace: String,
    name: String,
    slots: Vec<TemplateSlot>,
    attributes: Vec<AttributeInfo>,
}

impl SoapObjectTemplate {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fresh object with this shape
    pub fn instantiate(&self) -> SoapObject {
        let mut object = SoapObject::new(&self.namespace, &self.name);
        for slot in &self.slots {
            match slot {
                TemplateSlot::Property(info) => {
                    object.add_property_info(info.clone(), Value::Null);
                }
                TemplateSlot::Nested(template) => {
                    object.add_soap_object(template.instantiate());
                }
            }
        }
        for attribute in &self.attributes {
            object.attributes.add_info(attribute.clone());
        }
        object
    }
}

impl From<&SoapObject> for SoapObjectTemplate {
    fn from(object: &SoapObject) -> Self {
        let slots = object
            .properties
            .iter()
            .map(|p| {
                let nested = match (&p.info.name, &p.value) {
                    (None, Value::Object(o)) => o.borrow().as_soap_object().map(SoapObjectTemplate::from),
                    _ => None,
                };
                match nested {
                    Some(template) => TemplateSlot::Nested(template),
                    None => TemplateSlot::Property(p.info.clone()),
                }
            })
            .collect();

        SoapObjectTemplate {
            namespace: object.namespace.clone(),
            name: object.name.clone(),
            slots,
            attributes: object.attributes.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn person() -> SoapObject {
        let mut p = SoapObject::new("urn:people", "Person");
        p.add_property("name", "Ada").add_property("age", 36);
        p
    }

    #[test]
    fn test_lookup() {
        let p = person();
        assert_eq!(p.property_by_name("age").unwrap(), Value::Int(36));
        assert!(p.property_by_name("height").is_err());
        assert_eq!(p.property_safely_as_string("name"), "Ada");
        assert_eq!(p.property_safely_as_string("height"), "");
        assert_eq!(p.property_safely_or("height", Value::Int(0)), Value::Int(0));
        assert!(p.has_property("name"));
        assert_eq!(p.property_info(1).type_key, TypeKey::Int);
    }

    #[test]
    fn test_namespaced_lookup() {
        let mut p = SoapObject::new("", "x");
        p.add_property_with_namespace("urn:a", "v", 1);
        p.add_property_with_namespace("urn:b", "v", 2);
        assert_eq!(p.property_by_ns("urn:b", "v").unwrap(), Value::Int(2));
        assert!(!p.has_property_ns("urn:c", "v"));
    }

    #[test]
    fn test_primitive_property() {
        let mut p = person();
        p.add_soap_object(SoapObject::new("urn:people", "Address"));
        assert_eq!(p.primitive_property_as_string("age"), "36");
        assert_eq!(p.primitive_property("Address").unwrap(), Value::Null);
        assert_eq!(p.primitive_property_as_string("Address"), "");
    }

    #[test]
    fn test_display() {
        let mut p = person();
        let mut address = SoapObject::new("urn:people", "Address");
        address.add_property("city", "London");
        p.add_soap_object(address);
        assert_eq!(p.to_string(), "Person{name=Ada; age=36; Address{city=London; }}");
    }

    #[test]
    fn test_equality() {
        let a = person();
        let mut b = person();
        assert_eq!(a, b);

        b.set_property_by_name("age", 37).unwrap();
        assert_ne!(a, b);

        let mut c = person();
        c.add_attribute("lang", "en");
        assert_ne!(a, c);
    }

    #[test]
    fn test_new_instance_copies_nested_objects() {
        let mut p = person();
        p.add_soap_object(SoapObject::new("urn:people", "Address"));

        let copy = p.new_instance();
        assert_eq!(copy, p);
        assert!(!copy.property(2).same_instance(&p.property(2)));
    }

    #[test]
    fn test_template_instantiates_null_slots() {
        let mut p = person();
        p.add_attribute("lang", "en");
        let mut address = SoapObject::new("urn:people", "Address");
        address.add_property("city", "London");
        p.add_soap_object(address);

        let fresh = p.to_template().instantiate();
        assert_eq!(fresh.property_count(), 3);
        assert_eq!(fresh.property(0), Value::Null);
        assert_eq!(fresh.property_info(1).type_key, TypeKey::Int);
        assert_eq!(fresh.attributes().get("lang").unwrap(), "en");

        let nested = fresh.property(2);
        let nested = nested.as_object().unwrap().borrow();
        assert_eq!(nested.property(0), Value::Null);
    }
}
