//! Write path: object graph values into XML elements
//!
//! Shared instances are found before anything is written. Every slot holding
//! an instance reached more than once, and every slot flagged MULTI_REF or
//! REF_ONLY, becomes an empty element with `href="#oN"`. The instances
//! themselves are written once each, in encounter order, after the root
//! element as its siblings. A reference back to the root points at `o0`.

use super::attributes::AttributeInfo;
use super::object::Serializable;
use super::property::PropertyInfo;
use super::registry::{Marshal, TypeRegistry};
use super::value::{ObjectRef, Value, VectorRef};
use super::EnvelopeOptions;
use crate::error::{Error, Result};
use crate::soap::SoapVersion;
use crate::writer::XmlWriter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
struct RefState {
    /// Index into the multi-ref list once an id was handed out
    id: Option<usize>,
    /// Number of slots holding the instance
    count: usize,
    written: bool,
}

/// Qualified type name and codec of a value
type TypeInfo = (String, String, Option<Arc<dyn Marshal>>);

/// Mapping engine state for writing one message
pub struct SoapWriter<'a> {
    xml: &'a mut XmlWriter,
    registry: &'a TypeRegistry,
    options: &'a EnvelopeOptions,
    version: SoapVersion,
    refs: HashMap<usize, RefState>,
    /// Instances by id: `o0` is the root
    order: Vec<Value>,
}

impl<'a> SoapWriter<'a> {
    pub fn new(xml: &'a mut XmlWriter, registry: &'a TypeRegistry, options: &'a EnvelopeOptions) -> Self {
        SoapWriter {
            xml,
            registry,
            options,
            version: registry.version(),
            refs: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The underlying XML writer, for codecs
    pub fn xml(&mut self) -> &mut XmlWriter {
        &mut *self.xml
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// Qualified type name and codec `value` is written with
    fn type_info(&self, value: &Value) -> TypeInfo {
        if let Value::Primitive(primitive) = value {
            return (
                primitive.namespace().to_string(),
                primitive.name().to_string(),
                Some(self.registry.default_marshal().clone()),
            );
        }

        let key = match value {
            Value::Object(object) => {
                let object = object.borrow();
                if let Some(so) = object.as_soap_object() {
                    return (so.namespace().to_string(), so.name().to_string(), None);
                }
                object.type_key()
            }
            other => other.type_key(),
        };

        match self.registry.entry_for_type(&key) {
            Some(entry) => (entry.namespace.clone(), entry.name.clone(), entry.marshal.clone()),
            None => (self.registry.xsd().to_string(), "anyType".to_string(), None),
        }
    }

    /// Values directly reachable from `value`
    fn children(value: &Value) -> Vec<Value> {
        match value {
            Value::Object(object) => {
                let object = object.borrow();
                let children: Vec<Value> = (0..object.property_count())
                    .filter(|&i| !object.property_info(i).is_transient())
                    .map(|i| object.property(i))
                    .collect();
                children
            }
            Value::Vector(items) => items.borrow().clone(),
            Value::Map(entries) => entries
                .borrow()
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Count the slots holding each shared instance
    fn count_refs(&mut self, value: &Value) {
        let Some(key) = value.identity() else {
            return;
        };
        let state = self.refs.entry(key).or_default();
        state.count += 1;
        if state.count > 1 {
            return;
        }
        for child in Self::children(value) {
            self.count_refs(&child);
        }
    }

    /// Id of a shared instance, handing out the next one on first use
    fn id_for(&mut self, value: &Value) -> usize {
        let key = value.identity().unwrap_or_default();
        let state = self.refs.entry(key).or_default();
        match state.id {
            Some(id) => id,
            None => {
                let id = self.order.len();
                state.id = Some(id);
                self.order.push(value.clone());
                trace!(id, "multi-ref id assigned");
                id
            }
        }
    }

    fn is_written(&self, value: &Value) -> bool {
        value
            .identity()
            .and_then(|key| self.refs.get(&key))
            .is_some_and(|state| state.written)
    }

    fn mark_written(&mut self, value: &Value) {
        if let Some(key) = value.identity() {
            self.refs.entry(key).or_default().written = true;
        }
    }

    /// `prefix:name`, or the bare name for the empty namespace
    fn qname_value(&mut self, namespace: &str, name: &str, include_default: bool) -> Result<String> {
        if namespace.is_empty() {
            return Ok(name.to_string());
        }
        let prefix = self.xml.ensure_prefix(namespace, include_default)?;
        Ok(if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", prefix, name)
        })
    }

    fn write_type(&mut self, namespace: &str, name: &str) -> Result<()> {
        let value = self.qname_value(namespace, name, true)?;
        let xsi = self.version.xsi();
        self.xml.attribute(Some(xsi), "type", &value)?;
        Ok(())
    }

    /// Write `root` as the body element, followed by any instances that
    /// were only referenced
    pub fn write_body(&mut self, root: &Value) -> Result<()> {
        self.refs.clear();
        self.order.clear();
        self.count_refs(root);
        self.order.push(root.clone());
        if let Some(key) = root.identity() {
            let state = self.refs.entry(key).or_default();
            state.id = Some(0);
            state.written = true;
        }

        let (namespace, name, marshal) = self.type_info(root);
        let tag_namespace = if self.options.dot_net { "" } else { namespace.as_str() };
        self.xml.start_tag(Some(tag_namespace), &name)?;
        if self.options.dot_net {
            self.xml.attribute(None, "xmlns", &namespace)?;
        }
        if self.options.add_adornments {
            let enc = self.version.enc();
            self.xml.attribute(None, "id", "o0")?;
            self.xml.attribute(Some(enc), "root", "1")?;
        }
        self.write_element(root, &PropertyInfo::object(), marshal.as_deref())?;
        self.xml.end_tag(Some(tag_namespace), &name)?;

        self.write_referenced()
    }

    /// Shared instances, written as siblings of the root
    fn write_referenced(&mut self) -> Result<()> {
        let mut index = 1;
        while index < self.order.len() {
            let value = self.order[index].clone();
            if !self.is_written(&value) {
                self.mark_written(&value);
                let (namespace, name, marshal) = self.type_info(&value);
                self.xml.start_tag(Some(&namespace), &name)?;
                self.xml.attribute(None, "id", &format!("o{}", index))?;
                if self.options.add_adornments {
                    let enc = self.version.enc();
                    self.xml.attribute(Some(enc), "root", "0")?;
                }
                if !self.options.implicit_types {
                    self.write_type(&namespace, &name)?;
                }
                self.write_element(&value, &PropertyInfo::object(), marshal.as_deref())?;
                self.xml.end_tag(Some(&namespace), &name)?;
            }
            index += 1;
        }
        Ok(())
    }

    /// Write `value` as a complete element `{namespace}name`
    pub fn write_named(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        value: &Value,
        info: &PropertyInfo,
    ) -> Result<()> {
        if value.is_skip() {
            return Ok(());
        }
        self.xml.start_tag(namespace, name)?;
        self.write_property(value, info)?;
        self.xml.end_tag(namespace, name)?;
        Ok(())
    }

    /// Attributes and content of a slot element whose start tag is open
    pub fn write_property(&mut self, value: &Value, info: &PropertyInfo) -> Result<()> {
        match value {
            Value::Skip => return Ok(()),
            Value::Null => {
                let label = if self.version == SoapVersion::V10 { "null" } else { "nil" };
                let xsi = self.version.xsi();
                self.xml.attribute(Some(xsi), label, "true")?;
                return Ok(());
            }
            _ => {}
        }

        let by_reference = info.is_multi_ref() || info.is_ref_only();
        match value.identity() {
            Some(key) => {
                let shared = self
                    .refs
                    .get(&key)
                    .is_some_and(|state| state.count > 1 || state.written);
                if by_reference || shared {
                    let id = self.id_for(value);
                    self.xml.attribute(None, "href", &format!("#o{}", id))?;
                    return Ok(());
                }
            }
            None if info.is_ref_only() => {
                return Err(Error::UnsupportedValue(format!(
                    "{} ({}) in a reference-only slot",
                    value,
                    value.type_key()
                )));
            }
            None => {}
        }

        let (namespace, name, marshal) = self.type_info(value);
        if !self.options.implicit_types || value.type_key() != info.type_key {
            self.write_type(&namespace, &name)?;
        }
        self.write_element(value, info, marshal.as_deref())
    }

    fn write_element(&mut self, value: &Value, info: &PropertyInfo, marshal: Option<&dyn Marshal>) -> Result<()> {
        if let Some(marshal) = marshal {
            return marshal.write_instance(self, value);
        }
        match value {
            Value::Object(object) => {
                self.write_attributes(object)?;
                self.write_object_body(object)
            }
            Value::Vector(items) => self.write_vector_body(items, info.element_type.as_deref()),
            other => Err(Error::UnsupportedValue(format!("{} ({})", other, other.type_key()))),
        }
    }

    fn write_attributes(&mut self, object: &ObjectRef) -> Result<()> {
        let attributes: Vec<AttributeInfo> = object
            .borrow()
            .attributes()
            .map(|a| a.iter().cloned().collect())
            .unwrap_or_default();
        for attribute in &attributes {
            self.xml
                .attribute(attribute.namespace.as_deref(), &attribute.name, &attribute.value)?;
        }
        Ok(())
    }

    /// One element per slot, in slot order, then the inner text
    pub fn write_object_body(&mut self, object: &ObjectRef) -> Result<()> {
        let (slots, inner_text) = {
            let object = object.borrow();
            let slots: Vec<(PropertyInfo, Value)> = (0..object.property_count())
                .map(|i| (object.property_info(i), object.property(i)))
                .collect();
            (slots, object.inner_text().map(str::to_string))
        };

        for (info, value) in &slots {
            if info.is_transient() || value.is_skip() || (value.is_null() && self.options.skip_null_properties) {
                continue;
            }

            let (type_namespace, type_name, _) = self.type_info(value);
            let name = info.name.clone().unwrap_or(type_name);
            let namespace = match &info.namespace {
                Some(ns) if !ns.is_empty() => Some(ns.clone()),
                _ if value.is_soap_object() => Some(type_namespace),
                other => other.clone(),
            };

            self.xml.start_tag(namespace.as_deref(), &name)?;
            self.write_property(value, info)?;
            self.xml.end_tag(namespace.as_deref(), &name)?;
        }

        if let Some(text) = inner_text {
            self.xml.cdsect(&text)?;
        }
        Ok(())
    }

    /// SOAP array content: `arrayType` and one element per non-null item;
    /// an item after a gap carries its `position`
    pub fn write_vector_body(&mut self, items: &VectorRef, element_type: Option<&PropertyInfo>) -> Result<()> {
        let any = PropertyInfo::object();
        let element_type = element_type.unwrap_or(&any);
        let (tag, mut items_namespace) = match &element_type.name {
            Some(name) => (name.clone(), element_type.namespace.clone()),
            None => ("item".to_string(), None),
        };

        let items = items.borrow().clone();
        let (array_namespace, array_name) = match self.registry.qname_for_type(&element_type.type_key) {
            Some((namespace, name)) => (namespace.to_string(), name.to_string()),
            None => (self.registry.xsd().to_string(), "anyType".to_string()),
        };

        let enc = self.version.enc();
        if !self.options.implicit_types {
            let qname = self.qname_value(&array_namespace, &array_name, false)?;
            self.xml
                .attribute(Some(enc), "arrayType", &format!("{}[{}]", qname, items.len()))?;
        } else if items_namespace.is_none() {
            items_namespace = Some(array_namespace);
        }

        let mut skipped = false;
        for (i, item) in items.iter().enumerate() {
            if item.is_null() || item.is_skip() {
                skipped = true;
                continue;
            }
            self.xml.start_tag(items_namespace.as_deref(), &tag)?;
            if skipped {
                self.xml.attribute(Some(enc), "position", &format!("[{}]", i))?;
                skipped = false;
            }
            self.write_property(item, element_type)?;
            self.xml.end_tag(items_namespace.as_deref(), &tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::marshal::HashtableMarshal;
    use crate::serialization::property::{PropertyFlags, TypeKey};
    use crate::serialization::SoapObject;
    use crate::soap::ns;
    use pretty_assertions::assert_eq;

    const BODY_OPEN: &str = concat!(
        r#"<Body xmlns:i="http://www.w3.org/2001/XMLSchema-instance" "#,
        r#"xmlns:d="http://www.w3.org/2001/XMLSchema" "#,
        r#"xmlns:c="http://schemas.xmlsoap.org/soap/encoding/">"#
    );

    fn write_with(root: &Value, registry: &TypeRegistry, options: &EnvelopeOptions) -> Result<String> {
        let mut xml = XmlWriter::default();
        xml.set_prefix("i", ns::XSI)?;
        xml.set_prefix("d", ns::XSD)?;
        xml.set_prefix("c", ns::ENC)?;
        xml.start_tag(None, "Body")?;
        SoapWriter::new(&mut xml, registry, options).write_body(root)?;
        xml.end_tag(None, "Body")?;

        let out = xml.as_str();
        let inner = out
            .strip_prefix(BODY_OPEN)
            .and_then(|rest| rest.strip_suffix("</Body>"))
            .unwrap_or(out);
        Ok(inner.to_string())
    }

    fn write(root: &Value) -> String {
        write_with(root, &TypeRegistry::new(SoapVersion::V11), &EnvelopeOptions::default()).unwrap()
    }

    fn point(x: i32) -> SoapObject {
        let mut p = SoapObject::new("urn:t", "Pt");
        p.add_property("x", x);
        p
    }

    #[test]
    fn test_typed_slots() {
        let mut person = SoapObject::new("urn:t", "Person");
        person.add_property("name", "Ada").add_property("age", 36);
        assert_eq!(
            write(&Value::from(person)),
            concat!(
                r#"<n0:Person id="o0" c:root="1" xmlns:n0="urn:t">"#,
                r#"<name i:type="d:string">Ada</name><age i:type="d:int">36</age>"#,
                r#"</n0:Person>"#
            )
        );
    }

    #[test]
    fn test_implicit_types_without_adornments() {
        let mut person = SoapObject::new("urn:t", "Person");
        person.add_property("name", "Ada");
        person.add_property_info(PropertyInfo::new("age", TypeKey::Long), Value::Int(36));
        let options = EnvelopeOptions {
            implicit_types: true,
            add_adornments: false,
            ..EnvelopeOptions::default()
        };
        let out = write_with(&Value::from(person), &TypeRegistry::new(SoapVersion::V11), &options).unwrap();
        assert_eq!(
            out,
            r#"<n0:Person xmlns:n0="urn:t"><name>Ada</name><age i:type="d:int">36</age></n0:Person>"#
        );
    }

    #[test]
    fn test_nil_and_skip() {
        let mut holder = SoapObject::new("urn:t", "H");
        holder.add_property("a", Value::Null).add_property("b", Value::Skip);
        assert_eq!(
            write(&Value::from(holder.clone())),
            r#"<n0:H id="o0" c:root="1" xmlns:n0="urn:t"><a i:nil="true" /></n0:H>"#
        );

        let options = EnvelopeOptions {
            skip_null_properties: true,
            ..EnvelopeOptions::default()
        };
        let out = write_with(&Value::from(holder), &TypeRegistry::new(SoapVersion::V11), &options).unwrap();
        assert_eq!(out, r#"<n0:H id="o0" c:root="1" xmlns:n0="urn:t" />"#);
    }

    #[test]
    fn test_sparse_vector() {
        let mut holder = SoapObject::new("urn:t", "H");
        holder.add_property("list", Value::vector(vec![1.into(), Value::Null, Value::Null, 4.into()]));
        assert_eq!(
            write(&Value::from(holder)),
            concat!(
                r#"<n0:H id="o0" c:root="1" xmlns:n0="urn:t">"#,
                r#"<list i:type="c:Array" c:arrayType="d:anyType[4]">"#,
                r#"<item i:type="d:int">1</item>"#,
                r#"<item c:position="[3]" i:type="d:int">4</item>"#,
                r#"</list></n0:H>"#
            )
        );
    }

    #[test]
    fn test_shared_instance_written_as_sibling() {
        let shared = Value::from(point(1));
        let mut holder = SoapObject::new("urn:t", "H");
        holder.add_property("a", shared.clone()).add_property("b", shared);
        assert_eq!(
            write(&Value::from(holder)),
            concat!(
                r##"<n0:H id="o0" c:root="1" xmlns:n0="urn:t">"##,
                r##"<n0:a href="#o1" /><n0:b href="#o1" />"##,
                r##"</n0:H>"##,
                r#"<n1:Pt id="o1" c:root="0" i:type="n1:Pt" xmlns:n1="urn:t">"#,
                r#"<x i:type="d:int">1</x></n1:Pt>"#
            )
        );
    }

    #[test]
    fn test_self_reference_points_at_root() {
        let mut node = SoapObject::new("urn:t", "N");
        node.add_property("me", Value::Null);
        let node = Value::from(node);
        node.as_object().unwrap().borrow_mut().set_property(0, node.clone());

        let out = write(&node);
        node.as_object().unwrap().borrow_mut().set_property(0, Value::Null);
        assert_eq!(
            out,
            r##"<n0:N id="o0" c:root="1" xmlns:n0="urn:t"><n0:me href="#o0" /></n0:N>"##
        );
    }

    #[test]
    fn test_ref_only_slot() {
        let mut holder = SoapObject::new("urn:t", "H");
        let info = PropertyInfo::new("p", TypeKey::SoapObject).with_flags(PropertyFlags::REF_ONLY);
        holder.add_property_info(info, Value::from(point(4)));
        let out = write(&Value::from(holder));
        assert!(out.contains(r##"<n0:p href="#o1" />"##));
        assert!(out.contains(r#"<n1:Pt id="o1" c:root="0""#));

        let mut scalar = SoapObject::new("urn:t", "H");
        let info = PropertyInfo::new("n", TypeKey::Int).with_flags(PropertyFlags::REF_ONLY);
        scalar.add_property_info(info, Value::Int(4));
        let err = write_with(&Value::from(scalar), &TypeRegistry::new(SoapVersion::V11), &EnvelopeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue(_)));
    }

    #[test]
    fn test_multi_ref_slot_written_as_sibling() {
        let mut holder = SoapObject::new("urn:t", "H");
        let info = PropertyInfo::new("p", TypeKey::SoapObject).with_flags(PropertyFlags::MULTI_REF);
        holder.add_property_info(info, Value::from(point(2)));
        assert_eq!(
            write(&Value::from(holder)),
            concat!(
                r##"<n0:H id="o0" c:root="1" xmlns:n0="urn:t"><n0:p href="#o1" /></n0:H>"##,
                r#"<n1:Pt id="o1" c:root="0" i:type="n1:Pt" xmlns:n1="urn:t">"#,
                r#"<x i:type="d:int">2</x></n1:Pt>"#
            )
        );
    }

    #[test]
    fn test_nested_object_uses_type_name() {
        let mut holder = SoapObject::new("urn:t", "H");
        holder.add_soap_object(point(3));
        assert_eq!(
            write(&Value::from(holder)),
            concat!(
                r#"<n0:H id="o0" c:root="1" xmlns:n0="urn:t">"#,
                r#"<n0:Pt i:type="n0:Pt"><x i:type="d:int">3</x></n0:Pt>"#,
                r#"</n0:H>"#
            )
        );
    }

    #[test]
    fn test_attributes_and_inner_text() {
        let mut note = SoapObject::new("", "note");
        note.add_attribute("lang", "en");
        note.set_inner_text("a < b");
        assert_eq!(
            write(&Value::from(note)),
            r#"<note id="o0" c:root="1" lang="en"><![CDATA[a < b]]></note>"#
        );
    }

    #[test]
    fn test_map() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        registry.add_marshal(HashtableMarshal);
        let mut holder = SoapObject::new("", "H");
        holder.add_property("m", Value::map(vec![("k".into(), 1.into())]));
        let out = write_with(&Value::from(holder), &registry, &EnvelopeOptions::default()).unwrap();
        assert_eq!(
            out,
            concat!(
                r#"<H id="o0" c:root="1">"#,
                r#"<m i:type="n0:Map" xmlns:n0="http://xml.apache.org/xml-soap">"#,
                r#"<item><key i:type="d:string">k</key><value i:type="d:int">1</value></item>"#,
                r#"</m></H>"#
            )
        );
    }

    #[test]
    fn test_unsupported_value() {
        let mut holder = SoapObject::new("", "H");
        holder.add_property("price", 2.5f64);
        let err = write_with(&Value::from(holder), &TypeRegistry::new(SoapVersion::V11), &EnvelopeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue(_)));
    }
}
