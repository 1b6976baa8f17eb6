//! Read path: XML elements into object graph values
//!
//! A [`SoapReader`] drives the pull parser element by element. Every call to
//! [`SoapReader::read`] starts on a start tag and returns on the matching end
//! tag. The order of decisions for one element:
//!
//! - `href` present: the value comes from the element carrying that id,
//!   possibly later in the document
//! - `xsi:nil` / `xsi:null` true: null
//! - otherwise the type name (from `xsi:type`, an `arrayType` attribute or
//!   the slot's declared type) selects a codec, a template, a native type
//!   or the generic fallback

use super::attributes::AttributeInfo;
use super::object::{Serializable, SoapObject};
use super::primitive::SoapPrimitive;
use super::property::{PropertyInfo, TypeKey};
use super::refs::{IdMap, PatchTarget};
use super::registry::{Mapping, TypeRegistry};
use super::value::{ObjectRef, Value, VectorRef};
use super::EnvelopeOptions;
use crate::core::attributes::split_name;
use crate::error::{Error, Result};
use crate::reader::{EventType, PullParser};
use crate::soap::{string_to_boolean, SoapVersion};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

/// `[n]` to `n`, or `default` when absent or not a number
fn get_index(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|v| v.trim().strip_prefix('['))
        .and_then(|v| v.strip_suffix(']'))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Qualified type name of a generic object value
fn nested_type_name(value: &Value) -> Option<(String, String)> {
    let Value::Object(object) = value else {
        return None;
    };
    let object = object.borrow();
    let so = object.as_soap_object()?;
    Some((so.namespace().to_string(), so.name().to_string()))
}

/// Mapping engine state for reading one message
pub struct SoapReader<'a> {
    parser: &'a mut PullParser,
    registry: &'a TypeRegistry,
    options: &'a EnvelopeOptions,
    version: SoapVersion,
    ids: IdMap,
}

impl<'a> SoapReader<'a> {
    pub fn new(parser: &'a mut PullParser, registry: &'a TypeRegistry, options: &'a EnvelopeOptions) -> Self {
        SoapReader {
            parser,
            registry,
            options,
            version: registry.version(),
            ids: IdMap::new(),
        }
    }

    /// The underlying parser, for codecs
    pub fn parser(&mut self) -> &mut PullParser {
        &mut *self.parser
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// End of message: references to ids never defined stay null
    pub fn finish(self) {
        let unresolved = self.ids.unresolved();
        if !unresolved.is_empty() {
            warn!(ids = ?unresolved, "unresolved href references left null");
        }
    }

    fn xsi(&self) -> &'static str {
        self.version.xsi()
    }

    fn enc(&self) -> &'static str {
        self.version.enc()
    }

    /// Read the element the parser is on.
    ///
    /// `owner` is the slot the value goes into; it is required for `href`
    /// elements, whose value may only be known later. `qname` is the type
    /// name to assume when the element has no `xsi:type`.
    pub fn read(
        &mut self,
        owner: Option<PatchTarget>,
        qname: Option<(String, String)>,
        expected: &PropertyInfo,
    ) -> Result<Value> {
        let element_name = self.parser.name().unwrap_or_default().to_string();
        let href = self.parser.attribute_value(None, "href").map(str::to_string);

        if let Some(href) = href {
            let Some(owner) = owner else {
                return Err(Error::UnresolvedType("href at root level".to_string()));
            };
            let id = href.strip_prefix('#').unwrap_or(&href);
            trace!(id, "href");
            let value = self.ids.lookup_or_defer(id, owner).unwrap_or_default();
            self.parser.next_tag()?;
            self.parser.require(EventType::EndTag, None, Some(&element_name))?;
            return Ok(value);
        }

        let xsi = self.xsi();
        let nil = self
            .parser
            .attribute_value(Some(xsi), "nil")
            .or_else(|| self.parser.attribute_value(Some(xsi), "null"))
            .map(string_to_boolean)
            .unwrap_or(false);
        let id = self.parser.attribute_value(None, "id").map(str::to_string);

        if !nil && expected.is_ref_only() {
            return Err(Error::UnresolvedType(format!(
                "inline value in reference-only slot {}",
                element_name
            )));
        }

        let value = if nil {
            self.parser.next_tag()?;
            self.parser.require(EventType::EndTag, None, Some(&element_name))?;
            Value::Null
        } else {
            let (namespace, name) = self.type_name(qname, expected);
            trace!(element = %element_name, namespace = %namespace, name = %name, "resolved type");
            self.read_instance(&namespace, &name, expected)?
        };

        if let Some(id) = id {
            self.ids.resolve(&id, &value)?;
        }
        self.parser.require(EventType::EndTag, None, Some(&element_name))?;
        Ok(value)
    }

    /// Type name of the current element: `xsi:type`, then the caller's
    /// assumption, then an array marker, then the slot's declared type
    fn type_name(&self, qname: Option<(String, String)>, expected: &PropertyInfo) -> (String, String) {
        if let Some(xsi_type) = self.parser.attribute_value(Some(self.xsi()), "type") {
            let (prefix, local) = split_name(xsi_type);
            let namespace = self.parser.namespace_for(prefix).unwrap_or_default();
            return (namespace.to_string(), local.to_string());
        }
        if let Some(qname) = qname {
            return qname;
        }
        if self.parser.attribute_value(Some(self.enc()), "arrayType").is_some() {
            return (self.enc().to_string(), "Array".to_string());
        }
        match self.registry.qname_for_type(&expected.type_key) {
            Some((namespace, name)) => (namespace.to_string(), name.to_string()),
            None => (self.registry.xsd().to_string(), "anyType".to_string()),
        }
    }

    /// Attributes of the current element, minus the encoding plumbing
    fn element_attributes(&self) -> Vec<AttributeInfo> {
        let (xsi, enc) = (self.xsi(), self.enc());
        self.parser
            .attributes()
            .iter()
            .filter(|a| a.namespace != xsi && a.namespace != enc)
            .filter(|a| !(a.namespace.is_empty() && (a.name == "id" || a.name == "href")))
            .map(|a| AttributeInfo::new(Some(&a.namespace), &a.name, &a.value))
            .collect()
    }

    /// Read content of type `{namespace}name`, unregistered types included
    pub fn read_instance(&mut self, namespace: &str, name: &str, expected: &PropertyInfo) -> Result<Value> {
        let registry = self.registry;
        let Some(mapping) = registry.lookup(namespace, name) else {
            return self.read_unknown(namespace, name);
        };

        match mapping {
            Mapping::Marshal(marshal) => marshal.read_instance(self, namespace, name, expected),
            Mapping::Template(template) => {
                let mut object = template.instantiate();
                for attribute in self.element_attributes() {
                    object.attributes_mut().set(attribute);
                }
                let object: ObjectRef = Rc::new(RefCell::new(object));
                self.fill(&object)?;
                Ok(Value::Object(object))
            }
            Mapping::Type {
                key: TypeKey::SoapObject,
                ..
            } => {
                let mut object = SoapObject::new(namespace, name);
                for attribute in self.element_attributes() {
                    object.attributes_mut().set(attribute);
                }
                let object = Rc::new(RefCell::new(object));
                self.append(&object)?;
                Ok(Value::Object(object))
            }
            Mapping::Type {
                key: TypeKey::Vector,
                ..
            } => {
                let vector: VectorRef = Rc::new(RefCell::new(Vec::new()));
                self.read_vector(&vector, expected.element_type.as_deref())?;
                Ok(Value::Vector(vector))
            }
            Mapping::Type {
                factory: Some(factory),
                ..
            } => {
                let object = factory();
                let attributes = self.element_attributes();
                if let Some(container) = object.borrow_mut().attributes_mut() {
                    for attribute in attributes {
                        container.set(attribute);
                    }
                }
                self.fill(&object)?;
                Ok(Value::Object(object))
            }
            Mapping::Type { key, .. } => Err(Error::UnresolvedType(format!("no deserializer for {}", key))),
        }
    }

    /// Move to the next child start tag or the end tag, keeping
    /// non-whitespace text as the object's inner text
    fn next_tag_or_text(&mut self, object: &ObjectRef) -> Result<EventType> {
        let mut event = self.parser.next()?;
        if event == EventType::Text {
            if !self.parser.is_whitespace()? {
                let text = self.parser.text().unwrap_or_default().to_string();
                object.borrow_mut().set_inner_text(text);
            }
            event = self.parser.next()?;
        }
        if event != EventType::StartTag && event != EventType::EndTag {
            return Err(Error::UnexpectedEventType {
                message: format!("unexpected type: {}", event),
                line: self.parser.line_number(),
                column: self.parser.column_number(),
            });
        }
        Ok(event)
    }

    /// Slot of `object` declared for the element `{namespace}name`, and
    /// the type name to read it as when the slot holds a nested object
    fn find_slot(object: &ObjectRef, namespace: &str, name: &str) -> Option<(usize, PropertyInfo, Option<(String, String)>)> {
        let object = object.borrow();
        (0..object.property_count()).find_map(|i| {
            let info = object.property_info(i);
            if info.matches(namespace, name) {
                return Some((i, info, None));
            }
            if info.name.is_some() {
                return None;
            }
            // nested generic object, addressed by its type name
            let qname = nested_type_name(&object.property(i))?;
            let namespace_ok = qname.0.is_empty() || qname.0 == namespace;
            (qname.1 == name && namespace_ok).then(|| (i, info, Some(qname)))
        })
    }

    /// Fill declared slots from child elements matched by name
    fn fill(&mut self, object: &ObjectRef) -> Result<()> {
        let mut event = self.next_tag_or_text(object)?;
        while event != EventType::EndTag {
            let name = self.parser.name().unwrap_or_default().to_string();
            let namespace = self.parser.namespace().unwrap_or_default().to_string();

            match Self::find_slot(object, &namespace, &name) {
                Some((index, info, qname)) => {
                    let value = self.read(Some(PatchTarget::Object(object.clone(), index)), qname, &info)?;
                    object.borrow_mut().set_property(index, value);
                }
                None if self.options.avoid_exception_for_unknown_property => {
                    warn!(property = %name, "skipping unknown property");
                    self.parser.skip_sub_tree()?;
                }
                None => return Err(Error::UnknownProperty(name)),
            }
            event = self.next_tag_or_text(object)?;
        }
        self.parser.require(EventType::EndTag, None, None)
    }

    /// Append every child element as a new slot of a generic object
    fn append(&mut self, object: &Rc<RefCell<SoapObject>>) -> Result<()> {
        let owner: ObjectRef = object.clone();
        let namespace = object.borrow().namespace().to_string();
        let any = PropertyInfo::object();

        let mut event = self.next_tag_or_text(&owner)?;
        while event != EventType::EndTag {
            let name = self.parser.name().unwrap_or_default().to_string();
            let index = object.borrow().property_count();
            let value = self.read(
                Some(PatchTarget::Object(owner.clone(), index)),
                Some((namespace.clone(), name.clone())),
                &any,
            )?;
            object.borrow_mut().add_property(&name, value);
            event = self.next_tag_or_text(&owner)?;
        }
        self.parser.require(EventType::EndTag, None, None)
    }

    /// Fallback for types the registry does not know: a primitive wrapper
    /// for text-only elements, a generic object otherwise
    fn read_unknown(&mut self, namespace: &str, name: &str) -> Result<Value> {
        let element_name = self.parser.name().unwrap_or_default().to_string();
        let element_namespace = self.parser.namespace().unwrap_or_default().to_string();
        let attributes = self.element_attributes();

        let mut text = None;
        let mut result = Value::Null;
        self.parser.next()?;

        if self.parser.event_type() == EventType::Text {
            let content = self.parser.text().unwrap_or_default().to_string();
            let mut primitive = SoapPrimitive::new(namespace, name, &content);
            for attribute in &attributes {
                primitive.attributes_mut().add_info(attribute.clone());
            }
            result = Value::Primitive(primitive);
            text = Some(content);
            self.parser.next()?;
        } else if self.parser.event_type() == EventType::EndTag {
            let mut object = SoapObject::new(namespace, name);
            for attribute in &attributes {
                object.attributes_mut().add_info(attribute.clone());
            }
            result = Value::from(object);
        }

        if self.parser.event_type() == EventType::StartTag {
            if text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                return Err(Error::UnresolvedType("Malformed input: Mixed content".to_string()));
            }
            let mut object = SoapObject::new(namespace, name);
            for attribute in &attributes {
                object.attributes_mut().add_info(attribute.clone());
            }
            let object = Rc::new(RefCell::new(object));
            let owner: ObjectRef = object.clone();
            let any = PropertyInfo::object();

            while self.parser.event_type() != EventType::EndTag {
                let child_namespace = self.parser.namespace().unwrap_or_default().to_string();
                let child_name = self.parser.name().unwrap_or_default().to_string();
                let index = object.borrow().property_count();
                let value = self.read(Some(PatchTarget::Object(owner.clone(), index)), None, &any)?;
                object
                    .borrow_mut()
                    .add_property_with_namespace(&child_namespace, &child_name, value);
                self.parser.next_tag()?;
            }
            result = Value::Object(owner);
        }

        self.parser
            .require(EventType::EndTag, Some(&element_namespace), Some(&element_name))?;
        Ok(result)
    }

    fn array_too_long(&self, what: &str, value: usize) -> Error {
        Error::InvalidValue(format!(
            "array {} {} exceeds the limit of {} items",
            what, value, self.options.max_array_length
        ))
    }

    /// Read a SOAP array into `vector`, honouring the declared size and
    /// `offset`/`position` markers
    fn read_vector(&mut self, vector: &VectorRef, element_type: Option<&PropertyInfo>) -> Result<()> {
        let enc = self.enc();
        let mut item_type = None;

        if let Some(array_type) = self.parser.attribute_value(Some(enc), "arrayType") {
            let (qname, dimension) = match array_type.find('[') {
                Some(cut) => (&array_type[..cut], Some(&array_type[cut..])),
                None => (array_type, None),
            };
            let (prefix, local) = split_name(qname);
            let namespace = self.parser.namespace_for(prefix).unwrap_or_default();
            item_type = Some((namespace.to_string(), local.to_string()));

            // only a plain [N] declares a size
            let size = dimension.and_then(|d| {
                d.strip_prefix('[')
                    .and_then(|d| d.strip_suffix(']'))
                    .and_then(|n| n.trim().parse::<usize>().ok())
            });
            if let Some(size) = size {
                if size > self.options.max_array_length {
                    return Err(self.array_too_long("size", size));
                }
                vector.borrow_mut().resize(size, Value::Null);
            }
        }

        let any = PropertyInfo::object();
        let element_type = element_type.unwrap_or(&any);

        let mut position = get_index(self.parser.attribute_value(Some(enc), "offset"), 0);
        self.parser.next_tag()?;
        while self.parser.event_type() != EventType::EndTag {
            position = get_index(self.parser.attribute_value(Some(enc), "position"), position);
            if position >= self.options.max_array_length {
                return Err(self.array_too_long("position", position));
            }
            {
                let mut items = vector.borrow_mut();
                if position >= items.len() {
                    items.resize(position + 1, Value::Null);
                }
            }

            let target = PatchTarget::Vector(vector.clone(), position);
            let value = self.read(Some(target.clone()), item_type.clone(), element_type)?;
            target.apply(value);
            position += 1;
            self.parser.next_tag()?;
        }
        self.parser.require(EventType::EndTag, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::marshal::{Base64Marshal, HashtableMarshal};
    use crate::serialization::property::PropertyFlags;
    use crate::soap::ns;
    use pretty_assertions::assert_eq;

    const DECLS: &str = concat!(
        r#"xmlns:i="http://www.w3.org/2001/XMLSchema-instance" "#,
        r#"xmlns:d="http://www.w3.org/2001/XMLSchema" "#,
        r#"xmlns:c="http://schemas.xmlsoap.org/soap/encoding/""#
    );

    fn read_with(xml: &str, registry: &TypeRegistry, options: &EnvelopeOptions) -> Result<Value> {
        let mut parser = PullParser::new(xml);
        parser.next_tag()?;
        let qname = (
            parser.namespace().unwrap_or_default().to_string(),
            parser.name().unwrap_or_default().to_string(),
        );
        let mut reader = SoapReader::new(&mut parser, registry, options);
        let value = reader.read(None, Some(qname), &PropertyInfo::object())?;
        reader.finish();
        Ok(value)
    }

    fn read_doc(xml: &str) -> Result<Value> {
        read_with(xml, &TypeRegistry::new(SoapVersion::V11), &EnvelopeOptions::default())
    }

    fn soap_object(value: &Value) -> SoapObject {
        value.as_object().unwrap().borrow().as_soap_object().unwrap().clone()
    }

    #[test]
    fn test_get_index() {
        assert_eq!(get_index(Some("[3]"), 0), 3);
        assert_eq!(get_index(Some("[]"), 7), 7);
        assert_eq!(get_index(None, 2), 2);
        assert_eq!(get_index(Some("[x]"), 1), 1);
    }

    #[test]
    fn test_typed_scalars() {
        let xml = format!(
            r#"<r {}><a i:type="d:int">42</a><b i:type="d:boolean">true</b><c i:type="d:string"> s </c></r>"#,
            DECLS
        );
        let object = soap_object(&read_doc(&xml).unwrap());
        assert_eq!(object.property(0), Value::Int(42));
        assert_eq!(object.property(1), Value::Boolean(true));
        assert_eq!(object.property(2), Value::from(" s "));
    }

    #[test]
    fn test_unknown_text_becomes_primitive() {
        let xml = r#"<r xmlns:t="urn:t"><code t:unit="kg">7</code></r>"#;
        let object = soap_object(&read_doc(xml).unwrap());
        let Value::Primitive(primitive) = object.property(0) else {
            panic!("expected a primitive");
        };
        assert_eq!(primitive.name(), "anyType");
        assert_eq!(primitive.value(), "7");
        assert_eq!(primitive.attributes().get_ns("urn:t", "unit").unwrap(), "kg");
    }

    #[test]
    fn test_mixed_content_rejected() {
        let err = read_doc("<r><a>text<b>x</b></a></r>").unwrap_err();
        assert!(matches!(err, Error::UnresolvedType(msg) if msg == "Malformed input: Mixed content"));
    }

    #[test]
    fn test_nil() {
        let xml = format!(r#"<r {}><a i:nil="true" /><b i:null="1"></b></r>"#, DECLS);
        let object = soap_object(&read_doc(&xml).unwrap());
        assert_eq!(object.property(0), Value::Null);
        assert_eq!(object.property(1), Value::Null);
    }

    #[test]
    fn test_href_at_root_is_rejected() {
        let err = read_doc(r##"<r href="#o1" />"##).unwrap_err();
        assert!(matches!(err, Error::UnresolvedType(_)));
    }

    #[test]
    fn test_duplicate_id() {
        let err = read_doc(r#"<r><a id="o1">x</a><b id="o1">y</b></r>"#).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id == "o1"));
    }

    #[test]
    fn test_unresolved_href_stays_null() {
        let object = soap_object(&read_doc(r##"<r><a href="#o9" /></r>"##).unwrap());
        assert_eq!(object.property(0), Value::Null);
    }

    #[test]
    fn test_array_with_offset() {
        let xml = format!(
            r#"<r {} i:type="c:Array" c:arrayType="d:int[4]" c:offset="[1]"><item>1</item><item>2</item></r>"#,
            DECLS
        );
        let value = read_doc(&xml).unwrap();
        let items = value.as_vector().unwrap().borrow().clone();
        assert_eq!(items, vec![Value::Null, Value::Int(1), Value::Int(2), Value::Null]);
    }

    #[test]
    fn test_array_grows_without_size() {
        let xml = format!(
            r#"<r {} i:type="c:Array" c:arrayType="d:string[]"><item>a</item><item c:position="[3]">b</item></r>"#,
            DECLS
        );
        let value = read_doc(&xml).unwrap();
        let items = value.as_vector().unwrap().borrow().clone();
        assert_eq!(items, vec![Value::from("a"), Value::Null, Value::Null, Value::from("b")]);
    }

    #[test]
    fn test_array_size_over_limit() {
        let xml = format!(
            r#"<r {} i:type="c:Array" c:arrayType="d:int[18446744073709551615]"><item>1</item></r>"#,
            DECLS
        );
        let err = read_doc(&xml).unwrap_err();
        assert!(matches!(err, Error::InvalidValue(msg) if msg.contains("size")));
    }

    #[test]
    fn test_array_position_over_limit() {
        let xml = format!(
            r#"<r {} i:type="c:Array" c:arrayType="d:int[]"><item c:position="[18446744073709551615]">1</item></r>"#,
            DECLS
        );
        let err = read_doc(&xml).unwrap_err();
        assert!(matches!(err, Error::InvalidValue(msg) if msg.contains("position")));

        let options = EnvelopeOptions {
            max_array_length: 4,
            ..EnvelopeOptions::default()
        };
        let registry = TypeRegistry::new(SoapVersion::V11);
        let last = format!(
            r#"<r {} i:type="c:Array" c:arrayType="d:int[4]"><item c:position="[3]">1</item></r>"#,
            DECLS
        );
        let items = read_with(&last, &registry, &options).unwrap();
        assert_eq!(items.as_vector().unwrap().borrow().len(), 4);

        let past = format!(
            r#"<r {} i:type="c:Array" c:arrayType="d:int[]"><item c:position="[4]">1</item></r>"#,
            DECLS
        );
        assert!(read_with(&past, &registry, &options).is_err());
    }

    #[test]
    fn test_ref_only_slot_rejects_inline_value() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        let mut shape = SoapObject::new("urn:t", "Link");
        let info = PropertyInfo::new("target", TypeKey::SoapObject).with_flags(PropertyFlags::REF_ONLY);
        shape.add_property_info(info, Value::Null);
        registry.add_template(&shape);

        let inline = r#"<t:Link xmlns:t="urn:t"><target><x>1</x></target></t:Link>"#;
        let err = read_with(inline, &registry, &EnvelopeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedType(msg) if msg.contains("target")));

        let by_ref = r##"<t:Link xmlns:t="urn:t"><target href="#o1" /></t:Link>"##;
        let object = soap_object(&read_with(by_ref, &registry, &EnvelopeOptions::default()).unwrap());
        assert_eq!(object.property(0), Value::Null);
    }

    #[test]
    fn test_template_fill_and_unknown_property() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        let mut shape = SoapObject::new("urn:t", "Reply");
        shape.add_property("code", 0).add_property("text", "");
        registry.add_template(&shape);

        let xml = r#"<t:Reply xmlns:t="urn:t"><text>ok</text><code>5</code></t:Reply>"#;
        let object = soap_object(&read_with(xml, &registry, &EnvelopeOptions::default()).unwrap());
        assert_eq!(object.property(0), Value::Int(5));
        assert_eq!(object.property(1), Value::from("ok"));

        let xml = r#"<t:Reply xmlns:t="urn:t"><extra><deep>1</deep></extra><code>5</code></t:Reply>"#;
        let err = read_with(xml, &registry, &EnvelopeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownProperty(name) if name == "extra"));

        let lenient = EnvelopeOptions {
            avoid_exception_for_unknown_property: true,
            ..EnvelopeOptions::default()
        };
        let object = soap_object(&read_with(xml, &registry, &lenient).unwrap());
        assert_eq!(object.property(0), Value::Int(5));
        assert_eq!(object.property(1), Value::Null);
    }

    #[test]
    fn test_hashtable() {
        let mut registry = TypeRegistry::new(SoapVersion::V11);
        registry.add_marshal(HashtableMarshal);
        registry.add_marshal(Base64Marshal);

        let xml = format!(
            concat!(
                r#"<m {} xmlns:a="http://xml.apache.org/xml-soap" i:type="a:Map">"#,
                r#"<item><key i:type="d:string">k</key><value i:type="d:base64Binary">aGk=</value></item>"#,
                r#"</m>"#
            ),
            DECLS
        );
        let value = read_with(&xml, &registry, &EnvelopeOptions::default()).unwrap();
        let entries = value.as_map().unwrap().borrow().clone();
        assert_eq!(entries, vec![(Value::from("k"), Value::Bytes(b"hi".to_vec()))]);
        assert_eq!(registry.qname_for_type(&TypeKey::Map), Some((HashtableMarshal::NAMESPACE, "Map")));
        assert_eq!(registry.enc(), ns::ENC);
    }
}
