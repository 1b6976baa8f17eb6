//! Literal XML element
//!
//! Used for SOAP header entries, fault details and literal bodies: anything
//! the mapping engine passes through without interpreting.

use super::node::{Child, Node, NodeKind};
use crate::error::Result;
use crate::reader::{EventType, PullParser};
use crate::writer::XmlWriter;

/// Attribute of a literal element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomAttribute {
    /// Namespace URI, empty when unqualified
    pub namespace: String,
    pub name: String,
    pub value: String,
}

/// Element with its namespace declarations, attributes and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    /// `(prefix, uri)` declared on this element; empty prefix is the default
    prefixes: Vec<(String, String)>,
    attributes: Vec<DomAttribute>,
    node: Node,
}

impl Element {
    /// New element; a `None` namespace is written without touching prefixes
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Element {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            ..Element::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn set_namespace(&mut self, namespace: Option<&str>) {
        self.namespace = namespace.map(str::to_string);
    }

    pub(crate) fn matches(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && namespace.map_or(true, |ns| self.namespace() == Some(ns))
    }

    /// Declare `prefix` for `namespace` when this element is written
    pub fn set_prefix(&mut self, prefix: &str, namespace: &str) {
        self.prefixes.push((prefix.to_string(), namespace.to_string()));
    }

    /// Namespace declarations made on this element
    pub fn prefixes(&self) -> &[(String, String)] {
        &self.prefixes
    }

    pub fn attributes(&self) -> &[DomAttribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// First attribute with this name; a `None` namespace matches any
    pub fn attribute_value(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && namespace.map_or(true, |ns| a.namespace == ns))
            .map(|a| a.value.as_str())
    }

    /// Set, replace or (with `None`) remove an attribute
    pub fn set_attribute(&mut self, namespace: Option<&str>, name: &str, value: Option<&str>) {
        let namespace = namespace.unwrap_or("");
        let existing = self
            .attributes
            .iter()
            .rposition(|a| a.namespace == namespace && a.name == name);

        match (existing, value) {
            (Some(i), None) => {
                self.attributes.remove(i);
            }
            (Some(i), Some(v)) => self.attributes[i].value = v.to_string(),
            (None, Some(v)) => self.attributes.push(DomAttribute {
                namespace: namespace.to_string(),
                name: name.to_string(),
                value: v.to_string(),
            }),
            (None, None) => {}
        }
    }

    /// Children of this element
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    pub fn children(&self) -> &[Child] {
        self.node.children()
    }

    pub fn add_child(&mut self, child: Child) {
        self.node.add_child(child);
    }

    pub fn child_count(&self) -> usize {
        self.node.child_count()
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.node.element(index)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.node.text(index)
    }

    pub fn index_of(&self, namespace: Option<&str>, name: &str, start: usize) -> Option<usize> {
        self.node.index_of(namespace, name, start)
    }

    pub fn get_element(&self, namespace: Option<&str>, name: &str) -> Result<&Element> {
        self.node.get_element(namespace, name)
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }

    /// Fill this element from the parser, which must be on its start tag.
    /// On return the parser is positioned after the matching end tag.
    pub fn parse(&mut self, parser: &mut PullParser) -> Result<()> {
        let depth = parser.depth();
        let from = parser.namespace_count(depth.saturating_sub(1));
        for i in from..parser.namespace_count(depth) {
            let prefix = parser.namespace_prefix(i).unwrap_or("").to_string();
            let uri = parser.namespace_uri(i).unwrap_or("").to_string();
            self.prefixes.push((prefix, uri));
        }

        for attr in parser.attributes() {
            self.attributes.push(DomAttribute {
                namespace: attr.namespace.clone(),
                name: attr.name.clone(),
                value: attr.value.clone(),
            });
        }

        if parser.is_empty_element_tag()? {
            parser.next_token()?;
        } else {
            parser.next_token()?;
            self.node.parse(parser)?;
            if self.node.child_count() == 0 {
                self.node.add_text(NodeKind::IgnorableWhitespace, "");
            }
        }

        parser.require(EventType::EndTag, self.namespace(), Some(self.name.as_str()))?;
        parser.next_token()?;
        Ok(())
    }

    /// Write the element with its declarations, attributes and children
    pub fn write(&self, writer: &mut XmlWriter) -> Result<()> {
        for (prefix, uri) in &self.prefixes {
            writer.set_prefix(prefix, uri)?;
        }
        writer.start_tag(self.namespace(), &self.name)?;
        for attr in &self.attributes {
            writer.attribute(Some(attr.namespace.as_str()), &attr.name, &attr.value)?;
        }
        self.node.write(writer)?;
        writer.end_tag(self.namespace(), &self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_collects_declarations_and_attributes() {
        let mut parser = PullParser::new(r#"<h:auth xmlns:h="urn:h" h:must="1" user="u">token</h:auth>"#);
        parser.next_token().unwrap();
        let mut element = Element::new(parser.namespace(), parser.name().unwrap());
        element.parse(&mut parser).unwrap();

        assert_eq!(element.namespace(), Some("urn:h"));
        assert_eq!(element.prefixes(), &[("h".to_string(), "urn:h".to_string())]);
        assert_eq!(element.attribute_value(Some("urn:h"), "must"), Some("1"));
        assert_eq!(element.attribute_value(None, "user"), Some("u"));
        assert_eq!(element.text(0), Some("token"));
        assert_eq!(parser.event_type(), EventType::EndDocument);
    }

    #[test]
    fn test_set_attribute_replace_and_remove() {
        let mut element = Element::new(None, "a");
        element.set_attribute(None, "k", Some("1"));
        element.set_attribute(None, "k", Some("2"));
        assert_eq!(element.attribute_count(), 1);
        assert_eq!(element.attribute_value(None, "k"), Some("2"));
        element.set_attribute(None, "k", None);
        assert_eq!(element.attribute_count(), 0);
    }

    #[test]
    fn test_empty_element_gets_placeholder_child() {
        let mut parser = PullParser::new("<a></a>");
        parser.next_token().unwrap();
        let mut element = Element::new(parser.namespace(), "a");
        element.parse(&mut parser).unwrap();
        assert_eq!(element.child_count(), 1);
        assert_eq!(element.text(0), Some(""));
    }

    #[test]
    fn test_write_with_prefix() {
        let mut element = Element::new(Some("urn:h"), "auth");
        element.set_prefix("h", "urn:h");
        element.set_attribute(Some("urn:h"), "must", Some("1"));
        element.add_child(Child::Data {
            kind: NodeKind::Text,
            text: "t".into(),
        });
        let mut writer = XmlWriter::default();
        element.write(&mut writer).unwrap();
        assert_eq!(writer.as_str(), r#"<h:auth h:must="1" xmlns:h="urn:h">t</h:auth>"#);
    }
}
