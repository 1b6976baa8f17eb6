//! Literal XML content
//!
//! A [`Node`] is an ordered list of children: elements and the various kinds
//! of character data. It is filled from a pull parser in token mode, so
//! comments, CDATA sections and unresolved entity references survive a round
//! trip through [`Node::write`].

use super::element::Element;
use crate::error::{Error, Result};
use crate::reader::{EventType, PullParser};
use crate::writer::XmlWriter;

/// Type of a child node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    CData,
    EntityRef,
    IgnorableWhitespace,
    ProcessingInstruction,
    Comment,
    DocDecl,
}

impl NodeKind {
    /// Child kind for a parser event; resolved entity references become text
    fn from_event(event: EventType) -> Self {
        match event {
            EventType::CdSect => NodeKind::CData,
            EventType::IgnorableWhitespace => NodeKind::IgnorableWhitespace,
            EventType::ProcessingInstruction => NodeKind::ProcessingInstruction,
            EventType::Comment => NodeKind::Comment,
            EventType::DocDecl => NodeKind::DocDecl,
            _ => NodeKind::Text,
        }
    }
}

/// A child of a [`Node`]
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(Element),
    /// Character data of any non-element kind
    Data { kind: NodeKind, text: String },
}

impl Child {
    pub fn kind(&self) -> NodeKind {
        match self {
            Child::Element(_) => NodeKind::Element,
            Child::Data { kind, .. } => *kind,
        }
    }
}

/// Ordered list of child nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    children: Vec<Child>,
}

impl Node {
    pub fn new() -> Self {
        Node::default()
    }

    pub fn add_child(&mut self, child: Child) {
        self.children.push(child);
    }

    pub fn insert_child(&mut self, index: usize, child: Child) {
        self.children.insert(index.min(self.children.len()), child);
    }

    pub fn add_element(&mut self, element: Element) {
        self.children.push(Child::Element(element));
    }

    pub fn add_text(&mut self, kind: NodeKind, text: impl Into<String>) {
        self.children.push(Child::Data {
            kind,
            text: text.into(),
        });
    }

    pub fn remove_child(&mut self, index: usize) -> Option<Child> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// The element at `index`, or `None` for text children
    pub fn element(&self, index: usize) -> Option<&Element> {
        match self.children.get(index) {
            Some(Child::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index) {
            Some(Child::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Child::Element(e) => Some(e),
            Child::Data { .. } => None,
        })
    }

    /// Character data at `index`, or `None` for elements
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.children.get(index) {
            Some(Child::Data { text, .. }) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, index: usize) -> bool {
        matches!(
            self.children.get(index).map(Child::kind),
            Some(NodeKind::Text | NodeKind::IgnorableWhitespace | NodeKind::CData)
        )
    }

    /// Index of the first matching child element at or after `start`;
    /// a `None` namespace matches any
    pub fn index_of(&self, namespace: Option<&str>, name: &str, start: usize) -> Option<usize> {
        (start..self.children.len())
            .find(|&i| self.element(i).is_some_and(|e| e.matches(namespace, name)))
    }

    /// The single child element with this name; absent or repeated is an error
    pub fn get_element(&self, namespace: Option<&str>, name: &str) -> Result<&Element> {
        let mut found = self.elements().filter(|e| e.matches(namespace, name));
        match (found.next(), found.next()) {
            (Some(element), None) => Ok(element),
            (first, _) => Err(Error::InvalidValue(format!(
                "Element {{{}}}{} {}",
                namespace.unwrap_or(""),
                name,
                if first.is_none() { "not found" } else { "more than once" }
            ))),
        }
    }

    /// Concatenated character data of the direct text children
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Child::Data {
                    kind: NodeKind::Text | NodeKind::CData | NodeKind::IgnorableWhitespace,
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Build children from the parser until an end tag or the end of the
    /// document. The end tag is not consumed.
    pub fn parse(&mut self, parser: &mut PullParser) -> Result<()> {
        loop {
            match parser.event_type() {
                EventType::StartTag => {
                    let mut child = Element::new(parser.namespace(), parser.name().unwrap_or(""));
                    child.parse(parser)?;
                    self.add_element(child);
                }
                EventType::EndTag | EventType::EndDocument => return Ok(()),
                event => {
                    if let Some(text) = parser.text() {
                        self.add_text(NodeKind::from_event(event), text);
                    } else if event == EventType::EntityRef {
                        if let Some(name) = parser.name() {
                            self.add_text(NodeKind::EntityRef, name);
                        }
                    }
                    parser.next_token()?;
                }
            }
        }
    }

    /// Write every child in order
    pub fn write(&self, writer: &mut XmlWriter) -> Result<()> {
        for child in &self.children {
            match child {
                Child::Element(e) => e.write(writer)?,
                Child::Data { kind, text } => match kind {
                    NodeKind::Text | NodeKind::Element => {
                        writer.text(text)?;
                    }
                    NodeKind::IgnorableWhitespace => writer.ignorable_whitespace(text)?,
                    NodeKind::CData => writer.cdsect(text)?,
                    NodeKind::EntityRef => writer.entity_ref(text)?,
                    NodeKind::ProcessingInstruction => writer.processing_instruction(text)?,
                    NodeKind::Comment => writer.comment(text)?,
                    NodeKind::DocDecl => writer.docdecl(text)?,
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Node {
        let mut parser = PullParser::new(xml);
        parser.next_token().unwrap();
        let mut node = Node::new();
        node.parse(&mut parser).unwrap();
        node
    }

    #[test]
    fn test_parse_mixed_children() {
        let node = parse("<a>x<!--c--><b/><![CDATA[y]]></a>");
        assert_eq!(node.child_count(), 1);
        let a = node.element(0).unwrap();
        let kinds: Vec<_> = a.children().iter().map(Child::kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Text, NodeKind::Comment, NodeKind::Element, NodeKind::CData]
        );
        assert_eq!(a.text_content(), "xy");
    }

    #[test]
    fn test_get_element() {
        let node = parse("<r><a/><b xmlns='urn:b'/><b/></r>");
        let r = node.element(0).unwrap();
        assert!(r.get_element(None, "a").is_ok());
        assert!(r.get_element(None, "b").is_err());
        assert_eq!(r.get_element(Some("urn:b"), "b").unwrap().namespace(), Some("urn:b"));
        assert!(r.get_element(None, "z").is_err());
        assert_eq!(r.index_of(None, "b", 2), Some(2));
    }

    #[test]
    fn test_round_trip() {
        let xml = "<p:a k=\"v\" xmlns:p=\"urn:p\">t<!--c--><b>&amp;</b></p:a>";
        let node = parse(xml);
        let mut writer = XmlWriter::default();
        node.write(&mut writer).unwrap();
        assert_eq!(writer.as_str(), xml);
    }

    #[test]
    fn test_remove_and_insert() {
        let mut node = Node::new();
        node.add_text(NodeKind::Text, "a");
        node.add_element(Element::new(None, "e"));
        node.insert_child(0, Child::Data {
            kind: NodeKind::Comment,
            text: "c".into(),
        });
        assert_eq!(node.child_count(), 3);
        assert!(node.is_text(1));
        assert!(node.remove_child(2).is_some());
        assert!(node.remove_child(5).is_none());
        assert_eq!(node.text(1), Some("a"));
    }
}
