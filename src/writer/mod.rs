//! XML Writer
//!
//! Streaming serializer with automatic namespace prefix management.
//!
//! - Start tags stay open until content, a child or the end tag arrives, so
//!   attributes and namespace declarations can still be added
//! - Prefixes are declared on demand (`n0`, `n1`, ...) unless the caller
//!   binds one with [`XmlWriter::set_prefix`]
//! - Output is buffered and only handed to a sink by [`XmlWriter::finish`]
//!   or [`XmlWriter::write_to`], so a failed document never reaches it

mod escape;

pub use escape::escape_into;

use crate::core::encoding::XmlEncoding;
use crate::core::namespace::ns;
use crate::error::{Error, Result};
use std::io::Write;

/// Element opened by `start_tag` and not yet closed
#[derive(Debug, Clone)]
struct OpenElement {
    namespace: Option<String>,
    prefix: String,
    name: String,
}

/// Streaming XML serializer
#[derive(Debug)]
pub struct XmlWriter {
    out: String,
    encoding: XmlEncoding,
    /// A start tag is open and still accepts attributes
    pending: bool,
    depth: usize,
    auto: usize,
    elements: Vec<OpenElement>,
    /// `ns_counts[d]`: number of bindings visible inside depth `d`
    ns_counts: Vec<usize>,
    ns_stack: Vec<(String, String)>,
    indent: Vec<bool>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new(XmlEncoding::Utf8)
    }
}

impl XmlWriter {
    /// Create a writer producing `encoding`
    pub fn new(encoding: XmlEncoding) -> Self {
        XmlWriter {
            out: String::with_capacity(1024),
            encoding,
            pending: false,
            depth: 0,
            auto: 0,
            elements: Vec::with_capacity(16),
            ns_counts: vec![2, 2],
            ns_stack: vec![
                (String::new(), String::new()),
                ("xml".to_string(), ns::XML.to_string()),
            ],
            indent: vec![false, false],
        }
    }

    pub fn encoding(&self) -> XmlEncoding {
        self.encoding
    }

    /// Text written so far (pending start tag not yet closed)
    pub fn as_str(&self) -> &str {
        &self.out
    }

    fn ensure_depth(&mut self, depth: usize) {
        if self.ns_counts.len() <= depth + 1 {
            self.ns_counts.resize(depth + 2, 0);
        }
        if self.indent.len() <= depth + 1 {
            self.indent.resize(depth + 2, false);
        }
    }

    fn write_escaped(&mut self, text: &str, quote: Option<char>) {
        escape_into(&mut self.out, text, quote, self.encoding.is_unicode());
    }

    /// Close a pending start tag, emitting its namespace declarations
    fn check(&mut self, close: bool) -> Result<()> {
        if !self.pending {
            return Ok(());
        }

        self.depth += 1;
        self.pending = false;
        self.ensure_depth(self.depth);
        self.indent[self.depth] = self.indent[self.depth - 1];

        let element_ns = self.elements.get(self.depth - 1).and_then(|e| e.namespace.clone());
        for i in self.ns_counts[self.depth - 1]..self.ns_counts[self.depth] {
            let (prefix, uri) = self.ns_stack[i].clone();
            self.out.push_str(" xmlns");
            if !prefix.is_empty() {
                self.out.push(':');
                self.out.push_str(&prefix);
            } else if element_ns.as_deref() == Some("") && !uri.is_empty() {
                return Err(Error::InvalidState(
                    "Cannot set default namespace for elements in no namespace".to_string(),
                ));
            }
            self.out.push_str("=\"");
            self.write_escaped(&uri, Some('"'));
            self.out.push('"');
        }

        self.ns_counts[self.depth + 1] = self.ns_counts[self.depth];
        self.out.push_str(if close { " />" } else { ">" });
        Ok(())
    }

    /// Depth of the innermost element, counting a pending start tag
    pub fn depth(&self) -> usize {
        if self.pending {
            self.depth + 1
        } else {
            self.depth
        }
    }

    /// Namespace of the innermost open element
    pub fn namespace(&self) -> Option<&str> {
        let depth = self.depth();
        if depth == 0 {
            return None;
        }
        self.elements.get(depth - 1).and_then(|e| e.namespace.as_deref())
    }

    /// Local name of the innermost open element
    pub fn name(&self) -> Option<&str> {
        let depth = self.depth();
        if depth == 0 {
            return None;
        }
        self.elements.get(depth - 1).map(|e| e.name.as_str())
    }

    /// Prefix bound to `namespace` in the current scope, without declaring one
    pub fn prefix_for(&self, namespace: &str, include_default: bool) -> Option<String> {
        self.lookup_prefix(namespace, include_default)
    }

    /// Prefix for `namespace`, declared on the pending start tag if unbound.
    /// Used for QName-valued attributes such as `xsi:type`.
    pub fn ensure_prefix(&mut self, namespace: &str, include_default: bool) -> Result<String> {
        self.get_prefix(namespace, include_default)
    }

    fn lookup_prefix(&self, namespace: &str, include_default: bool) -> Option<String> {
        let top = self.ns_counts[self.depth + 1];
        for i in (0..top).rev() {
            let (prefix, uri) = &self.ns_stack[i];
            if uri != namespace || (!include_default && prefix.is_empty()) {
                continue;
            }
            let shadowed = self.ns_stack[i + 1..top].iter().any(|(p, _)| p == prefix);
            if !shadowed {
                return Some(prefix.clone());
            }
        }
        None
    }

    /// Find or declare a prefix for `namespace`
    fn get_prefix(&mut self, namespace: &str, include_default: bool) -> Result<String> {
        if let Some(prefix) = self.lookup_prefix(namespace, include_default) {
            return Ok(prefix);
        }

        let prefix = if namespace.is_empty() {
            String::new()
        } else {
            let top = self.ns_counts[self.depth + 1];
            loop {
                let candidate = format!("n{}", self.auto);
                self.auto += 1;
                if !self.ns_stack[..top].iter().any(|(p, _)| *p == candidate) {
                    break candidate;
                }
            }
        };

        // Declare on the open tag without closing it
        let was_pending = self.pending;
        self.pending = false;
        self.set_prefix(&prefix, namespace)?;
        self.pending = was_pending;
        Ok(prefix)
    }

    /// Bind `prefix` to `namespace` for the next element
    pub fn set_prefix(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        self.check(false)?;
        self.ensure_depth(self.depth);

        if self.lookup_prefix(namespace, true).as_deref() == Some(prefix) {
            return Ok(());
        }

        let pos = self.ns_counts[self.depth + 1];
        self.ns_counts[self.depth + 1] += 1;
        self.ns_stack.truncate(pos);
        self.ns_stack.push((prefix.to_string(), namespace.to_string()));
        Ok(())
    }

    /// Open an element. `None` writes an unqualified name without touching
    /// the default namespace; `Some("")` explicitly selects no namespace.
    pub fn start_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<&mut Self> {
        self.check(false)?;
        self.ensure_depth(self.depth);

        if self.indent[self.depth] {
            self.out.push_str("\r\n");
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        }

        let prefix = match namespace {
            Some(ns) => self.get_prefix(ns, true)?,
            None => String::new(),
        };

        if namespace == Some("") {
            let (from, to) = (self.ns_counts[self.depth], self.ns_counts[self.depth + 1]);
            let conflict = self.ns_stack[from..to]
                .iter()
                .any(|(p, uri)| p.is_empty() && !uri.is_empty());
            if conflict {
                return Err(Error::InvalidState(
                    "Cannot set default namespace for elements in no namespace".to_string(),
                ));
            }
        }

        self.out.push('<');
        if !prefix.is_empty() {
            self.out.push_str(&prefix);
            self.out.push(':');
        }
        self.out.push_str(name);

        self.elements.truncate(self.depth);
        self.elements.push(OpenElement {
            namespace: namespace.map(str::to_string),
            prefix,
            name: name.to_string(),
        });
        self.pending = true;
        Ok(self)
    }

    /// Add an attribute to the pending start tag
    pub fn attribute(&mut self, namespace: Option<&str>, name: &str, value: &str) -> Result<&mut Self> {
        if !self.pending {
            return Err(Error::InvalidState("illegal position for attribute".to_string()));
        }

        let namespace = namespace.unwrap_or("");
        let prefix = if namespace.is_empty() {
            String::new()
        } else {
            self.get_prefix(namespace, false)?
        };

        self.out.push(' ');
        if !prefix.is_empty() {
            self.out.push_str(&prefix);
            self.out.push(':');
        }
        self.out.push_str(name);
        self.out.push('=');

        let quote = if value.contains('"') { '\'' } else { '"' };
        self.out.push(quote);
        self.write_escaped(value, Some(quote));
        self.out.push(quote);
        Ok(self)
    }

    /// Close the innermost element; namespace and name must match its start tag
    pub fn end_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<&mut Self> {
        if !self.pending {
            if self.depth == 0 {
                return Err(Error::InvalidState(format!("</{}> without open element", name)));
            }
            self.depth -= 1;
        }

        let matches = self
            .elements
            .get(self.depth)
            .is_some_and(|e| e.namespace.as_deref() == namespace && e.name == name);
        if !matches {
            return Err(Error::InvalidState(format!(
                "</{{{}}}{}> does not match start",
                namespace.unwrap_or(""),
                name
            )));
        }

        if self.pending {
            self.check(true)?;
            self.depth -= 1;
        } else {
            if self.indent[self.depth + 1] {
                self.out.push_str("\r\n");
                for _ in 0..self.depth {
                    self.out.push_str("  ");
                }
            }
            self.out.push_str("</");
            let prefix = &self.elements[self.depth].prefix;
            if !prefix.is_empty() {
                self.out.push_str(prefix);
                self.out.push(':');
            }
            self.out.push_str(name);
            self.out.push('>');
        }

        self.ns_counts[self.depth + 1] = self.ns_counts[self.depth];
        self.ns_stack.truncate(self.ns_counts[self.depth + 1]);
        self.elements.truncate(self.depth);
        Ok(self)
    }

    /// Escaped character data
    pub fn text(&mut self, text: &str) -> Result<&mut Self> {
        self.check(false)?;
        self.indent[self.depth] = false;
        self.write_escaped(text, None);
        Ok(self)
    }

    /// A CDATA section; an embedded `]]>` is split across two sections
    pub fn cdsect(&mut self, data: &str) -> Result<()> {
        self.check(false)?;
        self.out.push_str("<![CDATA[");
        self.out.push_str(&data.replace("]]>", "]]]]><![CDATA[>"));
        self.out.push_str("]]>");
        Ok(())
    }

    pub fn comment(&mut self, comment: &str) -> Result<()> {
        self.check(false)?;
        self.out.push_str("<!--");
        self.out.push_str(comment);
        self.out.push_str("-->");
        Ok(())
    }

    pub fn processing_instruction(&mut self, pi: &str) -> Result<()> {
        self.check(false)?;
        self.out.push_str("<?");
        self.out.push_str(pi);
        self.out.push_str("?>");
        Ok(())
    }

    pub fn docdecl(&mut self, decl: &str) -> Result<()> {
        self.out.push_str("<!DOCTYPE");
        self.out.push_str(decl);
        self.out.push('>');
        Ok(())
    }

    pub fn entity_ref(&mut self, name: &str) -> Result<()> {
        self.check(false)?;
        self.out.push('&');
        self.out.push_str(name);
        self.out.push(';');
        Ok(())
    }

    pub fn ignorable_whitespace(&mut self, whitespace: &str) -> Result<()> {
        self.text(whitespace).map(|_| ())
    }

    /// Write the XML declaration
    pub fn start_document(&mut self, encoding: Option<&str>, standalone: Option<bool>) -> Result<()> {
        self.out.push_str("<?xml version='1.0' ");
        if let Some(label) = encoding {
            self.out.push_str("encoding='");
            self.out.push_str(label);
            self.out.push_str("' ");
        }
        if let Some(standalone) = standalone {
            self.out.push_str("standalone='");
            self.out.push_str(if standalone { "yes" } else { "no" });
            self.out.push_str("' ");
        }
        self.out.push_str("?>");
        Ok(())
    }

    /// Close every open element
    pub fn end_document(&mut self) -> Result<()> {
        while self.depth() > 0 {
            let Some(open) = self.elements.get(self.depth() - 1).cloned() else {
                break;
            };
            self.end_tag(open.namespace.as_deref(), &open.name)?;
        }
        self.flush()
    }

    /// Turn pretty-printing on or off for children of the current element
    pub fn set_indent(&mut self, on: bool) -> Result<()> {
        self.check(false)?;
        self.ensure_depth(self.depth);
        self.indent[self.depth] = on;
        Ok(())
    }

    /// Close any pending start tag
    pub fn flush(&mut self) -> Result<()> {
        self.check(false)
    }

    /// Flush, then hand the encoded document to `sink`
    pub fn write_to<W: Write>(&mut self, mut sink: W) -> Result<()> {
        self.flush()?;
        sink.write_all(&self.encoding.encode(&self.out))?;
        sink.flush()?;
        Ok(())
    }

    /// Flush and return the encoded document
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.flush()?;
        Ok(self.encoding.encode(&self.out))
    }
}
