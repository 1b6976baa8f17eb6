//! Streaming pull parser
//!
//! XmlPull-style cursor over a decoded document. The caller drives it one
//! event at a time with [`PullParser::next`] (coalesced text, comments and
//! processing instructions dropped) or [`PullParser::next_token`] (every
//! lexical construct reported on its own).
//!
//! Features:
//! - Namespace processing with two-pass attribute resolution, so a prefix may
//!   be used on the same tag before the `xmlns:` declaration that binds it
//! - `<a/>` reported as a start tag followed by a synthesized end tag
//! - Relaxed mode: well-formedness errors become `COMMENT` events whose text
//!   starts with `ERR:` instead of failing the parse
//! - Caller-defined entity replacement text

use super::events::{EventType, Token};
use crate::core::attributes::{is_name_char, is_name_start_char, Attribute};
use crate::core::encoding::{decode_document, XmlEncoding};
use crate::core::entities::{decode_char_ref, is_entity_name_char, EntityTable};
use crate::core::namespace::NamespaceResolver;
use crate::core::scanner::Scanner;
use crate::error::{Error, Result};
use memchr::memmem;
use std::io::Read;
use tracing::{debug, trace, warn};

const UNEXPECTED_EOF: &str = "Unexpected EOF";

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Report well-formedness errors as annotations instead of failing
    pub relaxed: bool,
    /// Resolve prefixes and strip `xmlns` attributes
    pub process_namespaces: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            relaxed: false,
            process_namespaces: true,
        }
    }
}

/// Shape of the upcoming markup, from two characters of lookahead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookahead {
    EndDocument,
    StartTag,
    EndTag,
    Text,
    EntityRef,
    /// `<?`, `<!`: declarations, comments, CDATA, processing instructions
    Legacy,
}

impl Lookahead {
    fn is_textual(self) -> bool {
        matches!(self, Lookahead::Text | Lookahead::EntityRef | Lookahead::Legacy)
    }
}

/// Open element on the parser stack
#[derive(Debug, Clone)]
struct ElementFrame {
    namespace: String,
    prefix: Option<String>,
    name: String,
    qname: String,
}

/// Streaming pull parser
pub struct PullParser {
    scanner: Scanner,
    options: ParserOptions,
    entities: EntityTable,
    namespaces: NamespaceResolver,
    elements: Vec<ElementFrame>,

    encoding: Option<XmlEncoding>,
    version: Option<String>,
    declared_encoding: Option<String>,
    standalone: Option<bool>,

    event: EventType,
    token_mode: bool,
    text: String,
    is_whitespace: bool,
    namespace: Option<String>,
    prefix: Option<String>,
    name: Option<String>,
    attributes: Vec<Attribute>,
    degenerated: bool,
    unresolved: bool,
    pending_error: Option<String>,
}

impl PullParser {
    /// Create a parser with default options over already-decoded text
    pub fn new(input: impl Into<String>) -> Self {
        Self::with_options(input, ParserOptions::default())
    }

    /// Create a relaxed parser over already-decoded text
    pub fn new_relaxed(input: impl Into<String>) -> Self {
        Self::with_options(
            input,
            ParserOptions {
                relaxed: true,
                ..ParserOptions::default()
            },
        )
    }

    /// Create a parser with explicit options
    pub fn with_options(input: impl Into<String>, options: ParserOptions) -> Self {
        PullParser {
            scanner: Scanner::new(input.into()),
            options,
            entities: EntityTable::new(),
            namespaces: NamespaceResolver::new(),
            elements: Vec::with_capacity(16),
            encoding: None,
            version: None,
            declared_encoding: None,
            standalone: None,
            event: EventType::StartDocument,
            token_mode: false,
            text: String::with_capacity(128),
            is_whitespace: true,
            namespace: None,
            prefix: None,
            name: None,
            attributes: Vec::new(),
            degenerated: false,
            unresolved: false,
            pending_error: None,
        }
    }

    /// Create a parser over raw bytes.
    ///
    /// Without an explicit encoding name the encoding is sniffed from the
    /// byte order mark or the XML declaration.
    pub fn from_bytes(input: &[u8], encoding: Option<&str>, options: ParserOptions) -> Result<Self> {
        let (text, detected) = decode_document(input, encoding).map_err(Error::Encoding)?;
        debug!(encoding = detected.label(), bytes = input.len(), "decoded input");
        let mut parser = Self::with_options(text, options);
        parser.encoding = Some(detected);
        Ok(parser)
    }

    /// Create a parser that reads the whole of `reader` up front.
    ///
    /// The reader is dropped before this returns.
    pub fn from_reader<R: Read>(mut reader: R, encoding: Option<&str>, options: ParserOptions) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_bytes(&buf, encoding, options)
    }

    /// Register replacement text for `&name;`
    pub fn define_entity_replacement_text(&mut self, name: &str, replacement: &str) {
        self.entities.define(name, replacement);
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Advance to the next event in coalesced mode.
    ///
    /// Adjacent text, CDATA and resolved entities are merged into one `TEXT`
    /// event. Comments, processing instructions, the doctype and whitespace
    /// outside the root element are skipped.
    pub fn next(&mut self) -> Result<EventType> {
        self.text.clear();
        self.is_whitespace = true;
        self.token_mode = false;

        let mut min = EventType::DocDecl;
        loop {
            self.next_impl()?;
            min = min.min(self.event);

            let more = min > EventType::EntityRef
                || (min >= EventType::Text && self.lookahead().is_textual());
            if !more {
                break;
            }
        }

        self.event = if min > EventType::Text { EventType::Text } else { min };
        Ok(self.event)
    }

    /// Advance to the next event in token mode, reporting every construct
    pub fn next_token(&mut self) -> Result<EventType> {
        self.text.clear();
        self.is_whitespace = true;
        self.token_mode = true;
        self.next_impl()?;
        Ok(self.event)
    }

    fn next_impl(&mut self) -> Result<()> {
        if self.event == EventType::EndTag {
            self.pop_element();
        }

        loop {
            self.attributes.clear();

            // Second half of <a/>: keep the start tag's names
            if self.degenerated {
                self.degenerated = false;
                self.event = EventType::EndTag;
                return Ok(());
            }

            if let Some(annotation) = self.pending_error.take() {
                if self.token_mode {
                    self.text.push_str(&annotation);
                }
                self.event = EventType::Comment;
                return Ok(());
            }

            self.prefix = None;
            self.name = None;
            self.namespace = None;

            match self.lookahead() {
                Lookahead::EntityRef => {
                    self.event = EventType::EntityRef;
                    self.push_entity()?;
                    return Ok(());
                }
                Lookahead::StartTag => {
                    self.event = EventType::StartTag;
                    self.parse_start_tag(false)?;
                    return Ok(());
                }
                Lookahead::EndTag => {
                    self.event = EventType::EndTag;
                    self.parse_end_tag()?;
                    return Ok(());
                }
                Lookahead::EndDocument => {
                    if !self.elements.is_empty() && !self.options.relaxed {
                        return Err(self.malformed(UNEXPECTED_EOF));
                    }
                    self.event = EventType::EndDocument;
                    return Ok(());
                }
                Lookahead::Text => {
                    self.event = EventType::Text;
                    self.push_text('<', !self.token_mode)?;
                    if self.elements.is_empty() && self.is_whitespace {
                        self.event = EventType::IgnorableWhitespace;
                    }
                    return Ok(());
                }
                Lookahead::Legacy => {
                    if let Some(kind) = self.parse_legacy(self.token_mode)? {
                        self.event = kind;
                        return Ok(());
                    }
                    // XML declaration consumed, keep going
                }
            }
        }
    }

    fn lookahead(&mut self) -> Lookahead {
        match self.scanner.peek(0) {
            None => Lookahead::EndDocument,
            Some('&') => Lookahead::EntityRef,
            Some('<') => match self.scanner.peek(1) {
                Some('/') => Lookahead::EndTag,
                Some('?') | Some('!') => Lookahead::Legacy,
                _ => Lookahead::StartTag,
            },
            Some(_) => Lookahead::Text,
        }
    }

    fn pop_element(&mut self) {
        if self.elements.pop().is_some() {
            self.namespaces.pop_scope();
        }
    }

    // ------------------------------------------------------------------
    // Error reporting
    // ------------------------------------------------------------------

    /// Fail, or in relaxed mode remember the first problem as an annotation
    fn error(&mut self, desc: &str) -> Result<()> {
        if !self.options.relaxed {
            return Err(self.malformed(desc));
        }
        if self.pending_error.is_none() {
            warn!(line = self.scanner.line(), column = self.scanner.column(), "relaxed: {}", desc);
            self.pending_error = Some(format!("ERR: {}", desc));
        }
        Ok(())
    }

    fn malformed(&self, desc: &str) -> Error {
        Error::MalformedXml {
            message: desc.to_string(),
            line: self.scanner.line(),
            column: self.scanner.column(),
        }
    }

    fn unexpected(&self, desc: impl Into<String>) -> Error {
        Error::UnexpectedEventType {
            message: format!("{} ({})", desc.into(), self.position_description()),
            line: self.scanner.line(),
            column: self.scanner.column(),
        }
    }

    // ------------------------------------------------------------------
    // Lexical helpers
    // ------------------------------------------------------------------

    #[inline]
    fn push(&mut self, c: char) {
        self.is_whitespace &= c <= ' ';
        self.text.push(c);
    }

    fn skip(&mut self) {
        while matches!(self.scanner.peek(0), Some(c) if c <= ' ') {
            self.scanner.read();
        }
    }

    fn read_expect(&mut self, expected: char) -> Result<()> {
        let actual = self.scanner.read();
        if actual != Some(expected) {
            let desc = match actual {
                Some(a) => format!("expected: '{}' actual: '{}'", expected, a),
                None => format!("expected: '{}' actual: EOF", expected),
            };
            self.error(&desc)?;
        }
        Ok(())
    }

    fn read_name(&mut self) -> Result<String> {
        if !self.scanner.peek(0).is_some_and(is_name_start_char) {
            self.error("name expected")?;
        }
        let mut name = String::new();
        loop {
            match self.scanner.read() {
                Some(c) => name.push(c),
                None => {
                    self.error(UNEXPECTED_EOF)?;
                    break;
                }
            }
            if !self.scanner.peek(0).is_some_and(is_name_char) {
                break;
            }
        }
        Ok(name)
    }

    /// Accumulate character data up to `delimiter`.
    ///
    /// `'<'` reads element content, a quote reads a quoted attribute value
    /// and `' '` reads an unquoted one (relaxed mode).
    fn push_text(&mut self, delimiter: char, resolve_entities: bool) -> Result<()> {
        let mut brackets = 0usize;

        while let Some(c) = self.scanner.peek(0) {
            if c == delimiter || (delimiter == ' ' && (c <= ' ' || c == '>')) {
                break;
            }

            if c == '&' {
                if !resolve_entities {
                    break;
                }
                self.push_entity()?;
                brackets = 0;
                continue;
            }

            if delimiter == '<' {
                let start = self.text.len();
                self.scanner.read_plain_run(&mut self.text);
                brackets = self.check_cdata_close(start, brackets)?;
                continue;
            }

            // Attribute value normalization
            self.scanner.read();
            if c == '\n' || c == '\t' {
                self.push(' ');
            } else {
                self.push(c);
            }
        }
        Ok(())
    }

    /// Inspect freshly appended character data for a stray `]]>`.
    /// `brackets` carries trailing `]` characters across runs.
    fn check_cdata_close(&mut self, start: usize, brackets: usize) -> Result<usize> {
        let bytes = self.text[start..].as_bytes();
        if bytes.is_empty() {
            return Ok(brackets);
        }
        self.is_whitespace &= bytes.iter().all(|&b| b <= b' ');

        let closes = memmem::find(bytes, b"]]>").is_some()
            || (brackets >= 2 && bytes[0] == b'>')
            || (brackets >= 1 && bytes.starts_with(b"]>"));
        let trailing = bytes.iter().rev().take_while(|&&b| b == b']').count();
        let brackets = if trailing == bytes.len() { brackets + trailing } else { trailing };

        if closes {
            self.error("Illegal: ]]>")?;
        }
        Ok(brackets)
    }

    fn push_entity(&mut self) -> Result<()> {
        let was_whitespace = self.is_whitespace;
        self.scanner.read(); // '&'
        let amp = self.text.len();
        self.text.push('&');

        loop {
            match self.scanner.peek(0) {
                Some(';') => {
                    self.scanner.read();
                    break;
                }
                Some(c) if is_entity_name_char(c) => {
                    self.text.push(c);
                    self.scanner.read();
                }
                _ => {
                    // Leave the raw text in place
                    self.is_whitespace = false;
                    return self.error("unterminated entity ref");
                }
            }
        }

        let code = self.text[amp + 1..].to_string();
        self.text.truncate(amp);
        self.is_whitespace = was_whitespace;

        if self.token_mode && self.event == EventType::EntityRef {
            self.name = Some(code.clone());
        }

        if let Some(number) = code.strip_prefix('#') {
            self.unresolved = false;
            match decode_char_ref(number) {
                Some(c) => self.push(c),
                None => self.error(&format!("invalid character reference: &{};", code))?,
            }
            return Ok(());
        }

        match self.entities.get(&code).map(str::to_string) {
            Some(replacement) => {
                self.unresolved = false;
                for c in replacement.chars() {
                    self.push(c);
                }
            }
            None => {
                self.unresolved = true;
                if !self.token_mode {
                    self.error(&format!("unresolved: &{};", code))?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Markup
    // ------------------------------------------------------------------

    /// Declarations, comments, CDATA and processing instructions.
    /// Returns `None` after consuming the XML declaration.
    fn parse_legacy(&mut self, push: bool) -> Result<Option<EventType>> {
        let mut push = push;
        self.scanner.read(); // '<'

        let (kind, required, term) = match self.scanner.read() {
            Some('?') => {
                let (a, b) = (self.scanner.peek(0), self.scanner.peek(1));
                if let (Some(x @ ('x' | 'X')), Some(m @ ('m' | 'M'))) = (a, b) {
                    if push {
                        self.push(x);
                        self.push(m);
                    }
                    self.scanner.read();
                    self.scanner.read();

                    let is_decl = matches!(self.scanner.peek(0), Some('l' | 'L'))
                        && self.scanner.peek(1).map_or(true, |c| c <= ' ');
                    if is_decl {
                        self.parse_xml_decl()?;
                        return Ok(None);
                    }
                }
                (EventType::ProcessingInstruction, "", Some('?'))
            }
            Some('!') => match self.scanner.peek(0) {
                Some('-') => (EventType::Comment, "--", Some('-')),
                Some('[') => {
                    push = true;
                    (EventType::CdSect, "[CDATA[", Some(']'))
                }
                _ => (EventType::DocDecl, "DOCTYPE", None),
            },
            other => {
                let shown = other.map(String::from).unwrap_or_default();
                self.error(&format!("illegal: <{}", shown))?;
                return Ok(Some(EventType::Comment));
            }
        };

        for expected in required.chars() {
            self.read_expect(expected)?;
        }

        let Some(term) = term else {
            self.parse_doctype(push)?;
            return Ok(Some(EventType::DocDecl));
        };

        let mut prev = None;
        loop {
            let Some(c) = self.scanner.read() else {
                self.error(UNEXPECTED_EOF)?;
                return Ok(Some(EventType::Comment));
            };
            if push {
                self.push(c);
            }
            if (term == '?' || c == term)
                && self.scanner.peek(0) == Some(term)
                && self.scanner.peek(1) == Some('>')
            {
                break;
            }
            prev = Some(c);
        }

        if term == '-' && prev == Some('-') && !self.options.relaxed {
            self.error("illegal comment delimiter: --->")?;
        }

        self.scanner.read();
        self.scanner.read();

        // Drop the first terminator character that was pushed with the body
        if push && term != '?' {
            self.text.pop();
        }

        trace!(kind = %kind, "legacy construct");
        Ok(Some(kind))
    }

    fn parse_xml_decl(&mut self) -> Result<()> {
        if self.scanner.line() != 1 || self.scanner.column() > 4 {
            self.error("PI must not start with xml")?;
        }

        self.parse_start_tag(true)?;
        let mut attrs = std::mem::take(&mut self.attributes).into_iter().peekable();

        match attrs.next_if(|a| a.name == "version") {
            Some(a) => self.version = Some(a.value),
            None => self.error("version expected")?,
        }
        if let Some(a) = attrs.next_if(|a| a.name == "encoding") {
            self.declared_encoding = Some(a.value);
        }
        if let Some(a) = attrs.next_if(|a| a.name == "standalone") {
            match a.value.as_str() {
                "yes" => self.standalone = Some(true),
                "no" => self.standalone = Some(false),
                other => self.error(&format!("illegal standalone value: {}", other))?,
            }
        }
        if attrs.next().is_some() {
            self.error("illegal xmldecl")?;
        }

        self.is_whitespace = true;
        self.text.clear();
        Ok(())
    }

    fn parse_doctype(&mut self, push: bool) -> Result<()> {
        let mut nesting = 1usize;
        let mut quote: Option<char> = None;

        loop {
            let Some(c) = self.scanner.read() else {
                return self.error(UNEXPECTED_EOF);
            };
            match c {
                '\'' | '"' => match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                },
                '<' if quote.is_none() => nesting += 1,
                '>' if quote.is_none() => {
                    nesting -= 1;
                    if nesting == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
            if push {
                self.push(c);
            }
        }
    }

    fn parse_end_tag(&mut self) -> Result<()> {
        self.scanner.read(); // '<'
        self.scanner.read(); // '/'
        let qname = self.read_name()?;
        self.skip();
        self.read_expect('>')?;

        let Some(expected) = self.elements.last().map(|f| f.qname.clone()) else {
            self.error("element stack empty")?;
            self.event = EventType::Comment;
            return Ok(());
        };

        if expected != qname {
            self.error(&format!("expected: /{} read: {}", expected, qname))?;
        }

        if let Some(frame) = self.elements.last() {
            self.namespace = Some(frame.namespace.clone());
            self.prefix = frame.prefix.clone();
            self.name = Some(frame.name.clone());
        }
        Ok(())
    }

    fn parse_start_tag(&mut self, xml_decl: bool) -> Result<()> {
        if !xml_decl {
            self.scanner.read(); // '<'
        }
        let qname = self.read_name()?;
        self.attributes.clear();

        loop {
            self.skip();
            let c = self.scanner.peek(0);

            if xml_decl {
                if c == Some('?') {
                    self.scanner.read();
                    self.read_expect('>')?;
                    return Ok(());
                }
            } else {
                if c == Some('/') {
                    self.degenerated = true;
                    self.scanner.read();
                    self.skip();
                    self.read_expect('>')?;
                    break;
                }
                if c == Some('>') {
                    self.scanner.read();
                    break;
                }
            }

            if c.is_none() {
                return self.error(UNEXPECTED_EOF);
            }

            let attr_name = self.read_name()?;
            if attr_name.is_empty() {
                self.error("attr name expected")?;
                break;
            }

            self.skip();
            let value = if self.scanner.peek(0) != Some('=') {
                self.error(&format!("Attr.value missing f. {}", attr_name))?;
                attr_name.clone()
            } else {
                self.read_expect('=')?;
                self.skip();
                let delimiter = match self.scanner.peek(0) {
                    Some(q @ ('\'' | '"')) => {
                        self.scanner.read();
                        q
                    }
                    _ => {
                        self.error("attr value delimiter missing!")?;
                        ' '
                    }
                };

                let start = self.text.len();
                self.push_text(delimiter, true)?;
                let value = self.text[start..].to_string();
                self.text.truncate(start);

                if delimiter != ' ' {
                    self.scanner.read();
                }
                value
            };

            self.attributes.push(Attribute::raw(attr_name, value));
        }

        self.namespaces.push_scope();
        let mut frame = ElementFrame {
            namespace: String::new(),
            prefix: None,
            name: qname.clone(),
            qname,
        };
        if self.options.process_namespaces {
            self.adjust_namespaces(&mut frame)?;
        }

        self.namespace = Some(frame.namespace.clone());
        self.prefix = frame.prefix.clone();
        self.name = Some(frame.name.clone());
        self.elements.push(frame);
        Ok(())
    }

    /// Bind this tag's `xmlns` declarations, then resolve attribute and
    /// element prefixes against the updated scope.
    fn adjust_namespaces(&mut self, frame: &mut ElementFrame) -> Result<()> {
        let mut qualified = false;

        // Pass 1: declarations
        let mut i = 0;
        while i < self.attributes.len() {
            let name = &self.attributes[i].name;
            if name != "xmlns" && !name.starts_with("xmlns:") {
                qualified |= name.contains(':');
                i += 1;
                continue;
            }

            let attr = self.attributes.remove(i);
            let prefix = attr.name.strip_prefix("xmlns:");
            if let Some(p) = prefix {
                if attr.value.is_empty() {
                    self.error(&format!("illegal empty namespace for prefix {}", p))?;
                    continue;
                }
            }
            if let Err(desc) = self.namespaces.declare(prefix, &attr.value) {
                self.error(&desc)?;
            }
        }

        // Pass 2: qualified attribute names
        if qualified {
            for idx in 0..self.attributes.len() {
                let Some(colon) = self.attributes[idx].name.find(':') else {
                    continue;
                };
                if colon == 0 {
                    let desc = format!("illegal attribute name: {}", self.attributes[idx].name);
                    self.error(&desc)?;
                    continue;
                }

                let qname = std::mem::take(&mut self.attributes[idx].name);
                let (prefix, local) = (&qname[..colon], &qname[colon + 1..]);
                let resolved = self.namespaces.resolve(Some(prefix)).map(str::to_string);
                let namespace = match resolved {
                    Some(uri) => uri,
                    None => {
                        self.error(&format!("Undefined Prefix: {} in {}", prefix, frame.qname))?;
                        String::new()
                    }
                };

                let attr = &mut self.attributes[idx];
                attr.namespace = namespace;
                attr.prefix = Some(prefix.to_string());
                attr.name = local.to_string();
            }
        }

        // Element name
        if let Some(colon) = frame.qname.find(':') {
            if colon == 0 {
                self.error(&format!("illegal tag name: {}", frame.qname))?;
            }
            frame.prefix = Some(frame.qname[..colon].to_string());
            frame.name = frame.qname[colon + 1..].to_string();
        }

        let resolved = self.namespaces.resolve(frame.prefix.as_deref()).map(str::to_string);
        frame.namespace = match resolved {
            Some(uri) => uri,
            None => {
                if let Some(prefix) = &frame.prefix {
                    self.error(&format!("undefined prefix: {}", prefix))?;
                }
                String::new()
            }
        };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Convenience operations
    // ------------------------------------------------------------------

    /// Check the current event's kind and, when given, its namespace and name
    pub fn require(&self, kind: EventType, namespace: Option<&str>, name: Option<&str>) -> Result<()> {
        let namespace_ok = namespace.map_or(true, |ns| self.namespace() == Some(ns));
        let name_ok = name.map_or(true, |n| self.name() == Some(n));

        if kind != self.event || !namespace_ok || !name_ok {
            return Err(self.unexpected(format!(
                "expected: {} {{{}}}{}",
                kind,
                namespace.unwrap_or(""),
                name.unwrap_or("")
            )));
        }
        Ok(())
    }

    /// From a start tag, read a text-only element and stop on its end tag
    pub fn next_text(&mut self) -> Result<String> {
        if self.event != EventType::StartTag {
            return Err(self.unexpected("precondition: START_TAG"));
        }

        self.next()?;
        let result = if self.event == EventType::Text {
            let text = std::mem::take(&mut self.text);
            self.next()?;
            text
        } else {
            String::new()
        };

        if self.event != EventType::EndTag {
            return Err(self.unexpected("END_TAG expected"));
        }
        Ok(result)
    }

    /// Advance to the next start or end tag, skipping whitespace-only text
    pub fn next_tag(&mut self) -> Result<EventType> {
        self.next()?;
        if self.event == EventType::Text && self.is_whitespace {
            self.next()?;
        }
        if self.event != EventType::StartTag && self.event != EventType::EndTag {
            return Err(self.unexpected("unexpected type"));
        }
        Ok(self.event)
    }

    /// From a start tag, advance to its matching end tag
    pub fn skip_sub_tree(&mut self) -> Result<()> {
        self.require(EventType::StartTag, None, None)?;
        let mut level = 1usize;
        while level > 0 {
            match self.next()? {
                EventType::EndTag => level -= 1,
                EventType::StartTag => level += 1,
                EventType::EndDocument => return Err(self.malformed(UNEXPECTED_EOF)),
                _ => {}
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Kind of the current event
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event
    }

    /// Number of open elements, including the current start/end tag
    #[inline]
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// Local name of the current tag, or entity name in token mode
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Namespace of the current tag (empty string when unqualified)
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Character data of the current event
    pub fn text(&self) -> Option<&str> {
        if !self.event.is_textual() || (self.event == EventType::EntityRef && self.unresolved) {
            None
        } else {
            Some(&self.text)
        }
    }

    /// Whether the current character data is whitespace only
    pub fn is_whitespace(&self) -> Result<bool> {
        match self.event {
            EventType::Text | EventType::IgnorableWhitespace | EventType::CdSect => Ok(self.is_whitespace),
            _ => Err(self.unexpected("Wrong event type")),
        }
    }

    /// Whether the current start tag was written as `<name/>`
    pub fn is_empty_element_tag(&self) -> Result<bool> {
        if self.event != EventType::StartTag {
            return Err(self.unexpected("Wrong event type"));
        }
        Ok(self.degenerated)
    }

    /// Attributes of the current start tag
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    /// Value of the last attribute named `name`; a `None` namespace matches any
    pub fn attribute_value(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|a| a.name == name && namespace.map_or(true, |ns| a.namespace == ns))
            .map(|a| a.value.as_str())
    }

    /// Number of namespace declarations in scope at `depth`
    pub fn namespace_count(&self, depth: usize) -> usize {
        self.namespaces.count(depth)
    }

    pub fn namespace_prefix(&self, pos: usize) -> Option<&str> {
        self.namespaces.prefix_at(pos)
    }

    pub fn namespace_uri(&self, pos: usize) -> Option<&str> {
        self.namespaces.uri_at(pos)
    }

    /// Resolve a prefix in the current scope (`None` for the default namespace)
    pub fn namespace_for(&self, prefix: Option<&str>) -> Option<&str> {
        self.namespaces.resolve(prefix)
    }

    pub fn line_number(&self) -> usize {
        self.scanner.line()
    }

    pub fn column_number(&self) -> usize {
        self.scanner.column()
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Encoding the input bytes were decoded with
    pub fn input_encoding(&self) -> Option<&'static str> {
        self.encoding.map(XmlEncoding::label)
    }

    /// `encoding` pseudo-attribute of the XML declaration
    pub fn declared_encoding(&self) -> Option<&str> {
        self.declared_encoding.as_deref()
    }

    pub fn xml_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn xml_standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// Borrowed view of the current event
    pub fn token(&self) -> Token<'_> {
        Token {
            kind: self.event,
            namespace: self.namespace(),
            name: self.name(),
            prefix: self.prefix(),
            text: self.text(),
            is_whitespace: self.is_whitespace,
        }
    }

    /// Human-readable description of the current event and position
    pub fn position_description(&self) -> String {
        let mut desc = String::from(self.event.name());
        desc.push(' ');

        match self.event {
            EventType::StartTag | EventType::EndTag => {
                if self.degenerated {
                    desc.push_str("(empty) ");
                }
                desc.push('<');
                if self.event == EventType::EndTag {
                    desc.push('/');
                }
                if let Some(prefix) = &self.prefix {
                    desc.push_str(&format!("{{{}}}{}:", self.namespace.as_deref().unwrap_or(""), prefix));
                }
                desc.push_str(self.name.as_deref().unwrap_or(""));
                for attr in &self.attributes {
                    desc.push(' ');
                    if !attr.namespace.is_empty() {
                        desc.push_str(&format!("{{{}}}{}:", attr.namespace, attr.prefix.as_deref().unwrap_or("")));
                    }
                    desc.push_str(&format!("{}='{}'", attr.name, attr.value));
                }
                desc.push('>');
            }
            EventType::IgnorableWhitespace => {}
            kind if kind.is_textual() => {
                if self.text.chars().count() > 16 {
                    desc.extend(self.text.chars().take(16));
                    desc.push_str("...");
                } else {
                    desc.push_str(&self.text);
                }
            }
            _ => {}
        }

        desc.push_str(&format!("@{}:{}", self.scanner.line(), self.scanner.column()));
        desc
    }
}
