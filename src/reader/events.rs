//! XML Event Types
//!
//! Event kinds reported by the pull parser. The declaration order matters:
//! coalescing in [`PullParser::next`](super::PullParser::next) compares kinds
//! with `<`/`>` the same way the XmlPull event numbering does.

use std::fmt;

/// Kind of the current parser event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
    /// Before the first call to `next`
    StartDocument,
    /// Input exhausted
    EndDocument,
    /// `<name attrs...>` or the start half of `<name/>`
    StartTag,
    /// `</name>` or the synthesized end half of `<name/>`
    EndTag,
    /// Character data
    Text,
    /// `<![CDATA[...]]>` (token mode only)
    CdSect,
    /// `&name;` (token mode only)
    EntityRef,
    /// Whitespace outside the root element
    IgnorableWhitespace,
    /// `<?target data?>`
    ProcessingInstruction,
    /// `<!-- ... -->`, also used for relaxed-mode error annotations
    Comment,
    /// `<!DOCTYPE ...>`
    DocDecl,
}

impl EventType {
    /// XmlPull style upper-case name
    pub fn name(self) -> &'static str {
        match self {
            EventType::StartDocument => "START_DOCUMENT",
            EventType::EndDocument => "END_DOCUMENT",
            EventType::StartTag => "START_TAG",
            EventType::EndTag => "END_TAG",
            EventType::Text => "TEXT",
            EventType::CdSect => "CDSECT",
            EventType::EntityRef => "ENTITY_REF",
            EventType::IgnorableWhitespace => "IGNORABLE_WHITESPACE",
            EventType::ProcessingInstruction => "PROCESSING_INSTRUCTION",
            EventType::Comment => "COMMENT",
            EventType::DocDecl => "DOCDECL",
        }
    }

    /// Events that carry character data in the text buffer
    #[inline]
    pub fn is_textual(self) -> bool {
        self >= EventType::Text
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of the parser's current event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: EventType,
    /// Resolved namespace, `None` outside tags
    pub namespace: Option<&'a str>,
    /// Local name for tags, entity name for entity references
    pub name: Option<&'a str>,
    pub prefix: Option<&'a str>,
    /// Character data, `None` for tags and document boundaries
    pub text: Option<&'a str>,
    pub is_whitespace: bool,
}
