//! Attribute storage for start tags
//!
//! The parser collects attributes with their raw qualified names first and
//! resolves prefixes only after every `xmlns` declaration on the same tag has
//! been seen, so an attribute may use a prefix declared after it.

/// Parsed attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, empty when unqualified or not yet resolved
    pub namespace: String,
    /// Prefix, if the name was qualified
    pub prefix: Option<String>,
    /// Local name (or raw qualified name before resolution)
    pub name: String,
    /// Attribute value with entities already replaced
    pub value: String,
}

impl Attribute {
    /// Attribute as read from the tag, before namespace resolution
    pub fn raw(qname: String, value: String) -> Self {
        Attribute {
            namespace: String::new(),
            prefix: None,
            name: qname,
            value,
        }
    }

    /// Qualified name as it appeared in the document
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

/// Split a qualified name into prefix and local name.
///
/// `"a:b"` gives `(Some("a"), "b")`, `"b"` gives `(None, "b")`. A leading
/// colon yields an empty prefix, which callers treat as illegal.
#[inline]
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(colon) => (Some(&name[..colon]), &name[colon + 1..]),
        None => (None, name),
    }
}

/// True for characters that may start an XML name
#[inline]
pub fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || c >= '\u{C0}'
}

/// True for characters that may continue an XML name
#[inline]
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.') || c >= '\u{B7}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("xsi:type"), (Some("xsi"), "type"));
        assert_eq!(split_name("id"), (None, "id"));
        assert_eq!(split_name(":bad"), (Some(""), "bad"));
    }

    #[test]
    fn test_qualified_name() {
        let mut attr = Attribute::raw("type".into(), "d:string".into());
        assert_eq!(attr.qualified_name(), "type");
        attr.prefix = Some("xsi".into());
        assert_eq!(attr.qualified_name(), "xsi:type");
    }

    #[test]
    fn test_name_chars() {
        assert!(is_name_start_char('a'));
        assert!(is_name_start_char('_'));
        assert!(!is_name_start_char('1'));
        assert!(!is_name_start_char('-'));
        assert!(is_name_char('1'));
        assert!(is_name_char('-'));
        assert!(is_name_char('é'));
        assert!(!is_name_char('='));
        assert!(!is_name_char(' '));
    }
}
