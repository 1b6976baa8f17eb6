//! XML Entity Resolution
//!
//! Handles the replacement text of entity references:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - Caller-defined entities via [`EntityTable::define`]

use std::collections::HashMap;

/// Named entity replacement table
#[derive(Debug, Clone)]
pub struct EntityTable {
    entries: HashMap<String, String>,
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityTable {
    /// Create a table holding the five predefined XML entities
    pub fn new() -> Self {
        let mut entries = HashMap::with_capacity(8);
        for (name, text) in [("lt", "<"), ("gt", ">"), ("amp", "&"), ("quot", "\""), ("apos", "'")] {
            entries.insert(name.to_string(), text.to_string());
        }
        EntityTable { entries }
    }

    /// Add or replace an entity definition
    pub fn define(&mut self, name: &str, replacement: &str) {
        self.entries.insert(name.to_string(), replacement.to_string());
    }

    /// Replacement text for a named entity (without `&` and `;`)
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}

/// Decode the body of a numeric character reference.
///
/// `code` is the reference without `&#` and `;`, e.g. `"x7B"` or `"123"`.
/// Returns `None` for malformed numbers and for code points that are not
/// legal XML characters.
pub fn decode_char_ref(code: &str) -> Option<char> {
    let codepoint = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
        // Hexadecimal: &#xHHHH;
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        // Decimal: &#DDDD;
        None => code.parse::<u32>().ok()?,
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Characters allowed inside an entity name before the closing `;`
#[inline]
pub fn is_entity_name_char(c: char) -> bool {
    !c.is_ascii() || c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '#' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entities() {
        let table = EntityTable::new();
        assert_eq!(table.get("lt"), Some("<"));
        assert_eq!(table.get("amp"), Some("&"));
        assert_eq!(table.get("apos"), Some("'"));
        assert_eq!(table.get("nbsp"), None);
    }

    #[test]
    fn test_define_entity() {
        let mut table = EntityTable::new();
        table.define("company", "ACME Corp");
        assert_eq!(table.get("company"), Some("ACME Corp"));
    }

    #[test]
    fn test_numeric_decimal() {
        assert_eq!(decode_char_ref("65"), Some('A'));
        assert_eq!(decode_char_ref("233"), Some('é'));
    }

    #[test]
    fn test_numeric_hex() {
        assert_eq!(decode_char_ref("x41"), Some('A'));
        assert_eq!(decode_char_ref("X1F600"), Some('😀'));
    }

    #[test]
    fn test_invalid_char_ref() {
        assert_eq!(decode_char_ref("x0"), None);
        assert_eq!(decode_char_ref("xD800"), None);
        assert_eq!(decode_char_ref("abc"), None);
        assert_eq!(decode_char_ref(""), None);
    }

    #[test]
    fn test_entity_name_chars() {
        assert!(is_entity_name_char('a'));
        assert!(is_entity_name_char('#'));
        assert!(!is_entity_name_char('<'));
        assert!(!is_entity_name_char(' '));
    }
}
