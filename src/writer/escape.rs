//! Character escaping for text and attribute values

use memchr::memchr3;

/// Append `text` to `out`, escaping markup characters.
///
/// - `&`, `<` and `>` always become entity references
/// - `quote` is the attribute delimiter in use, or `None` for element text;
///   the delimiter is escaped and line ends/tabs become character references
/// - control characters, and everything beyond ASCII when `unicode` is
///   false, become numeric character references
pub fn escape_into(out: &mut String, text: &str, quote: Option<char>, unicode: bool) {
    // Fast path: plain ASCII text without markup characters
    let bytes = text.as_bytes();
    if memchr3(b'&', b'<', b'>', bytes).is_none()
        && bytes.iter().all(|&b| b >= 0x20 && b < 0x7F && b != b'"' && b != b'\'')
    {
        out.push_str(text);
        return;
    }

    for c in text.chars() {
        match c {
            '\n' | '\r' | '\t' => match quote {
                None => out.push(c),
                Some(_) => push_char_ref(out, c),
            },
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote == Some('"') => out.push_str("&quot;"),
            '\'' if quote == Some('\'') => out.push_str("&apos;"),
            c if c < ' ' || c == '\u{7F}' || (!unicode && !c.is_ascii()) => push_char_ref(out, c),
            c => out.push(c),
        }
    }
}

#[inline]
fn push_char_ref(out: &mut String, c: char) {
    out.push_str("&#");
    out.push_str(&(c as u32).to_string());
    out.push(';');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(text: &str, quote: Option<char>, unicode: bool) -> String {
        let mut out = String::new();
        escape_into(&mut out, text, quote, unicode);
        out
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape("hello world", None, true), "hello world");
    }

    #[test]
    fn test_markup_escaped() {
        assert_eq!(escape("a<b>&c", None, true), "a&lt;b&gt;&amp;c");
    }

    #[test]
    fn test_whitespace_in_text_and_attribute() {
        assert_eq!(escape("a\nb\tc", None, true), "a\nb\tc");
        assert_eq!(escape("a\nb\tc", Some('"'), true), "a&#10;b&#9;c");
    }

    #[test]
    fn test_quotes() {
        assert_eq!(escape(r#"'x' "y""#, None, true), r#"'x' "y""#);
        assert_eq!(escape(r#"'x' "y""#, Some('"'), true), r#"'x' &quot;y&quot;"#);
        assert_eq!(escape(r#"'x' "y""#, Some('\''), true), r#"&apos;x&apos; "y""#);
    }

    #[test]
    fn test_control_and_non_ascii() {
        assert_eq!(escape("\u{1}", None, true), "&#1;");
        assert_eq!(escape("é", None, true), "é");
        assert_eq!(escape("é", None, false), "&#233;");
    }
}
