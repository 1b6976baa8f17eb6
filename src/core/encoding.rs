//! XML Encoding Detection and Conversion
//!
//! Handles detection of the input encoding from the first four bytes of a
//! document (byte order marks, the `<?xml` signature in various widths, and the
//! `encoding="..."` pseudo-attribute) and converts everything to UTF-8 before
//! parsing. The same enum drives output encoding for the writer.
//!
//! Supported encodings:
//! - UTF-8 (default)
//! - UTF-16 LE / BE
//! - UTF-32 LE / BE
//! - ISO-8859-1 (Latin-1)
//! - US-ASCII

use memchr::{memchr, memmem};

/// Character encodings understood by the parser and the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Latin1,
    Ascii,
}

impl XmlEncoding {
    /// Canonical label, as written into an XML declaration
    pub fn label(self) -> &'static str {
        match self {
            XmlEncoding::Utf8 => "UTF-8",
            XmlEncoding::Utf16Le => "UTF-16LE",
            XmlEncoding::Utf16Be => "UTF-16BE",
            XmlEncoding::Utf32Le => "UTF-32LE",
            XmlEncoding::Utf32Be => "UTF-32BE",
            XmlEncoding::Latin1 => "ISO-8859-1",
            XmlEncoding::Ascii => "US-ASCII",
        }
    }

    /// Look up an encoding by its IANA name (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.trim().to_ascii_uppercase();
        let enc = match upper.as_str() {
            "UTF-8" | "UTF8" => XmlEncoding::Utf8,
            // Unmarked UTF-16 defaults to big endian
            "UTF-16" | "UTF16" | "UTF-16BE" | "UNICODEFFFE" => XmlEncoding::Utf16Be,
            "UTF-16LE" | "UNICODE" => XmlEncoding::Utf16Le,
            "UTF-32" | "UTF32" | "UTF-32BE" => XmlEncoding::Utf32Be,
            "UTF-32LE" => XmlEncoding::Utf32Le,
            "ISO-8859-1" | "ISO8859-1" | "ISO_8859-1" | "LATIN1" | "LATIN-1" | "L1" => {
                XmlEncoding::Latin1
            }
            "US-ASCII" | "ASCII" => XmlEncoding::Ascii,
            _ => return None,
        };
        Some(enc)
    }

    /// True when every Unicode scalar value can be written without a
    /// character reference
    pub fn is_unicode(self) -> bool {
        !matches!(self, XmlEncoding::Latin1 | XmlEncoding::Ascii)
    }

    /// Sniff the encoding from the first four bytes.
    ///
    /// Returns the encoding and the length of the byte order mark to skip.
    pub fn detect(input: &[u8]) -> (Self, usize) {
        let mut head = [0u8; 4];
        let n = input.len().min(4);
        head[..n].copy_from_slice(&input[..n]);

        match head {
            [0x00, 0x00, 0xFE, 0xFF] => return (XmlEncoding::Utf32Be, 4),
            [0xFF, 0xFE, 0x00, 0x00] if n == 4 => return (XmlEncoding::Utf32Le, 4),
            [0x00, 0x00, 0x00, b'<'] => return (XmlEncoding::Utf32Be, 0),
            [b'<', 0x00, 0x00, 0x00] => return (XmlEncoding::Utf32Le, 0),
            [0x00, b'<', 0x00, b'?'] => return (XmlEncoding::Utf16Be, 0),
            [b'<', 0x00, b'?', 0x00] => return (XmlEncoding::Utf16Le, 0),
            [b'<', b'?', b'x', b'm'] => {
                let declared = declared_encoding(input).and_then(XmlEncoding::from_label);
                return (declared.unwrap_or(XmlEncoding::Utf8), 0);
            }
            _ => {}
        }

        match head {
            [0xFE, 0xFF, ..] => (XmlEncoding::Utf16Be, 2),
            [0xFF, 0xFE, ..] => (XmlEncoding::Utf16Le, 2),
            [0xEF, 0xBB, 0xBF, _] => (XmlEncoding::Utf8, 3),
            _ => (XmlEncoding::Utf8, 0),
        }
    }

    /// Length of this encoding's byte order mark at the start of `input`, if any
    fn bom_len(self, input: &[u8]) -> usize {
        let bom: &[u8] = match self {
            XmlEncoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            XmlEncoding::Utf16Le => &[0xFF, 0xFE],
            XmlEncoding::Utf16Be => &[0xFE, 0xFF],
            XmlEncoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            XmlEncoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            XmlEncoding::Latin1 | XmlEncoding::Ascii => &[],
        };
        if !bom.is_empty() && input.starts_with(bom) {
            bom.len()
        } else {
            0
        }
    }

    /// Decode `input` (BOM already removed) into a `String`
    pub fn decode(self, input: &[u8]) -> Result<String, String> {
        match self {
            XmlEncoding::Utf8 => String::from_utf8(input.to_vec())
                .map_err(|e| format!("Invalid UTF-8: {}", e)),
            XmlEncoding::Utf16Le => decode_utf16(input, u16::from_le_bytes, "LE"),
            XmlEncoding::Utf16Be => decode_utf16(input, u16::from_be_bytes, "BE"),
            XmlEncoding::Utf32Le => decode_utf32(input, u32::from_le_bytes, "LE"),
            XmlEncoding::Utf32Be => decode_utf32(input, u32::from_be_bytes, "BE"),
            // Latin-1 maps byte values straight onto U+0000..U+00FF
            XmlEncoding::Latin1 => Ok(input.iter().map(|&b| b as char).collect()),
            XmlEncoding::Ascii => {
                if let Some(pos) = input.iter().position(|b| !b.is_ascii()) {
                    return Err(format!("Invalid US-ASCII: byte 0x{:02X} at {}", input[pos], pos));
                }
                Ok(input.iter().map(|&b| b as char).collect())
            }
        }
    }

    /// Encode text for output. Characters the encoding cannot represent
    /// must already have been escaped by the writer.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            XmlEncoding::Utf8 => text.as_bytes().to_vec(),
            XmlEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            XmlEncoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            XmlEncoding::Utf32Le => text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect(),
            XmlEncoding::Utf32Be => text.chars().flat_map(|c| (c as u32).to_be_bytes()).collect(),
            XmlEncoding::Latin1 => text
                .chars()
                .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
                .collect(),
            XmlEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

/// Extract the `encoding` pseudo-attribute from an ASCII-compatible XML
/// declaration. Only the bytes up to the first `>` are examined.
fn declared_encoding(input: &[u8]) -> Option<&str> {
    let end = memchr(b'>', input)?;
    let decl = &input[..end];
    let at = memmem::find(decl, b"encoding")?;
    let rest = &decl[at + "encoding".len()..];

    let eq = rest.iter().position(|&b| !b.is_ascii_whitespace())?;
    if rest[eq] != b'=' {
        return None;
    }
    let rest = &rest[eq + 1..];
    let open = rest.iter().position(|&b| !b.is_ascii_whitespace())?;
    let quote = rest[open];
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &rest[open + 1..];
    let close = memchr(quote, value)?;
    std::str::from_utf8(&value[..close]).ok()
}

fn decode_utf16(input: &[u8], unit: fn([u8; 2]) -> u16, order: &str) -> Result<String, String> {
    if input.len() % 2 != 0 {
        return Err(format!("Invalid UTF-16 {}: odd number of bytes", order));
    }
    let code_units: Vec<u16> = input
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16(&code_units).map_err(|e| format!("Invalid UTF-16 {}: {}", order, e))
}

fn decode_utf32(input: &[u8], unit: fn([u8; 4]) -> u32, order: &str) -> Result<String, String> {
    if input.len() % 4 != 0 {
        return Err(format!("Invalid UTF-32 {}: length not a multiple of 4", order));
    }
    input
        .chunks_exact(4)
        .map(|chunk| {
            let cp = unit([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(cp).ok_or_else(|| format!("Invalid UTF-32 {}: U+{:X}", order, cp))
        })
        .collect()
}

/// Decode a raw document.
///
/// With an explicit encoding the sniffing step is skipped, but a matching
/// byte order mark is still removed. Returns the text and the encoding used.
pub fn decode_document(
    input: &[u8],
    explicit: Option<&str>,
) -> Result<(String, XmlEncoding), String> {
    let (encoding, skip) = match explicit {
        Some(label) => {
            let enc = XmlEncoding::from_label(label)
                .ok_or_else(|| format!("Unsupported encoding: {}", label))?;
            (enc, enc.bom_len(input))
        }
        None => XmlEncoding::detect(input),
    };
    let text = encoding.decode(&input[skip..])?;
    Ok((text, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_boms() {
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, b'<', 0]), (XmlEncoding::Utf16Le, 2));
        assert_eq!(XmlEncoding::detect(&[0xFE, 0xFF, 0, b'<']), (XmlEncoding::Utf16Be, 2));
        assert_eq!(XmlEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']), (XmlEncoding::Utf8, 3));
        assert_eq!(XmlEncoding::detect(&[0, 0, 0xFE, 0xFF]), (XmlEncoding::Utf32Be, 4));
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, 0, 0]), (XmlEncoding::Utf32Le, 4));
    }

    #[test]
    fn test_detect_without_bom() {
        assert_eq!(XmlEncoding::detect(b"<\0?\0"), (XmlEncoding::Utf16Le, 0));
        assert_eq!(XmlEncoding::detect(b"\0<\0?"), (XmlEncoding::Utf16Be, 0));
        assert_eq!(XmlEncoding::detect(b"<root/>"), (XmlEncoding::Utf8, 0));
        assert_eq!(XmlEncoding::detect(b""), (XmlEncoding::Utf8, 0));
    }

    #[test]
    fn test_detect_declared_encoding() {
        let doc = b"<?xml version='1.0' encoding = \"ISO-8859-1\"?><a/>";
        assert_eq!(XmlEncoding::detect(doc), (XmlEncoding::Latin1, 0));

        let unknown = b"<?xml version='1.0' encoding='x-klingon'?><a/>";
        assert_eq!(XmlEncoding::detect(unknown), (XmlEncoding::Utf8, 0));
    }

    #[test]
    fn test_decode_utf16_le() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("<a>é</a>".encode_utf16().flat_map(u16::to_le_bytes));
        let (text, enc) = decode_document(&bytes, None).unwrap();
        assert_eq!(enc, XmlEncoding::Utf16Le);
        assert_eq!(text, "<a>é</a>");
    }

    #[test]
    fn test_decode_latin1() {
        let bytes = b"<a>\xE9</a>";
        let (text, _) = decode_document(bytes, Some("iso-8859-1")).unwrap();
        assert_eq!(text, "<a>é</a>");
    }

    #[test]
    fn test_explicit_encoding_strips_bom() {
        let bytes = b"\xEF\xBB\xBF<a/>";
        let (text, _) = decode_document(bytes, Some("UTF-8")).unwrap();
        assert_eq!(text, "<a/>");
    }

    #[test]
    fn test_unsupported_label() {
        assert!(decode_document(b"<a/>", Some("EBCDIC")).is_err());
    }

    #[test]
    fn test_encode_utf16_be() {
        assert_eq!(XmlEncoding::Utf16Be.encode("A"), vec![0x00, 0x41]);
        assert!(!XmlEncoding::Ascii.is_unicode());
    }
}
