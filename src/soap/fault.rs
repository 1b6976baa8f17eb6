//! SOAP Fault
//!
//! Both fault shapes live in one type. SOAP 1.0/1.1 faults carry
//! `faultcode`, `faultstring`, `faultactor` and `detail` children; SOAP 1.2
//! faults carry `Code`, `Reason`, `Node`, `Role` and `Detail`, and their
//! `Code/Value` and `Reason/Text` are mirrored into the 1.1 fields.

use super::envelope::{ns, SoapVersion};
use crate::dom::{Element, Node};
use crate::error::{Error, Result};
use crate::reader::{EventType, PullParser};
use crate::writer::XmlWriter;
use std::fmt;
use tracing::debug;

/// A fault received from, or sent to, a SOAP peer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoapFault {
    pub version: SoapVersion,
    pub faultcode: Option<String>,
    pub faultstring: Option<String>,
    pub faultactor: Option<String>,
    /// The `detail` element (1.1) or the content of `Detail` (1.2)
    pub detail: Option<Element>,
    pub code: Option<Node>,
    pub reason: Option<Node>,
    pub node: Option<Node>,
    pub role: Option<Node>,
}

impl SoapFault {
    pub fn new(version: SoapVersion) -> Self {
        SoapFault {
            version,
            ..SoapFault::default()
        }
    }

    /// Fault with code and message, for the version's shape
    pub fn with_message(version: SoapVersion, code: &str, message: &str) -> Self {
        SoapFault {
            version,
            faultcode: Some(code.to_string()),
            faultstring: Some(message.to_string()),
            ..SoapFault::default()
        }
    }

    /// Parse a fault; the parser must be on the Fault start tag and is left
    /// on the next tag after the Fault end tag
    pub fn parse(parser: &mut PullParser, version: SoapVersion) -> Result<Self> {
        let mut fault = SoapFault::new(version);
        if version >= SoapVersion::V12 {
            fault.parse_v12(parser)?;
        } else {
            fault.parse_v11(parser)?;
        }
        debug!(version = %version, code = fault.faultcode.as_deref().unwrap_or(""), "parsed fault");
        Ok(fault)
    }

    fn parse_v11(&mut self, parser: &mut PullParser) -> Result<()> {
        parser.require(EventType::StartTag, Some(ns::ENV), Some("Fault"))?;

        let mut event = parser.next_tag()?;
        while event == EventType::StartTag {
            let name = parser.name().unwrap_or("").to_string();
            match name.as_str() {
                "detail" => {
                    let mut detail = Element::new(parser.namespace(), "detail");
                    detail.parse(parser)?;
                    self.detail = Some(detail);
                    // Element::parse moved past the end tag already
                    event = settle(parser)?;
                    continue;
                }
                "faultcode" => self.faultcode = Some(parser.next_text()?),
                "faultstring" => self.faultstring = Some(parser.next_text()?),
                "faultactor" => self.faultactor = Some(parser.next_text()?),
                _ => return Err(Error::InvalidValue(format!("unexpected tag:{}", name))),
            }
            parser.require(EventType::EndTag, None, Some(&name))?;
            event = parser.next_tag()?;
        }

        parser.require(EventType::EndTag, Some(ns::ENV), Some("Fault"))?;
        parser.next_tag()?;
        Ok(())
    }

    fn parse_v12(&mut self, parser: &mut PullParser) -> Result<()> {
        parser.require(EventType::StartTag, Some(ns::ENV2003), Some("Fault"))?;

        while parser.next_tag()? == EventType::StartTag {
            let name = parser.name().unwrap_or("").to_string();
            let namespace = parser.namespace().unwrap_or("").to_string();

            // Token mode keeps the text of Node and Role
            parser.next_token()?;
            let mut content = Node::new();
            content.parse(parser)?;

            match name.to_ascii_lowercase().as_str() {
                "code" => self.code = Some(content),
                "reason" => self.reason = Some(content),
                "node" => self.node = Some(content),
                "role" => self.role = Some(content),
                "detail" => {
                    let mut detail = Element::new(Some(ns::ENV2003), "Detail");
                    *detail.node_mut() = content;
                    self.detail = Some(detail);
                }
                _ => return Err(Error::InvalidValue(format!("unexpected tag:{}", name))),
            }
            parser.require(EventType::EndTag, Some(&namespace), Some(&name))?;
        }

        parser.require(EventType::EndTag, Some(ns::ENV2003), Some("Fault"))?;
        parser.next_tag()?;

        self.faultcode = first_text(self.code.as_ref(), "Value");
        self.faultstring = first_text(self.reason.as_ref(), "Text");
        self.faultactor = None;
        Ok(())
    }

    /// Write the fault in the shape of its version
    pub fn write(&self, writer: &mut XmlWriter) -> Result<()> {
        if self.version >= SoapVersion::V12 {
            self.write_v12(writer)
        } else {
            self.write_v11(writer)
        }
    }

    fn write_v11(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.start_tag(Some(ns::ENV), "Fault")?;
        for (name, value) in [
            ("faultcode", &self.faultcode),
            ("faultstring", &self.faultstring),
            ("faultactor", &self.faultactor),
        ] {
            if let Some(value) = value {
                writer.start_tag(None, name)?;
                writer.text(value)?;
                writer.end_tag(None, name)?;
            }
        }
        match &self.detail {
            Some(detail) => detail.write(writer)?,
            None => {
                writer.start_tag(None, "detail")?;
                writer.end_tag(None, "detail")?;
            }
        }
        writer.end_tag(Some(ns::ENV), "Fault")?;
        Ok(())
    }

    fn write_v12(&self, writer: &mut XmlWriter) -> Result<()> {
        let env = Some(ns::ENV2003);
        writer.start_tag(env, "Fault")?;

        writer.start_tag(env, "Code")?;
        match &self.code {
            Some(code) => code.write(writer)?,
            None => write_wrapped(writer, "Value", self.faultcode.as_deref())?,
        }
        writer.end_tag(env, "Code")?;

        writer.start_tag(env, "Reason")?;
        match &self.reason {
            Some(reason) => reason.write(writer)?,
            None => write_wrapped(writer, "Text", self.faultstring.as_deref())?,
        }
        writer.end_tag(env, "Reason")?;

        for (name, content) in [("Node", &self.node), ("Role", &self.role)] {
            if let Some(content) = content {
                writer.start_tag(env, name)?;
                content.write(writer)?;
                writer.end_tag(env, name)?;
            }
        }
        if let Some(detail) = &self.detail {
            writer.start_tag(env, "Detail")?;
            detail.node().write(writer)?;
            writer.end_tag(env, "Detail")?;
        }

        writer.end_tag(env, "Fault")?;
        Ok(())
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.faultcode.as_deref().unwrap_or("null");
        let message = self.faultstring.as_deref().unwrap_or("null");
        if self.version >= SoapVersion::V12 {
            return write!(f, "Code: {}, Reason: {}", code, message);
        }
        write!(
            f,
            "SoapFault - faultcode: '{}' faultstring: '{}' faultactor: '{}' detail: {}",
            code,
            message,
            self.faultactor.as_deref().unwrap_or("null"),
            self.detail.as_ref().map_or_else(|| "null".to_string(), Element::text_content)
        )
    }
}

impl std::error::Error for SoapFault {}

/// Skip whitespace, comments and processing instructions up to the next tag
fn settle(parser: &mut PullParser) -> Result<EventType> {
    loop {
        match parser.event_type() {
            EventType::StartTag | EventType::EndTag => return Ok(parser.event_type()),
            EventType::Comment | EventType::ProcessingInstruction | EventType::IgnorableWhitespace => {}
            EventType::Text if parser.is_whitespace()? => {}
            _ => {
                return Err(Error::InvalidValue(format!(
                    "unexpected content in fault: {}",
                    parser.position_description()
                )))
            }
        }
        parser.next_token()?;
    }
}

fn first_text(content: Option<&Node>, child: &str) -> Option<String> {
    let element = content?.get_element(Some(ns::ENV2003), child).ok()?;
    element.text(0).map(str::to_string)
}

fn write_wrapped(writer: &mut XmlWriter, name: &str, text: Option<&str>) -> Result<()> {
    writer.start_tag(Some(ns::ENV2003), name)?;
    writer.text(text.unwrap_or(""))?;
    writer.end_tag(Some(ns::ENV2003), name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Parse a fault nested in a body element, as it is in an envelope
    fn parse(xml: &str, version: SoapVersion) -> SoapFault {
        let mut parser = PullParser::new(format!("<body>{}</body>", xml));
        parser.next_tag().unwrap();
        parser.next_tag().unwrap();
        let fault = SoapFault::parse(&mut parser, version).unwrap();
        assert_eq!(parser.event_type(), EventType::EndTag);
        assert_eq!(parser.name(), Some("body"));
        fault
    }

    #[test]
    fn test_parse_v11() {
        let fault = parse(
            concat!(
                r#"<e:Fault xmlns:e="http://schemas.xmlsoap.org/soap/envelope/">"#,
                "\n  <faultcode>e:Server</faultcode>",
                "\n  <faultstring>boom</faultstring>",
                "\n  <faultactor>urn:actor</faultactor>",
                "\n  <detail><why>disk</why></detail>\n",
                "</e:Fault>"
            ),
            SoapVersion::V11,
        );
        assert_eq!(fault.faultcode.as_deref(), Some("e:Server"));
        assert_eq!(fault.faultstring.as_deref(), Some("boom"));
        assert_eq!(fault.faultactor.as_deref(), Some("urn:actor"));
        let detail = fault.detail.as_ref().unwrap();
        assert_eq!(detail.get_element(None, "why").unwrap().text_content(), "disk");
        assert_eq!(
            fault.to_string(),
            "SoapFault - faultcode: 'e:Server' faultstring: 'boom' faultactor: 'urn:actor' detail: "
        );
    }

    #[test]
    fn test_parse_v11_empty_detail_last() {
        let fault = parse(
            concat!(
                r#"<e:Fault xmlns:e="http://schemas.xmlsoap.org/soap/envelope/">"#,
                "<faultcode>c</faultcode><detail/></e:Fault>"
            ),
            SoapVersion::V11,
        );
        assert_eq!(fault.faultcode.as_deref(), Some("c"));
        assert!(fault.detail.is_some());
    }

    #[test]
    fn test_parse_v11_unexpected_child() {
        let mut parser = PullParser::new(concat!(
            r#"<e:Fault xmlns:e="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<bogus/></e:Fault>"
        ));
        parser.next_tag().unwrap();
        let err = SoapFault::parse(&mut parser, SoapVersion::V11).unwrap_err();
        assert!(err.to_string().contains("unexpected tag:bogus"));
    }

    #[test]
    fn test_parse_v12() {
        let fault = parse(
            concat!(
                r#"<env:Fault xmlns:env="http://www.w3.org/2003/05/soap-envelope">"#,
                "<env:Code><env:Value>env:Sender</env:Value></env:Code>",
                "<env:Reason><env:Text xml:lang=\"en\">bad input</env:Text></env:Reason>",
                "<env:Role>urn:gateway</env:Role>",
                "<env:Detail><n>1</n></env:Detail>",
                "</env:Fault>"
            ),
            SoapVersion::V12,
        );
        assert_eq!(fault.faultcode.as_deref(), Some("env:Sender"));
        assert_eq!(fault.faultstring.as_deref(), Some("bad input"));
        assert_eq!(fault.role.as_ref().unwrap().text_content(), "urn:gateway");
        assert!(fault.faultactor.is_none());
        assert_eq!(fault.to_string(), "Code: env:Sender, Reason: bad input");
    }

    #[test]
    fn test_write_v12_from_fields() {
        let fault = SoapFault::with_message(SoapVersion::V12, "env:Receiver", "down");
        let mut writer = XmlWriter::default();
        writer.set_prefix("env", ns::ENV2003).unwrap();
        fault.write(&mut writer).unwrap();
        assert_eq!(
            writer.as_str(),
            concat!(
                r#"<env:Fault xmlns:env="http://www.w3.org/2003/05/soap-envelope">"#,
                "<env:Code><env:Value>env:Receiver</env:Value></env:Code>",
                "<env:Reason><env:Text>down</env:Text></env:Reason>",
                "</env:Fault>"
            )
        );
    }

    #[test]
    fn test_write_v11_round_trip() {
        let fault = SoapFault::with_message(SoapVersion::V11, "v:Client", "nope");
        let mut writer = XmlWriter::default();
        writer.set_prefix("v", ns::ENV).unwrap();
        fault.write(&mut writer).unwrap();
        let xml = writer.as_str().to_string();

        let parsed = parse(&xml, SoapVersion::V11);
        assert_eq!(parsed.faultcode.as_deref(), Some("v:Client"));
        assert_eq!(parsed.faultstring.as_deref(), Some("nope"));
    }
}
