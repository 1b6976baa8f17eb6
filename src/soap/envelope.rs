//! SOAP Envelope
//!
//! Versions, their namespaces, and the Envelope/Header/Body framing shared by
//! every envelope kind. Implementors of [`Envelope`] supply the body handling;
//! parsing and writing of the frame, headers and whole messages are provided.

use super::fault::SoapFault;
use crate::core::encoding::XmlEncoding;
use crate::dom::{Element, Node};
use crate::error::Result;
use crate::reader::{EventType, ParserOptions, PullParser};
use crate::writer::XmlWriter;
use std::fmt;
use std::io::{Read, Write};
use tracing::debug;

/// Namespace URIs used by the supported protocol versions
pub mod ns {
    /// SOAP 1.1 envelope
    pub const ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
    /// SOAP 1.1 encoding
    pub const ENC: &str = "http://schemas.xmlsoap.org/soap/encoding/";
    /// SOAP 1.2 envelope
    pub const ENV2003: &str = "http://www.w3.org/2003/05/soap-envelope";
    /// SOAP 1.2 encoding
    pub const ENC2003: &str = "http://www.w3.org/2003/05/soap-encoding";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    pub const XSD1999: &str = "http://www.w3.org/1999/XMLSchema";
    pub const XSI1999: &str = "http://www.w3.org/1999/XMLSchema-instance";
}

/// SOAP protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SoapVersion {
    V10,
    #[default]
    V11,
    V12,
}

impl SoapVersion {
    /// Envelope namespace
    pub fn env(self) -> &'static str {
        match self {
            SoapVersion::V12 => ns::ENV2003,
            _ => ns::ENV,
        }
    }

    /// SOAP encoding namespace
    pub fn enc(self) -> &'static str {
        match self {
            SoapVersion::V12 => ns::ENC2003,
            _ => ns::ENC,
        }
    }

    /// XML Schema namespace (the 1999 draft for SOAP 1.0)
    pub fn xsd(self) -> &'static str {
        match self {
            SoapVersion::V10 => ns::XSD1999,
            _ => ns::XSD,
        }
    }

    /// XML Schema instance namespace
    pub fn xsi(self) -> &'static str {
        match self {
            SoapVersion::V10 => ns::XSI1999,
            _ => ns::XSI,
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoapVersion::V10 => "1.0",
            SoapVersion::V11 => "1.1",
            SoapVersion::V12 => "1.2",
        })
    }
}

/// SOAP boolean text: `1` or `true`, case-insensitive, surrounding
/// whitespace ignored
pub fn string_to_boolean(text: &str) -> bool {
    let text = text.trim();
    text == "1" || text.eq_ignore_ascii_case("true")
}

/// How a message is turned into bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub encoding: XmlEncoding,
    /// Literal text written before the root element, e.g. an XML declaration
    pub prologue: Option<String>,
}

/// Header entries and the `encodingStyle` seen or to be written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeFrame {
    /// Header entries of the last parsed message
    pub header_in: Vec<Element>,
    /// Header entries written with the next message
    pub header_out: Vec<Element>,
    pub encoding_style: Option<String>,
}

/// A SOAP envelope: framing is provided, the body is up to the implementor
pub trait Envelope {
    fn version(&self) -> SoapVersion;

    fn frame(&self) -> &EnvelopeFrame;

    fn frame_mut(&mut self) -> &mut EnvelopeFrame;

    /// Read the body content. Called on the Body start tag; must return on
    /// the Body end tag.
    fn parse_body(&mut self, parser: &mut PullParser) -> Result<()>;

    /// Write the body content between the Body tags
    fn write_body(&self, writer: &mut XmlWriter) -> Result<()>;

    /// Read header entries. Called on the Header start tag; returns on the
    /// Header end tag.
    fn parse_header(&mut self, parser: &mut PullParser) -> Result<()> {
        parser.next_tag()?;
        let mut headers = Node::new();
        headers.parse(parser)?;
        self.frame_mut().header_in = headers.elements().cloned().collect();
        Ok(())
    }

    fn write_header(&self, writer: &mut XmlWriter) -> Result<()> {
        for entry in &self.frame().header_out {
            entry.write(writer)?;
        }
        Ok(())
    }

    /// Parse a whole envelope, starting before its root element
    fn parse(&mut self, parser: &mut PullParser) -> Result<()> {
        let env = self.version().env();
        debug!(version = %self.version(), "parsing envelope");

        parser.next_tag()?;
        parser.require(EventType::StartTag, Some(env), Some("Envelope"))?;
        self.frame_mut().encoding_style = parser.attribute_value(Some(env), "encodingStyle").map(str::to_string);

        parser.next_tag()?;
        if parser.event_type() == EventType::StartTag
            && parser.namespace() == Some(env)
            && parser.name() == Some("Header")
        {
            self.parse_header(parser)?;
            parser.require(EventType::EndTag, Some(env), Some("Header"))?;
            parser.next_tag()?;
        }

        parser.require(EventType::StartTag, Some(env), Some("Body"))?;
        if let Some(style) = parser.attribute_value(Some(env), "encodingStyle") {
            self.frame_mut().encoding_style = Some(style.to_string());
        }

        self.parse_body(parser)?;
        parser.require(EventType::EndTag, Some(env), Some("Body"))?;
        parser.next_tag()?;
        parser.require(EventType::EndTag, Some(env), Some("Envelope"))?;
        Ok(())
    }

    /// Write the envelope with the conventional `i`, `d`, `c` and `v` prefixes
    fn write(&self, writer: &mut XmlWriter) -> Result<()> {
        let version = self.version();
        let env = version.env();
        debug!(version = %version, headers = self.frame().header_out.len(), "writing envelope");

        writer.set_prefix("i", version.xsi())?;
        writer.set_prefix("d", version.xsd())?;
        writer.set_prefix("c", version.enc())?;
        writer.set_prefix("v", env)?;

        writer.start_tag(Some(env), "Envelope")?;
        writer.start_tag(Some(env), "Header")?;
        self.write_header(writer)?;
        writer.end_tag(Some(env), "Header")?;
        writer.start_tag(Some(env), "Body")?;
        self.write_body(writer)?;
        writer.end_tag(Some(env), "Body")?;
        writer.end_tag(Some(env), "Envelope")?;
        Ok(())
    }

    /// Encode the message and hand it to `sink`: prologue, envelope, CRLF.
    ///
    /// Nothing reaches the sink if writing fails.
    fn write_message<W: Write>(&self, mut sink: W, options: &WriteOptions) -> Result<()>
    where
        Self: Sized,
    {
        let bytes = self.to_bytes(options)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Encode the message into a byte vector
    fn to_bytes(&self, options: &WriteOptions) -> Result<Vec<u8>>
    where
        Self: Sized,
    {
        let mut writer = XmlWriter::new(options.encoding);
        self.write(&mut writer)?;
        writer.end_document()?;

        let mut bytes = Vec::with_capacity(writer.as_str().len() + 64);
        if let Some(prologue) = &options.prologue {
            bytes.extend(options.encoding.encode(prologue));
        }
        bytes.extend(writer.finish()?);
        bytes.extend(options.encoding.encode("\r\n"));
        Ok(bytes)
    }

    /// Read a whole message from `source`. The character encoding is sniffed
    /// unless given.
    fn parse_message<R: Read>(&mut self, source: R, encoding: Option<&str>) -> Result<()>
    where
        Self: Sized,
    {
        self.parse_message_with_options(source, encoding, ParserOptions::default())
    }

    /// [`parse_message`](Envelope::parse_message) with explicit parser
    /// options, e.g. relaxed mode for near-conformant servers
    fn parse_message_with_options<R: Read>(
        &mut self,
        source: R,
        encoding: Option<&str>,
        options: ParserOptions,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let mut parser = PullParser::from_reader(source, encoding, options)?;
        self.parse(&mut parser)
    }
}

/// Body of a literal envelope
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralBody {
    Node(Node),
    Fault(SoapFault),
}

/// Envelope whose body is literal XML
#[derive(Debug, Clone, Default)]
pub struct SoapEnvelope {
    version: SoapVersion,
    frame: EnvelopeFrame,
    pub body_in: Option<LiteralBody>,
    pub body_out: Option<Node>,
}

impl SoapEnvelope {
    pub fn new(version: SoapVersion) -> Self {
        SoapEnvelope {
            version,
            ..SoapEnvelope::default()
        }
    }

    /// The received fault, if the last parsed body was one
    pub fn fault(&self) -> Option<&SoapFault> {
        match &self.body_in {
            Some(LiteralBody::Fault(fault)) => Some(fault),
            _ => None,
        }
    }
}

impl Envelope for SoapEnvelope {
    fn version(&self) -> SoapVersion {
        self.version
    }

    fn frame(&self) -> &EnvelopeFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut EnvelopeFrame {
        &mut self.frame
    }

    fn parse_body(&mut self, parser: &mut PullParser) -> Result<()> {
        parser.next_tag()?;
        let env = self.version.env();

        if parser.event_type() == EventType::StartTag
            && parser.namespace() == Some(env)
            && parser.name() == Some("Fault")
        {
            self.body_in = Some(LiteralBody::Fault(SoapFault::parse(parser, self.version)?));
        } else {
            let mut body = Node::new();
            body.parse(parser)?;
            self.body_in = Some(LiteralBody::Node(body));
        }
        Ok(())
    }

    fn write_body(&self, writer: &mut XmlWriter) -> Result<()> {
        if let Some(style) = &self.frame.encoding_style {
            writer.attribute(Some(self.version.env()), "encodingStyle", style)?;
        }
        if let Some(body) = &self.body_out {
            body.write(writer)?;
        }
        Ok(())
    }
}
