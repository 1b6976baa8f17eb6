//! Envelope with a mapped body
//!
//! Body content is read into and written from [`Value`] graphs through the
//! type registry. The framing (Envelope, Header, Body) is shared with the
//! literal [`SoapEnvelope`](crate::soap::SoapEnvelope).

use super::object::Serializable;
use super::property::PropertyInfo;
use super::read::SoapReader;
use super::registry::TypeRegistry;
use super::value::Value;
use super::write::SoapWriter;
use crate::error::{Error, Result};
use crate::reader::{EventType, PullParser};
use crate::soap::{Envelope, EnvelopeFrame, SoapFault, SoapVersion};
use crate::writer::XmlWriter;
use tracing::debug;

/// Switches of the mapping engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeOptions {
    /// Omit `xsi:type` and `arrayType` where the declared type matches
    pub implicit_types: bool,
    /// Leave out null slots instead of writing nil elements
    pub skip_null_properties: bool,
    /// Write the body element unqualified with an `xmlns` attribute
    pub dot_net: bool,
    /// Skip elements that match no slot of a typed object instead of failing
    pub avoid_exception_for_unknown_property: bool,
    /// Write `id` and `root` on the body element
    pub add_adornments: bool,
    /// Largest array size or position accepted from incoming `arrayType`
    /// and `position` attributes
    pub max_array_length: usize,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        EnvelopeOptions {
            implicit_types: false,
            skip_null_properties: false,
            dot_net: false,
            avoid_exception_for_unknown_property: false,
            add_adornments: true,
            max_array_length: 1 << 20,
        }
    }
}

/// SOAP envelope whose body is an object graph
#[derive(Debug, Clone)]
pub struct SoapSerializationEnvelope {
    version: SoapVersion,
    frame: EnvelopeFrame,
    pub options: EnvelopeOptions,
    pub registry: TypeRegistry,
    /// Written as the body element
    pub body_out: Option<Value>,
    /// Root of the last parsed body
    pub body_in: Option<Value>,
    /// Fault of the last parsed body
    pub fault: Option<SoapFault>,
}

impl SoapSerializationEnvelope {
    pub fn new(version: SoapVersion) -> Self {
        Self::with_registry(TypeRegistry::new(version))
    }

    /// Envelope for the registry's version
    pub fn with_registry(registry: TypeRegistry) -> Self {
        SoapSerializationEnvelope {
            version: registry.version(),
            frame: EnvelopeFrame::default(),
            options: EnvelopeOptions::default(),
            registry,
            body_out: None,
            body_in: None,
            fault: None,
        }
    }

    pub fn set_body_out(&mut self, body: impl Into<Value>) {
        self.body_out = Some(body.into());
    }

    /// Drop the outgoing body so an empty Body element is written
    pub fn set_body_out_empty(&mut self, empty: bool) {
        if empty {
            self.body_out = None;
        }
    }

    pub fn set_add_adornments(&mut self, add: bool) {
        self.options.add_adornments = add;
    }

    pub fn set_encoding_style(&mut self, style: Option<&str>) {
        self.frame.encoding_style = style.map(str::to_string);
    }

    /// The result of a call: the single slot of the body root, the slots as
    /// a vector when there are several, `None` for no slots. A received
    /// fault is returned as [`Error::Fault`].
    pub fn response(&self) -> Result<Option<Value>> {
        if let Some(fault) = &self.fault {
            return Err(Error::Fault(Box::new(fault.clone())));
        }
        let Some(body) = &self.body_in else {
            return Ok(None);
        };
        let Some(object) = body.as_object() else {
            return Ok(Some(body.clone()));
        };

        let object = object.borrow();
        let response = match object.property_count() {
            0 => None,
            1 => Some(object.property(0)),
            n => Some(Value::vector((0..n).map(|i| object.property(i)).collect())),
        };
        Ok(response)
    }
}

impl Default for SoapSerializationEnvelope {
    fn default() -> Self {
        SoapSerializationEnvelope::new(SoapVersion::default())
    }
}

impl Envelope for SoapSerializationEnvelope {
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
        self.body_in = None;
        self.fault = None;
        parser.next_tag()?;

        let env = self.version.env();
        if parser.event_type() == EventType::StartTag
            && parser.namespace() == Some(env)
            && parser.name() == Some("Fault")
        {
            self.fault = Some(SoapFault::parse(parser, self.version)?);
            return Ok(());
        }

        let enc = self.version.enc();
        let any = PropertyInfo::object();
        let mut reader = SoapReader::new(parser, &self.registry, &self.options);
        let mut body_in = None;
        let mut count = 0usize;

        while reader.parser().event_type() == EventType::StartTag {
            let root = reader.parser().attribute_value(Some(enc), "root") == Some("1");
            let qname = (
                reader.parser().namespace().unwrap_or_default().to_string(),
                reader.parser().name().unwrap_or_default().to_string(),
            );
            let value = reader.read(None, Some(qname), &any)?;
            if root || body_in.is_none() {
                body_in = Some(value);
            }
            count += 1;
            reader.parser().next_tag()?;
        }
        reader.finish();

        debug!(version = %self.version, elements = count, "parsed mapped body");
        self.body_in = body_in;
        Ok(())
    }

    fn write_body(&self, writer: &mut XmlWriter) -> Result<()> {
        if let Some(style) = &self.frame.encoding_style {
            writer.attribute(Some(self.version.env()), "encodingStyle", style)?;
        }
        if let Some(body) = &self.body_out {
            debug!(version = %self.version, type_key = %body.type_key(), "writing mapped body");
            SoapWriter::new(writer, &self.registry, &self.options).write_body(body)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::SoapObject;
    use crate::soap::WriteOptions;
    use pretty_assertions::assert_eq;

    const OPEN: &str = concat!(
        r#"<v:Envelope xmlns:i="http://www.w3.org/2001/XMLSchema-instance" "#,
        r#"xmlns:d="http://www.w3.org/2001/XMLSchema" "#,
        r#"xmlns:c="http://schemas.xmlsoap.org/soap/encoding/" "#,
        r#"xmlns:v="http://schemas.xmlsoap.org/soap/envelope/">"#,
        r#"<v:Header />"#
    );

    fn to_text(envelope: &SoapSerializationEnvelope) -> String {
        String::from_utf8(envelope.to_bytes(&WriteOptions::default()).unwrap()).unwrap()
    }

    fn parse(envelope: &mut SoapSerializationEnvelope, body: &str) -> Result<()> {
        let xml = format!(
            "{}<v:Body>{}</v:Body></v:Envelope>",
            OPEN.replace("<v:Header />", ""),
            body
        );
        envelope.parse(&mut PullParser::new(&xml))
    }

    #[test]
    fn test_write_request() {
        let mut request = SoapObject::new("urn:calc", "add");
        request.add_property("a", 1).add_property("b", 2);
        let mut envelope = SoapSerializationEnvelope::new(SoapVersion::V11);
        envelope.set_body_out(request);

        assert_eq!(
            to_text(&envelope),
            format!(
                "{}{}\r\n",
                OPEN,
                concat!(
                    r#"<v:Body><n0:add id="o0" c:root="1" xmlns:n0="urn:calc">"#,
                    r#"<a i:type="d:int">1</a><b i:type="d:int">2</b>"#,
                    r#"</n0:add></v:Body></v:Envelope>"#
                )
            )
        );
    }

    #[test]
    fn test_dot_net_body() {
        let mut request = SoapObject::new("urn:calc", "add");
        request.add_property("a", 1);
        let mut envelope = SoapSerializationEnvelope::new(SoapVersion::V11);
        envelope.options.dot_net = true;
        envelope.options.implicit_types = true;
        envelope.set_add_adornments(false);
        envelope.set_body_out(request);

        assert!(to_text(&envelope).contains(r#"<v:Body><add xmlns="urn:calc"><a>1</a></add></v:Body>"#));
    }

    #[test]
    fn test_empty_body_and_encoding_style() {
        let mut envelope = SoapSerializationEnvelope::new(SoapVersion::V11);
        envelope.set_body_out(SoapObject::new("urn:t", "x"));
        envelope.set_body_out_empty(true);
        envelope.set_encoding_style(Some("http://schemas.xmlsoap.org/soap/encoding/"));

        assert!(to_text(&envelope).ends_with(
            "<v:Body v:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\" /></v:Envelope>\r\n"
        ));
    }

    #[test]
    fn test_response_shapes() {
        let mut envelope = SoapSerializationEnvelope::new(SoapVersion::V11);

        parse(&mut envelope, r#"<m:r xmlns:m="urn:m" />"#).unwrap();
        assert_eq!(envelope.response().unwrap(), None);

        parse(&mut envelope, r#"<m:r xmlns:m="urn:m"><sum>3</sum></m:r>"#).unwrap();
        let sum = envelope.response().unwrap().unwrap();
        assert_eq!(sum.to_string(), "3");

        parse(&mut envelope, r#"<m:r xmlns:m="urn:m"><a>1</a><b>2</b></m:r>"#).unwrap();
        let both = envelope.response().unwrap().unwrap();
        assert_eq!(both.as_vector().unwrap().borrow().len(), 2);
    }

    #[test]
    fn test_root_marker_selects_body() {
        let mut envelope = SoapSerializationEnvelope::new(SoapVersion::V11);
        let body = concat!(
            r#"<m:extra xmlns:m="urn:m"><x>0</x></m:extra>"#,
            r#"<m:r xmlns:m="urn:m" xmlns:c="http://schemas.xmlsoap.org/soap/encoding/" c:root="1">"#,
            r#"<sum>3</sum></m:r>"#
        );
        parse(&mut envelope, body).unwrap();
        let root = envelope.body_in.clone().unwrap();
        let root = root.as_object().unwrap().borrow();
        assert_eq!(root.as_soap_object().unwrap().name(), "r");
    }

    #[test]
    fn test_fault_response() {
        let mut envelope = SoapSerializationEnvelope::new(SoapVersion::V11);
        let body = concat!(
            "<v:Fault><faultcode>v:Server</faultcode>",
            "<faultstring>boom</faultstring></v:Fault>"
        );
        parse(&mut envelope, body).unwrap();
        assert!(envelope.body_in.is_none());

        let err = envelope.response().unwrap_err();
        let fault = err.as_fault().unwrap();
        assert_eq!(fault.faultstring.as_deref(), Some("boom"));
    }
}
