//! Stock codecs
//!
//! [`DefaultMarshal`] is always registered. The others are opt-in through
//! [`TypeRegistry::add_marshal`](super::TypeRegistry::add_marshal).

use super::property::{PropertyInfo, TypeKey};
use super::read::SoapReader;
use super::refs::PatchTarget;
use super::registry::{Marshal, TypeRegistry};
use super::value::Value;
use super::write::SoapWriter;
use crate::error::{Error, Result};
use crate::reader::EventType;
use crate::soap::string_to_boolean;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

/// `xsd:dateTime` output format, always UTC with milliseconds
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn invalid(name: &str, text: &str) -> Error {
    Error::InvalidValue(format!("cannot read {} from '{}'", name, text))
}

fn qnames(namespace: &str, names: &[(&str, TypeKey)]) -> Vec<(String, String, TypeKey)> {
    names
        .iter()
        .map(|(name, key)| (namespace.to_string(), name.to_string(), key.clone()))
        .collect()
}

/// `xsd:string`, `xsd:int`, `xsd:long` and `xsd:boolean`; also writes
/// [`SoapPrimitive`](super::SoapPrimitive) values
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMarshal;

impl Marshal for DefaultMarshal {
    fn read_instance(
        &self,
        reader: &mut SoapReader<'_>,
        _namespace: &str,
        name: &str,
        _expected: &PropertyInfo,
    ) -> Result<Value> {
        let text = reader.parser().next_text()?;
        let trimmed = text.trim();
        match name.as_bytes().first() {
            Some(b's') => Ok(Value::String(text)),
            Some(b'i') => trimmed.parse().map(Value::Int).map_err(|_| invalid(name, &text)),
            Some(b'l') => trimmed.parse().map(Value::Long).map_err(|_| invalid(name, &text)),
            Some(b'b') => Ok(Value::Boolean(string_to_boolean(&text))),
            _ => Err(Error::UnresolvedType(format!("no default codec for {}", name))),
        }
    }

    fn write_instance(&self, writer: &mut SoapWriter<'_>, value: &Value) -> Result<()> {
        if let Value::Primitive(primitive) = value {
            for attribute in primitive.attributes() {
                writer
                    .xml()
                    .attribute(attribute.namespace.as_deref(), &attribute.name, &attribute.value)?;
            }
        }
        writer.xml().text(&value.to_string())?;
        Ok(())
    }

    fn mappings(&self, registry: &TypeRegistry) -> Vec<(String, String, TypeKey)> {
        qnames(
            registry.xsd(),
            &[
                ("int", TypeKey::Int),
                ("long", TypeKey::Long),
                ("string", TypeKey::String),
                ("boolean", TypeKey::Boolean),
            ],
        )
    }
}

/// `xsd:float`, `xsd:double` and `xsd:decimal`
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatMarshal;

fn parse_f64(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn format_f64(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "INF" } else { "-INF" };
        text.to_string()
    } else {
        n.to_string()
    }
}

impl Marshal for FloatMarshal {
    fn read_instance(
        &self,
        reader: &mut SoapReader<'_>,
        _namespace: &str,
        name: &str,
        _expected: &PropertyInfo,
    ) -> Result<Value> {
        let text = reader.parser().next_text()?;
        let trimmed = text.trim();
        match name {
            "float" => parse_f64(trimmed)
                .map(|n| Value::Float(n as f32))
                .ok_or_else(|| invalid(name, &text)),
            "double" => parse_f64(trimmed).map(Value::Double).ok_or_else(|| invalid(name, &text)),
            _ => Decimal::from_str(trimmed)
                .map(Value::Decimal)
                .map_err(|_| invalid(name, &text)),
        }
    }

    fn write_instance(&self, writer: &mut SoapWriter<'_>, value: &Value) -> Result<()> {
        let text = match value {
            Value::Float(n) => format_f64(f64::from(*n)),
            Value::Double(n) => format_f64(*n),
            other => other.to_string(),
        };
        writer.xml().text(&text)?;
        Ok(())
    }

    fn mappings(&self, registry: &TypeRegistry) -> Vec<(String, String, TypeKey)> {
        qnames(
            registry.xsd(),
            &[
                ("float", TypeKey::Float),
                ("double", TypeKey::Double),
                ("decimal", TypeKey::Decimal),
            ],
        )
    }
}

/// `xsd:base64Binary` and `SOAP-ENC:base64` as bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Marshal;

impl Marshal for Base64Marshal {
    fn read_instance(
        &self,
        reader: &mut SoapReader<'_>,
        _namespace: &str,
        name: &str,
        _expected: &PropertyInfo,
    ) -> Result<Value> {
        let text = reader.parser().next_text()?;
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map(Value::Bytes)
            .map_err(|e| Error::InvalidValue(format!("cannot read {}: {}", name, e)))
    }

    fn write_instance(&self, writer: &mut SoapWriter<'_>, value: &Value) -> Result<()> {
        let bytes = value
            .as_bytes()
            .ok_or_else(|| Error::UnsupportedValue(value.to_string()))?;
        writer.xml().text(&STANDARD.encode(bytes))?;
        Ok(())
    }

    fn mappings(&self, registry: &TypeRegistry) -> Vec<(String, String, TypeKey)> {
        // The schema name also maps back to bytes on write
        vec![
            (registry.enc().to_string(), "base64".to_string(), TypeKey::Bytes),
            (registry.xsd().to_string(), "base64Binary".to_string(), TypeKey::Bytes),
        ]
    }
}

/// `xsd:dateTime` as a UTC timestamp
#[derive(Debug, Clone, Copy, Default)]
pub struct DateMarshal;

/// RFC 3339 text, or a timestamp without offset taken as UTC
pub fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl Marshal for DateMarshal {
    fn read_instance(
        &self,
        reader: &mut SoapReader<'_>,
        _namespace: &str,
        name: &str,
        _expected: &PropertyInfo,
    ) -> Result<Value> {
        let text = reader.parser().next_text()?;
        parse_date_time(&text)
            .map(Value::DateTime)
            .ok_or_else(|| invalid(name, &text))
    }

    fn write_instance(&self, writer: &mut SoapWriter<'_>, value: &Value) -> Result<()> {
        let Value::DateTime(date) = value else {
            return Err(Error::UnsupportedValue(value.to_string()));
        };
        writer.xml().text(&date.format(DATE_TIME_FORMAT).to_string())?;
        Ok(())
    }

    fn mappings(&self, registry: &TypeRegistry) -> Vec<(String, String, TypeKey)> {
        qnames(registry.xsd(), &[("dateTime", TypeKey::DateTime)])
    }
}

/// Apache SOAP map: `<item><key/><value/></item>` entries
#[derive(Debug, Clone, Copy, Default)]
pub struct HashtableMarshal;

impl HashtableMarshal {
    pub const NAMESPACE: &'static str = "http://xml.apache.org/xml-soap";
    pub const NAME: &'static str = "Map";
}

impl Marshal for HashtableMarshal {
    fn read_instance(
        &self,
        reader: &mut SoapReader<'_>,
        _namespace: &str,
        _name: &str,
        _expected: &PropertyInfo,
    ) -> Result<Value> {
        let map = Rc::new(RefCell::new(Vec::new()));
        let any = PropertyInfo::object();

        while reader.parser().next_tag()? != EventType::EndTag {
            reader.parser().require(EventType::StartTag, None, Some("item"))?;
            let index = {
                let mut entries = map.borrow_mut();
                entries.push((Value::Null, Value::Null));
                entries.len() - 1
            };

            // key and value in either order
            for _ in 0..2 {
                reader.parser().next_tag()?;
                let target = match reader.parser().name() {
                    Some("key") => PatchTarget::MapKey(map.clone(), index),
                    Some("value") => PatchTarget::MapValue(map.clone(), index),
                    other => {
                        return Err(Error::InvalidValue(format!(
                            "unexpected map entry child: {}",
                            other.unwrap_or_default()
                        )))
                    }
                };
                let value = reader.read(Some(target.clone()), None, &any)?;
                target.apply(value);
            }

            reader.parser().next_tag()?;
            reader.parser().require(EventType::EndTag, None, Some("item"))?;
        }
        Ok(Value::Map(map))
    }

    fn write_instance(&self, writer: &mut SoapWriter<'_>, value: &Value) -> Result<()> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::UnsupportedValue(value.to_string()))?;
        let entries = map.borrow().clone();
        let any = PropertyInfo::object();

        for (key, value) in &entries {
            writer.xml().start_tag(Some(""), "item")?;
            writer.write_named(Some(""), "key", key, &any)?;
            writer.write_named(Some(""), "value", value, &any)?;
            writer.xml().end_tag(Some(""), "item")?;
        }
        Ok(())
    }

    fn mappings(&self, _registry: &TypeRegistry) -> Vec<(String, String, TypeKey)> {
        vec![(Self::NAMESPACE.to_string(), Self::NAME.to_string(), TypeKey::Map)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_time() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_date_time("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_date_time("2024-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_date_time(" 2024-03-01T12:30:00 "), Some(expected));
        assert_eq!(parse_date_time("yesterday"), None);
        assert_eq!(expected.format(DATE_TIME_FORMAT).to_string(), "2024-03-01T12:30:00.000Z");
    }

    #[test]
    fn test_float_text() {
        assert_eq!(parse_f64("INF"), Some(f64::INFINITY));
        assert_eq!(parse_f64("2.5"), Some(2.5));
        assert!(parse_f64("NaN").unwrap().is_nan());
        assert_eq!(format_f64(f64::NEG_INFINITY), "-INF");
        assert_eq!(format_f64(0.25), "0.25");
    }
}
