//! RustySOAP - SOAP section 5 encoding over a streaming XML core
//!
//! Layers:
//! core: lexer, entities, encodings, namespace scopes
//! reader: pull parser (START_TAG / TEXT / END_TAG events)
//! writer: namespace-aware XML serializer
//! dom: literal element trees for headers and fault details
//! soap: envelope framing, versions, faults
//! serialization: object graph mapping (types, multi-refs, arrays, codecs)

pub mod core;
pub mod dom;
pub mod error;
pub mod reader;
pub mod serialization;
pub mod soap;
pub mod writer;

// ============================================================================
// Re-exports
// ============================================================================

pub use crate::core::encoding::XmlEncoding;
pub use dom::{Element, Node, NodeKind};
pub use error::{Error, Result};
pub use reader::{EventType, ParserOptions, PullParser};
pub use serialization::{
    EnvelopeOptions, Marshal, PropertyFlags, PropertyInfo, Serializable, SoapObject, SoapPrimitive,
    SoapSerializationEnvelope, TypeKey, TypeRegistry, Value,
};
pub use soap::{Envelope, SoapEnvelope, SoapFault, SoapVersion, WriteOptions};
pub use writer::XmlWriter;
