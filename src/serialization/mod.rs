//! Object graph mapping
//!
//! Converts between [`Value`] graphs and SOAP-encoded XML. Types are resolved
//! through a [`TypeRegistry`]; shared and circular references travel as
//! `id`/`href` pairs and are rebuilt on read, including references to
//! elements that appear later in the document.

pub mod attributes;
pub mod envelope;
pub mod marshal;
pub mod object;
pub mod primitive;
pub mod property;
pub mod read;
pub mod refs;
pub mod registry;
pub mod value;
pub mod write;

pub use attributes::{AttributeContainer, AttributeInfo};
pub use envelope::{EnvelopeOptions, SoapSerializationEnvelope};
pub use marshal::{Base64Marshal, DateMarshal, DefaultMarshal, FloatMarshal, HashtableMarshal};
pub use object::{Serializable, SoapObject, SoapObjectTemplate};
pub use primitive::SoapPrimitive;
pub use property::{PropertyFlags, PropertyInfo, TypeKey};
pub use read::SoapReader;
pub use refs::{IdMap, PatchTarget};
pub use registry::{Factory, Mapping, Marshal, TypeEntry, TypeRegistry};
pub use value::{MapRef, ObjectRef, Value, VectorRef};
pub use write::SoapWriter;
