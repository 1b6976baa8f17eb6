//! SOAP framing
//!
//! Envelope/Header/Body structure, protocol versions and faults. Bodies here
//! are literal XML; the mapping engine in [`crate::serialization`] plugs its
//! own body handling into the same [`Envelope`] trait.

pub mod envelope;
pub mod fault;

pub use envelope::{
    ns, string_to_boolean, Envelope, EnvelopeFrame, LiteralBody, SoapEnvelope, SoapVersion, WriteOptions,
};
pub use fault::SoapFault;
