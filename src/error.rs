//! Error types
//!
//! One error enum for the whole crate. The low-level modules (scanner,
//! entities, encoding) report short `&'static str`/`String` messages and the
//! parser lifts them into [`Error::MalformedXml`] with the current position.

use crate::soap::fault::SoapFault;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while parsing, mapping or writing a message
#[derive(Debug, Error)]
pub enum Error {
    /// The tokenizer or parser found a structural violation
    #[error("malformed XML: {message} (line {line}, column {column})")]
    MalformedXml {
        message: String,
        line: usize,
        column: usize,
    },

    /// A `require`/`next_tag`/`next_text` precondition failed
    #[error("unexpected event: {message} (line {line}, column {column})")]
    UnexpectedEventType {
        message: String,
        line: usize,
        column: usize,
    },

    /// No declared slot matches an incoming element
    #[error("Unknown Property: {0}")]
    UnknownProperty(String),

    /// No registry entry and no generic fallback possible
    #[error("unresolved type: {0}")]
    UnresolvedType(String),

    /// Two elements in one document claim the same multi-ref id
    #[error("double ID: {0}")]
    DuplicateId(String),

    /// The write path was handed a value it cannot serialize
    #[error("Cannot serialize: {0}")]
    UnsupportedValue(String),

    /// A scalar codec could not parse element text
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The writer was driven out of order
    #[error("invalid writer state: {0}")]
    InvalidState(String),

    /// Unsupported or undecodable character encoding
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The server answered with a SOAP fault
    #[error("{0}")]
    Fault(Box<SoapFault>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the fault variant
    pub fn is_fault(&self) -> bool {
        matches!(self, Error::Fault(_))
    }

    /// Borrow the received fault, if this error carries one
    pub fn as_fault(&self) -> Option<&SoapFault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<SoapFault> for Error {
    fn from(fault: SoapFault) -> Self {
        Error::Fault(Box::new(fault))
    }
}
