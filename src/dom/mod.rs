//! DOM Module - literal XML fragments
//!
//! A small owned tree used wherever SOAP content is passed through as XML
//! rather than mapped to values:
//! - Header entries of an envelope
//! - Fault `detail` and the SOAP 1.2 fault sub-elements
//! - Literal message bodies

pub mod element;
pub mod node;

pub use element::{DomAttribute, Element};
pub use node::{Child, Node, NodeKind};
