//! XML Reader Module
//!
//! Pull-style access to XML documents:
//! - PullParser: streaming cursor with coalesced and token modes
//! - Events: event kinds and the borrowed token view

pub mod events;
pub mod pull;

pub use events::{EventType, Token};
pub use pull::{ParserOptions, PullParser};
