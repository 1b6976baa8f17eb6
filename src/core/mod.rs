//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Encoding: byte order mark / declaration sniffing and conversion to UTF-8
//! - Scanner: character lookahead with line-end normalization, memchr text runs
//! - Entities: predefined and caller-defined entity replacement
//! - Attributes: attribute storage and qualified-name helpers
//! - Namespace: depth-scoped prefix bindings

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod namespace;
pub mod scanner;
