//! Multi-ref bookkeeping for the read path
//!
//! An `href="#id"` may point at an element that appears later in the
//! document. Until then the slot that asked for it is recorded as a
//! [`PatchTarget`]; when the element with that id has been read, every
//! recorded target receives the value.

use super::value::{MapRef, ObjectRef, Value, VectorRef};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::trace;

/// A slot waiting for a value: owner handle plus index
#[derive(Debug, Clone)]
pub enum PatchTarget {
    Object(ObjectRef, usize),
    Vector(VectorRef, usize),
    MapKey(MapRef, usize),
    MapValue(MapRef, usize),
}

impl PatchTarget {
    /// Store `value` in the slot
    pub fn apply(&self, value: Value) {
        match self {
            PatchTarget::Object(owner, index) => owner.borrow_mut().set_property(*index, value),
            PatchTarget::Vector(owner, index) => {
                let mut items = owner.borrow_mut();
                if *index >= items.len() {
                    items.resize(*index + 1, Value::Null);
                }
                items[*index] = value;
            }
            PatchTarget::MapKey(owner, index) => {
                if let Some(entry) = owner.borrow_mut().get_mut(*index) {
                    entry.0 = value;
                }
            }
            PatchTarget::MapValue(owner, index) => {
                if let Some(entry) = owner.borrow_mut().get_mut(*index) {
                    entry.1 = value;
                }
            }
        }
    }
}

#[derive(Debug)]
enum Entry {
    Resolved(Value),
    Pending(Vec<PatchTarget>),
}

/// Id table of one message
#[derive(Debug, Default)]
pub struct IdMap {
    entries: HashMap<String, Entry>,
}

impl IdMap {
    pub fn new() -> Self {
        IdMap::default()
    }

    /// Value already read for `id`, or `None` after queueing `target`
    pub fn lookup_or_defer(&mut self, id: &str, target: PatchTarget) -> Option<Value> {
        match self.entries.get_mut(id) {
            Some(Entry::Resolved(value)) => Some(value.clone()),
            Some(Entry::Pending(targets)) => {
                targets.push(target);
                None
            }
            None => {
                trace!(id, "forward reference");
                self.entries.insert(id.to_string(), Entry::Pending(vec![target]));
                None
            }
        }
    }

    /// Record the value of `id` and patch every slot waiting for it
    pub fn resolve(&mut self, id: &str, value: &Value) -> Result<()> {
        let previous = self.entries.insert(id.to_string(), Entry::Resolved(value.clone()));
        match previous {
            Some(Entry::Resolved(_)) => Err(Error::DuplicateId(id.to_string())),
            Some(Entry::Pending(targets)) => {
                trace!(id, count = targets.len(), "patching forward references");
                for target in targets {
                    target.apply(value.clone());
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Ids referenced but never defined
    pub fn unresolved(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Pending(_)))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}
