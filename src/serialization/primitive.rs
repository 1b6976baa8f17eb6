//! Scalar wrapper for unregistered types
//!
//! When an element has only text and no registry entry, the reader keeps its
//! type name, text and attributes in a [`SoapPrimitive`] so the value can be
//! inspected or written back unchanged.

use super::attributes::AttributeContainer;
use std::fmt;

/// Text value tagged with its XML type name
#[derive(Debug, Clone, Default)]
pub struct SoapPrimitive {
    namespace: String,
    name: String,
    value: String,
    attributes: AttributeContainer,
}

impl SoapPrimitive {
    pub fn new(namespace: &str, name: &str, value: &str) -> Self {
        SoapPrimitive {
            namespace: namespace.to_string(),
            name: name.to_string(),
            value: value.to_string(),
            attributes: AttributeContainer::new(),
        }
    }

    /// Type namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeContainer {
        &mut self.attributes
    }
}

impl PartialEq for SoapPrimitive {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.value == other.value
            && self.attributes == other.attributes
    }
}

impl fmt::Display for SoapPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_includes_attributes() {
        let mut a = SoapPrimitive::new("urn:t", "code", "42");
        let b = SoapPrimitive::new("urn:t", "code", "42");
        assert_eq!(a, b);

        a.attributes_mut().add("unit", "kg");
        assert_ne!(a, b);
        assert_ne!(b, SoapPrimitive::new("urn:u", "code", "42"));
        assert_eq!(a.to_string(), "42");
    }
}
