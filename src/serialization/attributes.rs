//! XML attributes carried by mapped values
//!
//! Generic objects and primitive wrappers keep the attributes of the element
//! they were read from, and write them back before their content.

use crate::error::{Error, Result};

/// One attribute of a mapped value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

impl AttributeInfo {
    pub fn new(namespace: Option<&str>, name: &str, value: &str) -> Self {
        AttributeInfo {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Ordered attribute list with lookups by name or qualified name
#[derive(Debug, Clone, Default)]
pub struct AttributeContainer {
    attributes: Vec<AttributeInfo>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        AttributeContainer::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeInfo> {
        self.attributes.iter()
    }

    /// Attribute at `index`
    pub fn info(&self, index: usize) -> Option<&AttributeInfo> {
        self.attributes.get(index)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    fn index_of_ns(&self, namespace: &str, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.name == name && a.namespace.as_deref().unwrap_or("") == namespace)
    }

    /// Value of the first attribute named `name`
    pub fn get(&self, name: &str) -> Result<&str> {
        self.get_safely(name)
            .ok_or_else(|| Error::InvalidValue(format!("illegal property: {}", name)))
    }

    pub fn get_ns(&self, namespace: &str, name: &str) -> Result<&str> {
        self.get_safely_ns(namespace, name)
            .ok_or_else(|| Error::InvalidValue(format!("illegal property: {}", name)))
    }

    pub fn get_safely(&self, name: &str) -> Option<&str> {
        self.index_of(name).map(|i| self.attributes[i].value.as_str())
    }

    pub fn get_safely_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.index_of_ns(namespace, name)
            .map(|i| self.attributes[i].value.as_str())
    }

    /// Value of `name`, or an empty string
    pub fn get_safely_as_string(&self, name: &str) -> String {
        self.get_safely(name).unwrap_or_default().to_string()
    }

    pub fn has(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn has_ns(&self, namespace: &str, name: &str) -> bool {
        self.index_of_ns(namespace, name).is_some()
    }

    pub fn add(&mut self, name: &str, value: &str) {
        self.add_info(AttributeInfo::new(None, name, value));
    }

    pub fn add_ns(&mut self, namespace: &str, name: &str, value: &str) {
        self.add_info(AttributeInfo::new(Some(namespace), name, value));
    }

    /// Add only when a value is present
    pub fn add_if_value(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.add(name, value);
        }
    }

    pub fn add_info(&mut self, info: AttributeInfo) {
        self.attributes.push(info);
    }

    /// Replace the attribute with the same qualified name, or append it
    pub fn set(&mut self, info: AttributeInfo) {
        let namespace = info.namespace.as_deref().unwrap_or("");
        match self.index_of_ns(namespace, &info.name) {
            Some(i) => self.attributes[i] = info,
            None => self.attributes.push(info),
        }
    }
}

impl PartialEq for AttributeContainer {
    /// Same number of attributes, and every attribute found by name on the
    /// other side with an equal value
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .attributes
                .iter()
                .all(|a| other.get_safely(&a.name) == Some(a.value.as_str()))
    }
}

impl<'a> IntoIterator for &'a AttributeContainer {
    type Item = &'a AttributeInfo;
    type IntoIter = std::slice::Iter<'a, AttributeInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut attrs = AttributeContainer::new();
        attrs.add("lang", "en");
        attrs.add_ns("urn:x", "lang", "de");
        attrs.add_if_value("missing", None);

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("lang").unwrap(), "en");
        assert_eq!(attrs.get_ns("urn:x", "lang").unwrap(), "de");
        assert!(attrs.get("missing").is_err());
        assert_eq!(attrs.get_safely_as_string("missing"), "");
        assert!(attrs.has_ns("urn:x", "lang"));
        assert!(!attrs.has_ns("urn:y", "lang"));
    }

    #[test]
    fn test_set_replaces() {
        let mut attrs = AttributeContainer::new();
        attrs.add("a", "1");
        attrs.set(AttributeInfo::new(None, "a", "2"));
        attrs.set(AttributeInfo::new(None, "b", "3"));
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("a").unwrap(), "2");
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut left = AttributeContainer::new();
        left.add("a", "1");
        left.add("b", "2");
        let mut right = AttributeContainer::new();
        right.add("b", "2");
        right.add("a", "1");
        assert_eq!(left, right);

        right.set(AttributeInfo::new(None, "a", "9"));
        assert_ne!(left, right);
    }
}
