//! Namespace Resolution
//!
//! Stack-based namespace resolver shared by the pull parser and the DOM
//! builder. Bindings are tagged with the element depth that declared them so a
//! scope can be dropped in one step when its element closes.

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI); `None` is the default namespace
#[derive(Debug, Clone, PartialEq, Eq)]
struct NsBinding {
    prefix: Option<String>,
    uri: String,
    depth: usize,
}

/// Stack-based namespace resolver
#[derive(Debug, Default)]
pub struct NamespaceResolver {
    /// Declarations in document order, never including `xml`/`xmlns`
    bindings: Vec<NsBinding>,
    /// Current element depth
    depth: usize,
}

impl NamespaceResolver {
    /// Create an empty resolver; `xml` and `xmlns` are always bound
    pub fn new() -> Self {
        NamespaceResolver {
            bindings: Vec::with_capacity(16),
            depth: 0,
        }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a namespace binding for the current scope.
    ///
    /// The `xmlns` prefix can never be declared and `xml` may only be bound
    /// to its fixed URI (which is then a no-op).
    pub fn declare(&mut self, prefix: Option<&str>, uri: &str) -> Result<(), String> {
        match prefix {
            Some("xmlns") => return Err("the xmlns prefix cannot be declared".to_string()),
            Some("xml") if uri == ns::XML => return Ok(()),
            Some("xml") => return Err(format!("the xml prefix cannot be rebound to {}", uri)),
            _ => {}
        }
        if uri == ns::XMLNS || (uri == ns::XML && prefix.is_some()) {
            return Err(format!("reserved namespace {} cannot be bound", uri));
        }

        self.bindings.push(NsBinding {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
            depth: self.depth,
        });
        Ok(())
    }

    /// Resolve a prefix (`None` for the default namespace) to a URI
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(ns::XML),
            Some("xmlns") => return Some(ns::XMLNS),
            _ => {}
        }
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix.as_deref() == prefix)
            .map(|b| b.uri.as_str())
    }

    /// Get current depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of declarations visible at `depth`
    pub fn count(&self, depth: usize) -> usize {
        self.bindings.partition_point(|b| b.depth <= depth)
    }

    /// Prefix of the declaration at `pos` (document order)
    pub fn prefix_at(&self, pos: usize) -> Option<&str> {
        self.bindings.get(pos).and_then(|b| b.prefix.as_deref())
    }

    /// URI of the declaration at `pos` (document order)
    pub fn uri_at(&self, pos: usize) -> Option<&str> {
        self.bindings.get(pos).map(|b| b.uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces() {
        let resolver = NamespaceResolver::new();
        assert_eq!(resolver.resolve(Some("xml")), Some(ns::XML));
        assert_eq!(resolver.resolve(Some("xmlns")), Some(ns::XMLNS));
        assert_eq!(resolver.resolve(None), None);
    }

    #[test]
    fn test_reserved_prefixes() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        assert!(resolver.declare(Some("xmlns"), "urn:x").is_err());
        assert!(resolver.declare(Some("xml"), "urn:x").is_err());
        assert!(resolver.declare(Some("xml"), ns::XML).is_ok());
        assert!(resolver.declare(Some("p"), ns::XMLNS).is_err());
        assert_eq!(resolver.count(1), 0);
    }

    #[test]
    fn test_scope_pop() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare(Some("foo"), "http://example.com/foo").unwrap();
        assert_eq!(resolver.resolve(Some("foo")), Some("http://example.com/foo"));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(Some("foo")), None);
    }

    #[test]
    fn test_shadow_binding() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare(Some("ns"), "urn:ns1").unwrap();
        resolver.declare(None, "urn:default").unwrap();

        resolver.push_scope();
        resolver.declare(Some("ns"), "urn:ns2").unwrap();
        assert_eq!(resolver.resolve(Some("ns")), Some("urn:ns2"));
        assert_eq!(resolver.resolve(None), Some("urn:default"));
        assert_eq!(resolver.count(1), 2);
        assert_eq!(resolver.count(2), 3);
        assert_eq!(resolver.prefix_at(2), Some("ns"));
        assert_eq!(resolver.uri_at(2), Some("urn:ns2"));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(Some("ns")), Some("urn:ns1"));
        assert_eq!(resolver.count(2), 2);
    }
}
