//! Entity capability
//!
//! A collection being iterated only has to say what it is called and,
//! optionally, which query parameters it always sends. The pagination
//! engine does the rest.

use crate::types::StringMap;

/// A paginated collection exposed by the remote API
pub trait Entity: Send + Sync {
    /// Entity name, used as the request path below the base URL
    fn entity(&self) -> &str;

    /// Query parameters this entity always sends
    ///
    /// Parameters supplied through configuration or
    /// [`LanePager::add_query_params`](crate::pager::LanePager::add_query_params)
    /// override these.
    fn default_params(&self) -> StringMap {
        StringMap::new()
    }
}

/// An entity known only by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    name: String,
    params: StringMap,
}

impl NamedEntity {
    /// Create an entity from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: StringMap::new(),
        }
    }

    /// Add a default query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl Entity for NamedEntity {
    fn entity(&self) -> &str {
        &self.name
    }

    fn default_params(&self) -> StringMap {
        self.params.clone()
    }
}

impl Entity for String {
    fn entity(&self) -> &str {
        self
    }
}

impl Entity for &'static str {
    fn entity(&self) -> &str {
        self
    }
}
