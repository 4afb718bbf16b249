//! Rendered documents and their routing keys

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::yaml::parse_yaml;
use crate::{HarnessError, Result};

/// `(kind, metadata.name)` pair matched against slot identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingKey {
    /// Resource kind, e.g. `StatefulSet`
    pub kind: String,
    /// `metadata.name` of the resource
    pub name: String,
}

impl RoutingKey {
    /// Create a routing key
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Only the fields needed for routing; everything else is ignored.
#[derive(Deserialize)]
struct DocumentHeader {
    kind: String,
    metadata: HeaderMetadata,
}

#[derive(Deserialize)]
struct HeaderMetadata {
    name: String,
}

/// One document of a rendered bundle.
///
/// The body is kept generic until the document is routed to a slot, which
/// decodes it into its own type.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    index: usize,
    body: Value,
}

impl RenderedDocument {
    /// Parse the `index`-th document of a bundle.
    ///
    /// Returns `None` for empty and comment-only documents.
    pub fn parse(index: usize, text: &str) -> Result<Option<Self>> {
        let body = parse_yaml(text)
            .map_err(|e| HarnessError::decode(format!("document #{index}"), e.to_string()))?;
        if body.is_null() {
            return Ok(None);
        }
        Ok(Some(Self { index, body }))
    }

    /// Position of the document in its bundle
    pub fn index(&self) -> usize {
        self.index
    }

    /// Extract the routing key without decoding the rest of the body.
    ///
    /// Documents lacking `kind` or `metadata.name` have no key.
    pub fn routing_key(&self) -> Option<RoutingKey> {
        DocumentHeader::deserialize(&self.body)
            .ok()
            .map(|h| RoutingKey::new(h.kind, h.metadata.name))
    }

    /// Consume the document, returning its body
    pub fn into_body(self) -> Value {
        self.body
    }
}
