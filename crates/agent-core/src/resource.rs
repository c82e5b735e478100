//! Resource Catalog
//!
//! URI-addressed, read-only content items exposed to the calling client.
//! Like the tool registry, the catalog is built once at process start and
//! consulted read-only thereafter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Resource metadata for catalog listing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Unique resource URI (e.g., `agent://config`)
    pub uri: String,

    /// Human-readable name
    pub name: String,

    /// Description of the resource contents
    pub description: String,

    /// MIME type of the content
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Resource trait - implement to expose readable content
#[async_trait]
pub trait Resource: Send + Sync {
    /// Get the resource's catalog metadata
    fn spec(&self) -> ResourceSpec;

    /// Read the current content
    async fn read(&self) -> Result<String>;
}

/// Catalog of available resources, keyed by URI
pub struct ResourceCatalog {
    resources: HashMap<String, Arc<dyn Resource>>,
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    /// Register a new resource
    pub fn register<R: Resource + 'static>(&mut self, resource: R) {
        let spec = resource.spec();
        self.resources.insert(spec.uri.clone(), Arc::new(resource));
    }

    /// Get all resource specs (catalog snapshot)
    pub fn specs(&self) -> Vec<ResourceSpec> {
        let mut specs: Vec<_> = self.resources.values().map(|r| r.spec()).collect();
        specs.sort_by(|a, b| a.uri.cmp(&b.uri));
        specs
    }

    /// Read a resource by URI
    pub async fn read(&self, uri: &str) -> Result<(ResourceSpec, String)> {
        let resource = self
            .resources
            .get(uri)
            .ok_or_else(|| AgentError::ResourceNotFound(uri.to_string()))?;

        let content = resource.read().await?;
        Ok((resource.spec(), content))
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticResource;

    #[async_trait]
    impl Resource for StaticResource {
        fn spec(&self) -> ResourceSpec {
            ResourceSpec {
                uri: "agent://static".into(),
                name: "Static".into(),
                description: "Fixed content".into(),
                mime_type: "text/plain".into(),
            }
        }

        async fn read(&self) -> Result<String> {
            Ok("hello".into())
        }
    }

    #[tokio::test]
    async fn test_read_known_resource() {
        let mut catalog = ResourceCatalog::new();
        catalog.register(StaticResource);

        let (spec, content) = catalog.read("agent://static").await.unwrap();
        assert_eq!(spec.mime_type, "text/plain");
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn test_unknown_uri_is_reported() {
        let catalog = ResourceCatalog::new();
        let err = catalog.read("agent://unknown").await.unwrap_err();
        assert!(matches!(err, AgentError::ResourceNotFound(_)));
    }
}
