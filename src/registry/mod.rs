#[cfg(feature = "aws")]
pub mod ecr;
pub mod models;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::InventoryError;
use models::{ImageFailure, ImageIdentifier, Page};

/// Trait for container registry providers
///
/// Each method maps to a single provider call; pagination is left to the caller.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// List one page of repository names
    async fn list_repositories(&self, next_token: Option<String>) -> Result<Page<String>>;

    /// List one page of image identifiers in a repository
    async fn list_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<ImageIdentifier>>;

    /// Delete up to 100 images in one request
    ///
    /// Returns the per-image failures of a request the registry accepted.
    /// An `Err` means the request as a whole was rejected.
    async fn batch_delete_images(
        &self,
        repository: &str,
        images: &[ImageIdentifier],
    ) -> Result<Vec<ImageFailure>>;
}

/// Enumerates repositories and their images, hiding pagination from callers
pub struct RegistryInventory {
    api: Arc<dyn RegistryApi>,
    repository_prefix: Option<String>,
}

impl RegistryInventory {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        Self {
            api,
            repository_prefix: None,
        }
    }

    /// Only report repositories whose name starts with `prefix`
    pub fn with_repository_prefix(mut self, prefix: Option<String>) -> Self {
        self.repository_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// List all repository names in provider order
    pub async fn list_repositories(&self) -> Result<Vec<String>, InventoryError> {
        let mut repositories = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .api
                .list_repositories(next_token)
                .await
                .map_err(|source| InventoryError::ListRepositories { source })?;

            repositories.extend(page.items.into_iter().filter(|name| {
                self.repository_prefix
                    .as_deref()
                    .map_or(true, |prefix| name.starts_with(prefix))
            }));

            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        Ok(repositories)
    }

    /// List every image in a repository, following continuation tokens
    pub async fn list_images(&self, repository: &str) -> Result<Vec<ImageIdentifier>, InventoryError> {
        let mut images = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .api
                .list_images(repository, next_token)
                .await
                .map_err(|source| InventoryError::ListImages {
                    repository: repository.to_string(),
                    source,
                })?;
            pages += 1;

            images.extend(page.items);

            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        debug!(
            "Listed {} images in repository {} ({} pages)",
            images.len(),
            repository,
            pages
        );
        Ok(images)
    }
}
