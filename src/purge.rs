use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::PurgeError;
use crate::registry::models::{ImageFailureKind, ImageIdentifier};
use crate::registry::RegistryApi;

/// Maximum number of images in one batch delete request
pub const MAX_BATCH: usize = 100;

/// What a purge did (or would have done) to one repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub deleted: usize,
    /// Set in dry-run mode only
    pub would_delete: usize,
    pub batches: usize,
}

/// Consecutive chunks of at most [`MAX_BATCH`] images, in order
pub fn batches(stale: &[ImageIdentifier]) -> std::slice::Chunks<'_, ImageIdentifier> {
    stale.chunks(MAX_BATCH)
}

/// Deletes stale images in bounded batches
pub struct BatchPurge {
    api: Arc<dyn RegistryApi>,
}

impl BatchPurge {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        Self { api }
    }

    /// Delete `stale` from `repository`, one batch at a time
    ///
    /// Stops at the first rejected batch. Images from earlier batches stay
    /// deleted and are counted in the returned error.
    pub async fn purge(
        &self,
        repository: &str,
        stale: &[ImageIdentifier],
        dry_run: bool,
    ) -> Result<PurgeOutcome, PurgeError> {
        let batch_count = batches(stale).len();

        if dry_run {
            info!(
                "[DRY RUN] {} images in repository {} would be purged in {} batches",
                stale.len(),
                repository,
                batch_count
            );
            return Ok(PurgeOutcome {
                deleted: 0,
                would_delete: stale.len(),
                batches: batch_count,
            });
        }

        let mut deleted = 0;
        for (index, batch) in batches(stale).enumerate() {
            let failures = self
                .api
                .batch_delete_images(repository, batch)
                .await
                .map_err(|source| PurgeError::Batch {
                    repository: repository.to_string(),
                    batch: index + 1,
                    deleted,
                    source,
                })?;

            let mut rejected = 0;
            for failure in &failures {
                match &failure.kind {
                    ImageFailureKind::NotFound => {
                        debug!("Image {} in {} was already deleted", failure.image, repository);
                    }
                    ImageFailureKind::Other(code) => {
                        rejected += 1;
                        warn!(
                            "Failed to delete image {} in repository {}: {} ({})",
                            failure.image,
                            repository,
                            code,
                            failure.reason.as_deref().unwrap_or("no reason given")
                        );
                    }
                }
            }

            deleted += batch.len().saturating_sub(rejected);
            debug!(
                "Purged batch {}/{} of repository {} ({} images)",
                index + 1,
                batch_count,
                repository,
                batch.len()
            );
        }

        Ok(PurgeOutcome {
            deleted,
            would_delete: 0,
            batches: batch_count,
        })
    }
}
