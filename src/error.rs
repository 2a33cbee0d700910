use thiserror::Error;

/// Failure while building one of the inventories (registry or orchestrator side).
///
/// Provider errors are kept as `anyhow::Error` so the cleaned-up AWS message
/// and any attached context survive into the log line.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Failed to list repositories: {source}")]
    ListRepositories {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to list images in repository '{repository}': {source}")]
    ListImages {
        repository: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to list clusters: {source}")]
    ListClusters {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to list running tasks in cluster '{cluster}': {source}")]
    ListTasks {
        cluster: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to describe tasks in cluster '{cluster}': {source}")]
    DescribeTasks {
        cluster: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to describe task definition '{task_definition}': {source}")]
    DescribeTaskDefinition {
        task_definition: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Image reference '{image}' has no tag")]
    MissingTag { image: String },
}

/// Failure while deleting a repository's stale images.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// A batch was rejected. Earlier batches stay deleted; later ones were never sent.
    #[error("Failed purging images in repository '{repository}' (batch {batch}, {deleted} images already deleted): {source}")]
    Batch {
        repository: String,
        batch: usize,
        deleted: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl PurgeError {
    /// Number of images removed before the failing batch
    pub fn deleted(&self) -> usize {
        match self {
            PurgeError::Batch { deleted, .. } => *deleted,
        }
    }
}
