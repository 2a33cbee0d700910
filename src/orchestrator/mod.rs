#[cfg(feature = "aws")]
pub mod ecs;
pub mod models;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::InventoryError;
use crate::registry::models::Page;
use models::{parse_image_tag, ContainerSpec, MissingTagPolicy, TaskDetail};

/// Maximum number of tasks a single DescribeTasks call accepts
pub const DESCRIBE_TASKS_LIMIT: usize = 100;

/// Trait for cluster orchestrator providers
#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    /// List one page of cluster references
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>>;

    /// List one page of tasks whose desired status is RUNNING
    async fn list_running_tasks(
        &self,
        cluster: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Describe up to [`DESCRIBE_TASKS_LIMIT`] tasks of one cluster
    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<Vec<TaskDetail>>;

    /// Container definitions of a task definition
    async fn describe_task_definition(&self, task_definition: &str) -> Result<Vec<ContainerSpec>>;
}

/// Builds the set of image tags referenced by running workloads
pub struct OrchestratorInventory {
    api: Arc<dyn OrchestratorApi>,
    missing_tag_policy: MissingTagPolicy,
}

impl OrchestratorInventory {
    pub fn new(api: Arc<dyn OrchestratorApi>, missing_tag_policy: MissingTagPolicy) -> Self {
        Self {
            api,
            missing_tag_policy,
        }
    }

    /// Union of the tags of every container in every running task of every cluster
    pub async fn active_tags(&self) -> Result<HashSet<String>, InventoryError> {
        let clusters = self.list_clusters().await?;
        debug!("Found {} clusters", clusters.len());

        let mut seen_definitions = HashSet::new();
        let mut tags = HashSet::new();

        for cluster in &clusters {
            let task_arns = self.list_running_tasks(cluster).await?;
            if task_arns.is_empty() {
                debug!("No running tasks in cluster {}", cluster);
                continue;
            }

            for chunk in task_arns.chunks(DESCRIBE_TASKS_LIMIT) {
                let tasks = self.api.describe_tasks(cluster, chunk).await.map_err(|source| {
                    InventoryError::DescribeTasks {
                        cluster: cluster.clone(),
                        source,
                    }
                })?;

                for task in tasks {
                    let Some(definition) = task.task_definition_arn else {
                        debug!("Task {} has no task definition reference", task.task_arn);
                        continue;
                    };
                    // Many tasks share one definition; describe each once per pass
                    if !seen_definitions.insert(definition.clone()) {
                        continue;
                    }
                    self.collect_definition_tags(&definition, &mut tags).await?;
                }
            }
        }

        info!(
            "Found {} active image tags across {} clusters",
            tags.len(),
            clusters.len()
        );
        Ok(tags)
    }

    async fn list_clusters(&self) -> Result<Vec<String>, InventoryError> {
        let mut clusters = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .api
                .list_clusters(next_token)
                .await
                .map_err(|source| InventoryError::ListClusters { source })?;
            clusters.extend(page.items);

            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        Ok(clusters)
    }

    async fn list_running_tasks(&self, cluster: &str) -> Result<Vec<String>, InventoryError> {
        let mut tasks = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .api
                .list_running_tasks(cluster, next_token)
                .await
                .map_err(|source| InventoryError::ListTasks {
                    cluster: cluster.to_string(),
                    source,
                })?;
            tasks.extend(page.items);

            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        Ok(tasks)
    }

    async fn collect_definition_tags(
        &self,
        task_definition: &str,
        tags: &mut HashSet<String>,
    ) -> Result<(), InventoryError> {
        let containers = self
            .api
            .describe_task_definition(task_definition)
            .await
            .map_err(|source| InventoryError::DescribeTaskDefinition {
                task_definition: task_definition.to_string(),
                source,
            })?;

        for container in containers {
            let Some(image) = container.image else {
                continue;
            };
            match parse_image_tag(&image) {
                Some(tag) => {
                    tags.insert(tag.to_string());
                }
                None => match self.missing_tag_policy {
                    MissingTagPolicy::Skip => {
                        debug!(
                            "Skipping untagged image {} of container {} in {}",
                            image, container.name, task_definition
                        );
                    }
                    MissingTagPolicy::Fail => {
                        return Err(InventoryError::MissingTag { image });
                    }
                },
            }
        }

        Ok(())
    }
}
