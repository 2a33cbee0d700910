use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_ecs::types::DesiredStatus;
use aws_sdk_ecs::Client as EcsClient;

use crate::aws::{format_sdk_error, load_sdk_config};
use crate::orchestrator::models::{ContainerSpec, TaskDetail};
use crate::orchestrator::OrchestratorApi;
use crate::registry::models::Page;
use crate::settings::AwsSettings;

/// AWS ECS orchestrator provider
pub struct EcsOrchestrator {
    client: EcsClient,
}

impl EcsOrchestrator {
    pub async fn new(settings: &AwsSettings) -> Result<Self> {
        let aws_config = load_sdk_config(settings).await;
        Ok(Self {
            client: EcsClient::new(&aws_config),
        })
    }
}

#[async_trait]
impl OrchestratorApi for EcsOrchestrator {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>> {
        let response = self
            .client
            .list_clusters()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list ECS clusters: {}", format_sdk_error(&e)))?;

        Ok(Page {
            items: response.cluster_arns().to_vec(),
            next_token: response.next_token().map(String::from),
        })
    }

    async fn list_running_tasks(
        &self,
        cluster: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let response = self
            .client
            .list_tasks()
            .cluster(cluster)
            .desired_status(DesiredStatus::Running)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to list running tasks in ECS cluster '{}': {}",
                    cluster,
                    format_sdk_error(&e)
                )
            })?;

        Ok(Page {
            items: response.task_arns().to_vec(),
            next_token: response.next_token().map(String::from),
        })
    }

    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<Vec<TaskDetail>> {
        let response = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .set_tasks(Some(tasks.to_vec()))
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to describe tasks in ECS cluster '{}': {}",
                    cluster,
                    format_sdk_error(&e)
                )
            })?;

        for failure in response.failures() {
            tracing::warn!(
                "ECS could not describe task {} in cluster {}: {}",
                failure.arn().unwrap_or("<unknown>"),
                cluster,
                failure.reason().unwrap_or("no reason given")
            );
        }

        Ok(response
            .tasks()
            .iter()
            .map(|task| TaskDetail {
                task_arn: task.task_arn().unwrap_or_default().to_string(),
                task_definition_arn: task.task_definition_arn().map(String::from),
            })
            .collect())
    }

    async fn describe_task_definition(&self, task_definition: &str) -> Result<Vec<ContainerSpec>> {
        let response = self
            .client
            .describe_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to describe ECS task definition '{}': {}",
                    task_definition,
                    format_sdk_error(&e)
                )
            })?;

        let containers = response
            .task_definition()
            .map(|definition| {
                definition
                    .container_definitions()
                    .iter()
                    .map(|container| ContainerSpec {
                        name: container.name().unwrap_or_default().to_string(),
                        image: container.image().map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(containers)
    }
}
