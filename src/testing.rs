//! In-memory providers for unit tests

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::orchestrator::models::{ContainerSpec, TaskDetail};
use crate::orchestrator::OrchestratorApi;
use crate::registry::models::{ImageFailure, ImageFailureKind, ImageIdentifier, Page};
use crate::registry::RegistryApi;

fn paginate<T: Clone>(items: &[T], next_token: Option<String>, page_size: usize) -> Page<T> {
    let start: usize = next_token.map_or(0, |t| t.parse().expect("fake token"));
    let end = (start + page_size).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        next_token: (end < items.len()).then(|| end.to_string()),
    }
}

pub struct FakeRegistry {
    repositories: Mutex<Vec<(String, Vec<ImageIdentifier>)>>,
    page_size: usize,
    list_failures: HashSet<String>,
    delete_failures: HashMap<String, usize>,
    rejected: HashSet<ImageIdentifier>,
    list_calls: Mutex<HashMap<String, usize>>,
    delete_calls: Mutex<HashMap<String, usize>>,
    deleted_batches: Mutex<HashMap<String, Vec<Vec<ImageIdentifier>>>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            repositories: Mutex::new(Vec::new()),
            page_size: 1000,
            list_failures: HashSet::new(),
            delete_failures: HashMap::new(),
            rejected: HashSet::new(),
            list_calls: Mutex::new(HashMap::new()),
            delete_calls: Mutex::new(HashMap::new()),
            deleted_batches: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_repository(self, name: &str, images: Vec<ImageIdentifier>) -> Self {
        self.repositories
            .lock()
            .unwrap()
            .push((name.to_string(), images));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Listing images of `repository` fails
    pub fn with_list_failure(mut self, repository: &str) -> Self {
        self.list_failures.insert(repository.to_string());
        self
    }

    /// The `batch`-th (1-based) delete request for `repository` is rejected
    pub fn with_delete_failure_on_batch(mut self, repository: &str, batch: usize) -> Self {
        self.delete_failures.insert(repository.to_string(), batch);
        self
    }

    /// `image` is reported as a per-image failure whenever it is deleted
    pub fn with_rejected_image(mut self, image: ImageIdentifier) -> Self {
        self.rejected.insert(image);
        self
    }

    pub fn list_image_calls(&self, repository: &str) -> usize {
        self.list_calls
            .lock()
            .unwrap()
            .get(repository)
            .copied()
            .unwrap_or(0)
    }

    /// Total delete requests for `repository`, including rejected ones
    pub fn delete_calls(&self, repository: &str) -> usize {
        self.delete_calls
            .lock()
            .unwrap()
            .get(repository)
            .copied()
            .unwrap_or(0)
    }

    /// Accepted delete requests for `repository`
    pub fn delete_batches(&self, repository: &str) -> Vec<Vec<ImageIdentifier>> {
        self.deleted_batches
            .lock()
            .unwrap()
            .get(repository)
            .cloned()
            .unwrap_or_default()
    }

    pub fn remaining_images(&self, repository: &str) -> Vec<ImageIdentifier> {
        self.repositories
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == repository)
            .map(|(_, images)| images.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn list_repositories(&self, next_token: Option<String>) -> Result<Page<String>> {
        let names: Vec<String> = self
            .repositories
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        Ok(paginate(&names, next_token, self.page_size))
    }

    async fn list_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<ImageIdentifier>> {
        *self
            .list_calls
            .lock()
            .unwrap()
            .entry(repository.to_string())
            .or_default() += 1;

        if self.list_failures.contains(repository) {
            bail!("RepositoryNotFoundException: {}", repository);
        }

        let images = self.remaining_images(repository);
        Ok(paginate(&images, next_token, self.page_size))
    }

    async fn batch_delete_images(
        &self,
        repository: &str,
        images: &[ImageIdentifier],
    ) -> Result<Vec<ImageFailure>> {
        assert!(images.len() <= crate::purge::MAX_BATCH);

        let call = {
            let mut calls = self.delete_calls.lock().unwrap();
            let count = calls.entry(repository.to_string()).or_default();
            *count += 1;
            *count
        };
        if self.delete_failures.get(repository) == Some(&call) {
            bail!("ThrottlingException: Rate exceeded");
        }

        let mut failures = Vec::new();
        {
            let mut repositories = self.repositories.lock().unwrap();
            let stored = repositories
                .iter_mut()
                .find(|(name, _)| name == repository)
                .map(|(_, images)| images);

            let Some(stored) = stored else {
                bail!("RepositoryNotFoundException: {}", repository);
            };

            for image in images {
                if self.rejected.contains(image) {
                    failures.push(ImageFailure {
                        image: image.clone(),
                        kind: ImageFailureKind::Other("ImageReferencedByManifestList".into()),
                        reason: Some("referenced by a manifest list".into()),
                    });
                } else if let Some(pos) = stored.iter().position(|i| i == image) {
                    stored.remove(pos);
                } else {
                    failures.push(ImageFailure {
                        image: image.clone(),
                        kind: ImageFailureKind::NotFound,
                        reason: Some("Requested image not found".into()),
                    });
                }
            }
        }

        self.deleted_batches
            .lock()
            .unwrap()
            .entry(repository.to_string())
            .or_default()
            .push(images.to_vec());

        Ok(failures)
    }
}

pub struct FakeOrchestrator {
    clusters: Vec<String>,
    tasks: Vec<(String, String, String)>,
    definitions: HashMap<String, Vec<String>>,
    page_size: usize,
    list_tasks_failures: HashSet<String>,
    describe_batches: Mutex<Vec<usize>>,
    definition_calls: Mutex<usize>,
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self {
            clusters: Vec::new(),
            tasks: Vec::new(),
            definitions: HashMap::new(),
            page_size: 100,
            list_tasks_failures: HashSet::new(),
            describe_batches: Mutex::new(Vec::new()),
            definition_calls: Mutex::new(0),
        }
    }

    pub fn with_cluster(mut self, cluster: &str) -> Self {
        if !self.clusters.iter().any(|c| c == cluster) {
            self.clusters.push(cluster.to_string());
        }
        self
    }

    /// A running task in `cluster` whose definition runs `images`
    pub fn with_task(mut self, cluster: &str, task: &str, definition: &str, images: &[&str]) -> Self {
        self = self.with_cluster(cluster);
        self.tasks
            .push((cluster.to_string(), task.to_string(), definition.to_string()));
        self.definitions.insert(
            definition.to_string(),
            images.iter().map(|i| i.to_string()).collect(),
        );
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_list_tasks_failure(mut self, cluster: &str) -> Self {
        self.list_tasks_failures.insert(cluster.to_string());
        self
    }

    pub fn describe_task_batch_sizes(&self) -> Vec<usize> {
        self.describe_batches.lock().unwrap().clone()
    }

    pub fn definition_describe_calls(&self) -> usize {
        *self.definition_calls.lock().unwrap()
    }
}

#[async_trait]
impl OrchestratorApi for FakeOrchestrator {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>> {
        Ok(paginate(&self.clusters, next_token, self.page_size))
    }

    async fn list_running_tasks(
        &self,
        cluster: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        if self.list_tasks_failures.contains(cluster) {
            bail!("ClusterNotFoundException: {}", cluster);
        }
        let tasks: Vec<String> = self
            .tasks
            .iter()
            .filter(|(c, _, _)| c == cluster)
            .map(|(_, task, _)| task.clone())
            .collect();
        Ok(paginate(&tasks, next_token, self.page_size))
    }

    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<Vec<TaskDetail>> {
        assert!(!tasks.is_empty() && tasks.len() <= crate::orchestrator::DESCRIBE_TASKS_LIMIT);
        self.describe_batches.lock().unwrap().push(tasks.len());

        Ok(self
            .tasks
            .iter()
            .filter(|(c, task, _)| c == cluster && tasks.contains(task))
            .map(|(_, task, definition)| TaskDetail {
                task_arn: task.clone(),
                task_definition_arn: Some(definition.clone()),
            })
            .collect())
    }

    async fn describe_task_definition(&self, task_definition: &str) -> Result<Vec<ContainerSpec>> {
        *self.definition_calls.lock().unwrap() += 1;

        let Some(images) = self.definitions.get(task_definition) else {
            bail!("Unable to describe task definition {}", task_definition);
        };
        Ok(images
            .iter()
            .enumerate()
            .map(|(i, image)| ContainerSpec {
                name: format!("container-{i}"),
                image: Some(image.clone()),
            })
            .collect())
    }
}
