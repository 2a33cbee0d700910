use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_ecr::types::{ImageFailureCode, ImageIdentifier as EcrImageIdentifier};
use aws_sdk_ecr::Client as EcrClient;

use crate::aws::{format_sdk_error, load_sdk_config};
use crate::registry::models::{ImageFailure, ImageFailureKind, ImageIdentifier, Page};
use crate::registry::RegistryApi;
use crate::settings::AwsSettings;

/// AWS ECR registry provider
pub struct EcrRegistry {
    client: EcrClient,
}

impl EcrRegistry {
    /// Create a new ECR provider for the configured region
    pub async fn new(settings: &AwsSettings) -> Result<Self> {
        let aws_config = load_sdk_config(settings).await;
        Ok(Self {
            client: EcrClient::new(&aws_config),
        })
    }
}

fn from_ecr(id: &EcrImageIdentifier) -> ImageIdentifier {
    ImageIdentifier {
        digest: id.image_digest().map(String::from),
        tag: id.image_tag().map(String::from),
    }
}

fn to_ecr(id: &ImageIdentifier) -> EcrImageIdentifier {
    EcrImageIdentifier::builder()
        .set_image_digest(id.digest.clone())
        .set_image_tag(id.tag.clone())
        .build()
}

#[async_trait]
impl RegistryApi for EcrRegistry {
    async fn list_repositories(&self, next_token: Option<String>) -> Result<Page<String>> {
        let response = self
            .client
            .describe_repositories()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!("Failed to list ECR repositories: {}", format_sdk_error(&e))
            })?;

        let items = response
            .repositories()
            .iter()
            .filter_map(|repo| repo.repository_name().map(String::from))
            .collect();

        Ok(Page {
            items,
            next_token: response.next_token().map(String::from),
        })
    }

    async fn list_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<ImageIdentifier>> {
        let response = self
            .client
            .list_images()
            .repository_name(repository)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to list images in ECR repository '{}': {}",
                    repository,
                    format_sdk_error(&e)
                )
            })?;

        Ok(Page {
            items: response.image_ids().iter().map(from_ecr).collect(),
            next_token: response.next_token().map(String::from),
        })
    }

    async fn batch_delete_images(
        &self,
        repository: &str,
        images: &[ImageIdentifier],
    ) -> Result<Vec<ImageFailure>> {
        let response = self
            .client
            .batch_delete_image()
            .repository_name(repository)
            .set_image_ids(Some(images.iter().map(to_ecr).collect()))
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to delete images in ECR repository '{}': {}",
                    repository,
                    format_sdk_error(&e)
                )
            })?;

        let failures = response
            .failures()
            .iter()
            .map(|failure| ImageFailure {
                image: failure.image_id().map(from_ecr).unwrap_or(ImageIdentifier {
                    digest: None,
                    tag: None,
                }),
                kind: match failure.failure_code() {
                    Some(ImageFailureCode::ImageNotFound) => ImageFailureKind::NotFound,
                    Some(code) => ImageFailureKind::Other(code.as_str().to_string()),
                    None => ImageFailureKind::Other("Unknown".to_string()),
                },
                reason: failure.failure_reason().map(String::from),
            })
            .collect();

        Ok(failures)
    }
}
