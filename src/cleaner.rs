use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::orchestrator::{OrchestratorApi, OrchestratorInventory};
use crate::purge::BatchPurge;
use crate::reconcile;
use crate::registry::{RegistryApi, RegistryInventory};
use crate::report::{Reporter, RepositoryReport, RunHeader, RunSummary};
use crate::settings::Settings;

/// Drives one cleanup run: inventories, then list → classify → purge → report per repository
///
/// A failure in one repository is recorded in its report and never stops the run.
pub struct Cleaner {
    registry: RegistryInventory,
    orchestrator: OrchestratorInventory,
    purge: BatchPurge,
    region: String,
    dry_run: bool,
    concurrency: usize,
}

impl Cleaner {
    pub fn new(
        registry_api: Arc<dyn RegistryApi>,
        orchestrator_api: Arc<dyn OrchestratorApi>,
        settings: &Settings,
    ) -> Self {
        Self {
            registry: RegistryInventory::new(registry_api.clone())
                .with_repository_prefix(settings.purge.repository_prefix.clone()),
            orchestrator: OrchestratorInventory::new(
                orchestrator_api,
                settings.orchestrator.missing_tag_policy,
            ),
            purge: BatchPurge::new(registry_api),
            region: settings.aws.region.clone(),
            dry_run: settings.purge.dry_run,
            concurrency: settings.purge.concurrency.max(1),
        }
    }

    pub async fn run(&self) -> RunSummary {
        let mut reporter = Reporter::new();

        let (repositories, active) = tokio::join!(
            self.registry.list_repositories(),
            self.orchestrator.active_tags()
        );

        let repositories = repositories.unwrap_or_else(|e| {
            error!("Error listing repositories: {}", e);
            Vec::new()
        });

        let mut dry_run = self.dry_run;
        let active = match active {
            Ok(tags) => tags,
            Err(e) => {
                error!("Error finding running tasks within clusters: {}", e);
                if !dry_run {
                    // With no active tags every image would be stale
                    warn!("Active image inventory unavailable, continuing as a dry run");
                    dry_run = true;
                }
                HashSet::new()
            }
        };

        reporter.header(&RunHeader {
            dry_run,
            region: self.region.clone(),
            repositories: repositories.len(),
            active_tags: active.len(),
        });

        let mut summary = RunSummary::new(dry_run);
        let reports = futures::stream::iter(&repositories)
            .map(|repository| self.process_repository(repository, &active, dry_run))
            .buffered(self.concurrency);
        let mut reports = std::pin::pin!(reports);

        while let Some(report) = reports.next().await {
            reporter.repository(&report);
            summary.record(&report);
        }

        reporter.summary(&summary);
        info!(
            "Cleanup finished: {} repositories, {} failed",
            summary.repositories,
            summary.failed_repositories.len()
        );
        summary
    }

    async fn process_repository(
        &self,
        repository: &str,
        active: &HashSet<String>,
        dry_run: bool,
    ) -> RepositoryReport {
        let mut report = RepositoryReport::new(repository, dry_run);

        let images = match self.registry.list_images(repository).await {
            Ok(images) => images,
            Err(e) => {
                error!("Error retrieving images for `{}` repository: {}", repository, e);
                report.error = Some(e.to_string());
                return report;
            }
        };
        report.images_found = images.len();

        let classification = reconcile::partition(&images, active);
        report.kept = classification.kept.len();
        report.stale = classification.stale.len();
        debug!(
            "Repository {}: {} kept, {} stale",
            repository, report.kept, report.stale
        );

        match self
            .purge
            .purge(repository, &classification.stale, dry_run)
            .await
        {
            Ok(outcome) => {
                debug!("Repository {}: {} purge batches", repository, outcome.batches);
                report.purged = if dry_run {
                    outcome.would_delete
                } else {
                    outcome.deleted
                };
            }
            Err(e) => {
                error!("Error purging stale images for repo {}: {}", repository, e);
                report.purged = e.deleted();
                report.error = Some(e.to_string());
            }
        }

        report
    }
}
