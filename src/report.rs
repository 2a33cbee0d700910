use tracing::{error, info};

const SEPARATOR: &str = "----------------------------------------------------------------";

/// Summary of one repository's pass through list → classify → purge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryReport {
    pub repository: String,
    pub dry_run: bool,
    pub images_found: usize,
    pub kept: usize,
    pub stale: usize,
    /// Deleted in live mode, would-be-deleted in dry run
    pub purged: usize,
    /// Set when listing or purging failed; counts reflect what happened before
    pub error: Option<String>,
}

impl RepositoryReport {
    pub fn new(repository: impl Into<String>, dry_run: bool) -> Self {
        Self {
            repository: repository.into(),
            dry_run,
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Human-readable lines for the repository's log block
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Repository: {}", self.repository),
            format!("Images Found: {}", self.images_found),
            format!("Stale Images: {}", self.stale),
        ];

        if self.dry_run {
            lines.push(format!("[DRY RUN] `{}` images would be purged", self.purged));
        } else {
            lines.push(format!(
                "[PURGED] `{}` images in repository `{}`",
                self.purged, self.repository
            ));
        }

        if let Some(err) = &self.error {
            lines.push(format!("[ERROR] {}", err));
        }
        lines
    }
}

/// Parameters of the run, logged once before any repository is processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHeader {
    pub dry_run: bool,
    pub region: String,
    pub repositories: usize,
    pub active_tags: usize,
}

impl RunHeader {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Dry Run: {}", self.dry_run),
            format!("AWS Region: {}", self.region),
            format!("Repositories Found: {}", self.repositories),
            format!("Active Images Found: {}", self.active_tags),
        ]
    }
}

/// Totals across all repositories of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dry_run: bool,
    pub repositories: usize,
    pub images_found: usize,
    pub stale: usize,
    pub purged: usize,
    pub failed_repositories: Vec<String>,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn record(&mut self, report: &RepositoryReport) {
        self.repositories += 1;
        self.images_found += report.images_found;
        self.stale += report.stale;
        self.purged += report.purged;
        if report.is_failed() {
            self.failed_repositories.push(report.repository.clone());
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let verb = if self.dry_run {
            "Would Purge"
        } else {
            "Purged"
        };
        let mut lines = vec![
            format!("Repositories Processed: {}", self.repositories),
            format!("Images Found: {}", self.images_found),
            format!("Stale Images: {}", self.stale),
            format!("{}: {}", verb, self.purged),
        ];
        if !self.failed_repositories.is_empty() {
            lines.push(format!(
                "Failed Repositories: {}",
                self.failed_repositories.join(", ")
            ));
        }
        lines
    }
}

/// Writes report blocks to the log, one block per call
///
/// The buffer only ever holds the block being written and is cleared on flush.
#[derive(Debug, Default)]
pub struct Reporter {
    buffer: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&mut self, header: &RunHeader) {
        self.buffer.extend(header.lines());
        self.flush();
    }

    pub fn repository(&mut self, report: &RepositoryReport) {
        self.buffer.extend(report.lines());
        self.flush();
    }

    pub fn summary(&mut self, summary: &RunSummary) {
        self.buffer.extend(summary.lines());
        self.flush();
    }

    /// Lines waiting to be flushed
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pending(&self) -> &[String] {
        &self.buffer
    }

    fn flush(&mut self) {
        for line in self.buffer.drain(..) {
            if line.starts_with("[ERROR]") {
                error!("{}", line);
            } else {
                info!("{}", line);
            }
        }
        info!("{}", SEPARATOR);
    }
}
