use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "aws")]
mod aws;
mod cleaner;
mod error;
mod orchestrator;
mod purge;
mod reconcile;
mod registry;
mod report;
mod settings;
#[cfg(test)]
mod testing;

use orchestrator::models::MissingTagPolicy;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete ECR images that no running ECS task references
    Run(RunArgs),
    /// Check configuration for errors and unused options
    CheckConfig {
        /// Directory holding default/<run mode>/local config files
        #[arg(long)]
        config_dir: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// AWS region (overrides [aws] region, default us-west-2)
    #[arg(long = "aws-region", visible_alias = "region")]
    region: Option<String>,
    /// Executes without deleting any images
    #[arg(long)]
    dry_run: bool,
    /// Directory holding default/<run mode>/local config files
    #[arg(long)]
    config_dir: Option<String>,
    /// Only clean repositories whose name starts with this prefix
    #[arg(long)]
    repository_prefix: Option<String>,
    /// Number of repositories processed at the same time
    #[arg(long)]
    concurrency: Option<usize>,
    /// What to do with running images that have no tag ('skip' or 'fail')
    #[arg(long)]
    missing_tag_policy: Option<MissingTagPolicy>,
}

impl RunArgs {
    /// Command-line flags take precedence over config files
    fn apply(&self, settings: &mut Settings) {
        if let Some(region) = &self.region {
            settings.aws.region = region.clone();
        }
        if self.dry_run {
            settings.purge.dry_run = true;
        }
        if let Some(prefix) = &self.repository_prefix {
            settings.purge.repository_prefix = Some(prefix.clone());
        }
        if let Some(concurrency) = self.concurrency {
            settings.purge.concurrency = concurrency;
        }
        if let Some(policy) = self.missing_tag_policy {
            settings.orchestrator.missing_tag_policy = policy;
        }
    }
}

#[cfg(feature = "aws")]
async fn handle_run(args: RunArgs) -> Result<()> {
    use std::sync::Arc;

    let mut settings = Settings::new(args.config_dir.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    let registry = registry::ecr::EcrRegistry::new(&settings.aws).await?;
    let orchestrator = orchestrator::ecs::EcsOrchestrator::new(&settings.aws).await?;

    // Per-repository failures are logged and summarized; they never change the exit status
    cleaner::Cleaner::new(Arc::new(registry), Arc::new(orchestrator), &settings)
        .run()
        .await;
    Ok(())
}

#[cfg(not(feature = "aws"))]
async fn handle_run(_args: RunArgs) -> Result<()> {
    anyhow::bail!("ecr-cleaner was built without the `aws` feature; no registry provider is available")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::CheckConfig { config_dir } => {
            println!("Checking configuration...");
            match Settings::new(config_dir.as_deref()) {
                Ok(_) => {
                    println!("✓ Configuration is valid");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ Configuration error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
