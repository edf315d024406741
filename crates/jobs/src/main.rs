//! ScholarHub offline jobs
//!
//! Single-pass batch commands run against the catalog database:
//! - `similar-datasets`: rebuild the similar-dataset graph
//! - `link-datasets`: link datasets to papers by declared title
//! - `link-venues`: resolve paper venue strings to journals/conferences
//! - `migrate`: apply SQL migrations

mod link_datasets;
mod link_venues;
mod similar_datasets;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scholarhub_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    Repository, VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scholarhub-jobs", version, about = "ScholarHub offline batch jobs")]
struct Cli {
    /// Configuration file; layered config/ files and APP__ variables when absent
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute similar-dataset edges for every dataset
    SimilarDatasets,
    /// Link datasets to papers whose titles they declare
    LinkDatasets {
        /// Datasets per transaction
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Stop after this many datasets
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Link papers to journals or conferences by venue name
    LinkVenues,
    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config.observability);
    info!(
        service = %config.observability.service_name,
        version = VERSION,
        "Starting ScholarHub jobs"
    );

    let db = DbPool::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    let repo = Repository::new(db.clone());

    match cli.command {
        Command::SimilarDatasets => {
            let report = similar_datasets::run(&repo, &config.relations).await?;
            println!(
                "Related {} datasets: {} edges written ({} category, {} co-citation, {} fallback), {} failed",
                report.datasets,
                report.edges_written,
                report.category_edges,
                report.co_citation_edges,
                report.fallback_edges,
                report.failed
            );
        }
        Command::LinkDatasets { batch_size, limit } => {
            let report = link_datasets::run(&repo, batch_size, limit).await?;
            println!(
                "Processed {} datasets, created {} links ({} titles unmatched)",
                report.datasets_processed, report.links_created, report.titles_unmatched
            );
        }
        Command::LinkVenues => {
            let report = link_venues::run(&repo).await?;
            println!(
                "Updated {} of {} papers, created {} conferences",
                report.papers_updated, report.papers_considered, report.conferences_created
            );
        }
        Command::Migrate => {
            db.migrate().await?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_link_datasets_arguments() {
        let cli = Cli::parse_from(["scholarhub-jobs", "link-datasets", "--limit", "10"]);
        match cli.command {
            Command::LinkDatasets { batch_size, limit } => {
                assert_eq!(batch_size, 100);
                assert_eq!(limit, Some(10));
            }
            _ => panic!("expected link-datasets"),
        }

        let cli = Cli::parse_from(["scholarhub-jobs", "similar-datasets"]);
        assert!(matches!(cli.command, Command::SimilarDatasets));
        assert!(Cli::try_parse_from(["scholarhub-jobs", "rebuild-everything"]).is_err());
    }
}
