//! Command-line interface for s3-site-deploy.

pub mod args;

use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cdn::{CdnInvalidation, CloudFrontCdn};
use crate::config::ConfigError;
use crate::deploy::run::{run_deploy, DeployReport, KeyStatus};
use crate::store::{S3ObjectStore, S3StoreConfig};

pub use args::DeployArgs;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Glob expansion failure.
    #[error("failed to expand glob: {0}")]
    Glob(#[from] glob::GlobError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization error.
    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Execution
// =============================================================================

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let args = DeployArgs::parse();
    init_tracing(args.verbose);
    run(args).await
}

/// Run a deploy from parsed arguments.
///
/// Per-key upload failures are reported and leave the exit status untouched;
/// only configuration, glob, and output errors escape as `Err`.
pub async fn run(args: DeployArgs) -> Result<()> {
    let invocation_dir = std::env::current_dir()?;
    let json = args.json;
    let patterns = args.patterns.clone();
    let config = args.into_config(&invocation_dir)?;

    let paths = resolve_patterns(&patterns, &invocation_dir)?;
    if paths.is_empty() {
        warn!("no files matched the given patterns");
    }
    info!(
        files = paths.len(),
        bucket = %config.bucket,
        region = %config.region,
        "starting deploy"
    );

    let mut store_config =
        S3StoreConfig::new(config.bucket.clone()).with_region(config.region.clone());
    if let Some(profile) = &config.profile {
        store_config = store_config.with_profile(profile.clone());
    }
    if let Some(endpoint) = &config.endpoint_url {
        store_config = store_config.with_endpoint_url(endpoint.clone());
    }
    let store = S3ObjectStore::connect(store_config).await;

    let cdn = match &config.cdn {
        Some(_) => {
            Some(CloudFrontCdn::connect(Some(&config.region), config.profile.as_deref()).await)
        }
        None => None,
    };
    let cdn_ref = cdn.as_ref().map(|cdn| cdn as &dyn CdnInvalidation);

    let report = run_deploy(&store, cdn_ref, &config, &paths).await;
    print_report(&report, json)
}

/// Expand glob patterns into a deduplicated list of absolute paths.
fn resolve_patterns(patterns: &[String], invocation_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = invocation_dir.join(entry?);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}

fn print_report(report: &DeployReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Deploy complete: {} uploaded, {} skipped, {} failed",
        report.uploaded(),
        report.skipped(),
        report.failed()
    );
    for outcome in &report.outcomes {
        if let KeyStatus::Failed { error } = &outcome.status {
            eprintln!("  {}: {}", outcome.key, error);
        }
    }
    if !report.deleted.is_empty() {
        println!("Deleted {} removed object(s)", report.deleted.len());
    }
    if let Some(error) = &report.prune_error {
        eprintln!("Deleting removed objects failed: {error}");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "s3_site_deploy=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
