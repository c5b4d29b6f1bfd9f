//! Deploy orchestration.
//!
//! One pipeline per file: load, fingerprint, derive keys, gate each key
//! against the remote, upload what needs uploading. Pipelines run
//! concurrently and every one settles; a failure in one file never aborts
//! the others. Cache invalidation and orphan pruning happen once, after
//! the uploads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cdn::CdnInvalidation;
use crate::config::DeployConfig;
use crate::deploy::alias::expand_aliases;
use crate::deploy::fingerprint::Fingerprint;
use crate::deploy::key::build_key;
use crate::deploy::prune::prune_removed;
use crate::deploy::reader::read_local_file;
use crate::deploy::sync::{check_remote, SyncOutcome};
use crate::deploy::upload::{build_upload_params, execute_upload};
use crate::store::ObjectStore;

// =============================================================================
// Report Types
// =============================================================================

/// Terminal state of one (file, key) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum KeyStatus {
    Uploaded,
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyOutcome {
    pub key: String,
    #[serde(flatten)]
    pub status: KeyStatus,
}

/// Everything that happened during one deploy run.
#[derive(Debug, Serialize)]
pub struct DeployReport {
    pub outcomes: Vec<KeyOutcome>,
    /// Orphan keys removed by the pruner.
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune_error: Option<String>,
}

impl DeployReport {
    pub fn uploaded(&self) -> usize {
        self.count(|status| matches!(status, KeyStatus::Uploaded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, KeyStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, KeyStatus::Failed { .. }))
    }

    fn count(&self, matcher: impl Fn(&KeyStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matcher(&outcome.status))
            .count()
    }
}

// =============================================================================
// Per-File Pipeline
// =============================================================================

/// Deploy one file to its primary key and any alias keys.
///
/// Keys are decided independently: the primary key may skip while an alias
/// uploads. Directories and vanished paths produce no outcomes at all.
async fn deploy_file(
    store: &dyn ObjectStore,
    config: &DeployConfig,
    path: &Path,
) -> Vec<KeyOutcome> {
    let file = match read_local_file(path, &config.base_dir, &config.gzip).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            debug!(path = %path.display(), "not a regular file, skipping");
            return Vec::new();
        }
        Err(err) => {
            let key = build_key(path, &config.base_dir, config.key_prefix.as_deref(), None);
            error!(path = %path.display(), error = %err, "failed to read file");
            return vec![KeyOutcome {
                key,
                status: KeyStatus::Failed {
                    error: format!("failed to read file: {err}"),
                },
            }];
        }
    };

    let fingerprint = Fingerprint::compute(&file.contents);

    let mut targets: Vec<Option<String>> = vec![None];
    targets.extend(
        expand_aliases(&file.path, config.index_name.as_deref())
            .into_iter()
            .map(Some),
    );

    let mut outcomes = Vec::with_capacity(targets.len());
    for alias in targets {
        let key = build_key(
            &file.path,
            &file.base,
            config.key_prefix.as_deref(),
            alias.as_deref(),
        );
        let status = match check_remote(store, &file, &fingerprint, &key, config.prevent_updates)
            .await
        {
            SyncOutcome::SkipUnchanged => {
                info!(key = %key, "remote matches, skipping");
                KeyStatus::Skipped
            }
            SyncOutcome::Conflict(reason) => {
                warn!(key = %key, reason = %reason, "upload refused");
                KeyStatus::Failed {
                    error: reason.to_string(),
                }
            }
            SyncOutcome::Proceed => {
                let params = build_upload_params(&file, &fingerprint, key.clone(), config);
                match execute_upload(store, params).await {
                    Ok(()) => {
                        info!(bucket = %config.bucket, key = %key, gzipped = file.gzipped, "uploaded");
                        KeyStatus::Uploaded
                    }
                    Err(err) => {
                        error!(key = %key, error = %err, "upload failed");
                        KeyStatus::Failed {
                            error: err.to_string(),
                        }
                    }
                }
            }
        };
        outcomes.push(KeyOutcome { key, status });
    }
    outcomes
}

// =============================================================================
// Run
// =============================================================================

/// Run a full deploy: upload the files, invalidate the CDN, prune orphans.
pub async fn run_deploy(
    store: &dyn ObjectStore,
    cdn: Option<&dyn CdnInvalidation>,
    config: &DeployConfig,
    paths: &[PathBuf],
) -> DeployReport {
    let pipelines = paths.iter().map(|path| deploy_file(store, config, path));
    let outcomes: Vec<KeyOutcome> = join_all(pipelines).await.into_iter().flatten().collect();

    if let (Some(cdn), Some(cdn_config)) = (cdn, config.cdn.as_ref()) {
        match cdn
            .invalidate(&cdn_config.distribution_id, &cdn_config.paths)
            .await
        {
            Ok(()) => {
                info!(
                    distribution_id = %cdn_config.distribution_id,
                    paths = cdn_config.paths.len(),
                    "cache invalidation submitted"
                );
            }
            // Invalidation is best effort and never fails the deploy.
            Err(err) => {
                warn!(
                    distribution_id = %cdn_config.distribution_id,
                    error = %err,
                    "cache invalidation failed"
                );
            }
        }
    }

    let (deleted, prune_error) = if config.delete_removed {
        let expected: HashSet<String> = paths
            .iter()
            .map(|path| build_key(path, &config.base_dir, config.key_prefix.as_deref(), None))
            .collect();
        match prune_removed(store, &expected).await {
            Ok(deleted) => (deleted, None),
            Err(err) => {
                error!(error = %err, "pruning removed objects failed");
                (Vec::new(), Some(err.to_string()))
            }
        }
    } else {
        (Vec::new(), None)
    };

    DeployReport {
        outcomes,
        deleted,
        prune_error,
    }
}
