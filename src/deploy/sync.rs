//! Upload gating.
//!
//! Before a byte is uploaded, the remote object is probed with the local
//! content hash and mtime attached as conditions. The probe response alone
//! decides whether the upload proceeds, is skipped as unchanged, or is in
//! conflict. Each (file, key) pair is decided independently; an alias can
//! upload while its primary key skips.

use thiserror::Error;

use crate::deploy::fingerprint::Fingerprint;
use crate::deploy::reader::LocalFile;
use crate::store::{ObjectStore, ProbeConditions, ProbeResult, StoreError};

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    #[error("remote object differs (local md5 {local_md5}, remote etag {remote_etag}) and updates are prevented")]
    RemoteDiffers {
        local_md5: String,
        remote_etag: String,
    },

    #[error("existence probe failed: {code}: {message}")]
    Probe { code: String, message: String },
}

/// Verdict for one (file, key) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Upload the file.
    Proceed,
    /// Remote content already matches, or the remote copy is newer.
    SkipUnchanged,
    /// Do not upload; the reason says why.
    Conflict(ConflictReason),
}

/// Map a probe response to a verdict.
///
/// A hash match or a failed mtime precondition both mean the remote copy
/// should stay as it is. A remote object that exists with different content
/// is overwritten unless updates are prevented.
pub fn decide(probe: ProbeResult, prevent_updates: bool, local: &Fingerprint) -> SyncOutcome {
    match probe {
        ProbeResult::NotModified | ProbeResult::PreconditionFailed => SyncOutcome::SkipUnchanged,
        ProbeResult::Exists { etag } if prevent_updates => {
            SyncOutcome::Conflict(ConflictReason::RemoteDiffers {
                local_md5: local.hex.clone(),
                remote_etag: etag.unwrap_or_else(|| "unknown".to_string()),
            })
        }
        ProbeResult::Exists { .. } | ProbeResult::NotFound => SyncOutcome::Proceed,
    }
}

/// Probe the remote key and decide what to do with this file.
///
/// Probe failures are verdicts too, not errors: a key whose state cannot be
/// determined is reported as a conflict and the rest of the run continues.
pub async fn check_remote(
    store: &dyn ObjectStore,
    file: &LocalFile,
    fingerprint: &Fingerprint,
    key: &str,
    prevent_updates: bool,
) -> SyncOutcome {
    let conditions = ProbeConditions {
        if_none_match: fingerprint.hex.clone(),
        // With overwrites allowed, a remote object newer than the local
        // file still counts as up to date.
        if_unmodified_since: (!prevent_updates).then_some(file.modified),
    };

    match store.probe(key, &conditions).await {
        Ok(result) => decide(result, prevent_updates, fingerprint),
        Err(err) => {
            let (code, message) = match err {
                StoreError::Probe { code, message, .. } => (code, message),
                other => ("unknown".to_string(), other.to_string()),
            };
            SyncOutcome::Conflict(ConflictReason::Probe { code, message })
        }
    }
}
