//! Orphan removal.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::store::{ObjectStore, Result};

/// Delete every remote key that has no local counterpart.
///
/// `expected` holds the primary keys of the current deploy. Alias keys are
/// deliberately not in the set, so stale directory-index aliases are cleaned
/// up along with removed files. Returns the keys that were deleted.
pub async fn prune_removed(
    store: &dyn ObjectStore,
    expected: &HashSet<String>,
) -> Result<Vec<String>> {
    let remote = store.list_keys().await?;
    let orphans: Vec<String> = remote
        .into_iter()
        .filter(|key| !expected.contains(key))
        .collect();

    if orphans.is_empty() {
        info!("no removed objects to delete");
        return Ok(Vec::new());
    }

    debug!(keys = ?orphans, "deleting removed objects");
    store.delete_keys(&orphans).await?;
    info!(count = orphans.len(), "deleted removed objects");
    Ok(orphans)
}
