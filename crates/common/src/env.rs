//! Environment/runtime helpers
//!
//! Sanity checks run at startup before a persistent store is opened.

use std::path::Path;

use tracing::{info, warn};

/// Make sure the directory holding `store_file` exists.
/// An empty path (volatile storage) is accepted as is.
pub async fn ensure_store_dir(store_file: &Path) -> anyhow::Result<()> {
    if store_file.as_os_str().is_empty() {
        return Ok(());
    }
    let Some(dir) = store_file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::metadata(dir).await.is_err() {
        warn!(dir = %dir.display(), "store directory not found; creating it");
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    info!(file = %store_file.display(), "store location ready");
    Ok(())
}
