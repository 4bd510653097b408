#![cfg(test)]
use std::path::PathBuf;

/// Unique scratch file path under the system temp dir. Nothing is created.
pub fn temp_path(ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("assetdb-test-{}.{ext}", uuid::Uuid::new_v4()))
}
