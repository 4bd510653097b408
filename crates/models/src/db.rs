use std::path::Path;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::{computer, errors::ModelError};

/// Connection URL for an SQLite database file, created on first use.
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Open an SQLite database and make sure the `computers` table exists.
///
/// The pool is pinned to a single connection: the engine is an embedded,
/// single-file database and all writes go through one writer.
pub async fn connect(url: &str) -> Result<DatabaseConnection, ModelError> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    computer::ensure_table(&db).await?;
    info!(%url, "sqlite database ready");
    Ok(db)
}

/// Convenience wrapper around [`connect`] for a file path.
pub async fn connect_file(path: &Path) -> Result<DatabaseConnection, ModelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| ModelError::Db(e.to_string()))?;
    }
    connect(&sqlite_url(path)).await
}
