use std::{io::SeekFrom, path::PathBuf};

use async_trait::async_trait;
use models::Asset;
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{error, info, instrument};

use crate::errors::{StoreError, StoreResult};
use crate::store::{volatile::VolatileStore, AssetStore, KeyKind};

/// JSON file-backed asset store.
///
/// Queries and mutations run against an inner [`VolatileStore`]. After each
/// successful mutation the whole set is written back to the file as a JSON
/// array (`[]` when empty). A failed write is reported as
/// [`StoreError::Write`] but the in-memory change is kept, so the file can
/// lag behind memory until the next successful write.
pub struct JsonFileStore {
    inner: VolatileStore,
    file: Option<File>,
    file_path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is created holding `[]`;
    /// an existing one is parsed and every entry replayed through
    /// [`VolatileStore::add`]. Any parse or replay failure aborts with
    /// [`StoreError::Read`].
    pub async fn open<P: Into<PathBuf>>(path: P) -> StoreResult<Self> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| StoreError::Create(e.to_string()))?;
        }

        let mut inner = VolatileStore::new();
        let file = match fs::metadata(&file_path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create_new(true)
                    .open(&file_path)
                    .await
                    .map_err(|e| StoreError::Create(format!("{}: {e}", file_path.display())))?;
                file.write_all(b"[]").await.map_err(|e| StoreError::Create(e.to_string()))?;
                file.flush().await.map_err(|e| StoreError::Create(e.to_string()))?;
                info!(path = %file_path.display(), "created empty asset file");
                file
            }
            Err(e) => return Err(StoreError::Open(format!("{}: {e}", file_path.display()))),
            Ok(_) => {
                let mut file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(&file_path)
                    .await
                    .map_err(|e| StoreError::Open(format!("{}: {e}", file_path.display())))?;
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).await.map_err(|e| StoreError::Read(e.to_string()))?;
                for asset in parse_assets(&bytes)? {
                    inner.add(asset).map_err(|e| {
                        error!(error = %e, "error updating internal database");
                        StoreError::Read(e.to_string())
                    })?;
                }
                info!(path = %file_path.display(), count = inner.len(), "loaded asset file");
                file
            }
        };

        Ok(Self { inner, file: Some(file), file_path })
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.file.is_some() { Ok(()) } else { Err(StoreError::Closed) }
    }

    /// Truncate the file and write the full in-memory set.
    async fn save(&mut self) -> StoreResult<()> {
        let data = serde_json::to_vec(self.inner.records()).map_err(|e| StoreError::Write(e.to_string()))?;
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;
        let res = async {
            file.set_len(0).await?;
            file.seek(SeekFrom::Start(0)).await?;
            file.write_all(&data).await?;
            file.flush().await
        }
        .await;
        res.map_err(|e| {
            error!(path = %self.file_path.display(), error = %e, "error writing asset file");
            StoreError::Write(e.to_string())
        })
    }
}

fn parse_assets(bytes: &[u8]) -> StoreResult<Vec<Asset>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).map_err(|e| {
        error!(error = %e, "error decoding asset file");
        StoreError::Read(e.to_string())
    })
}

#[async_trait]
impl AssetStore for JsonFileStore {
    async fn read(&self, kind: KeyKind, key: &str) -> StoreResult<Asset> {
        self.ensure_open()?;
        self.inner.read(kind, key)
    }

    async fn read_all(&self, kind: KeyKind, key: &str) -> StoreResult<Vec<Asset>> {
        self.ensure_open()?;
        self.inner.read_all(kind, key)
    }

    #[instrument(level = "debug", skip(self, asset), fields(mac = %asset.mac))]
    async fn add(&mut self, asset: Asset) -> StoreResult<()> {
        self.ensure_open()?;
        self.inner.add(asset)?;
        self.save().await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&mut self, kind: KeyKind, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.inner.delete(kind, key)?;
        self.save().await
    }

    #[instrument(level = "debug", skip(self))]
    async fn assign(&mut self, kind: KeyKind, key: &str, assignee: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.inner.assign(kind, key, assignee)?;
        self.save().await
    }

    async fn close(&mut self) -> StoreResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().await.map_err(|e| StoreError::Close(e.to_string()))?;
        }
        Ok(())
    }
}
