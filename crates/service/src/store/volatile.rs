use async_trait::async_trait;
use models::{asset::validate_assignee, Asset};
use tracing::warn;

use crate::errors::{StoreError, StoreResult};
use crate::store::{AssetStore, KeyKind};

/// In-memory asset store.
///
/// Assets live in a plain `Vec`; every lookup is a linear scan over it.
/// Deleting swaps the last asset into the freed slot, so iteration order is
/// not preserved across deletes.
///
/// The inherent methods ignore the closed flag so that
/// [`JsonFileStore`](super::json_file::JsonFileStore) can drive its working
/// set directly; callers going through [`AssetStore`] get
/// [`StoreError::Closed`] once [`AssetStore::close`] has run.
#[derive(Debug, Default, Clone)]
pub struct VolatileStore {
    data: Vec<Asset>,
    closed: bool,
}

impl VolatileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All assets in their current in-memory order.
    pub fn records(&self) -> &[Asset] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed { Err(StoreError::Closed) } else { Ok(()) }
    }

    /// Index of the single asset matching `kind == key`.
    fn position(&self, kind: KeyKind, key: &str) -> StoreResult<usize> {
        kind.ensure_identifying()?;
        let mut found = None;
        for (n, asset) in self.data.iter().enumerate() {
            if kind.value_of(asset) == Some(key) {
                if found.is_some() {
                    warn!(key_kind = %kind, %key, "multiple items found");
                    return Err(StoreError::NotUnique);
                }
                found = Some(n);
            }
        }
        found.ok_or(StoreError::NotFound)
    }

    pub fn read(&self, kind: KeyKind, key: &str) -> StoreResult<Asset> {
        let n = self.position(kind, key)?;
        Ok(self.data[n].clone())
    }

    pub fn read_all(&self, kind: KeyKind, key: &str) -> StoreResult<Vec<Asset>> {
        kind.ensure_group()?;
        let found: Vec<Asset> = self
            .data
            .iter()
            .filter(|a| match kind {
                KeyKind::Assignee => a.assignee == key,
                KeyKind::Unassigned => !a.is_assigned(),
                _ => true,
            })
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(found)
    }

    pub fn add(&mut self, asset: Asset) -> StoreResult<()> {
        asset.validate()?;
        if self.data.iter().any(|existing| existing.collides_with(&asset)) {
            warn!(mac = %asset.mac, name = %asset.name, ip = %asset.ip, "item already exists");
            return Err(StoreError::AlreadyExists);
        }
        self.data.push(asset);
        Ok(())
    }

    pub fn delete(&mut self, kind: KeyKind, key: &str) -> StoreResult<()> {
        let n = self.position(kind, key)?;
        self.data.swap_remove(n);
        Ok(())
    }

    pub fn assign(&mut self, kind: KeyKind, key: &str, assignee: &str) -> StoreResult<()> {
        validate_assignee(assignee)?;
        let n = self.position(kind, key)?;
        self.data[n].assignee = assignee.to_string();
        Ok(())
    }
}

#[async_trait]
impl AssetStore for VolatileStore {
    async fn read(&self, kind: KeyKind, key: &str) -> StoreResult<Asset> {
        self.ensure_open()?;
        VolatileStore::read(self, kind, key)
    }

    async fn read_all(&self, kind: KeyKind, key: &str) -> StoreResult<Vec<Asset>> {
        self.ensure_open()?;
        VolatileStore::read_all(self, kind, key)
    }

    async fn add(&mut self, asset: Asset) -> StoreResult<()> {
        self.ensure_open()?;
        VolatileStore::add(self, asset)
    }

    async fn delete(&mut self, kind: KeyKind, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        VolatileStore::delete(self, kind, key)
    }

    async fn assign(&mut self, kind: KeyKind, key: &str, assignee: &str) -> StoreResult<()> {
        self.ensure_open()?;
        VolatileStore::assign(self, kind, key, assignee)
    }

    async fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        Ok(())
    }
}
