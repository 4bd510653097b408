//! Keyed asset storage.
//!
//! [`AssetStore`] is the contract every backend satisfies. The in-memory
//! [`volatile::VolatileStore`] defines the reference semantics;
//! [`json_file::JsonFileStore`] wraps one and mirrors it to a JSON file;
//! [`sqlite::SqliteStore`] maps the same operations onto a single table.

use std::{fmt, path::Path, str::FromStr};

use async_trait::async_trait;
use configs::StorageKind;
use models::Asset;
use tracing::info;

use crate::errors::{StoreError, StoreResult};

pub mod volatile;
pub mod json_file;
pub mod sqlite;
#[cfg(test)]
pub(crate) mod conformance;

/// Attribute used to locate assets.
///
/// `Mac`, `Name` and `Ip` identify a single asset and are accepted by
/// [`AssetStore::read`], [`AssetStore::delete`] and [`AssetStore::assign`].
/// `Assignee`, `Unassigned` and `All` select groups and are only accepted by
/// [`AssetStore::read_all`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Mac,
    Name,
    Ip,
    Assignee,
    Unassigned,
    All,
}

impl KeyKind {
    pub fn is_identifying(self) -> bool {
        matches!(self, KeyKind::Mac | KeyKind::Name | KeyKind::Ip)
    }

    /// Reject group kinds where a single asset must be addressed.
    pub fn ensure_identifying(self) -> StoreResult<()> {
        if self.is_identifying() { Ok(()) } else { Err(StoreError::InvalidKeyKind(self)) }
    }

    /// Reject identifying kinds where a group must be addressed.
    pub fn ensure_group(self) -> StoreResult<()> {
        if self.is_identifying() { Err(StoreError::InvalidKeyKind(self)) } else { Ok(()) }
    }

    /// Value of this attribute on `asset`; group kinds have none.
    pub fn value_of(self, asset: &Asset) -> Option<&str> {
        match self {
            KeyKind::Mac => Some(&asset.mac),
            KeyKind::Name => Some(&asset.name),
            KeyKind::Ip => Some(&asset.ip),
            KeyKind::Assignee => Some(&asset.assignee),
            KeyKind::Unassigned | KeyKind::All => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyKind::Mac => "MAC",
            KeyKind::Name => "Name",
            KeyKind::Ip => "IP",
            KeyKind::Assignee => "Assignee",
            KeyKind::Unassigned => "NotAssigned",
            KeyKind::All => "All",
        };
        f.write_str(s)
    }
}

impl FromStr for KeyKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mac" => Ok(KeyKind::Mac),
            "name" => Ok(KeyKind::Name),
            "ip" => Ok(KeyKind::Ip),
            "assignee" => Ok(KeyKind::Assignee),
            "notassigned" | "unassigned" => Ok(KeyKind::Unassigned),
            "all" => Ok(KeyKind::All),
            _ => Err(StoreError::UnknownKeyKind(s.to_string())),
        }
    }
}

/// Storage contract shared by all backends.
///
/// Callers serialize access (see [`crate::inventory::Inventory`]), so
/// mutating operations take `&mut self`.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetch the single asset whose identifying attribute `kind` equals `key`.
    async fn read(&self, kind: KeyKind, key: &str) -> StoreResult<Asset>;
    /// Fetch a group of assets. An empty result is [`StoreError::NotFound`].
    async fn read_all(&self, kind: KeyKind, key: &str) -> StoreResult<Vec<Asset>>;
    async fn add(&mut self, asset: Asset) -> StoreResult<()>;
    async fn delete(&mut self, kind: KeyKind, key: &str) -> StoreResult<()>;
    /// Set the assignee of one asset; an empty `assignee` clears it.
    async fn assign(&mut self, kind: KeyKind, key: &str, assignee: &str) -> StoreResult<()>;
    async fn unassign(&mut self, kind: KeyKind, key: &str) -> StoreResult<()> {
        self.assign(kind, key, "").await
    }
    /// Release held resources. Calling it again is a no-op.
    async fn close(&mut self) -> StoreResult<()>;
}

/// Open the backend selected by `kind`. `path` is ignored for volatile storage.
pub async fn open(kind: StorageKind, path: &Path) -> StoreResult<Box<dyn AssetStore>> {
    info!(?kind, path = %path.display(), "opening asset store");
    let store: Box<dyn AssetStore> = match kind {
        StorageKind::Volatile => Box::new(volatile::VolatileStore::new()),
        StorageKind::Json => Box::new(json_file::JsonFileStore::open(path).await?),
        StorageKind::Sqlite => Box::new(sqlite::SqliteStore::open(path).await?),
    };
    Ok(store)
}
