//! Process-wide inventory context.
//!
//! [`Inventory`] owns the opened backend behind a single async mutex, so
//! store operations never interleave. After a mutation that gives an
//! assignee another asset, the assignee's holdings are counted and an alert
//! is sent when they exceed the threshold. The alert is sent after the store
//! lock is released; a failed alert is reported to the caller but the
//! mutation stays applied.

use std::sync::Arc;

use models::Asset;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::errors::{InventoryError, StoreError};
use crate::metrics;
use crate::notify::{over_assignment, Notifier};
use crate::store::{AssetStore, KeyKind};

pub type InventoryResult<T> = Result<T, InventoryError>;

pub struct Inventory {
    store: Mutex<Box<dyn AssetStore>>,
    notifier: Arc<dyn Notifier>,
    threshold: usize,
}

impl Inventory {
    pub fn new(store: Box<dyn AssetStore>, notifier: Arc<dyn Notifier>, threshold: usize) -> Self {
        Self { store: Mutex::new(store), notifier, threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub async fn read(&self, kind: KeyKind, key: &str) -> InventoryResult<Asset> {
        let res = self.store.lock().await.read(kind, key).await.map_err(InventoryError::from);
        metrics::record_op("read", &res);
        res
    }

    pub async fn read_all(&self, kind: KeyKind, key: &str) -> InventoryResult<Vec<Asset>> {
        let res = self.store.lock().await.read_all(kind, key).await.map_err(InventoryError::from);
        metrics::record_op("read_all", &res);
        res
    }

    #[instrument(skip(self, asset), fields(mac = %asset.mac, assignee = %asset.assignee))]
    pub async fn add(&self, asset: Asset) -> InventoryResult<()> {
        let assignee = asset.assignee.clone();
        let res: InventoryResult<()> = async {
            self.store.lock().await.add(asset).await?;
            if !assignee.is_empty() {
                self.check_assignee(&assignee).await?;
            }
            Ok(())
        }
        .await;
        metrics::record_op("add", &res);
        res
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, kind: KeyKind, key: &str) -> InventoryResult<()> {
        let res = self.store.lock().await.delete(kind, key).await.map_err(InventoryError::from);
        metrics::record_op("delete", &res);
        res
    }

    #[instrument(skip(self))]
    pub async fn assign(&self, kind: KeyKind, key: &str, assignee: &str) -> InventoryResult<()> {
        let res: InventoryResult<()> = async {
            self.store.lock().await.assign(kind, key, assignee).await?;
            if !assignee.is_empty() {
                self.check_assignee(assignee).await?;
            }
            Ok(())
        }
        .await;
        metrics::record_op("assign", &res);
        res
    }

    #[instrument(skip(self))]
    pub async fn unassign(&self, kind: KeyKind, key: &str) -> InventoryResult<()> {
        let res = self.store.lock().await.unassign(kind, key).await.map_err(InventoryError::from);
        metrics::record_op("unassign", &res);
        res
    }

    pub async fn close(&self) -> InventoryResult<()> {
        self.store.lock().await.close().await?;
        info!("asset store closed");
        Ok(())
    }

    /// Count `assignee`'s assets and alert when over the threshold.
    async fn check_assignee(&self, assignee: &str) -> InventoryResult<()> {
        let count = match self.store.lock().await.read_all(KeyKind::Assignee, assignee).await {
            Ok(assets) => assets.len(),
            Err(StoreError::NotFound) => 0,
            Err(e) => return Err(e.into()),
        };
        let Some(notification) = over_assignment(assignee, count, self.threshold) else {
            return Ok(());
        };
        warn!(%assignee, count, "assignee over threshold, notifying");
        let sent = self.notifier.send(&notification).await;
        metrics::record_notification(sent.is_ok());
        sent.map_err(InventoryError::from)
    }
}
