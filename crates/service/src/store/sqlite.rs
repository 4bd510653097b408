use std::path::Path;

use async_trait::async_trait;
use models::{
    asset::validate_assignee,
    computer::{self, assignee_value, Column, Entity},
    db, Asset,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{error, instrument, warn};

use crate::errors::{StoreError, StoreResult};
use crate::store::{AssetStore, KeyKind};

/// SQLite-backed asset store using the `computers` table.
///
/// The table is the only copy of the data. Every mutation runs in its own
/// transaction; a `DatabaseTransaction` that is dropped before `commit`
/// rolls back, so each early return leaves the table untouched.
pub struct SqliteStore {
    db: Option<DatabaseConnection>,
}

fn read_err(e: DbErr) -> StoreError {
    error!(error = %e, "error reading database");
    StoreError::Read(e.to_string())
}

fn write_err(e: DbErr) -> StoreError {
    error!(error = %e, "error writing to database");
    StoreError::Write(e.to_string())
}

fn key_column(kind: KeyKind) -> StoreResult<Column> {
    match kind {
        KeyKind::Mac => Ok(Column::Mac),
        KeyKind::Name => Ok(Column::Name),
        KeyKind::Ip => Ok(Column::Ip),
        other => Err(StoreError::InvalidKeyKind(other)),
    }
}

fn unassigned() -> Condition {
    Condition::any().add(Column::Assignee.eq("")).add(Column::Assignee.is_null())
}

/// Locate the one row whose `kind` column equals `key`.
async fn find_unique<C: ConnectionTrait>(conn: &C, kind: KeyKind, key: &str) -> StoreResult<computer::Model> {
    let col = key_column(kind)?;
    let rows = Entity::find().filter(col.eq(key)).limit(2).all(conn).await.map_err(read_err)?;
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        (None, _) => Err(StoreError::NotFound),
        (Some(_), Some(_)) => {
            warn!(key_kind = %kind, %key, "multiple items found");
            Err(StoreError::NotUnique)
        }
    }
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = db::connect_file(path.as_ref()).await.map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { db: Some(db) })
    }

    /// Open a database by URL, e.g. `sqlite::memory:`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let db = db::connect(url).await.map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { db: Some(db) })
    }

    fn conn(&self) -> StoreResult<&DatabaseConnection> {
        self.db.as_ref().ok_or(StoreError::Closed)
    }
}

#[async_trait]
impl AssetStore for SqliteStore {
    async fn read(&self, kind: KeyKind, key: &str) -> StoreResult<Asset> {
        kind.ensure_identifying()?;
        let row = find_unique(self.conn()?, kind, key).await?;
        Ok(row.into())
    }

    async fn read_all(&self, kind: KeyKind, key: &str) -> StoreResult<Vec<Asset>> {
        let query = match kind {
            KeyKind::Assignee if key.is_empty() => Entity::find().filter(unassigned()),
            KeyKind::Assignee => Entity::find().filter(Column::Assignee.eq(key)),
            KeyKind::Unassigned => Entity::find().filter(unassigned()),
            KeyKind::All => Entity::find(),
            other => return Err(StoreError::InvalidKeyKind(other)),
        };
        let rows = query.all(self.conn()?).await.map_err(read_err)?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    #[instrument(level = "debug", skip(self, asset), fields(mac = %asset.mac))]
    async fn add(&mut self, asset: Asset) -> StoreResult<()> {
        asset.validate()?;
        let txn = self.conn()?.begin().await.map_err(write_err)?;
        let clash = Entity::find()
            .filter(
                Condition::any()
                    .add(Column::Mac.eq(asset.mac.as_str()))
                    .add(Column::Name.eq(asset.name.as_str()))
                    .add(Column::Ip.eq(asset.ip.as_str())),
            )
            .one(&txn)
            .await
            .map_err(read_err)?;
        if clash.is_some() {
            warn!(mac = %asset.mac, name = %asset.name, ip = %asset.ip, "item already exists");
            return Err(StoreError::AlreadyExists);
        }
        let am: computer::ActiveModel = asset.into();
        Entity::insert(am).exec_without_returning(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::AlreadyExists,
            _ => write_err(e),
        })?;
        txn.commit().await.map_err(write_err)
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&mut self, kind: KeyKind, key: &str) -> StoreResult<()> {
        kind.ensure_identifying()?;
        let txn = self.conn()?.begin().await.map_err(write_err)?;
        let row = find_unique(&txn, kind, key).await?;
        row.delete(&txn).await.map_err(write_err)?;
        txn.commit().await.map_err(write_err)
    }

    #[instrument(level = "debug", skip(self))]
    async fn assign(&mut self, kind: KeyKind, key: &str, assignee: &str) -> StoreResult<()> {
        validate_assignee(assignee)?;
        kind.ensure_identifying()?;
        let txn = self.conn()?.begin().await.map_err(write_err)?;
        let row = find_unique(&txn, kind, key).await?;
        let mut am: computer::ActiveModel = row.into();
        am.assignee = Set(assignee_value(assignee));
        am.update(&txn).await.map_err(write_err)?;
        txn.commit().await.map_err(write_err)
    }

    async fn close(&mut self) -> StoreResult<()> {
        if let Some(db) = self.db.take() {
            db.close().await.map_err(|e| {
                error!(error = %e, "error closing database");
                StoreError::Close(e.to_string())
            })?;
        }
        Ok(())
    }
}
