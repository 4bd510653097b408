use sea_orm::{entity::prelude::*, ConnectionTrait, Schema, Set};

use crate::{asset::Asset, errors};

/// Row in `computers`. The three identifying columns form the primary key;
/// `Assignee` and `Description` are nullable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "computers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "MAC")]
    pub mac: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "Name")]
    pub name: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "IP")]
    pub ip: String,
    #[sea_orm(column_name = "Assignee", nullable)]
    pub assignee: Option<String>,
    #[sea_orm(column_name = "Description", column_type = "Text", nullable)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Storage form of an assignee code: empty means NULL.
pub fn assignee_value(assignee: &str) -> Option<String> {
    non_empty(assignee.to_string())
}

impl From<Model> for Asset {
    fn from(m: Model) -> Self {
        Asset {
            mac: m.mac,
            name: m.name,
            ip: m.ip,
            assignee: m.assignee.unwrap_or_default(),
            description: m.description.unwrap_or_default(),
        }
    }
}

impl From<Asset> for ActiveModel {
    fn from(a: Asset) -> Self {
        ActiveModel {
            mac: Set(a.mac),
            name: Set(a.name),
            ip: Set(a.ip),
            assignee: Set(non_empty(a.assignee)),
            description: Set(non_empty(a.description)),
        }
    }
}

/// Create the `computers` table when it does not exist yet.
pub async fn ensure_table<C: ConnectionTrait>(db: &C) -> Result<(), errors::ModelError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = backend.build(schema.create_table_from_entity(Entity).if_not_exists());
    db.execute(stmt).await?;
    Ok(())
}
