//! User entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Login identity, stored lower-cased
    #[sea_orm(column_type = "Text", unique)]
    pub email: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coffee::Entity")]
    Coffees,

    #[sea_orm(has_many = "super::roaster::Entity")]
    Roasters,

    #[sea_orm(has_many = "super::processing::Entity")]
    Processing,

    #[sea_orm(has_many = "super::tasting_note::Entity")]
    TastingNotes,
}

impl Related<super::coffee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coffees.def()
    }
}

impl Related<super::roaster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roasters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
