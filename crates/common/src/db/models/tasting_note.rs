//! Tasting note entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasting_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    /// Capitalized, e.g. "Dark chocolate"
    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::coffee_tasting_note::Entity")]
    CoffeeTastingNotes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::coffee::Entity> for Entity {
    fn to() -> RelationDef {
        super::coffee_tasting_note::Relation::Coffee.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::coffee_tasting_note::Relation::TastingNote.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
