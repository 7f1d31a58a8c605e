//! Join table between coffees and tasting notes

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coffee_tasting_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub coffee_id: Uuid,

    #[sea_orm(primary_key, auto_increment = false)]
    pub tasting_note_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::coffee::Entity",
        from = "Column::CoffeeId",
        to = "super::coffee::Column::Id",
        on_delete = "Cascade"
    )]
    Coffee,

    #[sea_orm(
        belongs_to = "super::tasting_note::Entity",
        from = "Column::TastingNoteId",
        to = "super::tasting_note::Column::Id",
        on_delete = "Cascade"
    )]
    TastingNote,
}

impl Related<super::coffee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coffee.def()
    }
}

impl Related<super::tasting_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TastingNote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
