//! Coffee entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coffees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// Origin country, free text
    #[sea_orm(column_type = "Text")]
    pub country: String,

    pub processing_id: Option<Uuid>,

    pub roaster_id: Option<Uuid>,

    pub roasting_date: Date,

    /// 1 to 5 when set
    pub rating: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub variety: Option<String>,

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

    #[sea_orm(
        belongs_to = "super::processing::Entity",
        from = "Column::ProcessingId",
        to = "super::processing::Column::Id",
        on_delete = "SetNull"
    )]
    Processing,

    #[sea_orm(
        belongs_to = "super::roaster::Entity",
        from = "Column::RoasterId",
        to = "super::roaster::Column::Id",
        on_delete = "SetNull"
    )]
    Roaster,

    #[sea_orm(has_many = "super::coffee_tasting_note::Entity")]
    CoffeeTastingNotes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::processing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Processing.def()
    }
}

impl Related<super::roaster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roaster.def()
    }
}

impl Related<super::tasting_note::Entity> for Entity {
    fn to() -> RelationDef {
        super::coffee_tasting_note::Relation::TastingNote.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::coffee_tasting_note::Relation::Coffee.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
