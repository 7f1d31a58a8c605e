//! Schema creation
//!
//! Tables are derived from the entity definitions so PostgreSQL and SQLite
//! get the same layout. Every statement is `IF NOT EXISTS`, running this on
//! an up-to-date database is a no-op.

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, Schema};
use tracing::{debug, info};

/// Create all tables and composite unique indexes
pub async fn create_schema<C: ConnectionTrait>(conn: &C) -> Result<()> {
    let schema = Schema::new(conn.get_database_backend());

    // parents before children, foreign keys are declared inline
    create_table(conn, schema.create_table_from_entity(UserEntity)).await?;
    create_table(conn, schema.create_table_from_entity(ProcessingEntity)).await?;
    create_table(conn, schema.create_table_from_entity(RoasterEntity)).await?;
    create_table(conn, schema.create_table_from_entity(TastingNoteEntity)).await?;
    create_table(conn, schema.create_table_from_entity(CoffeeEntity)).await?;
    create_table(conn, schema.create_table_from_entity(CoffeeTastingNoteEntity)).await?;

    for index in unique_indexes() {
        conn.execute(conn.get_database_backend().build(&index)).await?;
    }

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<C: ConnectionTrait>(conn: &C, mut stmt: TableCreateStatement) -> Result<()> {
    stmt.if_not_exists();
    debug!(table = ?stmt.get_table_name(), "Ensuring table");

    conn.execute(conn.get_database_backend().build(&stmt)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("uq_processing_user_name")
            .table(ProcessingEntity)
            .col(ProcessingColumn::UserId)
            .col(ProcessingColumn::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_roasters_user_name_country")
            .table(RoasterEntity)
            .col(RoasterColumn::UserId)
            .col(RoasterColumn::Name)
            .col(RoasterColumn::Country)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_tasting_notes_user_name")
            .table(TastingNoteEntity)
            .col(TastingNoteColumn::UserId)
            .col(TastingNoteColumn::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_coffees_identity")
            .table(CoffeeEntity)
            .col(CoffeeColumn::UserId)
            .col(CoffeeColumn::Name)
            .col(CoffeeColumn::Country)
            .col(CoffeeColumn::RoasterId)
            .col(CoffeeColumn::RoastingDate)
            .col(CoffeeColumn::ProcessingId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}
