//! Per-user query scope
//!
//! Every query on a user-owned entity goes through `UserScope`, which adds
//! the `user_id` predicate itself. Handlers never filter by owner by hand.
//! The scope is generic over the connection so the same code runs on the
//! pool and inside a transaction.

use crate::db::models::*;
use crate::db::views::{CoffeeDetails, ProcessingUsage, RoasterSummary};
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

/// Shown when a coffee with the same identity already exists
pub const COFFEE_EXISTS_MESSAGE: &str =
    "Coffee with this Name, Country, Roaster, Roasting date and Processing already exists";

/// Shown when a roaster with the same name and country already exists
pub const ROASTER_EXISTS_MESSAGE: &str = "Roaster with this Name and Country already exists";

/// Input for a new coffee. Related rows are referenced by name and
/// created on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoffee {
    pub name: String,
    pub country: String,
    pub processing: String,
    pub roaster: String,
    pub roasting_date: NaiveDate,
    pub rating: Option<i32>,
    pub variety: Option<String>,
    pub tasting_notes: Vec<String>,
}

/// Input for a new roaster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoaster {
    pub name: String,
    pub country: String,
    pub website: Option<String>,
}

/// Query scope bound to a single user
pub struct UserScope<'c, C> {
    conn: &'c C,
    user_id: Uuid,
}

impl<'c, C: ConnectionTrait> UserScope<'c, C> {
    pub fn new(conn: &'c C, user_id: Uuid) -> Self {
        Self { conn, user_id }
    }

    fn coffees(&self) -> Select<CoffeeEntity> {
        CoffeeEntity::find().filter(CoffeeColumn::UserId.eq(self.user_id))
    }

    fn roasters(&self) -> Select<RoasterEntity> {
        RoasterEntity::find().filter(RoasterColumn::UserId.eq(self.user_id))
    }

    fn processing(&self) -> Select<ProcessingEntity> {
        ProcessingEntity::find().filter(ProcessingColumn::UserId.eq(self.user_id))
    }

    fn tasting_notes(&self) -> Select<TastingNoteEntity> {
        TastingNoteEntity::find().filter(TastingNoteColumn::UserId.eq(self.user_id))
    }

    // ========================================================================
    // Coffee Operations
    // ========================================================================

    /// List coffees, newest roast first.
    ///
    /// `search` is matched case-insensitively as a substring of the coffee
    /// name, country, processing name or roaster name.
    pub async fn list_coffees(&self, search: Option<&str>) -> Result<Vec<CoffeeDetails>> {
        let mut select = self
            .coffees()
            .left_join(ProcessingEntity)
            .left_join(RoasterEntity);

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));

            select = select.filter(
                Condition::any()
                    .add(lower_like((CoffeeEntity, CoffeeColumn::Name), &pattern))
                    .add(lower_like((CoffeeEntity, CoffeeColumn::Country), &pattern))
                    .add(lower_like((ProcessingEntity, ProcessingColumn::Name), &pattern))
                    .add(lower_like((RoasterEntity, RoasterColumn::Name), &pattern)),
            );
        }

        let coffees = select
            .order_by_desc(CoffeeColumn::RoastingDate)
            .order_by_asc(CoffeeColumn::Name)
            .all(self.conn)
            .await?;

        self.with_details(coffees).await
    }

    /// Find one of the user's coffees.
    /// Missing and foreign coffees yield the same error.
    pub async fn find_coffee(&self, id: Uuid) -> Result<CoffeeDetails> {
        let coffee = self
            .coffees()
            .filter(CoffeeColumn::Id.eq(id))
            .one(self.conn)
            .await?
            .ok_or(AppError::CoffeeNotFound)?;

        self.with_details(vec![coffee])
            .await?
            .pop()
            .ok_or(AppError::CoffeeNotFound)
    }

    /// Create a coffee; an existing identical coffee is a conflict
    pub async fn create_coffee(&self, new: &NewCoffee) -> Result<Coffee> {
        let processing = self.get_or_create_processing(&new.processing).await?;
        let roaster = self.get_or_create_roaster(&new.roaster).await?;

        let coffee = self.insert_coffee(new, &processing, &roaster).await?;
        self.add_tasting_notes(&coffee, &new.tasting_notes).await?;

        Ok(coffee)
    }

    /// Get or create a coffee by its full identity and merge its tasting
    /// notes. Rating and variety only apply when the coffee is created.
    ///
    /// Returns the coffee and whether it was created.
    pub async fn upsert_coffee(&self, new: &NewCoffee) -> Result<(Coffee, bool)> {
        let processing = self.get_or_create_processing(&new.processing).await?;
        let roaster = self.get_or_create_roaster(&new.roaster).await?;

        let existing = self
            .coffees()
            .filter(CoffeeColumn::Name.eq(new.name.as_str()))
            .filter(CoffeeColumn::Country.eq(new.country.as_str()))
            .filter(CoffeeColumn::RoasterId.eq(roaster.id))
            .filter(CoffeeColumn::RoastingDate.eq(new.roasting_date))
            .filter(CoffeeColumn::ProcessingId.eq(processing.id))
            .one(self.conn)
            .await?;

        let (coffee, created) = match existing {
            Some(coffee) => (coffee, false),
            None => (self.insert_coffee(new, &processing, &roaster).await?, true),
        };

        self.add_tasting_notes(&coffee, &new.tasting_notes).await?;

        Ok((coffee, created))
    }

    async fn insert_coffee(
        &self,
        new: &NewCoffee,
        processing: &Processing,
        roaster: &Roaster,
    ) -> Result<Coffee> {
        let now = Utc::now();

        let coffee = CoffeeActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            name: Set(new.name.clone()),
            country: Set(new.country.clone()),
            processing_id: Set(Some(processing.id)),
            roaster_id: Set(Some(roaster.id)),
            roasting_date: Set(new.roasting_date),
            rating: Set(new.rating),
            variety: Set(new.variety.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let coffee = coffee.insert(self.conn).await.map_err(|e| match AppError::from(e) {
            AppError::Duplicate { .. } => AppError::Duplicate {
                message: COFFEE_EXISTS_MESSAGE.to_string(),
            },
            other => other,
        })?;

        info!(user_id = %self.user_id, coffee_id = %coffee.id, "Coffee created");
        metrics::record_coffee_created();

        Ok(coffee)
    }

    /// Delete a coffee. Returns false when nothing was deleted.
    pub async fn delete_coffee(&self, id: Uuid) -> Result<bool> {
        let result = CoffeeEntity::delete_many()
            .filter(CoffeeColumn::UserId.eq(self.user_id))
            .filter(CoffeeColumn::Id.eq(id))
            .exec(self.conn)
            .await?;

        let deleted = result.rows_affected > 0;
        info!(user_id = %self.user_id, coffee_id = %id, deleted, "Coffee delete requested");

        Ok(deleted)
    }

    async fn with_details(&self, coffees: Vec<Coffee>) -> Result<Vec<CoffeeDetails>> {
        let processing = coffees.load_one(ProcessingEntity, self.conn).await?;
        let roasters = coffees.load_one(RoasterEntity, self.conn).await?;
        let notes = coffees
            .load_many_to_many(TastingNoteEntity, CoffeeTastingNoteEntity, self.conn)
            .await?;

        let details = coffees
            .into_iter()
            .zip(processing)
            .zip(roasters)
            .zip(notes)
            .map(|(((coffee, processing), roaster), mut tasting_notes)| {
                tasting_notes.sort_by(|a, b| a.name.cmp(&b.name));
                CoffeeDetails {
                    coffee,
                    processing,
                    roaster,
                    tasting_notes,
                }
            })
            .collect();

        Ok(details)
    }

    // ========================================================================
    // Tasting Notes
    // ========================================================================

    /// Get or create a tasting note by exact name
    pub async fn get_or_create_tasting_note(&self, name: &str) -> Result<TastingNote> {
        if let Some(note) = self
            .tasting_notes()
            .filter(TastingNoteColumn::Name.eq(name))
            .one(self.conn)
            .await?
        {
            return Ok(note);
        }

        let now = Utc::now();
        let note = TastingNoteActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            name: Set(name.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.conn)
        .await?;

        debug!(user_id = %self.user_id, note = %note.name, "Tasting note created");
        Ok(note)
    }

    /// Add notes to a coffee's note set. Notes already attached are kept
    /// once.
    pub async fn add_tasting_notes(&self, coffee: &Coffee, names: &[String]) -> Result<()> {
        if coffee.user_id != self.user_id {
            return Err(AppError::CoffeeNotFound);
        }
        if names.is_empty() {
            return Ok(());
        }

        let mut attached: HashSet<Uuid> = CoffeeTastingNoteEntity::find()
            .filter(CoffeeTastingNoteColumn::CoffeeId.eq(coffee.id))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|link| link.tasting_note_id)
            .collect();

        for name in names {
            let note = self.get_or_create_tasting_note(name).await?;
            if !attached.insert(note.id) {
                continue;
            }

            CoffeeTastingNoteActiveModel {
                coffee_id: Set(coffee.id),
                tasting_note_id: Set(note.id),
            }
            .insert(self.conn)
            .await?;
        }

        Ok(())
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Get or create a processing method by exact name
    pub async fn get_or_create_processing(&self, name: &str) -> Result<Processing> {
        if let Some(processing) = self
            .processing()
            .filter(ProcessingColumn::Name.eq(name))
            .one(self.conn)
            .await?
        {
            return Ok(processing);
        }

        let now = Utc::now();
        let processing = ProcessingActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            name: Set(name.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.conn)
        .await?;

        debug!(user_id = %self.user_id, processing = %processing.name, "Processing created");
        Ok(processing)
    }

    /// Processing methods with the number of coffees using each, by name
    pub async fn list_processing(&self) -> Result<Vec<ProcessingUsage>> {
        let processing = self
            .processing()
            .order_by_asc(ProcessingColumn::Name)
            .all(self.conn)
            .await?;

        let usage = self.count_coffees_by(CoffeeColumn::ProcessingId).await?;

        Ok(processing
            .into_iter()
            .map(|processing| ProcessingUsage {
                used: usage.get(&processing.id).copied().unwrap_or(0),
                processing,
            })
            .collect())
    }

    // ========================================================================
    // Roasters
    // ========================================================================

    /// Get or create a roaster by name. A new roaster gets an empty country.
    pub async fn get_or_create_roaster(&self, name: &str) -> Result<Roaster> {
        if let Some(roaster) = self
            .roasters()
            .filter(RoasterColumn::Name.eq(name))
            .order_by_asc(RoasterColumn::CreatedAt)
            .one(self.conn)
            .await?
        {
            return Ok(roaster);
        }

        self.create_roaster(&NewRoaster {
            name: name.to_string(),
            country: String::new(),
            website: None,
        })
        .await
    }

    /// Create a roaster; an existing (name, country) pair is a conflict
    pub async fn create_roaster(&self, new: &NewRoaster) -> Result<Roaster> {
        let now = Utc::now();

        let roaster = RoasterActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            name: Set(new.name.clone()),
            country: Set(new.country.clone()),
            website: Set(new.website.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let roaster = roaster.insert(self.conn).await.map_err(|e| match AppError::from(e) {
            AppError::Duplicate { .. } => AppError::Duplicate {
                message: ROASTER_EXISTS_MESSAGE.to_string(),
            },
            other => other,
        })?;

        info!(user_id = %self.user_id, roaster_id = %roaster.id, "Roaster created");
        Ok(roaster)
    }

    /// Roasters with their coffee count, most coffees first then by name
    pub async fn list_roasters(&self) -> Result<Vec<RoasterSummary>> {
        let roasters = self.roasters().all(self.conn).await?;
        let counts = self.count_coffees_by(CoffeeColumn::RoasterId).await?;

        let mut summaries: Vec<RoasterSummary> = roasters
            .into_iter()
            .map(|roaster| RoasterSummary {
                coffees: counts.get(&roaster.id).copied().unwrap_or(0),
                roaster,
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.coffees
                .cmp(&a.coffees)
                .then_with(|| a.roaster.name.cmp(&b.roaster.name))
        });

        Ok(summaries)
    }

    /// Number of the user's coffees per value of a nullable foreign key
    async fn count_coffees_by(&self, column: CoffeeColumn) -> Result<HashMap<Uuid, i64>> {
        let rows: Vec<(Uuid, i64)> = self
            .coffees()
            .select_only()
            .column(column)
            .column_as(CoffeeColumn::Id.count(), "count")
            .filter(column.is_not_null())
            .group_by(column)
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().collect())
    }
}

const LIKE_ESCAPE: char = '\\';

/// Make `%` and `_` in user input match literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn lower_like<T: IntoColumnRef>(column: T, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_create_and_find_coffee() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "finder@example.com").await;
        let scope = repo.scope(user.id);

        let mut new = testing::new_coffee("Kochere", "Ethiopia");
        new.tasting_notes = vec!["Peach".into(), "Bergamot".into()];
        new.rating = Some(4);

        let coffee = scope.create_coffee(&new).await.unwrap();
        let details = scope.find_coffee(coffee.id).await.unwrap();

        assert_eq!(details.coffee.name, "Kochere");
        assert_eq!(details.coffee.rating, Some(4));
        assert_eq!(details.processing_name(), Some("Washed"));
        assert_eq!(details.roaster_name(), Some("Friedhats"));
        assert_eq!(details.tasting_note_names(), vec!["Bergamot", "Peach"]);
        assert_eq!(details.flag(), "\u{1F1EA}\u{1F1F9}");
    }

    #[tokio::test]
    async fn test_foreign_coffee_is_not_found() {
        let repo = testing::test_repository().await;
        let owner = testing::create_user(&repo, "owner@example.com").await;
        let other = testing::create_user(&repo, "other@example.com").await;

        let coffee = repo
            .scope(owner.id)
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        let err = repo.scope(other.id).find_coffee(coffee.id).await.unwrap_err();
        assert!(matches!(err, AppError::CoffeeNotFound));

        let err = repo.scope(owner.id).find_coffee(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::CoffeeNotFound));
    }

    #[tokio::test]
    async fn test_delete_is_scoped() {
        let repo = testing::test_repository().await;
        let owner = testing::create_user(&repo, "owner@example.com").await;
        let other = testing::create_user(&repo, "other@example.com").await;

        let coffee = repo
            .scope(owner.id)
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        assert!(!repo.scope(other.id).delete_coffee(coffee.id).await.unwrap());
        assert!(repo.scope(owner.id).delete_coffee(coffee.id).await.unwrap());
        assert!(!repo.scope(owner.id).delete_coffee(coffee.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_coffees_order_and_search() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "lister@example.com").await;
        let scope = repo.scope(user.id);

        let mut old = testing::new_coffee("Zebra", "Kenya");
        old.roasting_date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        scope.create_coffee(&old).await.unwrap();

        let mut natural = testing::new_coffee("Alo", "Ethiopia");
        natural.processing = "Natural".into();
        natural.roaster = "Coffee Collective".into();
        scope.create_coffee(&natural).await.unwrap();

        scope
            .create_coffee(&testing::new_coffee("Gesha", "Panama"))
            .await
            .unwrap();

        let all = scope.list_coffees(None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.coffee.name.as_str()).collect();
        assert_eq!(names, vec!["Alo", "Gesha", "Zebra"]);

        let by_country = scope.list_coffees(Some("kEnYa")).await.unwrap();
        assert_eq!(by_country.len(), 1);
        assert_eq!(by_country[0].coffee.name, "Zebra");

        let by_processing = scope.list_coffees(Some("natur")).await.unwrap();
        assert_eq!(by_processing.len(), 1);
        assert_eq!(by_processing[0].coffee.name, "Alo");

        let by_roaster = scope.list_coffees(Some("collective")).await.unwrap();
        assert_eq!(by_roaster.len(), 1);

        assert!(scope.list_coffees(Some("nothing like it")).await.unwrap().is_empty());
        assert_eq!(scope.list_coffees(Some("  ")).await.unwrap().len(), 3);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("kochere"), "kochere");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("k_chere"), "k\\_chere");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "wildcards@example.com").await;
        let scope = repo.scope(user.id);

        scope
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        assert!(scope.list_coffees(Some("%")).await.unwrap().is_empty());
        assert!(scope.list_coffees(Some("K_chere")).await.unwrap().is_empty());
        assert!(scope.list_coffees(Some("\\")).await.unwrap().is_empty());

        scope
            .create_coffee(&testing::new_coffee("100% Arabica_Lot", "Ethiopia"))
            .await
            .unwrap();

        let found = scope.list_coffees(Some("%")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].coffee.name, "100% Arabica_Lot");
        assert_eq!(scope.list_coffees(Some("a_l")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_coffees_only_sees_own_rows() {
        let repo = testing::test_repository().await;
        let a = testing::create_user(&repo, "a@example.com").await;
        let b = testing::create_user(&repo, "b@example.com").await;

        repo.scope(a.id)
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        assert_eq!(repo.scope(a.id).list_coffees(None).await.unwrap().len(), 1);
        assert!(repo.scope(b.id).list_coffees(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_reuses_and_merges_notes() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "upsert@example.com").await;
        let scope = repo.scope(user.id);

        let mut first = testing::new_coffee("Kochere", "Ethiopia");
        first.rating = Some(3);
        first.tasting_notes = vec!["Peach".into()];
        let (coffee, created) = scope.upsert_coffee(&first).await.unwrap();
        assert!(created);

        let mut second = first.clone();
        second.rating = Some(5);
        second.tasting_notes = vec!["Peach".into(), "Jasmine".into()];
        let (again, created) = scope.upsert_coffee(&second).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, coffee.id);

        let details = scope.find_coffee(coffee.id).await.unwrap();
        // rating only applies on creation
        assert_eq!(details.coffee.rating, Some(3));
        assert_eq!(details.tasting_note_names(), vec!["Jasmine", "Peach"]);
    }

    #[tokio::test]
    async fn test_get_or_create_related_rows() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "related@example.com").await;
        let scope = repo.scope(user.id);

        let washed = scope.get_or_create_processing("Washed").await.unwrap();
        let again = scope.get_or_create_processing("Washed").await.unwrap();
        assert_eq!(washed.id, again.id);

        let roaster = scope.get_or_create_roaster("Friedhats").await.unwrap();
        assert_eq!(roaster.country, "");
        assert_eq!(
            scope.get_or_create_roaster("Friedhats").await.unwrap().id,
            roaster.id
        );

        let note = scope.get_or_create_tasting_note("Cherry").await.unwrap();
        assert_eq!(
            scope.get_or_create_tasting_note("Cherry").await.unwrap().id,
            note.id
        );
    }

    #[tokio::test]
    async fn test_duplicate_roaster_is_a_conflict() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "roaster@example.com").await;
        let scope = repo.scope(user.id);

        let new = NewRoaster {
            name: "Friedhats".into(),
            country: "Netherlands".into(),
            website: Some("https://friedhats.com".into()),
        };
        scope.create_roaster(&new).await.unwrap();

        let err = scope.create_roaster(&new).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref message } if message == ROASTER_EXISTS_MESSAGE));

        // same name, other country is fine
        let other = NewRoaster {
            country: "Belgium".into(),
            ..new
        };
        tokio_test::assert_ok!(scope.create_roaster(&other).await);
    }

    #[tokio::test]
    async fn test_list_roasters_by_coffee_count() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "counts@example.com").await;
        let scope = repo.scope(user.id);

        scope
            .create_roaster(&NewRoaster {
                name: "Abandoned".into(),
                country: "Germany".into(),
                website: None,
            })
            .await
            .unwrap();

        for name in ["One", "Two"] {
            let mut coffee = testing::new_coffee(name, "Kenya");
            coffee.roaster = "Busy".into();
            scope.create_coffee(&coffee).await.unwrap();
        }
        scope
            .create_coffee(&testing::new_coffee("Three", "Kenya"))
            .await
            .unwrap();

        let summaries = scope.list_roasters().await.unwrap();
        let counts: Vec<(&str, i64)> = summaries
            .iter()
            .map(|s| (s.roaster.name.as_str(), s.coffees))
            .collect();

        assert_eq!(counts, vec![("Busy", 2), ("Friedhats", 1), ("Abandoned", 0)]);
    }

    #[tokio::test]
    async fn test_list_processing_usage() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "usage@example.com").await;
        let scope = repo.scope(user.id);

        scope.get_or_create_processing("Honey").await.unwrap();
        scope
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        let usage: Vec<(String, i64)> = scope
            .list_processing()
            .await
            .unwrap()
            .into_iter()
            .map(|u| (u.processing.name, u.used))
            .collect();

        assert_eq!(
            usage,
            vec![("Honey".to_string(), 0), ("Washed".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_notes_of_foreign_coffee_are_rejected() {
        let repo = testing::test_repository().await;
        let owner = testing::create_user(&repo, "owner@example.com").await;
        let other = testing::create_user(&repo, "other@example.com").await;

        let coffee = repo
            .scope(owner.id)
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        let err = repo
            .scope(other.id)
            .add_tasting_notes(&coffee, &["Sneaky".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CoffeeNotFound));
    }

    #[tokio::test]
    async fn test_deleting_related_rows_keeps_coffee() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "orphan@example.com").await;
        let scope = repo.scope(user.id);

        let coffee = scope
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();
        let processing_id = coffee.processing_id.unwrap();
        let roaster_id = coffee.roaster_id.unwrap();

        ProcessingEntity::delete_by_id(processing_id)
            .exec(scope.conn)
            .await
            .unwrap();
        let details = scope.find_coffee(coffee.id).await.unwrap();
        assert_eq!(details.coffee.processing_id, None);
        assert!(details.processing.is_none());
        assert_eq!(details.coffee.roaster_id, Some(roaster_id));

        RoasterEntity::delete_by_id(roaster_id)
            .exec(scope.conn)
            .await
            .unwrap();
        let details = scope.find_coffee(coffee.id).await.unwrap();
        assert_eq!(details.coffee.roaster_id, None);
        assert!(details.roaster.is_none());
        assert_eq!(details.coffee.name, "Kochere");
    }
}
