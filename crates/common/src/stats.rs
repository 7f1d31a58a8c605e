//! Aggregation queries
//!
//! Counts and top-N breakdowns over coffees, either for one user or for
//! the whole site. All grouping and counting happens in SQL.

use crate::config::StatsConfig;
use crate::db::models::*;
use crate::errors::{AppError, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whose coffees are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    Site,
    User(Uuid),
}

/// Aggregated statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_coffees: u64,
    pub total_origins: u64,
    pub total_roasters: u64,
    pub top_origins: Vec<OriginCount>,
    pub top_roasters: Vec<RoasterCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginCount {
    pub country: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoasterCount {
    pub name: String,
    pub count: i64,
}

/// Resolve the `limit` query parameter: default when absent, clamped to
/// `1..=max_limit`, a validation error when not a number.
pub fn resolve_limit(raw: Option<&str>, config: &StatsConfig) -> Result<u64> {
    let requested = match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => config.default_limit,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AppError::invalid_field("limit", "limit must be a whole number"))?
            .max(0) as u64,
    };

    Ok(requested.clamp(1, config.max_limit.max(1)))
}

fn coffees(scope: StatsScope) -> Select<CoffeeEntity> {
    match scope {
        StatsScope::Site => CoffeeEntity::find(),
        StatsScope::User(user_id) => CoffeeEntity::find().filter(CoffeeColumn::UserId.eq(user_id)),
    }
}

fn roasters(scope: StatsScope) -> Select<RoasterEntity> {
    match scope {
        StatsScope::Site => RoasterEntity::find(),
        StatsScope::User(user_id) => {
            RoasterEntity::find().filter(RoasterColumn::UserId.eq(user_id))
        }
    }
}

/// Compute all statistics for a scope. Empty scopes give zeros.
pub async fn aggregate<C: ConnectionTrait>(conn: &C, scope: StatsScope, limit: u64) -> Result<Stats> {
    let total_coffees = coffees(scope).count(conn).await?;

    let total_origins = coffees(scope)
        .select_only()
        .column(CoffeeColumn::Country)
        .distinct()
        .count(conn)
        .await?;

    let total_roasters = roasters(scope).count(conn).await?;

    Ok(Stats {
        total_coffees,
        total_origins,
        total_roasters,
        top_origins: top_origins(conn, scope, limit).await?,
        top_roasters: top_roasters(conn, scope, limit).await?,
    })
}

/// Coffees per origin country, most first, ties by country name
pub async fn top_origins<C: ConnectionTrait>(
    conn: &C,
    scope: StatsScope,
    limit: u64,
) -> Result<Vec<OriginCount>> {
    let rows: Vec<(String, i64)> = coffees(scope)
        .select_only()
        .column(CoffeeColumn::Country)
        .column_as(CoffeeColumn::Id.count(), "count")
        .group_by(CoffeeColumn::Country)
        .order_by_desc(CoffeeColumn::Id.count())
        .order_by_asc(CoffeeColumn::Country)
        .limit(limit)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(country, count)| OriginCount { country, count })
        .collect())
}

/// Coffees per roaster name, most first, ties by name.
/// Coffees without a roaster are not counted.
pub async fn top_roasters<C: ConnectionTrait>(
    conn: &C,
    scope: StatsScope,
    limit: u64,
) -> Result<Vec<RoasterCount>> {
    let rows: Vec<(String, i64)> = coffees(scope)
        .select_only()
        .inner_join(RoasterEntity)
        .column(RoasterColumn::Name)
        .column_as(CoffeeColumn::Id.count(), "count")
        .group_by(RoasterColumn::Name)
        .order_by_desc(CoffeeColumn::Id.count())
        .order_by_asc(RoasterColumn::Name)
        .limit(limit)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(name, count)| RoasterCount { name, count })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_resolve_limit() {
        let config = StatsConfig::default();

        assert_eq!(resolve_limit(None, &config).unwrap(), 5);
        assert_eq!(resolve_limit(Some(""), &config).unwrap(), 5);
        assert_eq!(resolve_limit(Some("3"), &config).unwrap(), 3);
        assert_eq!(resolve_limit(Some("0"), &config).unwrap(), 1);
        assert_eq!(resolve_limit(Some("-4"), &config).unwrap(), 1);
        assert_eq!(resolve_limit(Some("1000"), &config).unwrap(), 50);

        let err = resolve_limit(Some("five"), &config).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fresh_user_has_zero_stats() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "fresh@example.com").await;

        let stats = repo.stats(StatsScope::User(user.id), 5).await.unwrap();
        assert_eq!(stats, Stats::default());
    }

    #[tokio::test]
    async fn test_top_origins() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "origins@example.com").await;
        let scope = repo.scope(user.id);

        for (name, country) in [("A", "El Salvador"), ("B", "Ethiopia"), ("C", "Ethiopia")] {
            scope
                .create_coffee(&testing::new_coffee(name, country))
                .await
                .unwrap();
        }

        let stats = repo.stats(StatsScope::User(user.id), 5).await.unwrap();
        assert_eq!(stats.total_coffees, 3);
        assert_eq!(stats.total_origins, 2);
        assert_eq!(stats.total_roasters, 1);
        assert_eq!(
            stats.top_origins,
            vec![
                OriginCount { country: "Ethiopia".into(), count: 2 },
                OriginCount { country: "El Salvador".into(), count: 1 },
            ]
        );
        assert_eq!(
            stats.top_roasters,
            vec![RoasterCount { name: "Friedhats".into(), count: 3 }]
        );

        let truncated = repo.stats(StatsScope::User(user.id), 1).await.unwrap();
        assert_eq!(truncated.top_origins.len(), 1);
        assert_eq!(truncated.top_origins[0].country, "Ethiopia");
    }

    #[tokio::test]
    async fn test_ties_are_alphabetical() {
        let repo = testing::test_repository().await;
        let user = testing::create_user(&repo, "ties@example.com").await;
        let scope = repo.scope(user.id);

        for (name, country, roaster) in [("A", "Kenya", "Zeta"), ("B", "Brazil", "Alpha")] {
            let mut coffee = testing::new_coffee(name, country);
            coffee.roaster = roaster.into();
            scope.create_coffee(&coffee).await.unwrap();
        }

        let stats = repo.stats(StatsScope::User(user.id), 5).await.unwrap();
        let origins: Vec<&str> = stats.top_origins.iter().map(|o| o.country.as_str()).collect();
        let roasters: Vec<&str> = stats.top_roasters.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(origins, vec!["Brazil", "Kenya"]);
        assert_eq!(roasters, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_site_scope_spans_users() {
        let repo = testing::test_repository().await;
        let a = testing::create_user(&repo, "a@example.com").await;
        let b = testing::create_user(&repo, "b@example.com").await;

        repo.scope(a.id)
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();
        repo.scope(b.id)
            .create_coffee(&testing::new_coffee("Kochere", "Ethiopia"))
            .await
            .unwrap();

        let site = repo.stats(StatsScope::Site, 5).await.unwrap();
        assert_eq!(site.total_coffees, 2);
        assert_eq!(site.total_origins, 1);
        // each user has their own "Friedhats" row, grouped by name
        assert_eq!(site.total_roasters, 2);
        assert_eq!(site.top_roasters[0].count, 2);

        let mine = repo.stats(StatsScope::User(a.id), 5).await.unwrap();
        assert_eq!(mine.total_coffees, 1);
    }
}
