//! REST API
//!
//! Token issuance, public statistics, and read-only views of the caller's
//! catalogue. Everything except `/api/auth/` and `/api/stats/` requires a
//! Bearer token.

use axum::{
    extract::{Query, State},
    Json,
};
use beans_common::{
    auth::AuthUser,
    db::CoffeeDetails,
    errors::{AppError, Result},
    metrics,
    stats::{resolve_limit, Stats, StatsScope},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "email is a required field"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is a required field"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Raw query: `limit` is validated by hand so a bad value is a 400 with
/// our error body rather than an extractor rejection
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CoffeeResponse {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub processing: Option<String>,
    pub roaster: Option<String>,
    pub roasting_date: NaiveDate,
    pub rating: Option<i32>,
    pub variety: Option<String>,
    pub tasting_notes: Vec<String>,
}

impl From<CoffeeDetails> for CoffeeResponse {
    fn from(details: CoffeeDetails) -> Self {
        let tasting_notes = details
            .tasting_note_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            processing: details.processing.map(|p| p.name),
            roaster: details.roaster.map(|r| r.name),
            id: details.coffee.id,
            name: details.coffee.name,
            country: details.coffee.country,
            roasting_date: details.coffee.roasting_date,
            rating: details.coffee.rating,
            variety: details.coffee.variety,
            tasting_notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoasterResponse {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub website: Option<String>,
    pub coffees: i64,
}

#[derive(Debug, Serialize)]
pub struct ProcessingResponse {
    pub id: Uuid,
    pub name: String,
    pub used: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Exchange credentials for a Bearer token
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let user = match state.repo.authenticate(&request.email, &request.password).await {
        Ok(user) => user,
        Err(e) => {
            metrics::record_login("api", false);
            return Err(e);
        }
    };
    metrics::record_login("api", true);

    let token = state.jwt.generate_token(user.id, &user.email)?;
    info!(user_id = %user.id, "API token issued");

    Ok(Json(TokenResponse { token }))
}

/// Site-wide statistics, no authentication
pub async fn public_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Stats>> {
    let limit = resolve_limit(query.limit.as_deref(), &state.config.stats)?;
    Ok(Json(state.repo.stats(StatsScope::Site, limit).await?))
}

pub async fn user_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Stats>> {
    let limit = resolve_limit(query.limit.as_deref(), &state.config.stats)?;
    Ok(Json(
        state.repo.stats(StatsScope::User(user.user_id), limit).await?,
    ))
}

pub async fn user_coffees(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CoffeeResponse>>> {
    let coffees = state.repo.scope(user.user_id).list_coffees(None).await?;
    Ok(Json(coffees.into_iter().map(CoffeeResponse::from).collect()))
}

pub async fn user_roasters(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<RoasterResponse>>> {
    let roasters = state.repo.scope(user.user_id).list_roasters().await?;

    Ok(Json(
        roasters
            .into_iter()
            .map(|summary| RoasterResponse {
                id: summary.roaster.id,
                name: summary.roaster.name,
                country: summary.roaster.country,
                website: summary.roaster.website,
                coffees: summary.coffees,
            })
            .collect(),
    ))
}

pub async fn user_processing(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ProcessingResponse>>> {
    let processing = state.repo.scope(user.user_id).list_processing().await?;

    Ok(Json(
        processing
            .into_iter()
            .map(|usage| ProcessingResponse {
                id: usage.processing.id,
                name: usage.processing.name,
                used: usage.used,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use beans_common::testing::{new_coffee, TEST_PASSWORD};

    fn api_get(uri: &str, bearer: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::AUTHORIZATION, bearer)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_obtain_token() {
        let app = test_app().await;
        app.user("api@example.com").await;

        let request = |password: &str| {
            Request::post("/api/auth/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"email": "API@example.com", "password": password}).to_string(),
                ))
                .unwrap()
        };

        let response = app.send(request(TEST_PASSWORD)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"].as_str().unwrap().to_string();
        assert!(app.state.jwt.authenticate(&token).is_ok());

        let response = app.send(request("wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Username or password incorrect"
        );
    }

    #[tokio::test]
    async fn test_user_endpoints_require_token() {
        let app = test_app().await;

        for uri in [
            "/api/user/coffees/",
            "/api/user/roasters/",
            "/api/user/processing/",
            "/api/user/stats/",
        ] {
            let response = app.get(uri, None).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }

        let response = app.send(api_get("/api/user/coffees/", "Bearer garbage")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_coffees_shape() {
        let app = test_app().await;
        let user = app.user("shape@example.com").await;
        let mut coffee = new_coffee("Kochere", "Ethiopia");
        coffee.rating = Some(5);
        coffee.tasting_notes = vec!["Peach".into(), "Jasmine".into()];
        tokio_test::assert_ok!(app.state.repo.create_coffee(user.id, &coffee).await);

        let response = app.send(api_get("/api/user/coffees/", &app.bearer(&user))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let first = &body[0];
        assert_eq!(first["name"], "Kochere");
        assert_eq!(first["country"], "Ethiopia");
        assert_eq!(first["processing"], "Washed");
        assert_eq!(first["roaster"], "Friedhats");
        assert_eq!(first["roasting_date"], "2022-03-03");
        assert_eq!(first["rating"], 5);
        assert!(first["variety"].is_null());
        assert_eq!(first["tasting_notes"], serde_json::json!(["Jasmine", "Peach"]));
    }

    #[tokio::test]
    async fn test_user_roasters_and_processing() {
        let app = test_app().await;
        let user = app.user("lists@example.com").await;
        app.state.repo.create_coffee(user.id, &new_coffee("Kochere", "Ethiopia")).await.unwrap();
        app.state.repo.create_coffee(user.id, &new_coffee("Gatomboya", "Kenya")).await.unwrap();
        let bearer = app.bearer(&user);

        let roasters = body_json(app.send(api_get("/api/user/roasters/", &bearer)).await).await;
        assert_eq!(roasters[0]["name"], "Friedhats");
        assert_eq!(roasters[0]["coffees"], 2);
        assert!(roasters[0]["website"].is_null());

        let processing = body_json(app.send(api_get("/api/user/processing/", &bearer)).await).await;
        assert_eq!(processing[0]["name"], "Washed");
        assert_eq!(processing[0]["used"], 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let app = test_app().await;
        let user = app.user("stats@example.com").await;
        let other = app.user("other-stats@example.com").await;
        for (name, country) in [("A", "El Salvador"), ("B", "Ethiopia"), ("C", "Ethiopia")] {
            app.state.repo.create_coffee(user.id, &new_coffee(name, country)).await.unwrap();
        }
        app.state.repo.create_coffee(other.id, &new_coffee("D", "Kenya")).await.unwrap();

        let scoped = body_json(app.send(api_get("/api/user/stats/", &app.bearer(&user))).await).await;
        assert_eq!(scoped["total_coffees"], 3);
        assert_eq!(scoped["total_origins"], 2);
        assert_eq!(scoped["total_roasters"], 1);
        assert_eq!(
            scoped["top_origins"],
            serde_json::json!([
                {"country": "Ethiopia", "count": 2},
                {"country": "El Salvador", "count": 1}
            ])
        );
        assert_eq!(scoped["top_roasters"], serde_json::json!([{"name": "Friedhats", "count": 3}]));

        let site = body_json(app.get("/api/stats/?limit=1", None).await).await;
        assert_eq!(site["total_coffees"], 4);
        assert_eq!(site["top_origins"].as_array().unwrap().len(), 1);

        let response = app.get("/api/stats/?limit=lots", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
