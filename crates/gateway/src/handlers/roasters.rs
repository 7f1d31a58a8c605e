//! Roaster list and add views

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use beans_common::{countries, db::NewRoaster, errors::AppError};
use serde::Deserialize;
use validator::{Validate, ValidateUrl};

use super::{form_errors, non_blank, validate_name};
use crate::pages::{self, Chrome, HtmlError, RoasterFormValues};
use crate::session::{flash, take_flash, CurrentUser};
use crate::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RoasterForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    pub country: String,

    pub website: String,
}

impl RoasterForm {
    fn values(&self) -> RoasterFormValues<'_> {
        RoasterFormValues {
            name: &self.name,
            country: &self.country,
            website: &self.website,
        }
    }

    /// Field-level checks beyond the derive: country lookup and an optional URL
    fn extra_errors(&self) -> Vec<(String, String)> {
        let mut errors = Vec::new();
        if countries::resolve_code(&self.country).is_none() {
            errors.push(("country".to_string(), "Select a valid country".to_string()));
        }
        if let Some(website) = non_blank(&self.website) {
            if !website.validate_url() {
                errors.push(("website".to_string(), "Enter a valid URL".to_string()));
            }
        }
        errors
    }
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, HtmlError> {
    let roasters = state.repo.scope(user.user_id).list_roasters().await?;

    let (jar, flash) = take_flash(jar);
    let chrome = Chrome {
        user: Some(&user.email),
        flash: flash.as_deref(),
        error: None,
    };

    Ok((jar, pages::roaster_list(&chrome, &roasters)).into_response())
}

pub async fn add_page(CurrentUser(user): CurrentUser) -> Response {
    let chrome = Chrome {
        user: Some(&user.email),
        ..Chrome::default()
    };

    pages::roaster_form(&chrome, &RoasterFormValues::default(), &[]).into_response()
}

pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<RoasterForm>,
) -> Result<Response, HtmlError> {
    let chrome = Chrome {
        user: Some(&user.email),
        error: Some(pages::FORM_ERROR_MESSAGE),
        flash: None,
    };

    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => form_errors(&e),
    };
    errors.extend(form.extra_errors());

    // extra_errors guarantees a known country
    let country = match countries::resolve_code(&form.country) {
        Some(country) if errors.is_empty() => country,
        _ => return Ok(pages::roaster_form(&chrome, &form.values(), &errors).into_response()),
    };

    let new = NewRoaster {
        name: form.name.trim().to_string(),
        country: country.name.to_string(),
        website: non_blank(&form.website).map(str::to_string),
    };

    match state.repo.scope(user.user_id).create_roaster(&new).await {
        Ok(roaster) => {
            let jar = flash(jar, &format!("Added {}", roaster.name));
            Ok((jar, Redirect::to("/coffees/roasters/")).into_response())
        }
        Err(AppError::Duplicate { message }) => {
            let chrome = Chrome {
                error: Some(message.as_str()),
                ..chrome
            };
            Ok(pages::roaster_form(&chrome, &form.values(), &[]).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use beans_common::db::ROASTER_EXISTS_MESSAGE;
    use beans_common::testing::new_coffee;

    #[tokio::test]
    async fn test_list_orders_by_coffee_count() {
        let app = test_app().await;
        let user = app.user("roasters@example.com").await;
        let mut single = new_coffee("Kochere", "Ethiopia");
        single.roaster = "April".to_string();
        app.state.repo.create_coffee(user.id, &single).await.unwrap();
        app.state.repo.create_coffee(user.id, &new_coffee("Gatomboya", "Kenya")).await.unwrap();
        app.state.repo.create_coffee(user.id, &new_coffee("Finca Deborah", "Panama")).await.unwrap();

        let body = body_text(app.get("/coffees/roasters/", Some(&app.session_cookie(&user))).await).await;

        let friedhats = body.find("Friedhats").unwrap();
        let april = body.find("April").unwrap();
        assert!(friedhats < april);
        assert!(body.contains("<td>2</td>"));
    }

    #[tokio::test]
    async fn test_add_roaster() {
        let app = test_app().await;
        let user = app.user("roaster-add@example.com").await;
        let cookie = app.session_cookie(&user);
        let body = "name=Friedhats&country=NL&website=https%3A%2F%2Ffriedhats.com";

        let response = app.post_form("/coffees/roasters/add", body, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/coffees/roasters/");

        let roasters = app.state.repo.scope(user.id).list_roasters().await.unwrap();
        assert_eq!(roasters.len(), 1);
        assert_eq!(roasters[0].roaster.country, "Netherlands");
        assert_eq!(roasters[0].roaster.website.as_deref(), Some("https://friedhats.com"));

        let response = app.post_form("/coffees/roasters/add", body, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(ROASTER_EXISTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_add_roaster_requires_country_and_valid_url() {
        let app = test_app().await;
        let user = app.user("roaster-bad@example.com").await;

        let response = app
            .post_form(
                "/coffees/roasters/add",
                "name=Friedhats&country=&website=not+a+url",
                Some(&app.session_cookie(&user)),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Select a valid country"));
        assert!(body.contains("Enter a valid URL"));
        assert!(app.state.repo.scope(user.id).list_roasters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_roaster_rejects_blank_name() {
        let app = test_app().await;
        let user = app.user("roaster-blank@example.com").await;

        let response = app
            .post_form(
                "/coffees/roasters/add",
                "name=+++&country=NL",
                Some(&app.session_cookie(&user)),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response)
            .await
            .contains("This field is required (at most 200 characters)"));
        assert!(app.state.repo.scope(user.id).list_roasters().await.unwrap().is_empty());
    }
}
