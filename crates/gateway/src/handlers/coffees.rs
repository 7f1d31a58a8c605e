//! Coffee list, detail, add and delete views

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use beans_common::{
    countries,
    db::{NewCoffee, COFFEE_EXISTS_MESSAGE},
    errors::AppError,
};
use beans_impex::{get_tasting_notes, parse_roasting_date};
use serde::Deserialize;
use std::borrow::Cow;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{form_errors, non_blank, validate_name};
use crate::pages::{self, Chrome, CoffeeFormValues, HtmlError};
use crate::session::{flash, take_flash, CurrentUser};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CoffeeForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(custom(function = "validate_country"))]
    pub country: String,

    #[validate(custom(function = "validate_name"))]
    pub processing: String,

    #[validate(custom(function = "validate_name"))]
    pub roaster: String,

    #[validate(custom(function = "validate_roasting_date"))]
    pub roasting_date: String,

    #[validate(custom(function = "validate_rating"))]
    pub rating: String,

    pub variety: String,
    pub tasting_notes: String,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_country(value: &str) -> Result<(), ValidationError> {
    resolve_country(value)
        .map(|_| ())
        .ok_or_else(|| invalid("country", "Select a valid country"))
}

fn validate_roasting_date(value: &str) -> Result<(), ValidationError> {
    parse_roasting_date(value.trim())
        .map(|_| ())
        .map_err(|_| invalid("roasting_date", "Enter a valid date (YYYY-MM-DD)"))
}

fn validate_rating(value: &str) -> Result<(), ValidationError> {
    parse_rating(value)
        .map(|_| ())
        .ok_or_else(|| invalid("rating", "Rating must be a whole number between 1 and 5"))
}

/// Country code or exact name, stored by name
fn resolve_country(value: &str) -> Option<countries::Country> {
    countries::resolve_code(value).or_else(|| countries::resolve_name(value.trim()))
}

/// `None` for an invalid rating, `Some(None)` for a blank one
fn parse_rating(value: &str) -> Option<Option<i32>> {
    match non_blank(value) {
        None => Some(None),
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|r| (1..=5).contains(r))
            .map(Some),
    }
}

impl CoffeeForm {
    fn values(&self) -> CoffeeFormValues<'_> {
        CoffeeFormValues {
            name: &self.name,
            country: &self.country,
            processing: &self.processing,
            roaster: &self.roaster,
            roasting_date: &self.roasting_date,
            rating: &self.rating,
            variety: &self.variety,
            tasting_notes: &self.tasting_notes,
        }
    }

    /// Convert a validated form into the storage input
    fn to_new_coffee(&self) -> Result<NewCoffee, AppError> {
        let country = resolve_country(&self.country)
            .ok_or_else(|| AppError::invalid_field("country", "Select a valid country"))?;
        let roasting_date = parse_roasting_date(self.roasting_date.trim())
            .map_err(|e| AppError::invalid_field("roasting_date", e.to_string()))?;
        let rating = parse_rating(&self.rating)
            .ok_or_else(|| AppError::invalid_field("rating", "Rating must be between 1 and 5"))?;

        Ok(NewCoffee {
            name: self.name.trim().to_string(),
            country: country.name.to_string(),
            processing: self.processing.trim().to_string(),
            roaster: self.roaster.trim().to_string(),
            roasting_date,
            rating,
            variety: non_blank(&self.variety).map(str::to_string),
            tasting_notes: get_tasting_notes(Some(&self.tasting_notes)),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
    jar: CookieJar,
) -> Result<Response, HtmlError> {
    let search = query.q.as_deref().and_then(non_blank);
    let coffees = state.repo.scope(user.user_id).list_coffees(search).await?;

    let (jar, flash) = take_flash(jar);
    let chrome = Chrome {
        user: Some(&user.email),
        flash: flash.as_deref(),
        error: None,
    };

    Ok((jar, pages::coffee_list(&chrome, &coffees, search)).into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, HtmlError> {
    // A malformed id is as unknown as a missing one
    let id = Uuid::parse_str(&id).map_err(|_| AppError::CoffeeNotFound)?;
    let details = state.repo.scope(user.user_id).find_coffee(id).await?;

    let chrome = Chrome {
        user: Some(&user.email),
        ..Chrome::default()
    };

    Ok(pages::coffee_detail(&chrome, &details).into_response())
}

pub async fn add_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, HtmlError> {
    let chrome = Chrome {
        user: Some(&user.email),
        ..Chrome::default()
    };

    render_form(&state, user.user_id, &chrome, &CoffeeForm::default(), &[]).await
}

pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<CoffeeForm>,
) -> Result<Response, HtmlError> {
    let chrome = Chrome {
        user: Some(&user.email),
        error: Some(pages::FORM_ERROR_MESSAGE),
        flash: None,
    };

    if let Err(errors) = form.validate() {
        return render_form(&state, user.user_id, &chrome, &form, &form_errors(&errors)).await;
    }

    let new = match form.to_new_coffee() {
        Ok(new) => new,
        Err(AppError::Validation { message, field }) => {
            let errors = [(field.unwrap_or_default(), message)];
            return render_form(&state, user.user_id, &chrome, &form, &errors).await;
        }
        Err(e) => return Err(e.into()),
    };

    match state.repo.create_coffee(user.user_id, &new).await {
        Ok(coffee) => {
            info!(user_id = %user.user_id, coffee_id = %coffee.id, "Coffee added from form");
            let jar = flash(jar, &format!("Added {}", coffee.name));
            Ok((jar, Redirect::to("/coffees/")).into_response())
        }
        Err(AppError::Duplicate { .. }) => {
            let chrome = Chrome {
                error: Some(COFFEE_EXISTS_MESSAGE),
                ..chrome
            };
            render_form(&state, user.user_id, &chrome, &form, &[]).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn render_form(
    state: &AppState,
    user_id: Uuid,
    chrome: &Chrome<'_>,
    form: &CoffeeForm,
    errors: &[(String, String)],
) -> Result<Response, HtmlError> {
    let scope = state.repo.scope(user_id);
    let processing = scope.list_processing().await?;
    let roasters = scope.list_roasters().await?;

    Ok(pages::coffee_form(chrome, &form.values(), errors, &processing, &roasters).into_response())
}

/// Best effort: the same message whether or not a row was removed
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Result<Response, HtmlError> {
    if let Ok(id) = Uuid::parse_str(&id) {
        state.repo.scope(user.user_id).delete_coffee(id).await?;
    }

    let jar = flash(jar, "Coffee deleted");
    Ok((jar, Redirect::to("/coffees/")).into_response())
}
