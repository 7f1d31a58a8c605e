//! Home page, login, registration and logout

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use beans_common::{errors::AppError, metrics, stats::StatsScope};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::form_errors;
use crate::pages::{self, Chrome, HtmlError, RegisterValues};
use crate::session::{end_session, session_user, start_session, take_flash};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    pub name: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The two password fields didn't match"))]
    pub password_confirmation: String,
}

/// Dashboard for a logged-in user, welcome page otherwise
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Result<Response, HtmlError> {
    let (jar, flash) = take_flash(jar);
    let user = session_user(&state, &jar);

    let stats = match &user {
        Some(user) => Some(
            state
                .repo
                .stats(StatsScope::User(user.user_id), state.config.stats.default_limit)
                .await?,
        ),
        None => None,
    };

    let chrome = Chrome {
        user: user.as_ref().map(|u| u.email.as_str()),
        flash: flash.as_deref(),
        error: None,
    };

    Ok((jar, pages::home(&chrome, stats.as_ref())).into_response())
}

pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if session_user(&state, &jar).is_some() {
        return Redirect::to("/").into_response();
    }

    let (jar, flash) = take_flash(jar);
    let chrome = Chrome {
        flash: flash.as_deref(),
        ..Chrome::default()
    };

    (jar, pages::login(&chrome, "")).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, HtmlError> {
    match state.repo.authenticate(&form.email, &form.password).await {
        Ok(user) => {
            metrics::record_login("web", true);
            let token = state.jwt.generate_token(user.id, &user.email)?;
            info!(user_id = %user.id, "User logged in");

            let jar = start_session(&state, jar, token);
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AppError::InvalidCredentials) => {
            metrics::record_login("web", false);
            let message = AppError::InvalidCredentials.to_string();
            let chrome = Chrome {
                error: Some(message.as_str()),
                ..Chrome::default()
            };

            Ok(pages::login(&chrome, &form.email).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn register_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if session_user(&state, &jar).is_some() {
        return Redirect::to("/").into_response();
    }

    pages::register(&Chrome::default(), &RegisterValues::default(), &[]).into_response()
}

/// Create the account and log straight in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, HtmlError> {
    let values = RegisterValues {
        email: &form.email,
        name: &form.name,
    };

    if let Err(errors) = form.validate() {
        let chrome = Chrome {
            error: Some(pages::FORM_ERROR_MESSAGE),
            ..Chrome::default()
        };
        return Ok(pages::register(&chrome, &values, &form_errors(&errors)).into_response());
    }

    let name = Some(form.name.trim().to_string());
    let user = match state.repo.create_user(&form.email, &form.password, name).await {
        Ok(user) => user,
        Err(AppError::Duplicate { message }) => {
            let chrome = Chrome {
                error: Some(pages::FORM_ERROR_MESSAGE),
                ..Chrome::default()
            };
            let errors = [("email".to_string(), message)];
            return Ok(pages::register(&chrome, &values, &errors).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.jwt.generate_token(user.id, &user.email)?;
    let jar = start_session(&state, jar, token);

    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (end_session(&state, jar), Redirect::to("/"))
}
