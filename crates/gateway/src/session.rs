//! Cookie sessions and flash messages for the HTML views
//!
//! The session cookie holds the same signed token the REST API hands out,
//! so there is no server-side session store.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use beans_common::auth::AuthUser;

use crate::AppState;

/// Name of the one-shot message cookie
pub const FLASH_COOKIE: &str = "beans_flash";

/// Logged-in browser user. Rejects with a redirect to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        session_user(&state, &jar)
            .map(CurrentUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// User of a valid session cookie, if any
pub fn session_user(state: &AppState, jar: &CookieJar) -> Option<AuthUser> {
    let cookie = jar.get(&state.config.auth.session_cookie)?;
    state.jwt.authenticate(cookie.value()).ok()
}

/// Store a freshly issued token in the session cookie
pub fn start_session(state: &AppState, jar: CookieJar, token: String) -> CookieJar {
    let cookie = Cookie::build((state.config.auth.session_cookie.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.secure_cookies);

    jar.add(cookie)
}

pub fn end_session(state: &AppState, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((state.config.auth.session_cookie.clone(), "")).path("/"))
}

/// Queue a message for the next rendered page
pub fn flash(jar: CookieJar, message: &str) -> CookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, sanitize(message)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    jar.add(cookie)
}

/// Read and clear the pending message
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) {
        Some(message) if !message.is_empty() => {
            let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
            (jar, Some(message))
        }
        _ => (jar, None),
    }
}

/// Cookie values cannot carry separators or quotes
fn sanitize(message: &str) -> String {
    message
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, ';' | '"' | '\\'))
        .collect()
}
