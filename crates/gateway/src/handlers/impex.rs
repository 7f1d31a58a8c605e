//! CSV upload and template download

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use beans_common::errors::AppError;
use beans_impex::{csv_template, ImportError, TEMPLATE_FILENAME};

use crate::pages::{self, Chrome, HtmlError};
use crate::session::{flash, CurrentUser};
use crate::AppState;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

pub async fn upload_page(CurrentUser(user): CurrentUser) -> Response {
    let chrome = Chrome {
        user: Some(&user.email),
        ..Chrome::default()
    };

    pages::upload(&chrome).into_response()
}

/// Import the uploaded file, then show the summary on the coffee list
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Response, HtmlError> {
    let mut data = None;
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() == Some(FILE_FIELD) {
            data = Some(field.bytes().await.map_err(invalid_upload)?);
            break;
        }
    }

    let rerender = |message: &str| {
        let chrome = Chrome {
            user: Some(&user.email),
            error: Some(message),
            flash: None,
        };
        pages::upload(&chrome).into_response()
    };

    let Some(data) = data.filter(|d| !d.is_empty()) else {
        return Ok(rerender("No file was submitted"));
    };

    match state.importer.import(user.user_id, &data).await {
        Ok(outcome) => {
            let jar = flash(jar, &outcome.summary.to_string());
            Ok((jar, Redirect::to("/coffees/")).into_response())
        }
        Err(ImportError::Storage(e)) if e.is_server_error() => Err(e.into()),
        Err(e) => Ok(rerender(&AppError::from(e).public_message())),
    }
}

fn invalid_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidFormat {
        message: e.body_text(),
    }
}

/// Empty template with the header row only
pub async fn download_template() -> Result<Response, HtmlError> {
    let body = csv_template().map_err(AppError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", TEMPLATE_FILENAME),
            ),
        ],
        body,
    )
        .into_response())
}
