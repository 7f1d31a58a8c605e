//! HTML pages
//!
//! Server-rendered markup built with `format!`. Every user-supplied string
//! goes through [`escape`] before it reaches a page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use beans_common::{
    countries::{self, Country},
    db::{CoffeeDetails, ProcessingUsage, RoasterSummary},
    errors::AppError,
    stats::Stats,
};
use std::fmt::Write;

/// Shown above a form that failed validation
pub const FORM_ERROR_MESSAGE: &str = "An error occurred while processing the form";

/// Escape text for HTML element content and quoted attribute values
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Context shared by every page
#[derive(Debug, Default)]
pub struct Chrome<'a> {
    /// Email of the logged-in user
    pub user: Option<&'a str>,
    pub flash: Option<&'a str>,
    pub error: Option<&'a str>,
}

/// Wrap a page body in the site layout
pub fn layout(title: &str, chrome: &Chrome<'_>, body: &str) -> Html<String> {
    let nav = match chrome.user {
        Some(email) => format!(
            r#"<a href="/coffees/">Coffees</a>
      <a href="/coffees/roasters/">Roasters</a>
      <a href="/coffees/add/">Add coffee</a>
      <a href="/impex/upload/">Import</a>
      <span class="user">{}</span>
      <form method="post" action="/logout" class="inline"><button type="submit">Log out</button></form>"#,
            escape(email)
        ),
        None => r#"<a href="/login">Log in</a>
      <a href="/register">Register</a>"#
            .to_string(),
    };

    let mut messages = String::new();
    if let Some(flash) = chrome.flash {
        let _ = write!(messages, r#"<p class="message info">{}</p>"#, escape(flash));
    }
    if let Some(error) = chrome.error {
        let _ = write!(messages, r#"<p class="message error">{}</p>"#, escape(error));
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} | Beans</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 900px; margin: 0 auto; padding: 20px; color: #2b2118; }}
    nav {{ display: flex; gap: 16px; align-items: center; border-bottom: 2px solid #6f4e37; padding-bottom: 10px; }}
    nav .brand {{ font-weight: 700; margin-right: auto; }}
    .inline {{ display: inline; }}
    .message {{ padding: 8px 12px; border-radius: 4px; }}
    .info {{ background: #eef6ee; }}
    .error {{ background: #fbeaea; }}
    .field-error {{ color: #a12622; font-size: 0.9em; }}
    table {{ width: 100%; border-collapse: collapse; }}
    td, th {{ text-align: left; padding: 6px; border-bottom: 1px solid #ddd; }}
  </style>
</head>
<body>
  <nav>
      <a class="brand" href="/">Beans</a>
      {nav}
  </nav>
  {messages}
  <main>
{body}
  </main>
</body>
</html>"#,
        title = escape(title),
    ))
}

/// Error page rendered in place of a view
pub fn error_page(status: StatusCode, message: &str, chrome: &Chrome<'_>) -> Response {
    let body = format!(
        r#"<h1>{}</h1>
<p>{}</p>
<p><a href="/">Back home</a></p>"#,
        status.as_u16(),
        escape(message)
    );

    (status, layout(status.canonical_reason().unwrap_or("Error"), chrome, &body)).into_response()
}

/// Error type for HTML handlers: renders a page instead of JSON
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(e: AppError) -> Self {
        HtmlError(e)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Server error");
        }
        error_page(status, &self.0.public_message(), &Chrome::default())
    }
}

// ============================================================================
// Home & accounts
// ============================================================================

pub fn home(chrome: &Chrome<'_>, stats: Option<&Stats>) -> Html<String> {
    let body = match stats {
        Some(stats) => format!(
            r#"<h1>Your coffee journal</h1>
<ul class="totals">
  <li><strong>{}</strong> coffees</li>
  <li><strong>{}</strong> origins</li>
  <li><strong>{}</strong> roasters</li>
</ul>
{}
{}"#,
            stats.total_coffees,
            stats.total_origins,
            stats.total_roasters,
            top_list(
                "Most common origins",
                stats
                    .top_origins
                    .iter()
                    .map(|o| (format!("{} {}", countries::country_flag(&o.country), o.country), o.count))
            ),
            top_list(
                "Most common roasters",
                stats.top_roasters.iter().map(|r| (r.name.clone(), r.count))
            ),
        ),
        None => r#"<h1>Welcome to Beans</h1>
<p>Keep track of the coffees you drink: where they come from, who roasted them and how they taste.</p>
<p><a href="/register">Create an account</a> or <a href="/login">log in</a>.</p>"#
            .to_string(),
    };

    layout("Home", chrome, &body)
}

fn top_list(title: &str, rows: impl Iterator<Item = (String, i64)>) -> String {
    let items: String = rows
        .map(|(label, count)| format!("<li>{} ({})</li>", escape(label.trim()), count))
        .collect();

    if items.is_empty() {
        return String::new();
    }
    format!("<h2>{}</h2>\n<ol>{}</ol>", escape(title), items)
}

pub fn login(chrome: &Chrome<'_>, email: &str) -> Html<String> {
    let body = format!(
        r#"<h1>Log in</h1>
<form method="post" action="/login">
  <label>Email <input type="email" name="email" value="{}" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
        escape(email)
    );

    layout("Log in", chrome, &body)
}

/// Values echoed back into the registration form
#[derive(Debug, Default)]
pub struct RegisterValues<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

pub fn register(
    chrome: &Chrome<'_>,
    values: &RegisterValues<'_>,
    errors: &[(String, String)],
) -> Html<String> {
    let body = format!(
        r#"<h1>Register</h1>
<form method="post" action="/register">
  <label>Email <input type="email" name="email" value="{email}" required></label>
  {email_errors}
  <label>Name <input type="text" name="name" value="{name}"></label>
  <label>Password <input type="password" name="password" required></label>
  {password_errors}
  <label>Confirm password <input type="password" name="password_confirmation" required></label>
  {confirmation_errors}
  <button type="submit">Register</button>
</form>"#,
        email = escape(values.email),
        name = escape(values.name),
        email_errors = field_errors(errors, "email"),
        password_errors = field_errors(errors, "password"),
        confirmation_errors = field_errors(errors, "password_confirmation"),
    );

    layout("Register", chrome, &body)
}

fn field_errors(errors: &[(String, String)], field: &str) -> String {
    errors
        .iter()
        .filter(|(name, _)| name == field)
        .map(|(_, message)| format!(r#"<p class="field-error">{}</p>"#, escape(message)))
        .collect()
}

// ============================================================================
// Coffees
// ============================================================================

pub fn coffee_list(chrome: &Chrome<'_>, coffees: &[CoffeeDetails], query: Option<&str>) -> Html<String> {
    let rows: String = coffees
        .iter()
        .map(|details| {
            format!(
                r#"<tr>
  <td><a href="/coffees/{id}">{name}</a></td>
  <td>{flag} {country}</td>
  <td>{processing}</td>
  <td>{roaster}</td>
  <td>{date}</td>
  <td>{rating}</td>
</tr>"#,
                id = details.coffee.id,
                name = escape(&details.coffee.name),
                flag = details.flag(),
                country = escape(&details.coffee.country),
                processing = escape(details.processing_name().unwrap_or_default()),
                roaster = escape(details.roaster_name().unwrap_or_default()),
                date = details.coffee.roasting_date,
                rating = details.coffee.rating.map(|r| r.to_string()).unwrap_or_default(),
            )
        })
        .collect();

    let table = if coffees.is_empty() {
        "<p>No coffees found.</p>".to_string()
    } else {
        format!(
            r#"<table>
<thead><tr><th>Name</th><th>Country</th><th>Processing</th><th>Roaster</th><th>Roasted</th><th>Rating</th></tr></thead>
<tbody>
{}
</tbody>
</table>"#,
            rows
        )
    };

    let body = format!(
        r#"<h1>Coffees</h1>
<form method="get" action="/coffees/">
  <input type="search" name="q" value="{}" placeholder="Search by name, country, processing or roaster">
  <button type="submit">Search</button>
</form>
{}"#,
        escape(query.unwrap_or_default()),
        table
    );

    layout("Coffees", chrome, &body)
}

pub fn coffee_detail(chrome: &Chrome<'_>, details: &CoffeeDetails) -> Html<String> {
    let coffee = &details.coffee;
    let rating = coffee
        .rating
        .map(|r| "\u{2605}".repeat(usize::try_from(r).unwrap_or(0)))
        .unwrap_or_else(|| "Not rated".to_string());

    let body = format!(
        r#"<h1>{title}</h1>
<dl>
  <dt>Country</dt><dd>{flag} {country}</dd>
  <dt>Processing</dt><dd>{processing}</dd>
  <dt>Roaster</dt><dd>{roaster}</dd>
  <dt>Roasting date</dt><dd>{date}</dd>
  <dt>Rating</dt><dd>{rating}</dd>
  <dt>Variety</dt><dd>{variety}</dd>
  <dt>Tasting notes</dt><dd>{notes}</dd>
</dl>
<form method="post" action="/coffees/{id}/delete">
  <button type="submit">Delete</button>
</form>"#,
        title = escape(&details.title()),
        flag = details.flag(),
        country = escape(&coffee.country),
        processing = escape(details.processing_name().unwrap_or("-")),
        roaster = escape(details.roaster_name().unwrap_or("-")),
        date = coffee.roasting_date,
        rating = rating,
        variety = escape(coffee.variety.as_deref().unwrap_or("-")),
        notes = escape(&details.tasting_note_names().join(", ")),
        id = coffee.id,
    );

    layout(&coffee.name, chrome, &body)
}

/// Values echoed back into the add-coffee form
#[derive(Debug, Default)]
pub struct CoffeeFormValues<'a> {
    pub name: &'a str,
    pub country: &'a str,
    pub processing: &'a str,
    pub roaster: &'a str,
    pub roasting_date: &'a str,
    pub rating: &'a str,
    pub variety: &'a str,
    pub tasting_notes: &'a str,
}

pub fn coffee_form(
    chrome: &Chrome<'_>,
    values: &CoffeeFormValues<'_>,
    errors: &[(String, String)],
    processing: &[ProcessingUsage],
    roasters: &[RoasterSummary],
) -> Html<String> {
    let countries = country_options(&countries::origin_countries(), values.country);
    let processing_options: String = processing
        .iter()
        .map(|p| format!(r#"<option value="{}">"#, escape(&p.processing.name)))
        .collect();
    let roaster_options: String = roasters
        .iter()
        .map(|r| format!(r#"<option value="{}">"#, escape(&r.roaster.name)))
        .collect();

    let body = format!(
        r#"<h1>Add coffee</h1>
<form method="post" action="/coffees/add/">
  <label>Name <input type="text" name="name" value="{name}" maxlength="200" required></label>
  {name_errors}
  <label>Country <select name="country" required><option value="">---</option>{countries}</select></label>
  {country_errors}
  <label>Processing <input type="text" name="processing" list="processing" value="{processing}" required></label>
  <datalist id="processing">{processing_options}</datalist>
  {processing_errors}
  <label>Roaster <input type="text" name="roaster" list="roasters" value="{roaster}" maxlength="200" required></label>
  <datalist id="roasters">{roaster_options}</datalist>
  {roaster_errors}
  <label>Roasting date <input type="date" name="roasting_date" value="{roasting_date}" required></label>
  {date_errors}
  <label>Rating <input type="number" name="rating" min="1" max="5" value="{rating}"></label>
  {rating_errors}
  <label>Variety <input type="text" name="variety" value="{variety}"></label>
  <label>Tasting notes <input type="text" name="tasting_notes" value="{tasting_notes}" placeholder="Peach, jasmine"></label>
  <button type="submit">Add</button>
</form>"#,
        name = escape(values.name),
        processing = escape(values.processing),
        roaster = escape(values.roaster),
        roasting_date = escape(values.roasting_date),
        rating = escape(values.rating),
        variety = escape(values.variety),
        tasting_notes = escape(values.tasting_notes),
        name_errors = field_errors(errors, "name"),
        country_errors = field_errors(errors, "country"),
        processing_errors = field_errors(errors, "processing"),
        roaster_errors = field_errors(errors, "roaster"),
        date_errors = field_errors(errors, "roasting_date"),
        rating_errors = field_errors(errors, "rating"),
    );

    layout("Add coffee", chrome, &body)
}

fn country_options(countries: &[Country], selected: &str) -> String {
    countries
        .iter()
        .map(|c| {
            let is_selected = c.code.eq_ignore_ascii_case(selected) || c.name == selected;
            format!(
                r#"<option value="{}"{}>{} {}</option>"#,
                c.code,
                if is_selected { " selected" } else { "" },
                c.flag(),
                escape(c.name)
            )
        })
        .collect()
}

// ============================================================================
// Roasters
// ============================================================================

pub fn roaster_list(chrome: &Chrome<'_>, roasters: &[RoasterSummary]) -> Html<String> {
    let rows: String = roasters
        .iter()
        .map(|summary| {
            let roaster = &summary.roaster;
            let website = roaster
                .website
                .as_deref()
                .map(|url| format!(r#"<a href="{0}" rel="noopener">{0}</a>"#, escape(url)))
                .unwrap_or_default();

            format!(
                "<tr><td>{}</td><td>{} {}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&roaster.name),
                countries::country_flag(&roaster.country),
                escape(&roaster.country),
                website,
                summary.coffees
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Roasters</h1>
<p><a href="/coffees/roasters/add">Add roaster</a></p>
<table>
<thead><tr><th>Name</th><th>Country</th><th>Website</th><th>Coffees</th></tr></thead>
<tbody>
{}</tbody>
</table>"#,
        rows
    );

    layout("Roasters", chrome, &body)
}

/// Values echoed back into the add-roaster form
#[derive(Debug, Default)]
pub struct RoasterFormValues<'a> {
    pub name: &'a str,
    pub country: &'a str,
    pub website: &'a str,
}

pub fn roaster_form(
    chrome: &Chrome<'_>,
    values: &RoasterFormValues<'_>,
    errors: &[(String, String)],
) -> Html<String> {
    let body = format!(
        r#"<h1>Add roaster</h1>
<form method="post" action="/coffees/roasters/add">
  <label>Name <input type="text" name="name" value="{name}" maxlength="200" required></label>
  {name_errors}
  <label>Country <select name="country" required><option value="">---</option>{countries}</select></label>
  {country_errors}
  <label>Website <input type="url" name="website" value="{website}"></label>
  {website_errors}
  <button type="submit">Add</button>
</form>"#,
        name = escape(values.name),
        countries = country_options(&countries::origin_countries(), values.country),
        website = escape(values.website),
        name_errors = field_errors(errors, "name"),
        country_errors = field_errors(errors, "country"),
        website_errors = field_errors(errors, "website"),
    );

    layout("Add roaster", chrome, &body)
}

// ============================================================================
// Import
// ============================================================================

pub fn upload(chrome: &Chrome<'_>) -> Html<String> {
    let body = r#"<h1>Import coffees</h1>
<p>Upload a <code>;</code>-separated file. Start from the <a href="/impex/download-template">template</a>.</p>
<form method="post" action="/impex/upload/" enctype="multipart/form-data">
  <input type="file" name="file" accept=".csv,text/csv" required>
  <button type="submit">Upload</button>
</form>"#;

    layout("Import coffees", chrome, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape("Kochere"), "Kochere");
    }

    #[test]
    fn test_layout_escapes_chrome() {
        let chrome = Chrome {
            user: Some("<b>@example.com"),
            flash: Some("Coffee <deleted>"),
            error: None,
        };
        let Html(page) = layout("Home", &chrome, "<p>body</p>");

        assert!(page.contains("&lt;b&gt;@example.com"));
        assert!(page.contains("Coffee &lt;deleted&gt;"));
        assert!(page.contains("<p>body</p>"));
    }

    #[test]
    fn test_anonymous_home_is_a_welcome_page() {
        let Html(page) = home(&Chrome::default(), None);
        assert!(page.contains("Welcome to Beans"));
        assert!(page.contains(r#"href="/login""#));
    }

    #[test]
    fn test_field_errors_only_for_field() {
        let errors = vec![
            ("email".to_string(), "Enter a valid email".to_string()),
            ("password".to_string(), "Too short".to_string()),
        ];
        let html = field_errors(&errors, "email");

        assert!(html.contains("Enter a valid email"));
        assert!(!html.contains("Too short"));
    }
}
