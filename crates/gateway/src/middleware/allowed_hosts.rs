//! Host header validation
//!
//! An empty list or `*` accepts every host. An entry starting with `.`
//! matches the domain itself and all of its subdomains.

use axum::{
    extract::{Request, State},
    http::{header::HOST, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn check_host(
    State(allowed): State<Arc<Vec<String>>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default();

    if is_allowed(host, &allowed) {
        next.run(request).await
    } else {
        tracing::warn!(host = %host, "Rejected request for disallowed host");
        (StatusCode::BAD_REQUEST, "Bad Request").into_response()
    }
}

/// Whether `host` (optionally with a port) matches the allow list
pub fn is_allowed(host: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let host = strip_port(host).to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }

    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&pattern),
            None => host == pattern,
        }
    })
}

fn strip_port(host: &str) -> &str {
    // [::1]:8000
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default();
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
