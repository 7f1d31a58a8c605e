//! Beans web gateway
//!
//! The single entry point for browsers and API clients.
//! Handles:
//! - HTML views behind a session cookie
//! - Bearer-token REST API
//! - Login rate limiting and host checks
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod pages;
mod session;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use beans_common::{
    auth::JwtManager,
    config::AppConfig,
    db::{DbPool, Repository},
    metrics,
};
use beans_impex::CsvImporter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handlers::{accounts, api, coffees, health, impex, roasters};
use crate::middleware::{allowed_hosts, rate_limit, request_metrics};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub repo: Repository,
    pub jwt: Arc<JwtManager>,
    pub importer: Arc<CsvImporter>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let jwt = JwtManager::new(config.secret_key(), config.auth.token_expiration_secs);
        let repo = Repository::new(db.clone());

        Self {
            config: Arc::new(config),
            importer: Arc::new(CsvImporter::new(repo.clone())),
            jwt: Arc::new(jwt),
            repo,
            db,
        }
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting Beans gateway v{}",
        beans_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!(%addr, "Prometheus exporter listening");
    }
    metrics::register_metrics();

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    if config.database.auto_migrate {
        db.migrate().await?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(config, db);

    // Build the router
    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// JSON logs in production, human readable output in debug mode
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging && !config.server.debug {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration, the API is read-only for browsers on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Credential endpoints share one process-wide limiter
    let mut login_routes = Router::new()
        .route("/login", get(accounts::login_page).post(accounts::login))
        .route("/api/auth/", post(api::obtain_token));

    if config.rate_limit.enabled {
        let limiter =
            rate_limit::create_rate_limiter(config.rate_limit.requests_per_second, config.rate_limit.burst);
        login_routes = login_routes.route_layer(from_fn_with_state(limiter, rate_limit::rate_limit));
    }

    let web_routes = Router::new()
        .route("/", get(accounts::home))
        .route("/register", get(accounts::register_page).post(accounts::register))
        .route("/logout", get(accounts::logout).post(accounts::logout))
        // Coffees
        .route("/coffees/", get(coffees::list))
        .route("/coffees/add/", get(coffees::add_page).post(coffees::add))
        .route("/coffees/{id}", get(coffees::detail))
        .route("/coffees/{id}/delete", post(coffees::delete))
        // Roasters
        .route("/coffees/roasters/", get(roasters::list))
        .route("/coffees/roasters/add", get(roasters::add_page).post(roasters::add))
        // Import / export
        .route("/impex/upload/", get(impex::upload_page).post(impex::upload))
        .route("/impex/download-template", get(impex::download_template));

    let api_routes = Router::new()
        .route("/stats/", get(api::public_stats))
        .route("/user/coffees/", get(api::user_coffees))
        .route("/user/roasters/", get(api::user_roasters))
        .route("/user/processing/", get(api::user_processing))
        .route("/user/stats/", get(api::user_stats))
        .layer(cors);

    let mut app = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .merge(login_routes)
        .merge(web_routes)
        .nest("/api", api_routes)
        .layer(from_fn(request_metrics::track_metrics))
        .layer(TimeoutLayer::new(config.request_timeout()));

    if !config.server.debug {
        let hosts = Arc::new(config.server.allowed_hosts.clone());
        app = app.layer(from_fn_with_state(hosts, allowed_hosts::check_host));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router fixtures for handler tests

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, Response};
    use beans_common::{db::models::User, testing};
    use tower::ServiceExt;

    pub struct TestApp {
        pub state: AppState,
        pub router: Router,
    }

    /// Debug-mode app on an in-memory database
    pub async fn test_app() -> TestApp {
        let mut config = AppConfig::default();
        config.server.debug = true;
        config.rate_limit.enabled = false;

        test_app_with(config).await
    }

    pub async fn test_app_with(config: AppConfig) -> TestApp {
        let state = AppState::new(config, testing::test_pool().await);
        let router = create_router(state.clone());
        TestApp { state, router }
    }

    impl TestApp {
        pub async fn user(&self, email: &str) -> User {
            testing::create_user(&self.state.repo, email).await
        }

        /// `Cookie` header value of a logged-in session
        pub fn session_cookie(&self, user: &User) -> String {
            let token = self
                .state
                .jwt
                .generate_token(user.id, &user.email)
                .unwrap();
            format!("{}={}", self.state.config.auth.session_cookie, token)
        }

        pub fn bearer(&self, user: &User) -> String {
            let token = self
                .state
                .jwt
                .generate_token(user.id, &user.email)
                .unwrap();
            format!("Bearer {}", token)
        }

        pub async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }

        pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            let mut request = Request::get(uri);
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            self.send(request.body(Body::empty()).unwrap()).await
        }

        pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
            let mut request = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            self.send(request.body(Body::from(body.to_string())).unwrap())
                .await
        }
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// All `Set-Cookie` values of a response
    pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}
