//! HTTP server for phone-system directory lookups.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/contacts?Number=..&Email=..` | Contact lookup (Basic auth, rate limited) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Request pipeline
//!
//! A `/contacts` request passes through, in order: the per-address rate
//! limiter, the Basic credential check, input validation, the store query
//! and the response formatter. Each stage can end the request with a
//! [`LookupError`].
//!
//! # Response
//!
//! ```json
//! { "contacts": [ { "contactid": 1, "firstname": "Jane", "lastname": "Public",
//!   "company": "", "email": null, "phonebusiness": "555 1234567",
//!   "phonemobile": "", "phonehome": "" } ] }
//! ```
//!
//! Requests exceeding `server.request_timeout_secs` are aborted with `408`;
//! dropping the handler future also drops the in-flight query and returns its
//! pooled connection.

use axum::{
    extract::{rejection::QueryRejection, ConnectInfo, FromRequestParts, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{parse_basic_header, CredentialVerifier};
use crate::config::Config;
use crate::db;
use crate::error::LookupError;
use crate::lookup::lookup_contacts;
use crate::models::ContactList;
use crate::query::{LookupParams, LookupQuery};
use crate::rate_limit::RateLimiter;
use crate::store::ContactStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub verifier: Arc<CredentialVerifier>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>, verifier: CredentialVerifier, limiter: RateLimiter) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
            limiter,
        }
    }
}

/// Builds the router. The caller must serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()` (or, in tests,
/// provide `MockConnectInfo`) so the rate limiter can see client addresses.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let lookup = Router::new()
        .route("/contacts", get(handle_contacts))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .merge(lookup)
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` and serves until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = db::connect(config).await?;
    let state = AppState::new(
        store.clone(),
        CredentialVerifier::from_config(&config.auth),
        RateLimiter::from_config(&config.rate_limit),
    );

    let app = build_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = config.server.bind.as_str(),
        backend = store.backend(),
        per_minute = config.rate_limit.per_minute,
        per_hour = config.rate_limit.per_hour,
        "Contact lookup server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// ============ Rate limiting ============

/// Rejects the request before authentication when the client address has
/// exhausted a quota.
async fn enforce_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, LookupError> {
    if let Err(exceeded) = state.limiter.check(addr.ip()) {
        tracing::warn!(client = %addr.ip(), limit = %exceeded.quota, "Rate limit exceeded");
        return Err(exceeded.into());
    }
    Ok(next.run(request).await)
}

// ============ Authentication ============

/// Extractor that succeeds only for requests carrying the configured
/// Basic credentials. Holds the authenticated username.
pub struct AuthenticatedClient(pub String);

impl FromRequestParts<AppState> for AuthenticatedClient {
    type Rejection = LookupError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credentials = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic_header)
            .ok_or(LookupError::MissingCredentials)?;

        tracing::debug!(?credentials, "Received credentials");

        if !state.verifier.verify(&credentials) {
            tracing::warn!("Invalid API Key or Password");
            return Err(LookupError::Unauthorized);
        }

        tracing::debug!("Authentication successful");
        Ok(AuthenticatedClient(credentials.username))
    }
}

// ============ GET /contacts ============

/// Handler for `GET /contacts`.
///
/// The query string is read as raw pairs so a repeated `Number` or `Email`
/// keeps its last value instead of failing deserialization.
async fn handle_contacts(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    AuthenticatedClient(client): AuthenticatedClient,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ContactList>, LookupError> {
    tracing::debug!(client = %addr.ip(), user = client.as_str(), "Incoming request");

    let Query(pairs) = pairs.map_err(|e| LookupError::BadRequest(e.body_text()))?;
    let params = LookupParams::from_pairs(pairs);
    tracing::debug!(number = ?params.number, email = ?params.email, "Query parameters");

    let query = LookupQuery::from_params(&params).map_err(|e| {
        tracing::debug!("Missing query parameters: Number or Email must be provided");
        e
    })?;

    let list = lookup_contacts(state.store.as_ref(), &query).await?;
    tracing::debug!(response = ?list, "Response");
    Ok(Json(list))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
