//! The example server's routes
//!
//! Every route sits behind the authentication gate and answers with JSON.

use axum::{routing::get, Json, Router};
use iamgate::{AuthGate, IdentityLookup, Principal};
use iamgate_axum::{Authenticated, JsonErrorHandler};
use iamgate_tower::GateAuthorizer;
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tower_http::trace::TraceLayer;

/// Builds the router with every route protected by `gate`
pub fn app<L>(gate: AuthGate<L>) -> Router
where
    L: IdentityLookup + 'static,
{
    Router::new()
        .route("/", get(greet))
        .route("/health", get(health))
        .route("/profile", get(profile))
        .route("/api/info", get(api_info))
        .layer(GateAuthorizer::new(gate).with_error_handler(JsonErrorHandler))
        .layer(TraceLayer::new_for_http())
}

/// Response to `GET /`
#[derive(Debug, Serialize)]
pub struct Greeting {
    /// `Hello, <name>!`
    pub message: String,
    /// The caller
    pub user: Principal,
}

/// Response to `GET /health`
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `healthy`
    pub status: &'static str,
    /// The caller's name
    pub user: String,
    /// When the response was produced
    pub timestamp: String,
}

/// Response to `GET /profile`
#[derive(Debug, Serialize)]
pub struct Profile {
    /// The caller
    pub profile: Principal,
    /// When the response was produced
    pub timestamp: String,
}

/// Response to `GET /api/info`
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    /// Name of this API
    pub api: &'static str,
    /// Version of this server
    pub version: &'static str,
    /// The web framework serving the request
    pub framework: &'static str,
    /// The identity client in use
    pub sdk: &'static str,
    /// The caller's identifier
    pub user_id: Option<String>,
    /// Always `true`; unauthenticated callers never get this far
    pub authenticated: bool,
}

async fn greet(Authenticated(user): Authenticated) -> Json<Greeting> {
    let message = format!("Hello, {}!", user.name.as_deref().unwrap_or("User"));
    Json(Greeting { message, user })
}

async fn health(Authenticated(user): Authenticated) -> Json<Health> {
    Json(Health {
        status: "healthy",
        user: user.name.unwrap_or_else(|| "Unknown".to_owned()),
        timestamp: now(),
    })
}

async fn profile(Authenticated(profile): Authenticated) -> Json<Profile> {
    Json(Profile {
        profile,
        timestamp: now(),
    })
}

async fn api_info(Authenticated(user): Authenticated) -> Json<ApiInfo> {
    Json(ApiInfo {
        api: "iamgate example",
        version: env!("CARGO_PKG_VERSION"),
        framework: "axum",
        sdk: "iamgate_reqwest",
        user_id: user.id,
        authenticated: true,
    })
}

fn now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
