//! Axum utilities for handlers behind an `iamgate` authentication layer.
//!
//! Install [`GateAuthorizer`](iamgate_tower::GateAuthorizer) with the
//! [`JsonErrorHandler`] on the protected routes, then take the caller as an
//! [`Authenticated`] argument.
//!
//! # Full Example
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use iamgate::{AuthGate, ClientId, ClientSecret};
//! use iamgate_axum::{Authenticated, JsonErrorHandler};
//! use iamgate_reqwest::{IamClient, IamConfig};
//! use iamgate_tower::GateAuthorizer;
//! use std::net::SocketAddr;
//!
//! async fn hello(Authenticated(principal): Authenticated) -> String {
//!     format!("Hello, {}!", principal.name.as_deref().unwrap_or("User"))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IamConfig::new(
//!         "http://localhost:3000".parse()?,
//!         ClientId::from_static("my-client"),
//!         ClientSecret::from_static("my-secret"),
//!     );
//!     let gate = AuthGate::new(IamClient::new(config)?);
//!
//!     let router = Router::new()
//!         .route("/", get(hello))
//!         .layer(GateAuthorizer::new(gate).with_error_handler(JsonErrorHandler));
//!
//!     let listener = tokio::net::TcpListener::bind(&SocketAddr::new([0, 0, 0, 0].into(), 3001))
//!         .await?;
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use std::{error::Error, fmt};

use axum_core::{
    body::Body,
    extract::FromRequestParts,
    response::{IntoResponse, Response},
};
use http::{header, request::Parts, HeaderValue};
use iamgate::Principal;
use iamgate_tower::{util, OnAuthError};

/// The message returned to callers that failed authentication
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized - Invalid token";

/// Responds to authentication failures with `401 Unauthorized` and a JSON
/// body of the form `{"error": "Unauthorized - Invalid token"}`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonErrorHandler;

impl OnAuthError for JsonErrorHandler {
    type Body = Body;

    fn on_unauthorized(&self) -> http::Response<Self::Body> {
        unauthorized_json()
    }
}

fn unauthorized_json() -> Response {
    let body = serde_json::json!({ "error": UNAUTHORIZED_MESSAGE }).to_string();

    let mut resp = util::unauthorized_with_body(Body::from(body));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

/// Extracts the [`Principal`] authenticated by the gate
///
/// The handler must sit behind a
/// [`GateAuthorizer`](iamgate_tower::GateAuthorizer). If it does not, the
/// request is rejected as if authentication had failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    /// The authenticated principal
    #[inline]
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    /// Consumes the extractor, returning the principal
    #[inline]
    pub fn into_inner(self) -> Principal {
        self.0
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| {
                tracing::warn!(
                    path = parts.uri.path(),
                    "no principal on request; is the route missing the authentication layer?"
                );
                Unauthenticated
            })
    }
}

/// Rejection used when a handler asks for an [`Authenticated`] caller that
/// the gate did not provide
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unauthenticated;

impl fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request is not authenticated")
    }
}

impl Error for Unauthenticated {}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        unauthorized_json()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, routing::get, Router};
    use http::{Request, StatusCode};
    use iamgate::{AccessTokenRef, AuthGate, IdentityLookup, IdentityUser};
    use iamgate_tower::GateAuthorizer;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("token rejected")]
    struct Rejected;

    #[derive(Debug)]
    struct AdaOnly;

    #[async_trait::async_trait]
    impl IdentityLookup for AdaOnly {
        type Error = Rejected;

        async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
            match token.as_str() {
                "tok_valid_1" => Ok(IdentityUser {
                    id: Some("u1".into()),
                    name: Some("Ada".into()),
                    ..IdentityUser::default()
                }),
                _ => Err(Rejected),
            }
        }
    }

    async fn whoami(Authenticated(principal): Authenticated) -> String {
        principal.name.unwrap_or_default()
    }

    fn router() -> Router {
        let protected = Router::new()
            .route("/whoami", get(whoami))
            .layer(
                GateAuthorizer::new(AuthGate::new(AdaOnly)).with_error_handler(JsonErrorHandler),
            );

        Router::new()
            .route("/unguarded", get(whoami))
            .merge(protected)
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str, authorization: Option<&'static str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn authenticated_handler_receives_principal() {
        let resp = router()
            .oneshot(get_request("/whoami", Some("Bearer tok_valid_1")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "Ada");
    }

    #[tokio::test]
    async fn rejected_token_gets_json_401() {
        let resp = router()
            .oneshot(get_request("/whoami", Some("Bearer tok_expired")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            body_string(resp).await,
            r#"{"error":"Unauthorized - Invalid token"}"#
        );
    }

    #[tokio::test]
    async fn missing_header_gets_the_same_401() {
        let resp = router()
            .oneshot(get_request("/whoami", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_string(resp).await,
            r#"{"error":"Unauthorized - Invalid token"}"#
        );
    }

    #[tokio::test]
    async fn route_without_layer_is_rejected_not_leaked() {
        let resp = router()
            .oneshot(get_request("/unguarded", Some("Bearer tok_valid_1")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn accessors_expose_principal() {
        let principal = Principal {
            id: Some("u1".into()),
            ..Principal::default()
        };
        let extracted = Authenticated(principal.clone());

        assert_eq!(extracted.principal(), &principal);
        assert_eq!(extracted.into_inner(), principal);
    }
}
