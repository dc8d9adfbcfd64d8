//! Authentication middleware for `tower` services, including `axum` routers.
//!
//! [`GateAuthorizer`] is a [`Layer`](tower_layer::Layer) that runs every
//! request through an [`AuthGate`](iamgate::AuthGate). Requests that pass
//! continue with the authenticated [`Principal`](iamgate::Principal) in their
//! extensions; all others are answered by an [`OnAuthError`] handler with a
//! `401 Unauthorized` response.
//!
//! ```
//! # use std::convert::Infallible;
//! use http::{Request, Response};
//! use iamgate::{AuthGate, Principal};
//! use iamgate_tower::GateAuthorizer;
//! use tower::{ServiceBuilder, ServiceExt};
//! # use iamgate::{AccessTokenRef, IdentityLookup, IdentityUser};
//! #
//! # #[derive(Debug)]
//! # struct Lookup;
//! #
//! # #[derive(Debug, thiserror::Error)]
//! # #[error("rejected")]
//! # struct Rejected;
//! #
//! # #[async_trait::async_trait]
//! # impl IdentityLookup for Lookup {
//! #     type Error = Rejected;
//! #     async fn lookup(&self, _: &AccessTokenRef) -> Result<IdentityUser, Rejected> {
//! #         Ok(IdentityUser { name: Some("Ada".into()), ..IdentityUser::default() })
//! #     }
//! # }
//! #
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let authorizer = GateAuthorizer::new(AuthGate::new(Lookup))
//!     .with_terse_error_handler::<String>();
//!
//! let service = ServiceBuilder::new()
//!     .layer(authorizer)
//!     .service_fn(|req: Request<String>| async move {
//!         let principal = req.extensions().get::<Principal>().cloned().unwrap_or_default();
//!         Ok::<_, Infallible>(Response::new(format!("Hello, {}!", principal.name.unwrap_or_default())))
//!     });
//!
//! let request = Request::builder()
//!     .header("authorization", "Bearer tok_valid_1")
//!     .body(String::new())
//!     .unwrap();
//! let response = service.oneshot(request).await.unwrap();
//! assert_eq!(response.body(), "Hello, Ada!");
//! # }
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

use std::fmt;
use std::marker::PhantomData;

mod authorizer;
pub mod util;

pub use crate::authorizer::*;

/// Responds to authentication failures with a bare `401 Unauthorized`
///
/// The response carries a `www-authenticate: Bearer` challenge and an empty
/// body.
pub struct TerseErrorHandler<ResBody> {
    _ty: PhantomData<fn() -> ResBody>,
}

impl<ResBody> TerseErrorHandler<ResBody> {
    /// Instantiates a new instance over a given body type
    #[inline]
    pub fn new() -> Self {
        Self { _ty: PhantomData }
    }
}

impl<ResBody> fmt::Debug for TerseErrorHandler<ResBody> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("TerseErrorHandler")
    }
}

impl<ResBody> Default for TerseErrorHandler<ResBody> {
    #[inline]
    fn default() -> Self {
        Self { _ty: PhantomData }
    }
}

impl<ResBody> Clone for TerseErrorHandler<ResBody> {
    #[inline]
    fn clone(&self) -> Self {
        Self { _ty: PhantomData }
    }
}

impl<ResBody> Copy for TerseErrorHandler<ResBody> {}

impl<ResBody> OnAuthError for TerseErrorHandler<ResBody>
where
    ResBody: Default,
{
    type Body = ResBody;

    #[inline]
    fn on_unauthorized(&self) -> http::Response<Self::Body> {
        util::unauthorized()
    }
}
