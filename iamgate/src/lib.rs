//! Bearer-token authentication delegated to an external identity service.
//!
//! The [`AuthGate`] sits in front of protected operations. It pulls the
//! bearer token out of an `Authorization` header value, hands it to an
//! [`IdentityLookup`] and projects whatever comes back into a fully formed
//! [`Principal`]. Every failure, whatever its cause, surfaces as the single
//! [`AuthError::Unauthorized`]; the cause is only ever written to the log.
//!
//! ```
//! use iamgate::{AccessTokenRef, AuthError, AuthGate, IdentityLookup, IdentityUser};
//!
//! #[derive(Debug)]
//! struct OnlyAda;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("token not recognized")]
//! struct NotRecognized;
//!
//! #[async_trait::async_trait]
//! impl IdentityLookup for OnlyAda {
//!     type Error = NotRecognized;
//!
//!     async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
//!         if token.as_str() == "tok_valid_1" {
//!             Ok(IdentityUser {
//!                 id: Some("u1".into()),
//!                 name: Some("Ada".into()),
//!                 ..IdentityUser::default()
//!             })
//!         } else {
//!             Err(NotRecognized)
//!         }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let gate = AuthGate::new(OnlyAda);
//!
//! let principal = gate.authenticate("Bearer tok_valid_1").await.unwrap();
//! assert_eq!(principal.name.as_deref(), Some("Ada"));
//! assert!(principal.roles.is_empty());
//!
//! assert_eq!(gate.authenticate("Bearer tok_expired").await, Err(AuthError::Unauthorized));
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
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod gate;
mod lookup;
mod principal;

pub use braids::*;
pub use gate::{extract_bearer, AuthError, AuthGate};
pub use lookup::IdentityLookup;
pub use principal::{IdentityUser, Principal};
