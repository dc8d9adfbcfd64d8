//! An [`IdentityLookup`](iamgate::IdentityLookup) that asks a Go IAM style
//! identity service who a token belongs to
//!
//! The service is expected to answer `GET {base_url}/me/v1` (with the token
//! as a bearer credential) with an envelope of the form
//! `{"success": true, "message": "…", "data": { …user… }}`.
//!
//! ```
//! use std::time::Duration;
//!
//! use iamgate::{AuthGate, ClientId, ClientSecret};
//! use iamgate_reqwest::{IamClient, IamConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IamConfig::new(
//!     "http://localhost:3000".parse()?,
//!     ClientId::from_static("abcdef1234567890abcdef1234567890"),
//!     ClientSecret::from_static("abcdef1234567890abcdef1234567890"),
//! )
//! .with_timeout(Duration::from_secs(5));
//!
//! let gate = AuthGate::new(IamClient::new(config)?);
//! # let _ = gate;
//! # Ok(())
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

mod client;
mod config;
mod dto;

pub use client::{IamClient, IdentityError};
pub use config::{ConfigError, IamConfig};
