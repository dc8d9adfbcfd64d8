//! An example HTTP server protected by `iamgate`, and a CLI for poking at
//! the identity service by hand.
//!
//! The `iamgate-server` binary serves [`routes::app`] backed by an
//! [`IamClient`](iamgate_reqwest::IamClient). The `iamgate-cli` binary
//! exposes the [`cli`] commands.

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

use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;
pub mod routes;

pub use routes::app;

/// Installs the global `tracing` subscriber
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`.
/// Output goes to stderr so it never mixes with command output.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
