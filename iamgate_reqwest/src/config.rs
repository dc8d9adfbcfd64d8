use std::time::Duration;

use iamgate::{ClientId, ClientSecret};
use thiserror::Error;
use url::Url;

/// Connection settings for the identity service
///
/// The `Debug` output never includes the client secret.
#[derive(Clone, Debug)]
pub struct IamConfig {
    /// Base URL of the identity service, e.g. `http://localhost:3000`
    pub base_url: Url,

    /// The client ID this application is registered under
    pub client_id: ClientId,

    /// The client secret paired with `client_id`
    pub client_secret: ClientSecret,

    /// Upper bound on a single identity lookup
    pub timeout: Duration,
}

impl IamConfig {
    /// Lookup timeout used unless overridden
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Constructs a configuration with the default timeout
    pub fn new(base_url: Url, client_id: ClientId, client_secret: ClientSecret) -> Self {
        Self {
            base_url,
            client_id,
            client_secret,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the lookup timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// The URL of the "who am I" endpoint below `base_url`
    pub fn me_url(&self) -> Result<Url, ConfigError> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: scheme.to_owned(),
                })
            }
        }

        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join("me/v1")
            .map_err(|source| ConfigError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source,
            })
    }
}

/// The identity service configuration cannot be used
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Only `http` and `https` identity services are supported
    #[error("unsupported identity service scheme `{scheme}`")]
    UnsupportedScheme {
        /// The scheme that was given
        scheme: String,
    },
    /// The endpoint URL could not be derived from the base URL
    #[error("invalid identity service base URL `{url}`")]
    InvalidBaseUrl {
        /// The base URL that was given
        url: String,
        /// Why it could not be used
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed
    #[error("unable to construct HTTP client")]
    HttpClient(#[source] reqwest::Error),
}
