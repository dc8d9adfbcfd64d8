use async_trait::async_trait;
use iamgate::{AccessTokenRef, ClientId, ClientIdRef, IdentityLookup, IdentityUser};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::{dto, ConfigError, IamConfig};

/// Client for the identity service's "who am I" endpoint
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct IamClient {
    client: reqwest::Client,
    base_url: Url,
    me_url: Url,
    client_id: ClientId,
}

impl IamClient {
    /// Constructs a client, building an HTTP client that honours the
    /// configured timeout
    pub fn new(config: IamConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Self::with_client(client, config)
    }

    /// Constructs a client on top of an existing HTTP client
    ///
    /// The configured timeout is not applied; the given client's own
    /// settings are used as is.
    pub fn with_client(client: reqwest::Client, config: IamConfig) -> Result<Self, ConfigError> {
        let me_url = config.me_url()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            me_url,
            client_id: config.client_id,
        })
    }

    /// Base URL of the identity service
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The client ID this client identifies as
    pub fn client_id(&self) -> &ClientIdRef {
        &self.client_id
    }

    /// Asks the identity service who `token` belongs to
    pub async fn me(&self, token: &AccessTokenRef) -> Result<IdentityUser, IdentityError> {
        request_me(
            &self.client,
            &self.base_url,
            &self.me_url,
            &self.client_id,
            token,
        )
        .await
    }
}

#[async_trait]
impl IdentityLookup for IamClient {
    type Error = IdentityError;

    async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
        self.me(token).await
    }
}

/// An error while asking the identity service about a token
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Unable to send the request, or no response arrived in time
    #[error("error sending request to identity service")]
    RequestSend(#[source] reqwest::Error),
    /// The identity service answered with an error status
    #[error("identity service responded with {status}: {body}")]
    ErrorWithBody {
        /// The response status
        status: StatusCode,
        /// The underlying request error
        source: reqwest::Error,
        /// The body of the error
        body: String,
    },
    /// Unable to read the response
    #[error("error reading response body")]
    BodyReadError(#[source] reqwest::Error),
    /// The response body was larger than a user record can reasonably be
    #[error("identity response exceeded {limit} bytes")]
    BodyTooLarge {
        /// The largest body accepted, in bytes
        limit: usize,
    },
    /// Unable to deserialize the response body
    #[error("error deserializing identity response")]
    UserBodyError(#[from] serde_json::Error),
    /// The response envelope reported a failure or carried no user
    #[error("identity service did not return a user: {message}")]
    Unsuccessful {
        /// The message given by the identity service
        message: String,
    },
}

impl IdentityError {
    /// Whether the identity service looked at the token and turned it down
    pub fn is_rejected(&self) -> bool {
        match self {
            Self::ErrorWithBody { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            Self::Unsuccessful { .. } => true,
            _ => false,
        }
    }

    /// Whether the identity service could not be reached in time
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::RequestSend(err) => err.is_connect() || err.is_timeout(),
            Self::BodyReadError(err) => err.is_timeout(),
            _ => false,
        }
    }
}

/// Largest success body read from the identity service
const MAX_BODY_LEN: usize = 64 * 1024;

/// How much of an error body is kept for diagnostics
const MAX_ERROR_BODY_LEN: usize = 1024;

#[tracing::instrument(
    err(level = "debug"),
    skip(client, base_url, me_url, client_id, token),
    fields(
        base_url = %base_url,
        client_id = %client_id,
    ),
)]
async fn request_me(
    client: &reqwest::Client,
    base_url: &Url,
    me_url: &Url,
    client_id: &ClientIdRef,
    token: &AccessTokenRef,
) -> Result<IdentityUser, IdentityError> {
    tracing::trace!("requesting token holder from identity service");

    let mut resp = client
        .get(me_url.clone())
        .bearer_auth(token.as_str())
        .send()
        .await
        .map_err(IdentityError::RequestSend)?;

    tracing::debug!(
        response.status = resp.status().as_u16(),
        "received response from identity service"
    );

    if let Err(error) = resp.error_for_status_ref() {
        let status = resp.status();
        let body = match read_limited(&mut resp, MAX_ERROR_BODY_LEN).await {
            Ok(body) => body.bytes,
            Err(partial) => {
                tracing::debug!(
                    error = %partial.error,
                    "unable to read error body from identity service"
                );
                partial.bytes
            }
        };

        return Err(IdentityError::ErrorWithBody {
            status,
            source: error,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let body = read_limited(&mut resp, MAX_BODY_LEN)
        .await
        .map_err(|partial| IdentityError::BodyReadError(partial.error))?;
    if body.truncated {
        return Err(IdentityError::BodyTooLarge {
            limit: MAX_BODY_LEN,
        });
    }

    let envelope: dto::MeResponse = serde_json::from_slice(&body.bytes)?;
    let user = envelope
        .into_user()
        .map_err(|message| IdentityError::Unsuccessful { message })?;

    tracing::trace!(
        has_id = user.id.is_some(),
        has_roles = user.roles.is_some(),
        "received token holder"
    );

    Ok(user.into())
}

struct LimitedBody {
    bytes: Vec<u8>,
    truncated: bool,
}

struct PartialBody {
    bytes: Vec<u8>,
    error: reqwest::Error,
}

/// Reads at most `limit` bytes of the body, stopping early once it is
/// exceeded
async fn read_limited(
    resp: &mut reqwest::Response,
    limit: usize,
) -> Result<LimitedBody, PartialBody> {
    let mut bytes = Vec::new();
    loop {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let room = limit - bytes.len();
                if chunk.len() > room {
                    bytes.extend_from_slice(&chunk[..room]);
                    return Ok(LimitedBody {
                        bytes,
                        truncated: true,
                    });
                }
                bytes.extend_from_slice(&chunk);
            }
            Ok(None) => {
                return Ok(LimitedBody {
                    bytes,
                    truncated: false,
                })
            }
            Err(error) => return Err(PartialBody { bytes, error }),
        }
    }
}
