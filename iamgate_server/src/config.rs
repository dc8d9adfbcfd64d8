//! Command line and environment configuration
//!
//! Every option can be given as a flag or through the environment. The
//! binaries load a `.env` file, if one exists, before parsing.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use clap::{Args, Parser};
use iamgate::{ClientId, ClientSecret};
use iamgate_reqwest::IamConfig;
use url::Url;

/// Client ID used when none is configured
pub const DEFAULT_CLIENT_ID: &str = "abcdef1234567890abcdef1234567890";

/// Client secret used when none is configured
pub const DEFAULT_CLIENT_SECRET: &str = "abcdef1234567890abcdef1234567890";

/// Where to find the identity service and who to present as
#[derive(Clone, Debug, Args)]
pub struct IamArgs {
    /// Base URL of the identity service
    #[arg(long, env = "GO_IAM_BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: Url,

    /// The client ID this application is registered under
    #[arg(long, env = "GO_IAM_CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: ClientId,

    /// The client secret paired with the client ID
    #[arg(
        long,
        env = "GO_IAM_CLIENT_SECRET",
        default_value = DEFAULT_CLIENT_SECRET,
        hide_env_values = true,
        hide_default_value = true
    )]
    pub client_secret: ClientSecret,

    /// Upper bound on a single identity lookup, in seconds
    #[arg(long, env = "GO_IAM_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl IamArgs {
    /// The identity client configuration described by these arguments
    pub fn iam_config(&self) -> IamConfig {
        IamConfig::new(
            self.base_url.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        )
        .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Runs an HTTP server whose routes all require a bearer token accepted by
/// the identity service
#[derive(Debug, Parser)]
#[command(name = "iamgate-server", version, about)]
pub struct ServerArgs {
    #[command(flatten)]
    #[allow(missing_docs)]
    pub iam: IamArgs,

    /// Address to listen on
    #[arg(long, env = "SERVER_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Name of the deployment environment, reported at startup
    #[arg(long, env = "ENVIRONMENT", default_value = "development")]
    pub environment: String,
}

impl ServerArgs {
    /// The socket address the server binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
