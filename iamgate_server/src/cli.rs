//! Commands for exercising the identity service and the example server by
//! hand
//!
//! Command output is written to the given writer. Failures that the user
//! should act on are reported there too and reflected in the returned
//! [`Outcome`], rather than as errors.

use std::{
    error::Error,
    io::{self, BufRead, Write},
};

use clap::{Args, Parser, Subcommand};
use iamgate::{AccessToken, AccessTokenRef, AuthGate, Principal};
use iamgate_reqwest::{IamClient, IdentityError};
use reqwest::StatusCode;
use url::Url;

use crate::config::IamArgs;

/// Value shipped in `.env` templates; never a real token
pub const PLACEHOLDER_TOKEN: &str = "your_jwt_token_here";

/// Tools for checking an identity service setup by hand
#[derive(Debug, Parser)]
#[command(name = "iamgate-cli", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    #[allow(missing_docs)]
    pub command: Command,
}

/// The available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the identity client from the configuration and report on it
    Check {
        #[command(flatten)]
        #[allow(missing_docs)]
        iam: IamArgs,
    },
    /// Ask the identity service who a token belongs to, then run it through
    /// the authentication gate
    Lookup {
        #[command(flatten)]
        #[allow(missing_docs)]
        iam: IamArgs,

        #[command(flatten)]
        #[allow(missing_docs)]
        token: TokenArgs,
    },
    /// Call a running example server with a token
    Request {
        /// Where the example server is listening
        #[arg(long, env = "SERVER_URL", default_value = "http://localhost:3001")]
        server_url: Url,

        #[command(flatten)]
        #[allow(missing_docs)]
        token: TokenArgs,
    },
}

/// Where to take the access token from
#[derive(Clone, Debug, Args)]
pub struct TokenArgs {
    /// The access token to use
    pub token: Option<String>,

    /// Access token from the environment, used when none is given as an argument
    #[arg(long, env = "JWT_TOKEN", hide_env_values = true)]
    pub jwt_token: Option<String>,

    /// Prompt for the token on stdin
    ///
    /// With a token in the environment, asks whether to use it first.
    #[arg(short, long)]
    pub interactive: bool,
}

/// How a command went
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Everything worked
    Success,
    /// Something failed; the details have been written out
    Failure,
}

impl Outcome {
    /// Whether the command succeeded
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Where a token came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
    /// The positional argument
    Argument,
    /// `--jwt-token` or `JWT_TOKEN`
    Environment,
    /// Typed in at the prompt
    Prompt,
}

/// Picks the token to use, prompting on `input` when interactive
///
/// Empty values and [`PLACEHOLDER_TOKEN`] count as absent.
pub fn resolve_token<R, W>(
    args: &TokenArgs,
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<(AccessToken, TokenSource)>>
where
    R: BufRead,
    W: Write,
{
    if let Some(token) = usable(args.token.as_deref()) {
        return Ok(Some((token, TokenSource::Argument)));
    }

    let from_env = usable(args.jwt_token.as_deref());
    if !args.interactive {
        return Ok(from_env.map(|t| (t, TokenSource::Environment)));
    }

    let prompt = match from_env {
        Some(token) => {
            writeln!(output, "Found JWT_TOKEN in environment: {token:#20}")?;
            if ask(input, output, "Use this token? (y/n): ")?.eq_ignore_ascii_case("y") {
                return Ok(Some((token, TokenSource::Environment)));
            }
            "Enter your JWT token: "
        }
        None => "Token: ",
    };

    let entered = ask(input, output, prompt)?;
    Ok(usable(Some(entered.as_str())).map(|t| (t, TokenSource::Prompt)))
}

fn usable(token: Option<&str>) -> Option<AccessToken> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != PLACEHOLDER_TOKEN)
        .map(AccessToken::from)
}

fn ask<R, W>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

/// Builds the identity client from `iam` and reports what it will talk to
pub fn check<W: Write>(iam: &IamArgs, out: &mut W) -> io::Result<Outcome> {
    writeln!(out, "Identity service: {}", iam.base_url)?;
    writeln!(out, "Client ID: {}...", truncated(iam.client_id.as_str(), 8))?;
    writeln!(out, "Lookup timeout: {}s", iam.timeout_secs)?;

    match IamClient::new(iam.iam_config()) {
        Ok(_) => {
            writeln!(out, "Identity client created successfully")?;
            Ok(Outcome::Success)
        }
        Err(err) => {
            writeln!(out, "Failed to create identity client: {err}")?;
            Ok(Outcome::Failure)
        }
    }
}

/// Looks `token` up directly, then runs it through an [`AuthGate`] over
/// the same client
pub async fn lookup<W: Write>(
    client: &IamClient,
    token: &AccessTokenRef,
    out: &mut W,
) -> io::Result<Outcome> {
    writeln!(out, "Testing token: {token:#20}")?;
    writeln!(out, "Identity service: {}", client.base_url())?;
    writeln!(out, "Client ID: {}...", truncated(client.client_id().as_str(), 8))?;

    match client.me(token).await {
        Ok(user) => {
            writeln!(out, "Token validation successful!")?;
            writeln!(out, "User information:")?;
            writeln!(out, "   Raw object: {user:?}")?;
            for (field, value) in [
                ("id", &user.id),
                ("name", &user.name),
                ("email", &user.email),
            ] {
                if let Some(value) = value {
                    writeln!(out, "   {field}: {value}")?;
                }
            }
            if let Some(roles) = &user.roles {
                writeln!(out, "   roles: {}", roles.join(", "))?;
            }
        }
        Err(err) => {
            writeln!(out, "Token validation failed: {err}")?;
            let mut source = err.source();
            while let Some(cause) = source {
                writeln!(out, "   caused by: {cause}")?;
                source = cause.source();
            }

            writeln!(out, "Possible issues:")?;
            for hint in troubleshooting_hints(&err) {
                writeln!(out, "   - {hint}")?;
            }
            return Ok(Outcome::Failure);
        }
    }

    writeln!(out, "Running the authentication gate...")?;
    match AuthGate::new(client.clone()).authenticate_token(token).await {
        Ok(principal) => {
            writeln!(out, "Gate accepted the token. Principal:")?;
            write_principal(&principal, out)?;
            Ok(Outcome::Success)
        }
        Err(err) => {
            writeln!(out, "Gate rejected the token: {err}")?;
            Ok(Outcome::Failure)
        }
    }
}

fn write_principal<W: Write>(principal: &Principal, out: &mut W) -> io::Result<()> {
    let json = serde_json::to_string_pretty(principal).map_err(io::Error::from)?;
    writeln!(out, "{json}")
}

/// Suggestions for fixing a failed lookup
pub fn troubleshooting_hints(err: &IdentityError) -> &'static [&'static str] {
    if err.is_rejected() {
        &[
            "Token might be expired",
            "Token might be invalid",
            "The identity service might not be running",
        ]
    } else if err.is_unreachable() {
        &[
            "The identity service is not running",
            "Check that the identity service is reachable at the configured base URL",
        ]
    } else {
        &["Check your identity service configuration"]
    }
}

/// What the example server said
#[derive(Clone, Debug)]
pub struct ServerReply {
    /// Response status
    pub status: StatusCode,
    /// Response body as text
    pub body: String,
}

/// Sends `GET server_url` with `token` as a bearer token
pub async fn call_server(
    client: &reqwest::Client,
    server_url: &Url,
    token: &AccessTokenRef,
) -> Result<ServerReply, reqwest::Error> {
    let resp = client
        .get(server_url.clone())
        .bearer_auth(token.as_str())
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    Ok(ServerReply { status, body })
}

/// Calls the example server and reports the result
pub async fn request<W: Write>(
    client: &reqwest::Client,
    server_url: &Url,
    token: &AccessTokenRef,
    out: &mut W,
) -> io::Result<Outcome> {
    writeln!(out, "Testing example server at {server_url}...")?;

    let reply = match call_server(client, server_url, token).await {
        Ok(reply) => reply,
        Err(err) => {
            writeln!(out, "Failed to make request: {err}")?;
            return Ok(Outcome::Failure);
        }
    };

    if reply.status.is_success() {
        writeln!(out, "Request successful!")?;
        writeln!(out, "Response: {}", reply.body)?;
        return Ok(Outcome::Success);
    }

    writeln!(out, "Request failed with status: {}", reply.status)?;
    if reply.status == StatusCode::UNAUTHORIZED {
        writeln!(out)?;
        writeln!(out, "Troubleshooting tips:")?;
        writeln!(out, "- Check that your JWT token is valid and not expired")?;
        writeln!(out, "- Verify the identity service is running")?;
        writeln!(out, "- Ensure the example server is running at {server_url}")?;
    }
    Ok(Outcome::Failure)
}

/// Explains how to get hold of a token
pub fn token_instructions<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "No JWT token provided")?;
    writeln!(out)?;
    writeln!(out, "To get a token:")?;
    writeln!(out, "1. Log in to the identity service web interface")?;
    writeln!(out, "2. Open the browser developer tools")?;
    writeln!(out, "3. Go to the Application/Storage tab")?;
    writeln!(out, "4. Find 'access_token' in Local Storage")?;
    writeln!(out, "5. Copy the token value")?;
    writeln!(out, "6. Pass it as an argument, or export JWT_TOKEN=<token>")?;
    writeln!(out, "7. Or add JWT_TOKEN=<token> to a .env file")
}

fn truncated(value: &str, len: usize) -> &str {
    value
        .char_indices()
        .nth(len)
        .map_or(value, |(idx, _)| &value[..idx])
}
