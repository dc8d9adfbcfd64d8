use std::{io, process::ExitCode};

use clap::Parser;
use iamgate::AccessToken;
use iamgate_reqwest::IamClient;
use iamgate_server::cli::{self, CliArgs, Command, Outcome, TokenArgs};

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    iamgate_server::init_tracing("warn");

    let args = CliArgs::parse();
    let mut out = io::stdout().lock();

    let outcome = match args.command {
        Command::Check { iam } => cli::check(&iam, &mut out)?,
        Command::Lookup { iam, token } => match read_token(&token, &mut out)? {
            Some(token) => {
                let client = IamClient::new(iam.iam_config())?;
                cli::lookup(&client, &token, &mut out).await?
            }
            None => {
                cli::token_instructions(&mut out)?;
                Outcome::Failure
            }
        },
        Command::Request { server_url, token } => match read_token(&token, &mut out)? {
            Some(token) => {
                let client = reqwest::Client::new();
                cli::request(&client, &server_url, &token, &mut out).await?
            }
            None => {
                cli::token_instructions(&mut out)?;
                Outcome::Failure
            }
        },
    };

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_token(args: &TokenArgs, out: &mut impl io::Write) -> io::Result<Option<AccessToken>> {
    let resolved = cli::resolve_token(args, &mut io::stdin().lock(), out)?;
    if let Some((_, source)) = &resolved {
        tracing::debug!(?source, "using access token");
    }
    Ok(resolved.map(|(token, _)| token))
}
