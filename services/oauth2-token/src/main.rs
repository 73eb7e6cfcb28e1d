//! OAuth 2.0 token fetcher
//!
//! Single-binary CLI that:
//! 1. Loads a client configuration from TOML
//! 2. Performs one non-interactive grant against the token endpoint
//! 3. Prints the token endpoint's response as pretty JSON on stdout
//!
//! Logs go to stderr so stdout stays machine-readable.

mod config;

use anyhow::{Context, Result, bail};
use oauth2_client::{Client, GrantType, ReqwestTransport};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const USAGE: &str = "usage: oauth2-token [--config PATH] \
    <credentials | password USER PASS | jwt ASSERTION | refresh REFRESH_TOKEN>";

/// The grant to perform, with its arguments.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Credentials,
    Password { username: String, password: String },
    Jwt { assertion: String },
    Refresh { refresh_token: String },
}

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Cli {
    config_path: Option<String>,
    command: Command,
}

/// Parse arguments (without the program name).
///
/// `--config PATH` may appear anywhere; the remaining words are the grant
/// and its arguments.
fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config requires a path")?;
            config_path = Some(path.clone());
        } else {
            words.push(arg.as_str());
        }
    }

    let (grant, rest) = words.split_first().context(USAGE)?;
    let grant: GrantType = grant.parse().map_err(anyhow::Error::msg)?;

    let command = match (grant, rest) {
        (GrantType::ClientCredentials, []) => Command::Credentials,
        (GrantType::Password, [username, password]) => Command::Password {
            username: (*username).to_owned(),
            password: (*password).to_owned(),
        },
        (GrantType::JwtBearer, [assertion]) => Command::Jwt {
            assertion: (*assertion).to_owned(),
        },
        (GrantType::RefreshToken, [refresh_token]) => Command::Refresh {
            refresh_token: (*refresh_token).to_owned(),
        },
        (GrantType::AuthorizationCode | GrantType::Implicit, _) => {
            bail!("{grant} needs a browser redirect and cannot run from the command line")
        }
        _ => bail!("{USAGE}"),
    };

    Ok(Cli {
        config_path,
        command,
    })
}

fn build_client(config: &Config) -> Result<Client> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    Ok(Client::with_transport(
        config.client.clone(),
        Arc::new(ReqwestTransport::with_client(http)),
    ))
}

/// Perform the grant and return the raw token data.
async fn run(client: &Client, command: Command) -> Result<Map<String, Value>> {
    let token = match command {
        Command::Credentials => client.credentials().get_token().await,
        Command::Password { username, password } => {
            client.owner().get_token(&username, &password).await
        }
        Command::Jwt { assertion } => client.jwt().get_token(&assertion).await,
        Command::Refresh { refresh_token } => {
            client
                .create_token(None, Some(refresh_token.as_str()), None, None)
                .refresh()
                .await
        }
    }
    .context("token request failed")?;

    info!(
        token_type = token.token_type().unwrap_or("unknown"),
        expires = %token.expires(),
        "token issued"
    );
    Ok(token.data().clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let config_path = Config::resolve_path(cli.config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        access_token_uri = config.client.access_token_uri.as_deref().unwrap_or_default(),
        client_id = config.client.client_id.as_deref().unwrap_or_default(),
        timeout_secs = config.timeout_secs,
        "configuration loaded"
    );

    let client = build_client(&config)?;
    let data = run(&client, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);

    Ok(())
}
