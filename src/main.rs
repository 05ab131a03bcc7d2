use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pubic::cache::{CredentialCache, JsonFileCache};
use pubic::config::{default_config_path, ResolvedConfig};
use pubic::credentials::display_token;
use pubic::duration::format_duration;
use pubic::AuthFlow;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pubic")]
#[command(about = "hubiC OAuth2 client and storage credential fetcher")]
struct Cli {
    /// Path to config file (defaults to ./pubic.toml, then ~/.config/pubic/pubic.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore cached credentials and run the full authorization flow
    #[arg(long)]
    no_cache: bool,

    /// Print tokens unmasked
    #[arg(long, global = true)]
    show_secrets: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print object-storage credentials (default)
    Storage,
    /// Print the API access token
    Api,
    /// Refresh the cached API access token
    Refresh,
    /// Delete cached credentials
    ClearCache,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command.unwrap_or(Command::Storage) {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("API base: {}", config.api_base);
            println!("Redirect URI: {}", config.redirect_uri);
            println!("Scope: {}", config.scope);
            println!("Timeout: {}", format_duration(config.timeout));
            println!("Verify state: {}", config.verify_state);
            println!("Client id file: {}", config.client_id_file.display());
            println!("Client secret file: {}", config.client_secret_file.display());
            println!("Cache directory: {}", config.cache_dir.display());
        }
        Command::ClearCache => {
            let cache = JsonFileCache::with_path(&config.cache_dir);
            cache.clear().await.context("Failed to clear cache")?;
            println!("Cleared cached credentials in {}", config.cache_dir.display());
        }
        Command::Api => {
            let flow = AuthFlow::from_config(&config)?;
            let tokens = flow.get_api_credentials(!cli.no_cache).await?;
            println!("Access token: {}", display_token(&tokens.access_token, cli.show_secrets));
            println!("Token type: {}", tokens.token_type);
            println!("Expires at: {}", tokens.expires_at().to_rfc3339());
        }
        Command::Refresh => {
            let flow = AuthFlow::from_config(&config)?;
            let tokens = flow.refresh_api_credentials().await?;
            println!("Access token: {}", display_token(&tokens.access_token, cli.show_secrets));
            println!("Expires at: {}", tokens.expires_at().to_rfc3339());
        }
        Command::Storage => {
            let flow = AuthFlow::from_config(&config)?;
            let credentials = flow.get_storage_credentials(!cli.no_cache).await?;
            println!("Endpoint: {}", credentials.endpoint);
            println!("Token: {}", display_token(&credentials.token, cli.show_secrets));
            match credentials.expires {
                Some(expires) => println!("Expires: {}", expires.to_rfc3339()),
                None => println!("Expires: unknown"),
            }
        }
    }

    Ok(())
}
