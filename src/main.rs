//! `playkey` CLI - log in and resolve playable streams

mod cmd;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use playkey::{Category, KeyType, PlayError};

#[derive(Parser)]
#[command(name = "playkey")]
#[command(about = "Log in to the video service and resolve DRM-protected streams")]
#[command(version)]
struct Cli {
    /// Service config file (default: ~/.config/playkey/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Profile directory holding settings and the token cache
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// More logging (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store credentials and proxy settings in the profile
    Configure {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Proxy URL applied to every request (empty string removes it)
        #[arg(long)]
        proxy: Option<String>,

        #[arg(long)]
        proxy_username: Option<String>,

        #[arg(long)]
        proxy_password: Option<String>,
    },

    /// Log in now, replacing any cached token
    Login,

    /// Forget the cached token
    Logout,

    /// Print the bearer token, logging in if needed
    Token,

    /// Resolve a catalog id into a manifest URL and license key
    Resolve {
        /// episodes, movies or channels
        category: Category,

        /// Content id
        id: String,

        /// License key type (A, R, B or D)
        #[arg(short = 'k', long, default_value = "R")]
        key_type: KeyType,

        /// License request header as NAME=VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Key value for type D (must contain D{SSM})
        #[arg(long)]
        key_value: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Build a license key descriptor
    LicenseKey {
        /// License server URL
        url: String,

        #[arg(short = 'k', long, default_value = "R")]
        key_type: KeyType,

        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        #[arg(long)]
        key_value: Option<String>,
    },

    /// Authenticated GET against the first-party API
    Api {
        /// Path below the API base URL
        path: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<PlayError>() {
                Some(play) => {
                    tracing::debug!(error = %play, class = ?play.class(), "Command failed");
                    eprintln!("❌ {}", play.user_message());
                }
                None => eprintln!("❌ {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = cmd::Context::new(cli.config.as_deref(), cli.profile)?;

    match cli.command {
        Commands::Configure {
            username,
            password,
            proxy,
            proxy_username,
            proxy_password,
        } => cmd::configure::cmd_configure(
            &ctx,
            cmd::configure::Changes {
                username,
                password,
                proxy,
                proxy_username,
                proxy_password,
            },
        ),
        Commands::Login => cmd::auth::cmd_login(&ctx).await,
        Commands::Logout => cmd::auth::cmd_logout(&ctx),
        Commands::Token => cmd::auth::cmd_token(&ctx).await,
        Commands::Resolve {
            category,
            id,
            key_type,
            headers,
            key_value,
            json,
        } => {
            cmd::resolve::cmd_resolve(
                &ctx,
                category,
                &id,
                key_type,
                &headers,
                key_value.as_deref(),
                json,
            )
            .await
        }
        Commands::LicenseKey {
            url,
            key_type,
            headers,
            key_value,
        } => cmd::license::cmd_license_key(&url, key_type, &headers, key_value.as_deref()),
        Commands::Api { path } => cmd::api::cmd_api(&ctx, &path).await,
    }
}
