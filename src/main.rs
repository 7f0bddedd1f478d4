use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cf;
mod commands;
mod config;
mod error;
mod lifecycle;
mod notifications;
mod templates;

use commands::run::RunArgs;
use config::{Config, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "sandbox-purge")]
#[command(
    author,
    version,
    about = "Notify owners of aging sandbox spaces, then purge and recreate them"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "SANDBOX_PURGE_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Platform API bearer token
    #[arg(long, global = true, env = "CF_API_TOKEN", hide_env_values = true)]
    cf_token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one lifecycle pass over all sandbox organizations
    Run {
        /// Report what would happen without deleting, creating or mailing
        #[arg(long)]
        dry_run: bool,

        /// Only send notices, never purge
        #[arg(long)]
        disable_purge: bool,

        /// Abort the run after this many minutes
        #[arg(long)]
        deadline_mins: Option<u64>,

        /// Bearer token for the mail relay
        #[arg(long, env = "MAIL_RELAY_TOKEN", hide_env_values = true)]
        mail_token: Option<String>,
    },

    /// Show which spaces are due for a notice or a purge
    Plan,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("sandbox_purge=debug")
        } else {
            EnvFilter::new("sandbox_purge=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run {
            dry_run,
            disable_purge,
            deadline_mins,
            mail_token,
        } => {
            let args = RunArgs {
                dry_run,
                disable_purge,
                deadline: deadline_mins.map(commands::run::deadline_from_minutes),
                cf_token: cli.cf_token,
                mail_token,
            };
            commands::run::run(config, args).await?;
        }
        Commands::Plan => {
            commands::plan::run(config, cli.cf_token).await?;
        }
    }

    Ok(())
}
