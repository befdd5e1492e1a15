//! Party RSVP CLI - share links, exports, and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Print the link to send to guests
//! rsvp-cli link
//!
//! # Check configuration and gist access
//! rsvp-cli check
//!
//! # Dump every RSVP as JSON
//! rsvp-cli export > rsvps.json
//!
//! # Show counts
//! rsvp-cli stats
//!
//! # Delete every RSVP (keeps the gist)
//! rsvp-cli clear --yes
//! ```
//!
//! Reads the same environment as the server. `--token` overrides
//! `GITHUB_TOKEN` for one invocation.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "rsvp-cli")]
#[command(author, version, about = "Party RSVP CLI tools")]
struct Cli {
    /// GitHub token for this invocation (takes precedence over `GITHUB_TOKEN`)
    #[arg(long, global = true, env = "RSVP_CLI_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the guest share link
    Link,
    /// Verify configuration, credential, and gist access
    Check,
    /// Print all RSVPs as JSON
    Export {
        /// Include aggregate stats alongside the records
        #[arg(long)]
        with_stats: bool,
    },
    /// Print aggregate RSVP counts
    Stats,
    /// Delete every RSVP
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `export` output stays clean JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsvp_cli=info,party_rsvp_server=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let token = cli.token.map(SecretString::from);

    match cli.command {
        Commands::Link => commands::link::print_link()?,
        Commands::Check => commands::store::check(token).await?,
        Commands::Export { with_stats } => commands::store::export(token, with_stats).await?,
        Commands::Stats => commands::store::stats(token).await?,
        Commands::Clear { yes } => commands::store::clear(token, yes).await?,
    }
    Ok(())
}
