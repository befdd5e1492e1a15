//! Subcommand implementations.

pub mod link;
pub mod store;

use party_rsvp_server::config::ConfigError;
use party_rsvp_server::state::StateError;
use party_rsvp_server::store::StoreError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("startup: {0}")]
    State(#[from] StateError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("no GitHub token: pass --token or set GITHUB_TOKEN")]
    CredentialMissing,

    #[error("refusing to clear without --yes")]
    NotConfirmed,

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}
