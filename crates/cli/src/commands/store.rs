//! Commands that talk to the gist: check, export, stats, clear.

use party_rsvp_server::config::ServerConfig;
use party_rsvp_server::services::WriteCredential;
use party_rsvp_server::state::AppState;
use secrecy::SecretString;

use super::CliError;

/// Loaded state plus the resolved credential.
struct Context {
    state: AppState,
    credential: WriteCredential,
}

impl Context {
    /// Load config and state, then resolve `--token` → config → build.
    async fn load(token: Option<SecretString>) -> Result<Self, CliError> {
        let config = ServerConfig::from_env()?;
        let state = AppState::new(config).await?;

        let mut sources = state.deployment_credentials();
        sources.request = token;
        let credential = sources
            .resolve_write_credential()
            .ok_or(CliError::CredentialMissing)?;

        Ok(Self { state, credential })
    }
}

/// Report what the server would use, and read the gist once.
///
/// # Errors
///
/// Returns error if configuration is invalid, no credential resolves, or the
/// gist read fails.
pub async fn check(token: Option<SecretString>) -> Result<(), CliError> {
    let ctx = Context::load(token).await?;
    let config = ctx.state.config();

    tracing::info!(source = %ctx.credential.source(), "Write credential found");
    let access = if ctx.state.gate().is_open() {
        "open"
    } else {
        "secret required"
    };
    tracing::info!(access, contact_mode = %config.contact_mode, "Access gate");
    tracing::info!(enabled = ctx.state.email().is_some(), "Email notifications");

    match ctx.state.repository().store().reference_slot().get().await {
        Some(reference) => tracing::info!(gist_id = %reference, "Store reference"),
        None => tracing::info!("No gist yet; one will be created on the first RSVP"),
    }

    let records = ctx.state.repository().list(&ctx.credential).await?;
    tracing::info!(rsvps = records.len(), "Gist read OK");
    Ok(())
}

/// Print every record, or records plus stats, as pretty JSON.
///
/// # Errors
///
/// Returns error if the gist read fails.
#[allow(clippy::print_stdout)]
pub async fn export(token: Option<SecretString>, with_stats: bool) -> Result<(), CliError> {
    let ctx = Context::load(token).await?;
    let repository = ctx.state.repository();

    let json = if with_stats {
        serde_json::to_string_pretty(&repository.overview(&ctx.credential).await?)?
    } else {
        serde_json::to_string_pretty(&repository.list(&ctx.credential).await?)?
    };

    println!("{json}");
    Ok(())
}

/// Print aggregate counts.
///
/// # Errors
///
/// Returns error if the gist read fails.
#[allow(clippy::print_stdout)]
pub async fn stats(token: Option<SecretString>) -> Result<(), CliError> {
    let ctx = Context::load(token).await?;
    let stats = ctx.state.repository().stats(&ctx.credential).await?;

    println!("Total responses: {}", stats.total);
    println!("Going:           {}", stats.going);
    println!("Not going:       {}", stats.not_going);
    println!("Adults:          {}", stats.total_adults);
    println!("Kids:            {}", stats.total_kids);
    Ok(())
}

/// Delete every record. Requires `--yes`.
///
/// # Errors
///
/// Returns `NotConfirmed` without `--yes`, or the store error.
pub async fn clear(token: Option<SecretString>, yes: bool) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::NotConfirmed);
    }

    let ctx = Context::load(token).await?;
    let removed = ctx.state.repository().list(&ctx.credential).await?.len();
    ctx.state.repository().clear_all(&ctx.credential).await?;

    tracing::info!(removed, "All RSVPs cleared");
    Ok(())
}
