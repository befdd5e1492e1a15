//! Guest share link.

use party_rsvp_server::config::{ConfigError, ServerConfig};

use super::CliError;

/// Print `RSVP_FRONTEND_URL/?access=<secret>`.
///
/// # Errors
///
/// Returns error if configuration fails to load or has no frontend URL.
#[allow(clippy::print_stdout)]
pub fn print_link() -> Result<(), CliError> {
    let config = ServerConfig::from_env()?;
    let link = config
        .share_link()
        .ok_or_else(|| ConfigError::MissingEnvVar("RSVP_FRONTEND_URL".to_string()))?;

    if config.access_secret.is_none() {
        tracing::warn!("RSVP_ACCESS_SECRET is not set; anyone with the URL can RSVP");
    }

    println!("{link}");
    Ok(())
}
