//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Server
//! - `RSVP_HOST` - Bind address (default: 127.0.0.1)
//! - `RSVP_PORT` - Listen port (default: 5000)
//! - `RSVP_BASE_URL` - Public URL of this API (default: `http://{host}:{port}`)
//! - `RSVP_FRONTEND_URL` - URL guests open; used for the share link and CORS
//! - `RSVP_ACCESS_SECRET` - Shared access secret (unset = open mode)
//! - `RSVP_CONTACT_MODE` - `name_and_email` (default) or `name_only`
//! - `SESSION_IDLE_MINUTES` - Session credential lifetime (default: 60)
//!
//! ## Gist storage
//! - `GITHUB_TOKEN` - Deployment write credential (gist scope)
//! - `GIST_ID` - Existing gist to use before any is created
//! - `GIST_REFERENCE_FILE` - File that remembers the active gist id
//! - `GIST_FILENAME` - File inside the gist (default: rsvps.json)
//! - `GIST_DESCRIPTION` - Description for created gists
//! - `GIST_API_BASE` - API root (default: <https://api.github.com>)
//! - `GIST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//!
//! ## Email (enabled when host, username and password are all set)
//! - `SMTP_HOST`, `SMTP_PORT` (default: 587), `SMTP_USERNAME`, `SMTP_PASSWORD`
//! - `SMTP_TLS` - `starttls` (default) or `none` for local relays
//! - `FROM_EMAIL` - Sender address (default: `SMTP_USERNAME`)
//! - `ADMIN_EMAIL` - Notification recipient (default: `FROM_EMAIL`)
//! - `ADMIN_NAME` - Notification recipient name (default: Party Host)
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use party_rsvp_core::ContactMode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ACCESS_SECRET_LENGTH: usize = 8;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 2.5;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

pub const DEFAULT_GIST_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GIST_FILENAME: &str = "rsvps.json";
pub const DEFAULT_GIST_DESCRIPTION: &str = "Party RSVPs";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// RSVP server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// URL of the guest-facing page
    pub frontend_url: Option<String>,
    /// Shared access secret; `None` means open mode
    pub access_secret: Option<SecretString>,
    /// Which contact fields a submission must carry
    pub contact_mode: ContactMode,
    /// Deployment write credential
    pub github_token: Option<SecretString>,
    /// How long an idle session keeps its credential
    pub session_idle: Duration,
    pub gist: GistConfig,
    pub email: Option<EmailConfig>,
    pub sentry: SentryConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("frontend_url", &self.frontend_url)
            .field("access_secret", &self.access_secret.as_ref().map(|_| "[REDACTED]"))
            .field("contact_mode", &self.contact_mode)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("session_idle", &self.session_idle)
            .field("gist", &self.gist)
            .field("email", &self.email)
            .field("sentry", &self.sentry)
            .finish()
    }
}

/// Gist storage configuration.
#[derive(Debug, Clone)]
pub struct GistConfig {
    /// API root, without trailing slash
    pub api_base: String,
    /// Name of the file holding the document
    pub filename: String,
    /// Description given to created gists
    pub description: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Gist to use before any has been created
    pub gist_id: Option<String>,
    /// File that remembers the active gist across restarts
    pub reference_file: Option<PathBuf>,
}

impl Default for GistConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GIST_API_BASE.to_string(),
            filename: DEFAULT_GIST_FILENAME.to_string(),
            description: DEFAULT_GIST_DESCRIPTION.to_string(),
            timeout: Duration::from_secs(10),
            gist_id: None,
            reference_file: None,
        }
    }
}

/// Transport security for the SMTP relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpSecurity {
    #[default]
    StartTls,
    /// Plain connection, for local relays such as Mailpit.
    None,
}

/// SMTP notification configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub security: SmtpSecurity,
    /// Sender address
    pub from_address: String,
    /// Display name used as the sender
    pub from_name: String,
    /// Notification recipient
    pub admin_address: String,
    pub admin_name: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("security", &self.security)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("admin_address", &self.admin_address)
            .field("admin_name", &self.admin_name)
            .finish()
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is unparseable or the access
    /// secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host: IpAddr = env.parse_or("RSVP_HOST", "127.0.0.1")?;
        let port: u16 = env.parse_or("RSVP_PORT", "5000")?;
        let base_url = env
            .optional("RSVP_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let frontend_url = env.optional("RSVP_FRONTEND_URL");
        if let Some(url) = &frontend_url {
            validate_url(url, "RSVP_FRONTEND_URL")?;
        }

        let access_secret = env.optional("RSVP_ACCESS_SECRET");
        if let Some(reason) = access_secret.as_deref().and_then(access_secret_weakness) {
            tracing::warn!(reason = %reason, "RSVP_ACCESS_SECRET is easy to guess");
        }

        let contact_mode: ContactMode = env.parse_or("RSVP_CONTACT_MODE", "name_and_email")?;
        let idle_minutes: u64 = env.parse_or("SESSION_IDLE_MINUTES", "60")?;
        let idle_secs = idle_minutes.checked_mul(60).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "SESSION_IDLE_MINUTES".to_string(),
                format!("{idle_minutes} minutes is out of range"),
            )
        })?;

        Ok(Self {
            host,
            port,
            base_url,
            frontend_url,
            access_secret: access_secret.map(SecretString::from),
            contact_mode,
            github_token: env.optional("GITHUB_TOKEN").map(SecretString::from),
            session_idle: Duration::from_secs(idle_secs),
            gist: GistConfig::from_env(&env)?,
            email: EmailConfig::from_env(&env)?,
            sentry: SentryConfig::from_env(&env)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Link guests open to reach the form, if a frontend URL is configured.
    #[must_use]
    pub fn share_link(&self) -> Option<String> {
        let frontend = self.frontend_url.as_deref()?.trim_end_matches('/');
        Some(match &self.access_secret {
            Some(secret) => format!("{frontend}/?access={}", secret.expose_secret()),
            None => format!("{frontend}/"),
        })
    }
}

impl GistConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env.parse_or("GIST_TIMEOUT_SECS", "10")?;
        let api_base = env.or_default("GIST_API_BASE", DEFAULT_GIST_API_BASE);
        validate_url(&api_base, "GIST_API_BASE")?;

        Ok(Self {
            api_base,
            filename: env.or_default("GIST_FILENAME", DEFAULT_GIST_FILENAME),
            description: env.or_default("GIST_DESCRIPTION", DEFAULT_GIST_DESCRIPTION),
            timeout: Duration::from_secs(timeout_secs),
            gist_id: env.optional("GIST_ID"),
            reference_file: env.optional("GIST_REFERENCE_FILE").map(PathBuf::from),
        })
    }
}

impl EmailConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let (Some(smtp_host), Some(smtp_username), Some(password)) = (
            env.optional("SMTP_HOST"),
            env.optional("SMTP_USERNAME"),
            env.optional("SMTP_PASSWORD"),
        ) else {
            return Ok(None);
        };

        let security = match env.or_default("SMTP_TLS", "starttls").as_str() {
            "starttls" => SmtpSecurity::StartTls,
            "none" => SmtpSecurity::None,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "SMTP_TLS".to_string(),
                    format!("expected 'starttls' or 'none', got '{other}'"),
                ));
            }
        };

        let from_address = env
            .optional("FROM_EMAIL")
            .unwrap_or_else(|| smtp_username.clone());
        let admin_address = env
            .optional("ADMIN_EMAIL")
            .unwrap_or_else(|| from_address.clone());

        Ok(Some(Self {
            smtp_host,
            smtp_port: env.parse_or("SMTP_PORT", "587")?,
            smtp_username,
            smtp_password: SecretString::from(password),
            security,
            from_address,
            from_name: env.or_default("FROM_NAME", "Party RSVP"),
            admin_address,
            admin_name: env.or_default("ADMIN_NAME", "Party Host"),
        }))
    }
}

impl SentryConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with blank values treated as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Require an absolute http(s) URL.
fn validate_url(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Describe why an access secret looks guessable, if it does.
///
/// Any non-empty secret is accepted; this only feeds a startup warning.
fn access_secret_weakness(secret: &str) -> Option<String> {
    if secret.chars().count() < MIN_ACCESS_SECRET_LENGTH {
        return Some(format!("shorter than {MIN_ACCESS_SECRET_LENGTH} characters"));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Some(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    (entropy < MIN_ENTROPY_BITS_PER_CHAR).then(|| {
        format!("low entropy ({entropy:.2} bits/char, want >= {MIN_ENTROPY_BITS_PER_CHAR:.1})")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert!(config.access_secret.is_none());
        assert_eq!(config.contact_mode, ContactMode::NameAndEmail);
        assert_eq!(config.gist.filename, "rsvps.json");
        assert_eq!(config.gist.timeout, Duration::from_secs(10));
        assert_eq!(config.session_idle, Duration::from_secs(3600));
        assert!(config.email.is_none());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[("RSVP_ACCESS_SECRET", "  "), ("GITHUB_TOKEN", "")]).unwrap();
        assert!(config.access_secret.is_none());
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let err = load(&[("RSVP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "RSVP_PORT"));
    }

    #[test]
    fn test_gist_api_base_must_be_http_url() {
        let err = load(&[("GIST_API_BASE", "ftp://gists.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "GIST_API_BASE"));
        assert!(load(&[("GIST_API_BASE", "not a url")]).is_err());
        assert!(load(&[("GIST_API_BASE", "http://127.0.0.1:9000")]).is_ok());
    }

    #[test]
    fn test_name_only_mode() {
        let config = load(&[("RSVP_CONTACT_MODE", "name_only")]).unwrap();
        assert_eq!(config.contact_mode, ContactMode::NameOnly);
    }

    #[test]
    fn test_email_requires_host_username_and_password() {
        let partial = load(&[("SMTP_HOST", "smtp.test"), ("SMTP_USERNAME", "u")]).unwrap();
        assert!(partial.email.is_none());

        let full = load(&[
            ("SMTP_HOST", "smtp.test"),
            ("SMTP_USERNAME", "host@party.test"),
            ("SMTP_PASSWORD", "pw"),
        ])
        .unwrap();
        let email = full.email.unwrap();
        assert_eq!(email.smtp_port, 587);
        assert_eq!(email.from_address, "host@party.test");
        assert_eq!(email.admin_address, "host@party.test");
        assert_eq!(email.security, SmtpSecurity::StartTls);
    }

    #[test]
    fn test_share_link_includes_access_secret() {
        let config = load(&[
            ("RSVP_FRONTEND_URL", "https://party.test/"),
            ("RSVP_ACCESS_SECRET", "Bday-Kq7z-2025"),
        ])
        .unwrap();
        assert_eq!(
            config.share_link().as_deref(),
            Some("https://party.test/?access=Bday-Kq7z-2025")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("RSVP_ACCESS_SECRET", "Bday-Kq7z-2025"),
            ("GITHUB_TOKEN", "ghp_abcdef123456"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("Bday-Kq7z-2025"));
        assert!(!debug.contains("ghp_abcdef123456"));
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_access_secret_placeholder_flagged() {
        assert!(access_secret_weakness("your-secret-here").is_some());
        assert!(access_secret_weakness("changeme123").is_some());
    }

    #[test]
    fn test_access_secret_low_entropy_flagged() {
        assert!(access_secret_weakness("aaaaaaaaaaaa").is_some());
        assert!(access_secret_weakness("abababab").is_some());
    }

    #[test]
    fn test_access_secret_too_short_flagged() {
        assert!(access_secret_weakness("k7Q!").is_some());
    }

    #[test]
    fn test_access_secret_strong() {
        assert!(access_secret_weakness("Party-2025").is_none());
        assert!(access_secret_weakness("Bday-Kq7z-2025").is_none());
    }

    #[test]
    fn test_weak_access_secrets_still_load() {
        for secret in ["party", "SkyesSecretBash", "Example-Party-2025", "password1"] {
            let config = load(&[("RSVP_ACCESS_SECRET", secret)]).unwrap();
            assert_eq!(
                config.access_secret.as_ref().map(ExposeSecret::expose_secret),
                Some(secret)
            );

            let gate = crate::services::AccessGate::new(secret.to_string());
            assert!(gate.check(Some(secret)));
            assert!(!gate.check(Some(&secret.to_uppercase())));
            assert!(!gate.check(None));
        }
    }

    #[test]
    fn test_session_idle_overflow_is_reported() {
        let minutes = u64::MAX.to_string();
        let err = load(&[("SESSION_IDLE_MINUTES", minutes.as_str())]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref var, _) if var == "SESSION_IDLE_MINUTES"));
    }

    #[test]
    fn test_session_idle_minutes() {
        let config = load(&[("SESSION_IDLE_MINUTES", "15")]).unwrap();
        assert_eq!(config.session_idle, Duration::from_secs(900));
    }
}
