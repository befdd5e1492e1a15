//! Write-credential and access-secret resolution.
//!
//! The GitHub token used for store calls can come from four places, checked
//! in this order:
//!
//! 1. the current request (`?token=`)
//! 2. the caller's session (set via `PUT /api/session/credential`)
//! 3. runtime configuration (`GITHUB_TOKEN`)
//! 4. the build environment (`RSVP_BUILD_GITHUB_TOKEN`, baked in at compile time)
//!
//! This lets an operator override a baked-in token for one browser session
//! without redeploying, while a bare deployment still works out of the box.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Token captured from the build environment, if any.
pub const BUILD_TOKEN: Option<&str> = option_env!("RSVP_BUILD_GITHUB_TOKEN");

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Request,
    Session,
    Config,
    Build,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Session => write!(f, "session"),
            Self::Config => write!(f, "config"),
            Self::Build => write!(f, "build"),
        }
    }
}

/// The effective credential for remote store calls.
#[derive(Clone)]
pub struct WriteCredential {
    secret: SecretString,
    source: CredentialSource,
}

impl WriteCredential {
    #[must_use]
    pub const fn new(secret: SecretString, source: CredentialSource) -> Self {
        Self { secret, source }
    }

    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub const fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for WriteCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteCredential")
            .field("secret", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

type Lookup = fn(&CredentialSources) -> Option<&str>;

/// Resolution order. First non-blank value wins.
const CHAIN: [(CredentialSource, Lookup); 4] = [
    (CredentialSource::Request, from_request),
    (CredentialSource::Session, from_session),
    (CredentialSource::Config, from_config),
    (CredentialSource::Build, from_build),
];

fn from_request(s: &CredentialSources) -> Option<&str> {
    s.request.as_ref().map(ExposeSecret::expose_secret)
}

fn from_session(s: &CredentialSources) -> Option<&str> {
    s.session.as_ref().map(ExposeSecret::expose_secret)
}

fn from_config(s: &CredentialSources) -> Option<&str> {
    s.config.as_ref().map(ExposeSecret::expose_secret)
}

const fn from_build(s: &CredentialSources) -> Option<&str> {
    s.build
}

/// Every candidate credential visible to one request.
#[derive(Clone, Default)]
pub struct CredentialSources {
    pub request: Option<SecretString>,
    pub session: Option<SecretString>,
    pub config: Option<SecretString>,
    pub build: Option<&'static str>,
}

impl fmt::Debug for CredentialSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSources")
            .field("request", &self.request.is_some())
            .field("session", &self.session.is_some())
            .field("config", &self.config.is_some())
            .field("build", &self.build.is_some())
            .finish()
    }
}

impl CredentialSources {
    /// Sources available outside a request: configuration and build only.
    #[must_use]
    pub fn from_deployment(config: Option<SecretString>) -> Self {
        Self {
            request: None,
            session: None,
            config,
            build: BUILD_TOKEN,
        }
    }

    /// Walk the chain and return the first non-blank credential.
    #[must_use]
    pub fn resolve_write_credential(&self) -> Option<WriteCredential> {
        CHAIN.iter().find_map(|(source, lookup)| {
            lookup(self)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| WriteCredential::new(SecretString::from(value.to_owned()), *source))
        })
    }
}

/// Effective access secret; an empty string means open mode.
#[must_use]
pub fn resolve_access_secret(configured: Option<&SecretString>) -> String {
    configured
        .map(|s| s.expose_secret().to_owned())
        .unwrap_or_default()
}
