//! Shared-secret access gate.
//!
//! Guests reach the RSVP form through a link carrying `?access=<secret>`; the
//! admin endpoints use the same secret. With no secret configured the gate is
//! open, which keeps secret-less deployments working.

use secrecy::{ExposeSecret, SecretString};

/// Binary admission check against the configured access secret.
#[derive(Clone)]
pub struct AccessGate {
    secret: Option<SecretString>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("open", &self.is_open())
            .finish()
    }
}

impl AccessGate {
    /// Build a gate from the resolved secret. An empty string means open mode.
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self {
            secret: Some(secret)
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
        }
    }

    /// A gate that admits everyone.
    #[must_use]
    pub const fn open() -> Self {
        Self { secret: None }
    }

    /// Whether no secret is configured.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.secret.is_none()
    }

    /// Admit `provided` if it matches exactly, or if the gate is open.
    ///
    /// The comparison is case-sensitive and does not trim.
    #[must_use]
    pub fn check(&self, provided: Option<&str>) -> bool {
        match &self.secret {
            None => true,
            Some(expected) => provided.is_some_and(|p| p == expected.expose_secret()),
        }
    }
}
