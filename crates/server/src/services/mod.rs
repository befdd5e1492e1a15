//! Business logic services.

pub mod access;
pub mod credentials;
pub mod email;
pub mod submission;

pub use access::AccessGate;
pub use credentials::{CredentialSource, CredentialSources, WriteCredential};
pub use email::{EmailError, EmailService, NotificationParams};
pub use submission::{SubmissionError, SubmissionService};
