//! Email notifications for new RSVPs.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain-text
//! templates. Sending is best-effort: the submission workflow logs failures
//! and moves on.

use std::time::Duration;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use party_rsvp_core::Record;
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::{EmailConfig, SmtpSecurity};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Flattened view of a record handed to the notification templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationParams {
    pub to_email: String,
    pub to_name: String,
    pub from_name: String,
    pub from_email: String,
    pub child_name: String,
    pub going: String,
    pub num_adults: u32,
    pub num_kids: u32,
    pub total_people: u32,
    pub message: String,
    pub submitted_at: String,
    pub subject: String,
}

impl NotificationParams {
    /// Build template parameters for `record`, addressed to the admin.
    #[must_use]
    pub fn for_record(record: &Record, to_email: &str, to_name: &str) -> Self {
        let from_name = record
            .contact_name
            .clone()
            .unwrap_or_else(|| "Guest".to_string());
        let verdict = if record.attending { "Going" } else { "Not going" };

        Self {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject: format!("New RSVP from {from_name}: {verdict}"),
            from_name,
            from_email: record
                .contact_email
                .clone()
                .unwrap_or_else(|| "No email provided".to_string()),
            child_name: record.child_name.clone().unwrap_or_else(|| "N/A".to_string()),
            going: if record.attending {
                "Yes, going!".to_string()
            } else {
                "No, cannot attend".to_string()
            },
            num_adults: record.adult_count,
            num_kids: record.kid_count,
            total_people: record.party_size(),
            message: record.note.clone().unwrap_or_else(|| "No message".to_string()),
            submitted_at: record
                .created_at
                .format("%b %-d, %Y, %-I:%M %p UTC")
                .to_string(),
        }
    }
}

/// HTML template for the RSVP notification.
#[derive(Template)]
#[template(path = "email/rsvp_notification.html")]
struct RsvpNotificationHtml<'a> {
    p: &'a NotificationParams,
}

/// Plain text template for the RSVP notification.
#[derive(Template)]
#[template(path = "email/rsvp_notification.txt")]
struct RsvpNotificationText<'a> {
    p: &'a NotificationParams,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends RSVP notifications to the party host.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    from_name: String,
    admin_address: String,
    admin_name: String,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from_address", &self.from_address)
            .field("admin_address", &self.admin_address)
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the relay's TLS parameters cannot be built.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let builder = match config.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            }
        };

        let mailer = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
            admin_address: config.admin_address.clone(),
            admin_name: config.admin_name.clone(),
        })
    }

    /// Template parameters for a notification about `record`.
    #[must_use]
    pub fn params_for(&self, record: &Record) -> NotificationParams {
        NotificationParams::for_record(record, &self.admin_address, &self.admin_name)
    }

    /// Notify the host about a new RSVP.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn send_rsvp_notification(&self, record: &Record) -> Result<(), EmailError> {
        let params = self.params_for(record);
        let html = RsvpNotificationHtml { p: &params }.render()?;
        let text = RsvpNotificationText { p: &params }.render()?;

        self.send_multipart_email(&params.to_email, &params.subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let from = Mailbox::new(
            Some(self.from_name.clone()),
            self.from_address
                .parse()
                .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
        );

        let email = Message::builder()
            .from(from)
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
