//! Outgoing mail via SMTP.
//!
//! Sending is fire-and-forget: [`MailService::send`] logs failures and
//! returns nothing. Without SMTP configuration, messages are logged
//! instead of delivered.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use super::settings::SettingsStore;
use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// No sender address is configured.
    #[error("no sender address configured")]
    NoSender,
}

/// Header overrides for one message.
#[derive(Debug, Clone, Default)]
pub struct MailHeaders {
    pub from: Option<String>,
    pub reply_to: Option<String>,
}

/// Mail delivery service.
#[derive(Clone)]
pub struct MailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    fallback_from: Option<String>,
    settings: SettingsStore,
}

impl MailService {
    /// Create a mail service; `None` config logs messages instead.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&EmailConfig>, settings: SettingsStore) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self::disabled(settings));
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(mailer),
            fallback_from: Some(config.from_address.clone()),
            settings,
        })
    }

    /// A service that only logs.
    #[must_use]
    pub fn disabled(settings: SettingsStore) -> Self {
        Self {
            mailer: None,
            fallback_from: None,
            settings,
        }
    }

    /// Send an HTML message, logging instead of failing.
    pub async fn send(&self, to: &str, subject: &str, html_body: &str, headers: MailHeaders) {
        if let Err(e) = self.try_send(to, subject, html_body, headers).await {
            tracing::warn!(to = %to, subject = %subject, error = %e, "Failed to send email");
        }
    }

    /// Send an HTML message.
    ///
    /// `From` and `Reply-To` default to the `contact_email` setting, then to
    /// the SMTP sender address.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if addresses are invalid or delivery fails.
    pub async fn try_send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        headers: MailHeaders,
    ) -> Result<(), MailError> {
        let contact = self
            .settings
            .get("contact_email")
            .await
            .ok()
            .filter(|email| !email.is_empty())
            .or_else(|| self.fallback_from.clone());

        let Some(mailer) = &self.mailer else {
            tracing::warn!(to = %to, subject = %subject, "SMTP not configured; email not sent");
            return Ok(());
        };

        let message = build_message(to, subject, html_body, headers, contact.as_deref())?;
        mailer.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

/// Assemble a message, applying default `From`/`Reply-To`.
fn build_message(
    to: &str,
    subject: &str,
    html_body: &str,
    headers: MailHeaders,
    default_sender: Option<&str>,
) -> Result<Message, MailError> {
    let from = headers
        .from
        .as_deref()
        .or(default_sender)
        .ok_or(MailError::NoSender)?;
    let reply_to = headers.reply_to.as_deref().or(default_sender).unwrap_or(from);

    let message = Message::builder()
        .from(parse_mailbox(from)?)
        .reply_to(parse_mailbox(reply_to)?)
        .to(parse_mailbox(to)?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body.to_string())?;

    Ok(message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn formatted(message: &Message) -> String {
        String::from_utf8(message.formatted()).unwrap()
    }

    #[test]
    fn test_defaults_from_and_reply_to_to_contact() {
        let message = build_message(
            "guest@example.org",
            "Your reservation",
            "<p>See you soon</p>",
            MailHeaders::default(),
            Some("hello@bistro.test"),
        )
        .unwrap();

        let text = formatted(&message);
        assert!(text.contains("From: hello@bistro.test"));
        assert!(text.contains("Reply-To: hello@bistro.test"));
        assert!(text.contains("To: guest@example.org"));
        assert!(text.contains("Content-Type: text/html"));
    }

    #[test]
    fn test_explicit_headers_override_defaults() {
        let message = build_message(
            "guest@example.org",
            "Hi",
            "<p>Hi</p>",
            MailHeaders {
                from: Some("events@bistro.test".to_string()),
                reply_to: Some("chef@bistro.test".to_string()),
            },
            Some("hello@bistro.test"),
        )
        .unwrap();

        let text = formatted(&message);
        assert!(text.contains("From: events@bistro.test"));
        assert!(text.contains("Reply-To: chef@bistro.test"));
    }

    #[test]
    fn test_no_sender_is_an_error() {
        let result = build_message("guest@example.org", "Hi", "", MailHeaders::default(), None);
        assert!(matches!(result, Err(MailError::NoSender)));
    }

    #[test]
    fn test_invalid_recipient() {
        let result = build_message(
            "not an address",
            "Hi",
            "",
            MailHeaders::default(),
            Some("hello@bistro.test"),
        );
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }
}
