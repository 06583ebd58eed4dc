//! Outgoing email via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. Configuration is
//! loaded from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and delivery is disabled: messages
//! are dropped with a warning instead of failing the caller.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@gatehouse.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default                    |
    /// |-----------------|----------|----------------------------|
    /// | `SMTP_HOST`     | yes      | -                          |
    /// | `SMTP_PORT`     | no       | `587`                      |
    /// | `SMTP_FROM`     | no       | `noreply@gatehouse.local`  |
    /// | `SMTP_USER`     | no       | -                          |
    /// | `SMTP_PASSWORD` | no       | -                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Sends transactional emails, or drops them when SMTP is not configured.
pub struct EmailDelivery {
    mailer: Option<Mailer>,
}

impl EmailDelivery {
    /// Build the transport once. `None` disables delivery.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, EmailError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: Some(Mailer {
                transport: builder.build(),
                from: config.from_address.parse()?,
            }),
        })
    }

    pub fn disabled() -> Self {
        Self { mailer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Send a message with plain-text and HTML alternatives.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let to: Mailbox = to.parse()?;

        let Some(mailer) = &self.mailer else {
            tracing::warn!(subject, "SMTP is not configured, email dropped");
            return Ok(());
        };

        let message = Message::builder()
            .from(mailer.from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                plain_body.to_string(),
                html_body.to_string(),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        mailer.transport.send(message).await?;
        tracing::info!(subject, "Email sent");
        Ok(())
    }

    /// Send the password reset link. The link embeds a live token, so neither
    /// the URL nor the body is ever logged.
    pub async fn forgot_password(&self, to: &str, reset_url: &str) -> Result<(), EmailError> {
        let plain = forgot_password_plain(reset_url);
        let html = forgot_password_html(reset_url);
        self.send(to, "Reset your password", &plain, &html).await
    }
}

fn forgot_password_plain(reset_url: &str) -> String {
    format!(
        "Hi there!\n\n\
         Someone asked to reset the password for this account.\n\
         To choose a new password, open the link below:\n\n\
         {reset_url}\n\n\
         If you did not ask for this, you can ignore this email; your password stays the same.\n"
    )
}

fn forgot_password_html(reset_url: &str) -> String {
    format!(
        "<p>Hi there!</p>\
         <p>Someone asked to reset the password for this account.</p>\
         <p>To choose a new password, <a href=\"{reset_url}\">click here</a>.</p>\
         <p>If you did not ask for this, you can ignore this email; your password stays the same.</p>"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
