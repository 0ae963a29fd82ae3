//! Invitation email delivery via SMTP.
//!
//! [`EmailDelivery`] assembles a `multipart/mixed` message: an HTML body
//! (merged from a template file) related to an inline logo, plus the
//! rendered invitation as an attachment. The finished [`Message`] goes to a
//! [`Mailer`]; [`SmtpMailer`] is the production one.
//!
//! Template and logo are read from disk for every message. Any failure,
//! from asset loading through transport, aborts the whole send.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use invite_core::config_store::ConfigSnapshot;
use invite_core::form::InvitationForm;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::template::merge;

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

    /// The HTML template or logo could not be loaded.
    #[error("Email asset error: {0}")]
    Asset(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTPS port (implicit TLS).
const DEFAULT_SMTP_PORT: u16 = 465;

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_server: String,
    /// SMTP server port (defaults to 465).
    pub smtp_port: u16,
    /// Login user; also used as the `From` address.
    pub smtp_user: String,
    pub smtp_password: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless `SMTP_SERVER`, `SMTP_USER` and `SMTP_PASSWORD`
    /// are all set.
    ///
    /// | Variable        | Required | Default |
    /// |-----------------|----------|---------|
    /// | `SMTP_SERVER`   | yes      | -       |
    /// | `SMTP_PORT`     | no       | `465`   |
    /// | `SMTP_USER`     | yes      | -       |
    /// | `SMTP_PASSWORD` | yes      | -       |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            smtp_server: std::env::var("SMTP_SERVER").ok()?,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_user: std::env::var("SMTP_USER").ok()?,
            smtp_password: std::env::var("SMTP_PASSWORD").ok()?,
        })
    }
}

// ---------------------------------------------------------------------------
// InvitationEmail
// ---------------------------------------------------------------------------

const DEFAULT_TEMPLATE_PATH: &str = "storage/email/template.html";
const DEFAULT_LOGO_PATH: &str = "storage/email/assets/logo.png";
const DEFAULT_SUBJECT: &str = "Приглашение на мероприятие от QuestGuru";
const DEFAULT_ATTACHMENT_NAME: &str = "QuestGuru.jpg";

/// Content-ID the HTML body uses to reference the logo (`cid:logo`).
pub const LOGO_CONTENT_ID: &str = "logo";

/// Fixed parts of every invitation email.
#[derive(Debug, Clone)]
pub struct InvitationEmail {
    /// `From` mailbox.
    pub from_address: String,
    pub subject: String,
    /// Filename of the rendered-image attachment.
    pub attachment_name: String,
    /// HTML template with `{date}`, `{time}`, `{address}`, `{phone}`, `{vk}`,
    /// `{mail}` placeholders.
    pub template_path: PathBuf,
    /// PNG logo embedded inline.
    pub logo_path: PathBuf,
}

impl InvitationEmail {
    /// Load message settings from the environment, sending from `from_address`.
    ///
    /// | Variable                | Default                            |
    /// |-------------------------|------------------------------------|
    /// | `EMAIL_TEMPLATE_PATH`   | `storage/email/template.html`      |
    /// | `EMAIL_LOGO_PATH`       | `storage/email/assets/logo.png`    |
    /// | `EMAIL_SUBJECT`         | `Приглашение на мероприятие от QuestGuru` |
    /// | `EMAIL_ATTACHMENT_NAME` | `QuestGuru.jpg`                    |
    pub fn from_env(from_address: impl Into<String>) -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.into());
        Self {
            from_address: from_address.into(),
            subject: var("EMAIL_SUBJECT", DEFAULT_SUBJECT),
            attachment_name: var("EMAIL_ATTACHMENT_NAME", DEFAULT_ATTACHMENT_NAME),
            template_path: var("EMAIL_TEMPLATE_PATH", DEFAULT_TEMPLATE_PATH).into(),
            logo_path: var("EMAIL_LOGO_PATH", DEFAULT_LOGO_PATH).into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Sends an assembled message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), EmailError>;
}

/// Authenticated implicit-TLS SMTP mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        self.transport.send(message).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Builds and sends invitation emails.
pub struct EmailDelivery {
    settings: InvitationEmail,
    mailer: Arc<dyn Mailer>,
}

impl EmailDelivery {
    pub fn new(settings: InvitationEmail, mailer: Arc<dyn Mailer>) -> Self {
        Self { settings, mailer }
    }

    pub fn settings(&self) -> &InvitationEmail {
        &self.settings
    }

    /// Send the rendered invitation to `form.email`.
    ///
    /// Contacts for `form.city` come from `snapshot`; an unknown city leaves
    /// those fields empty.
    pub async fn deliver(
        &self,
        form: &InvitationForm,
        artifact: Vec<u8>,
        snapshot: &ConfigSnapshot,
    ) -> Result<(), EmailError> {
        let message = self.build_message(form, artifact, snapshot).await?;
        self.mailer.send(message).await?;
        tracing::info!(to = %form.email, city = ?form.city, "Invitation email sent");
        Ok(())
    }

    /// Assemble the full MIME message without sending it.
    pub async fn build_message(
        &self,
        form: &InvitationForm,
        artifact: Vec<u8>,
        snapshot: &ConfigSnapshot,
    ) -> Result<Message, EmailError> {
        let template = tokio::fs::read_to_string(&self.settings.template_path)
            .await
            .map_err(|e| {
                EmailError::Asset(format!(
                    "Email template not found: {}: {e}",
                    self.settings.template_path.display()
                ))
            })?;
        let logo = tokio::fs::read(&self.settings.logo_path).await.map_err(|e| {
            EmailError::Asset(format!(
                "Email logo not found: {}: {e}",
                self.settings.logo_path.display()
            ))
        })?;

        let contact = snapshot.contact(form.city.as_deref());
        let html = merge(
            &template,
            &[
                ("date", form.date.as_str()),
                ("time", form.time.as_str()),
                ("address", form.address.as_str()),
                ("phone", contact.phone.as_str()),
                ("vk", contact.vk.as_str()),
                ("mail", contact.email.as_str()),
            ],
        );

        let png = content_type("image/png")?;
        let octet = content_type("application/octet-stream")?;

        let body = MultiPart::mixed()
            .multipart(
                MultiPart::related()
                    .singlepart(SinglePart::html(html))
                    .singlepart(Attachment::new_inline(LOGO_CONTENT_ID.to_string()).body(logo, png)),
            )
            .singlepart(Attachment::new(self.settings.attachment_name.clone()).body(artifact, octet));

        let from: Mailbox = self.settings.from_address.parse()?;
        let to: Mailbox = form.email.parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.settings.subject.clone())
            .multipart(body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

fn content_type(value: &str) -> Result<ContentType, EmailError> {
    ContentType::parse(value).map_err(|e| EmailError::Build(format!("{value}: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
