/// Transactional email notifications
///
/// Welcome and cancellation emails are best-effort: handlers spawn the send
/// and log failures, the HTTP response never waits on or reflects delivery.
/// When SMTP credentials are not configured the mailer is constructed
/// disabled and every send is a logged no-op, which keeps local development
/// and tests free of network dependencies.
use lettre::{
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

/// Error type for email operations
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Invalid sender or recipient address
    #[error("Invalid email address: {0}")]
    Address(String),

    /// Failed to build the message
    #[error("Failed to build email: {0}")]
    Build(String),

    /// SMTP transport setup failed
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// Sending failed
    #[error("Failed to send email: {0}")]
    Send(String),
}

/// SMTP settings for outbound mail
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,

    /// SMTP username
    pub smtp_username: String,

    /// SMTP password / API key
    pub smtp_password: String,

    /// Sender address for all notifications
    pub from: String,
}

/// Outbound mail client
///
/// Cheap to clone; the SMTP transport pools connections internally.
#[derive(Clone)]
pub struct Mailer {
    inner: Option<MailerInner>,
}

#[derive(Clone)]
struct MailerInner {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    /// Creates a mailer from SMTP settings
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| EmailError::Address(format!("Invalid from address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .credentials(Credentials::new(config.smtp_username, config.smtp_password))
            .build();

        Ok(Self {
            inner: Some(MailerInner { transport, from }),
        })
    }

    /// Creates a mailer that drops every message
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether a transport is configured
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Sends the post-registration welcome email
    pub async fn send_welcome(&self, email: &str, name: &str) -> Result<(), EmailError> {
        self.send(
            email,
            "Welcome!",
            format!(
                "Welcome to the app, {}. Let me know how you like, or don't like, things.",
                name
            ),
        )
        .await
    }

    /// Sends the account-cancellation email
    pub async fn send_cancellation(&self, email: &str, name: &str) -> Result<(), EmailError> {
        self.send(
            email,
            "Sorry to see you go",
            format!(
                "{}, your account has been deleted. Let us know if there is anything \
                 that could have kept you on board.",
                name
            ),
        )
        .await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), EmailError> {
        let Some(inner) = &self.inner else {
            debug!(to, subject, "Email disabled, dropping message");
            return Ok(());
        };

        let to: Mailbox = to
            .parse()
            .map_err(|e| EmailError::Address(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(inner.from.clone())
            .to(to)
            .subject(subject)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        inner
            .transport
            .send(message)
            .await
            .map_err(|e| EmailError::Send(e.to_string()))?;

        Ok(())
    }
}
