//! SMTP email provider implementation using Lettre.

use crate::config::EmailConfig;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tree_farm_core::EmailError;
use tree_farm_core::email::{EmailFuture, EmailMessage, EmailProvider};

/// SMTP email provider using Lettre.
///
/// Sends a `multipart/alternative` message (plain text and HTML) through a
/// STARTTLS relay. The transport pools connections and is shared by clones.
///
/// # Configuration
///
/// - `SMTP_HOST` / `SMTP_PORT`: relay address (usually port 587)
/// - `SMTP_USERNAME` / `SMTP_PASSWORD`: credentials, omitted when the username is empty
/// - `SENDER_ADDRESS` / `SENDER_NAME`: the "From" mailbox
#[derive(Clone)]
pub struct SmtpEmailProvider {
    /// Pooled async transport.
    transport: AsyncSmtpTransport<Tokio1Executor>,

    /// Sender mailbox.
    from: Mailbox,
}

impl SmtpEmailProvider {
    /// Create a provider from the email configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidMessage`] if the sender address is invalid,
    /// or [`EmailError::Delivery`] if the relay cannot be configured.
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        let address: Address = config
            .sender_address
            .parse()
            .map_err(|e| EmailError::InvalidMessage(format!("Invalid sender address: {e}")))?;
        let from = Mailbox::new(Some(config.sender_name.clone()), address);

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Delivery(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Build the lettre message.
    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| EmailError::InvalidMessage(format!("Invalid to address: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.plain_text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| EmailError::InvalidMessage(format!("Failed to build email: {e}")))
    }
}

impl std::fmt::Debug for SmtpEmailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEmailProvider")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl EmailProvider for SmtpEmailProvider {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> EmailFuture<'a> {
        Box::pin(async move {
            let email = self.build_message(message)?;

            self.transport
                .send(email)
                .await
                .map_err(|e| EmailError::Delivery(format!("Failed to send email: {e}")))?;

            tracing::info!(to = %message.to, "Confirmation email delivered");
            Ok(())
        })
    }
}
