//! Console email provider for development and testing.

use tracing::info;
use tree_farm_core::email::{EmailFuture, EmailMessage, EmailProvider};

/// Console email provider.
///
/// Logs messages instead of sending them. Useful for development where you
/// don't want to send real emails.
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailProvider;

impl ConsoleEmailProvider {
    /// Create a new console email provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EmailProvider for ConsoleEmailProvider {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> EmailFuture<'a> {
        Box::pin(async move {
            info!(
                to = %message.to,
                subject = %message.subject,
                "📧 Confirmation Email (Development Mode)"
            );
            println!("\n╔══════════════════════════════════════════════════════════════╗");
            println!("║                  CONFIRMATION EMAIL                          ║");
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!("║ To: {:<57}║", message.to);
            println!("║ Subject: {:<52}║", message.subject);
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!("║ {:<61}║", message.plain_text);
            println!("╚══════════════════════════════════════════════════════════════╝\n");

            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_provider_always_succeeds() {
        let provider = ConsoleEmailProvider::new();
        let message = EmailMessage {
            to: "a@b.com".to_string(),
            subject: "Reservation confirmation".to_string(),
            plain_text: "This is the confirmation".to_string(),
            html: "<p>This is the confirmation</p>".to_string(),
        };

        assert!(provider.send(&message).await.is_ok());
    }
}
