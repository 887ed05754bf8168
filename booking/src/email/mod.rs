//! Email providers for confirmation delivery.
//!
//! - [`ConsoleEmailProvider`]: prints messages, for development
//! - [`SmtpEmailProvider`]: delivers through an SMTP relay with `lettre`

mod console;
mod smtp;

pub use console::ConsoleEmailProvider;
pub use smtp::SmtpEmailProvider;

use crate::config::{EmailConfig, EmailProviderKind};
use std::sync::Arc;
use tree_farm_core::{EmailError, EmailProvider};

/// Build the provider selected by `EMAIL_PROVIDER`.
///
/// # Errors
///
/// Returns [`EmailError::InvalidMessage`] if the SMTP sender address is invalid
/// or [`EmailError::Delivery`] if the relay cannot be configured.
pub fn build_provider(config: &EmailConfig) -> Result<Arc<dyn EmailProvider>, EmailError> {
    match config.provider {
        EmailProviderKind::Console => Ok(Arc::new(ConsoleEmailProvider::new())),
        EmailProviderKind::Smtp => Ok(Arc::new(SmtpEmailProvider::from_config(config)?)),
    }
}
