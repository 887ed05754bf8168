//! Recording email provider.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tree_farm_core::email::{EmailFuture, EmailMessage, EmailProvider};
use tree_farm_core::EmailError;

/// Mock email provider for testing.
///
/// Records every delivered message. Failure can be toggled at runtime and an
/// optional delay simulates a slow relay. Clones share state.
#[derive(Clone, Debug)]
pub struct MockEmailProvider {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    attempts: Arc<AtomicUsize>,
    should_succeed: Arc<AtomicBool>,
    delay: Option<Duration>,
}

impl MockEmailProvider {
    /// Create a mock provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            should_succeed: Arc::new(AtomicBool::new(true)),
            delay: None,
        }
    }

    /// Create a mock provider that fails every delivery.
    #[must_use]
    pub fn failing() -> Self {
        let provider = Self::new();
        provider.set_should_succeed(false);
        provider
    }

    /// Delay every delivery by `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Simulate success or failure for subsequent deliveries.
    pub fn set_should_succeed(&self, should_succeed: bool) {
        self.should_succeed.store(should_succeed, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of messages delivered so far.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Number of delivery attempts, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for MockEmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailProvider for MockEmailProvider {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> EmailFuture<'a> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.attempts.fetch_add(1, Ordering::SeqCst);
            if !self.should_succeed.load(Ordering::SeqCst) {
                return Err(EmailError::Delivery("mock relay rejected the message".to_string()));
            }

            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        })
    }
}
