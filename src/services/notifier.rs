//! Contact message notification delivery.
//!
//! Persisting a contact message must never fail because notifying the site
//! owner failed, so delivery is fire-and-forget behind this trait. The
//! default implementation writes a structured log line; an SMTP or webhook
//! implementation can be swapped in without touching the routes.

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub ip_address: Option<String>,
}

pub trait ContactNotifier: Send + Sync {
    fn notify(&self, message: ContactMessage);
}

/// Notifier that records incoming contact messages in the application log.
#[derive(Default)]
pub struct LogNotifier;

impl ContactNotifier for LogNotifier {
    fn notify(&self, message: ContactMessage) {
        info!(
            name = %message.name,
            email = %message.email,
            subject = %message.subject,
            ip = message.ip_address.as_deref().unwrap_or("unknown"),
            "New contact message received"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingNotifier {
        delivered: Arc<AtomicUsize>,
    }

    impl ContactNotifier for CountingNotifier {
        fn notify(&self, _message: ContactMessage) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_notifier_is_swappable() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let notifier: Arc<dyn ContactNotifier> = Arc::new(CountingNotifier {
            delivered: delivered.clone(),
        });

        notifier.notify(ContactMessage {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Nice site".to_string(),
            ip_address: None,
        });

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_log_notifier_does_not_panic() {
        LogNotifier.notify(ContactMessage {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            subject: "Hi".to_string(),
            message: "Test".to_string(),
            ip_address: Some("10.0.0.1".to_string()),
        });
    }
}
