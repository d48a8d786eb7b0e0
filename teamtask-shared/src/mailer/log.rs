use async_trait::async_trait;

use super::{Mailer, MailerError, Message};

/// Mailer that only logs
///
/// Used when no mail API is configured. Always succeeds.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &Message) -> Result<(), MailerError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail (log transport)"
        );
        Ok(())
    }
}
