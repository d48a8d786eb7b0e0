/// Mail API transport over HTTPS
///
/// Sends `POST {api_url}` with `Authorization: Bearer {api_key}` and a JSON
/// body:
///
/// ```json
/// { "from": "no-reply@teamtask.local", "to": ["a@b.c"], "subject": "...", "text": "..." }
/// ```
///
/// Any 2xx response is a success. Other statuses map to
/// [`MailerError::Rejected`]; connection failures and timeouts map to
/// [`MailerError::Transport`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Mailer, MailerError, Message};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Mail API connection settings
#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Serialize)]
struct SendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Mailer backed by an HTTP mail API
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    config: HttpMailerConfig,
}

impl HttpMailer {
    /// Builds the HTTP client
    ///
    /// # Errors
    ///
    /// Returns `MailerError::Transport` if the TLS backend cannot be initialized
    pub fn new(config: HttpMailerConfig) -> Result<Self, MailerError> {
        let client = Client::builder()
            .user_agent(concat!("teamtask/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailerError::Transport(format!("build client failed: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &Message) -> Result<(), MailerError> {
        let payload = SendEmail {
            from: &self.config.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to = %message.to, subject = %message.subject, "mail accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(to = %message.to, status = status.as_u16(), "mail API rejected message");

        Err(MailerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
