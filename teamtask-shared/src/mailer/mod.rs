//! Outbound mail
//!
//! Services send mail through the [`Mailer`] trait and never know which
//! transport sits behind it.
//!
//! # Transports
//!
//! - [`HttpMailer`]: POSTs JSON to a mail API with bearer auth
//! - [`LogMailer`]: writes messages to the log (no mail API configured)
//! - [`MockMailer`]: records messages in memory; used by tests
//! - [`BreakerMailer`]: wraps any mailer with a [`CircuitBreaker`](crate::breaker::CircuitBreaker)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use teamtask_shared::breaker::{BreakerConfig, CircuitBreaker};
//! use teamtask_shared::mailer::{BreakerMailer, Mailer, Message, MockMailer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mock = Arc::new(MockMailer::new());
//! let breaker = Arc::new(CircuitBreaker::new("mailer", BreakerConfig::default()));
//! let mailer = BreakerMailer::new(mock.clone(), breaker);
//!
//! mailer.send(&Message::welcome("a@b.c")).await?;
//! assert_eq!(mock.messages().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod http;
pub mod log;
pub mod mock;

pub use breaker::BreakerMailer;
pub use http::{HttpMailer, HttpMailerConfig};
pub use log::LogMailer;
pub use mock::MockMailer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Plain-text mail message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Sent after a successful registration
    pub fn welcome(to: impl Into<String>) -> Self {
        Self::new(to, "Welcome to TeamTask", "Your registration was successful")
    }

    /// Carries a team invitation code
    pub fn invitation(to: impl Into<String>, code: &str) -> Self {
        Self::new(to, "Team invitation", format!("Your invitation code: {}", code))
    }
}

/// Mail delivery failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailerError {
    /// Request never got a response
    #[error("mail transport error: {0}")]
    Transport(String),

    /// Mail API answered with a non-success status
    #[error("mail API rejected message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Circuit breaker short-circuited the send
    #[error("mail circuit breaker is open")]
    BreakerOpen,

    #[error("mail delivery failed: {0}")]
    Failed(String),
}

/// Sends mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), MailerError>;
}

#[async_trait]
impl<M> Mailer for Arc<M>
where
    M: Mailer + ?Sized,
{
    async fn send(&self, message: &Message) -> Result<(), MailerError> {
        (**self).send(message).await
    }
}
