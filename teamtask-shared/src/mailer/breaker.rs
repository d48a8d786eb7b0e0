use async_trait::async_trait;
use std::sync::Arc;

use super::{Mailer, MailerError, Message};
use crate::breaker::{BreakerError, CircuitBreaker};

/// Mailer guarded by a circuit breaker
///
/// While the breaker rejects calls the inner mailer is not invoked and
/// [`MailerError::BreakerOpen`] is returned.
#[derive(Debug)]
pub struct BreakerMailer<M> {
    inner: M,
    breaker: Arc<CircuitBreaker>,
}

impl<M: Mailer> BreakerMailer<M> {
    pub fn new(inner: M, breaker: Arc<CircuitBreaker>) -> Self {
        Self { inner, breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl<M: Mailer> Mailer for BreakerMailer<M> {
    async fn send(&self, message: &Message) -> Result<(), MailerError> {
        self.breaker
            .call(self.inner.send(message))
            .await
            .map_err(|e| match e {
                BreakerError::Inner(err) => err,
                BreakerError::Open | BreakerError::TooManyRequests => {
                    tracing::warn!(to = %message.to, "mail short-circuited by breaker");
                    MailerError::BreakerOpen
                }
            })
    }
}
