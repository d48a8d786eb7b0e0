/// In-memory mailer for tests
///
/// Records every message it is asked to send. A configured error is returned
/// instead of recording until [`MockMailer::reset`] clears it.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::{Mailer, MailerError, Message};

#[derive(Debug, Default)]
struct State {
    messages: Vec<Message>,
    error: Option<MailerError>,
}

/// Recording mailer
#[derive(Debug, Default)]
pub struct MockMailer {
    state: Mutex<State>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the messages sent so far
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Makes every following send fail with `error`
    pub fn set_error(&self, error: MailerError) {
        self.lock().error = Some(error);
    }

    /// Clears recorded messages and any configured error
    pub fn reset(&self) {
        let mut state = self.lock();
        state.messages.clear();
        state.error = None;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: &Message) -> Result<(), MailerError> {
        let mut state = self.lock();
        if let Some(error) = &state.error {
            return Err(error.clone());
        }

        state.messages.push(message.clone());
        Ok(())
    }
}
