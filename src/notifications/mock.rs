//! Recording mail transport for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{MailError, MailSender};

/// One mail handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentMail {
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// A mail transport that records instead of sending.
#[derive(Debug, Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl RecordingMailer {
    /// Create a transport whose every send is rejected.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Mails sent so far.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Rejected {
                status: 503,
                body: "relay unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMail {
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}
