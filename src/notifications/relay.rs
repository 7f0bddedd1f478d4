use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{MailError, MailSender};

/// Sends mail by POSTing it to an HTTP mail relay.
///
/// Single attempt per message; a failed delivery is reported, not retried.
pub(crate) struct RelayMailer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RelayMailer {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl MailSender for RelayMailer {
    #[allow(tail_expr_drop_order)] // Drop order changes are harmless for HTTP responses
    async fn send(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), MailError> {
        let payload = json!({
            "from": sender,
            "to": recipients,
            "subject": subject,
            "body": body,
        });

        debug!("Posting mail to relay {}: {}", self.url, subject);

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Mail relay accepted message");
        Ok(())
    }
}
