//! Mail notifications for sandbox space owners.
//!
//! Renders the embedded templates and hands the result to a
//! `MailSender`. The production sender posts to an HTTP mail relay.

#[cfg(test)]
pub(crate) mod mock;
mod relay;

pub(crate) use relay::RelayMailer;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::cf::resource::{Organization, Space};
use crate::error::{LifecycleError, LifecycleResult};
use crate::templates::{self, TemplateContext};

/// `local@domain`, dotless hosts included.
const ADDR_SPEC: &str = r"[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*";

/// A bare address or `Display Name <address>`; no comments or groups.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"^(?:{ADDR_SPEC}|[^<>"@]*<{ADDR_SPEC}>)$"#))
        .unwrap_or_else(|e| unreachable!("email pattern is valid: {e}"))
});

/// Returns true if `address` is a single mailbox.
pub(crate) fn is_valid_address(address: &str) -> bool {
    EMAIL_RE.is_match(address)
}

/// Errors from the mail transport.
#[derive(Debug, thiserror::Error)]
pub(crate) enum MailError {
    /// Relay could not be reached.
    #[error("mail relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay refused the message.
    #[error("mail relay returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers a rendered mail to a list of recipients.
#[async_trait]
pub(crate) trait MailSender: Send + Sync {
    async fn send(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), MailError>;
}

/// Which template to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateKind {
    /// Space is approaching the purge threshold.
    Notify,
    /// Space has been purged and recreated.
    Purged,
}

impl TemplateKind {
    fn template(self) -> &'static str {
        match self {
            Self::Notify => templates::NOTIFY_TXT,
            Self::Purged => templates::PURGED_TXT,
        }
    }
}

/// Renders and sends notifications from a fixed sender address.
#[derive(Clone)]
pub(crate) struct Notifier {
    mailer: Arc<dyn MailSender>,
    sender: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn MailSender>, sender: impl Into<String>) -> Self {
        Self {
            mailer,
            sender: sender.into(),
        }
    }

    /// Send one mail about `space` to all `recipients`.
    ///
    /// Every recipient must be a valid address. Nothing is sent when the
    /// list is empty or under dry run. Returns true if the mail went out.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_to(
        &self,
        kind: TemplateKind,
        org: &Organization,
        space: &Space,
        days: u32,
        purge_date: NaiveDate,
        recipients: &[String],
        dry_run: bool,
    ) -> LifecycleResult<bool> {
        if let Some(bad) = recipients.iter().find(|r| !is_valid_address(r)) {
            return Err(LifecycleError::InvalidRecipient {
                user: bad.clone(),
                address: bad.clone(),
            });
        }

        if recipients.is_empty() {
            info!(
                "No recipients for {:?} notice on space {} in org {}",
                kind, space.name, org.name
            );
            return Ok(false);
        }

        let mail = templates::render(
            kind.template(),
            &TemplateContext {
                organization: &org.name,
                space: &space.name,
                days,
                purge_date,
            },
        );

        if dry_run {
            info!(
                "[dry run] would send {:?} notice for space {} to {}",
                kind,
                space.name,
                recipients.join(", ")
            );
            debug!("Subject: {}\n{}", mail.subject, mail.body);
            return Ok(false);
        }

        self.mailer
            .send(&self.sender, &mail.subject, &mail.body, recipients)
            .await
            .map_err(|source| LifecycleError::Mail {
                space: space.name.clone(),
                source,
            })?;

        info!(
            "Sent {:?} notice for space {} in org {} to {} recipients",
            kind,
            space.name,
            org.name,
            recipients.len()
        );
        Ok(true)
    }
}
