//! Run one lifecycle pass: notify aging spaces, purge and recreate old ones.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use colored::Colorize;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::lifecycle::{self, Options, RunSummary};
use crate::notifications::{Notifier, RelayMailer};

/// Flags that override the configuration file.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub dry_run: bool,
    pub disable_purge: bool,
    pub deadline: Option<Duration>,
    pub cf_token: Option<String>,
    pub mail_token: Option<String>,
}

/// Converts `--deadline-mins`; absurdly large values saturate instead of wrapping.
pub fn deadline_from_minutes(mins: u64) -> Duration {
    Duration::from_secs(mins.saturating_mul(60))
}

/// Apply CLI overrides on top of the configured options.
pub(crate) fn effective_options(config: &Config, args: &RunArgs) -> Options {
    let mut options = config.options();
    options.dry_run |= args.dry_run;
    options.disable_purge |= args.disable_purge;
    options
}

/// Format the end-of-run summary.
pub(crate) fn format_summary(summary: &RunSummary, options: &Options) -> String {
    let mut out = String::new();
    let title = if options.dry_run {
        "Sandbox lifecycle dry run finished."
    } else {
        "Sandbox lifecycle run finished."
    };
    let mark = if summary.failures == 0 {
        "✓".green()
    } else {
        "✗".red()
    };
    writeln!(&mut out, "\n{mark} {title}").unwrap();
    writeln!(
        &mut out,
        "  Organizations: {}",
        summary.orgs.to_string().cyan()
    )
    .unwrap();
    writeln!(
        &mut out,
        "  Notified:      {}",
        summary.notified.to_string().cyan()
    )
    .unwrap();
    writeln!(&mut out, "  Purged:        {}", summary.purged.to_string().cyan()).unwrap();
    let failures = if summary.failures == 0 {
        summary.failures.to_string().cyan()
    } else {
        summary.failures.to_string().red().bold()
    };
    writeln!(&mut out, "  Failures:      {failures}").unwrap();
    out
}

/// Entry point for `sandbox-purge run`.
pub async fn run(config: Config, args: RunArgs) -> Result<()> {
    let options = effective_options(&config, &args);
    let client = super::connect(&config, args.cf_token.as_deref())?;

    if config.mail.relay_url.is_empty() && !options.dry_run {
        bail!("mail.relay_url is not configured; notifications cannot be sent");
    }
    if config.mail.relay_url.is_empty() {
        warn!("mail.relay_url is not configured; dry run will only log notifications");
    }
    let mailer = RelayMailer::new(
        config.mail.relay_url.clone(),
        args.mail_token,
        Duration::from_secs(config.cf.timeout_secs),
    )
    .context("Failed to build mail relay client")?;
    let notifier = Notifier::new(Arc::new(mailer), config.mail.sender.clone());

    info!(
        "Starting run: notify after {} days, purge after {} days{}{}",
        options.notify_days,
        options.purge_days,
        if options.disable_purge { ", purge disabled" } else { "" },
        if options.dry_run { ", dry run" } else { "" },
    );

    let summary = super::until_interrupted(
        lifecycle::run(&client, &notifier, &options, Utc::now()),
        args.deadline,
    )
    .await??;

    print!("{}", format_summary(&summary, &options));

    if summary.failures > 0 {
        bail!("{} failures during run", summary.failures);
    }
    Ok(())
}
