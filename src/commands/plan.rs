//! Show which sandbox spaces would be notified or purged, without acting.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use std::fmt::Write;

use crate::config::Config;
use crate::lifecycle::{self, Options, OrgPlan, SpaceDetails};

fn format_space(out: &mut String, details: &SpaceDetails, days: u32, label: &str) {
    let due = details.timestamp + Duration::days(i64::from(days));
    writeln!(
        out,
        "    {} {:<30} first resource {}  {} {}",
        "•".dimmed(),
        details.space.name,
        details.timestamp.format("%Y-%m-%d"),
        label,
        due.format("%Y-%m-%d").to_string().cyan()
    )
    .unwrap();
}

/// Format the classification of every sandbox organization.
pub(crate) fn format_plan(plans: &[OrgPlan], options: &Options, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "\n{}",
        format!("Sandbox plan as of {}", now.format("%Y-%m-%d")).yellow().bold()
    )
    .unwrap();

    if plans.is_empty() {
        writeln!(
            &mut out,
            "\n{} No organizations match prefix {:?}.",
            "ℹ".blue(),
            options.org_prefix
        )
        .unwrap();
        return out;
    }

    for plan in plans {
        writeln!(&mut out, "\n  {}", plan.org.name.bold()).unwrap();
        let c = match &plan.classification {
            Ok(c) => c,
            Err(e) => {
                writeln!(&mut out, "    {} {}", "✗ could not be read:".red(), e).unwrap();
                continue;
            }
        };
        if c.to_notify.is_empty() && c.to_purge.is_empty() {
            writeln!(&mut out, "    {}", "nothing due".dimmed()).unwrap();
            continue;
        }
        for details in &c.to_purge {
            format_space(&mut out, details, options.purge_days, &"purge".red().to_string());
        }
        for details in &c.to_notify {
            format_space(&mut out, details, options.purge_days, &"notify, purge on".yellow().to_string());
        }
    }

    if options.disable_purge {
        writeln!(&mut out, "\n{} Purging is disabled.", "ℹ".blue()).unwrap();
    }
    out
}

/// Entry point for `sandbox-purge plan`.
pub async fn run(config: Config, cf_token: Option<String>) -> Result<()> {
    let options = config.options();
    let client = super::connect(&config, cf_token.as_deref())?;
    let now = Utc::now();

    let plans =
        super::until_interrupted(lifecycle::plan(&client, &options, now), None).await??;

    print!("{}", format_plan(&plans, &options, now));

    let unreadable = plans.iter().filter(|p| p.classification.is_err()).count();
    if unreadable > 0 {
        bail!("{unreadable} organizations could not be read");
    }
    Ok(())
}
