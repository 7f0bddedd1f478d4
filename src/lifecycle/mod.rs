//! Sandbox lifecycle engine.
//!
//! Walks every sandbox organization and each of its spaces in turn:
//! - `inventory`: read organizations, spaces, apps and service instances
//! - `classify`: age each space and pick notify or purge
//! - `notify`: warn developers and managers ahead of a purge
//! - `purge` / `recreate`: delete a space and recreate it empty
//!
//! A failure stops the current space (or organization, for inventory
//! reads) and the run moves on.

mod classify;
mod inventory;
mod notify;
mod purge;
mod recreate;

pub(crate) use classify::{Classification, SpaceDetails};

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::cf::resource::Organization;
use crate::cf::{CfResourceClient, PollingOptions};
use crate::error::{LifecycleError, LifecycleResult};
use crate::notifications::Notifier;

use classify::list_purge_spaces;
use inventory::{list_org_resources, list_org_user_guids, list_sandbox_orgs};
use notify::notify_space;
use recreate::{purge_and_recreate_space, PurgeOutcome};

/// Settings the engine acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Options {
    pub notify_days: u32,
    pub purge_days: u32,
    pub disable_purge: bool,
    pub dry_run: bool,
    /// Preferred quota for recreated spaces; empty matches any quota in the org.
    pub sandbox_quota_name: String,
    /// Resources older than this count as created at this time.
    pub time_starts_at: DateTime<Utc>,
    pub org_prefix: String,
    pub polling: PollingOptions,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub orgs: usize,
    pub notified: usize,
    pub purged: usize,
    pub failures: usize,
}

/// Classification of one organization, for reporting.
///
/// Holds the inventory error when the organization could not be read.
#[derive(Debug)]
pub(crate) struct OrgPlan {
    pub org: Organization,
    pub classification: LifecycleResult<Classification>,
}

fn log_failure(action: &str, e: &LifecycleError) {
    match e.hint() {
        Some(hint) => error!("{action}: {e} ({hint})"),
        None => error!("{action}: {e}"),
    }
}

/// Runs one full lifecycle pass over all sandbox organizations.
///
/// Only failing to list organizations aborts the run.
pub(crate) async fn run(
    client: &CfResourceClient,
    notifier: &Notifier,
    options: &Options,
    now: DateTime<Utc>,
) -> LifecycleResult<RunSummary> {
    let orgs = list_sandbox_orgs(client, &options.org_prefix).await?;
    info!(
        "Found {} sandbox organizations with prefix {:?}",
        orgs.len(),
        options.org_prefix
    );

    let mut summary = RunSummary::default();
    for org in &orgs {
        summary.orgs += 1;
        if let Err(e) = process_org(client, notifier, options, org, now, &mut summary).await {
            log_failure(&format!("Skipping org {}", org.name), &e);
            summary.failures += 1;
        }
    }

    info!(
        "Run finished: {} orgs, {} notified, {} purged, {} failures",
        summary.orgs, summary.notified, summary.purged, summary.failures
    );
    Ok(summary)
}

async fn process_org(
    client: &CfResourceClient,
    notifier: &Notifier,
    options: &Options,
    org: &Organization,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> LifecycleResult<()> {
    let user_guids = list_org_user_guids(client, org).await?;
    let resources = list_org_resources(client, org).await?;
    let classification = list_purge_spaces(
        &resources.spaces,
        &resources.apps,
        &resources.instances,
        options,
        now,
    );

    info!(
        "Org {}: {} spaces, {} to notify, {} to purge",
        org.name,
        resources.spaces.len(),
        classification.to_notify.len(),
        classification.to_purge.len()
    );

    for details in &classification.to_notify {
        match notify_space(client, notifier, options, &user_guids, org, details).await {
            Ok(true) => summary.notified += 1,
            Ok(false) => {}
            Err(e) => {
                let action = format!("Failed to notify space {} in org {}", details.space.name, org.name);
                log_failure(&action, &e);
                summary.failures += 1;
            }
        }
    }

    for details in &classification.to_purge {
        match purge_and_recreate_space(client, notifier, options, &user_guids, org, details, now)
            .await
        {
            Ok(PurgeOutcome::Recreated(_)) => summary.purged += 1,
            Ok(PurgeOutcome::DryRun(_)) => {}
            Err(e) => {
                let action = format!("Failed to purge space {} in org {}", details.space.name, org.name);
                log_failure(&action, &e);
                summary.failures += 1;
            }
        }
    }

    Ok(())
}

/// Classifies every sandbox space without changing anything.
///
/// An organization whose inventory cannot be read is reported with its
/// error; only failing to list organizations fails the plan.
pub(crate) async fn plan(
    client: &CfResourceClient,
    options: &Options,
    now: DateTime<Utc>,
) -> LifecycleResult<Vec<OrgPlan>> {
    let mut plans = Vec::new();
    for org in list_sandbox_orgs(client, &options.org_prefix).await? {
        let classification = list_org_resources(client, &org)
            .await
            .map(|resources| {
                list_purge_spaces(
                    &resources.spaces,
                    &resources.apps,
                    &resources.instances,
                    options,
                    now,
                )
            })
            .inspect_err(|e| log_failure(&format!("Skipping org {}", org.name), e));
        plans.push(OrgPlan {
            org,
            classification,
        });
    }
    Ok(plans)
}
