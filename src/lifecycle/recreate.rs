//! Purge-and-recreate cycle for a single space.
//!
//! Roles are snapshotted before the space is deleted; the replacement
//! space gets the same name, organization and quota, and the snapshot is
//! replayed against its new guid.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use super::classify::SpaceDetails;
use super::purge::{purge_space, wait_for_space_deletion};
use super::Options;
use crate::cf::resource::{
    Organization, Role, RoleKind, Space, SpaceCreate, SpaceQuota, SpaceRelationships, User,
};
use crate::cf::{CfResourceClient, ListFilter};
use crate::error::{LifecycleError, LifecycleResult};
use crate::notifications::{Notifier, TemplateKind};

/// A user holding a role in the space being purged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SpaceUser {
    pub guid: String,
    pub username: String,
}

/// Developer and manager bindings captured before deletion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RoleSnapshot {
    pub developers: Vec<SpaceUser>,
    pub managers: Vec<SpaceUser>,
}

impl RoleSnapshot {
    /// Distinct usernames across both role kinds, in first-seen order.
    pub fn usernames(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.developers
            .iter()
            .chain(&self.managers)
            .filter(|user| seen.insert(user.guid.as_str()))
            .map(|user| user.username.clone())
            .collect()
    }
}

/// What a purge cycle ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PurgeOutcome {
    /// Dry run: roles were read, nothing was changed.
    DryRun(RoleSnapshot),
    /// The space was replaced by this new one.
    Recreated(Space),
}

/// Buckets the space's roles into developers and managers.
///
/// Roles held by users who are no longer organization members are
/// dropped, and so are roles whose user has no known username.
pub(crate) fn list_space_devs_and_managers(
    user_guids: &HashSet<String>,
    roles: &[Role],
    space_users: &[User],
) -> RoleSnapshot {
    let usernames: HashMap<&str, &str> = space_users
        .iter()
        .filter_map(|user| Some((user.guid.as_str(), user.username.as_deref()?)))
        .filter(|(_, username)| !username.is_empty())
        .collect();

    let mut snapshot = RoleSnapshot::default();
    for role in roles {
        let Some(user_guid) = role.user_guid() else {
            continue;
        };
        if !user_guids.contains(user_guid) {
            continue;
        }

        let Some(username) = usernames.get(user_guid) else {
            warn!(
                "Could not find a username for user guid {} in role {}",
                user_guid, role.kind
            );
            continue;
        };

        let user = SpaceUser {
            guid: user_guid.to_string(),
            username: (*username).to_string(),
        };
        match role.kind {
            RoleKind::SpaceDeveloper => snapshot.developers.push(user),
            RoleKind::SpaceManager => snapshot.managers.push(user),
            RoleKind::Other(_) => {}
        }
    }
    snapshot
}

async fn snapshot_roles(
    client: &CfResourceClient,
    space: &Space,
    user_guids: &HashSet<String>,
) -> LifecycleResult<RoleSnapshot> {
    let space_users = client
        .spaces
        .list_users(&space.guid)
        .await
        .map_err(|e| LifecycleError::list("space users", &space.name, e))?;

    let (roles, _) = client
        .roles
        .list_include_users(&ListFilter::space(&space.guid))
        .await
        .map_err(|e| LifecycleError::list("roles", &space.name, e))?;

    Ok(list_space_devs_and_managers(user_guids, &roles, &space_users))
}

/// Finds the quota to apply to the replacement space.
async fn find_space_quota(
    client: &CfResourceClient,
    options: &Options,
    org: &Organization,
    space: &Space,
) -> LifecycleResult<SpaceQuota> {
    let mut filter = ListFilter::organization(&org.guid);
    if !options.sandbox_quota_name.is_empty() {
        filter = filter.with_name(&options.sandbox_quota_name);
    }

    client
        .space_quotas
        .single(&filter)
        .await
        .map_err(|source| LifecycleError::QuotaLookup {
            quota: options.sandbox_quota_name.clone(),
            space: space.name.clone(),
            org: org.name.clone(),
            source,
        })?
        .ok_or_else(|| LifecycleError::QuotaNotFound {
            quota: options.sandbox_quota_name.clone(),
            space: space.name.clone(),
            org: org.name.clone(),
        })
}

/// Creates the empty replacement space and applies the quota to it.
///
/// The quota is resolved before anything is created so a missing quota
/// leaves no half-configured space behind.
pub(crate) async fn recreate_space(
    client: &CfResourceClient,
    options: &Options,
    org: &Organization,
    details: &SpaceDetails,
) -> LifecycleResult<Space> {
    let old = &details.space;
    let quota = find_space_quota(client, options, org, old).await?;

    let request = SpaceCreate {
        name: old.name.clone(),
        relationships: SpaceRelationships {
            organization: old.relationships.organization.clone(),
            quota: None,
        },
    };

    let space = client
        .spaces
        .create(&request)
        .await
        .map_err(|source| LifecycleError::SpaceCreate {
            space: old.name.clone(),
            org: org.name.clone(),
            source,
        })?;

    client
        .space_quotas
        .apply(&quota.guid, std::slice::from_ref(&space.guid))
        .await
        .map_err(|source| LifecycleError::QuotaApply {
            quota: quota.name.clone(),
            space: space.name.clone(),
            source,
        })?;

    Ok(space)
}

/// Replays the snapshot against the new space. Stops at the first failure.
pub(crate) async fn recreate_space_devs_and_managers(
    client: &CfResourceClient,
    space: &Space,
    snapshot: &RoleSnapshot,
) -> LifecycleResult<()> {
    let bindings = snapshot
        .developers
        .iter()
        .map(|user| (user, RoleKind::SpaceDeveloper))
        .chain(
            snapshot
                .managers
                .iter()
                .map(|user| (user, RoleKind::SpaceManager)),
        );

    for (user, kind) in bindings {
        client
            .roles
            .create_space_role(&space.guid, &user.guid, kind.clone())
            .await
            .map_err(|source| LifecycleError::RoleCreate {
                kind: kind.to_string(),
                user: user.username.clone(),
                space: space.name.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Deletes a space and recreates it empty with the same roles.
///
/// Under dry run only the role snapshot is taken. A failure after the
/// delete leaves the space missing or without users until the next run
/// or an operator steps in.
pub(crate) async fn purge_and_recreate_space(
    client: &CfResourceClient,
    notifier: &Notifier,
    options: &Options,
    user_guids: &HashSet<String>,
    org: &Organization,
    details: &SpaceDetails,
    now: DateTime<Utc>,
) -> LifecycleResult<PurgeOutcome> {
    let space = &details.space;
    let snapshot = snapshot_roles(client, space, user_guids).await?;

    if options.dry_run {
        info!(
            "[dry run] would purge space {} in org {} ({} developers, {} managers)",
            space.name,
            org.name,
            snapshot.developers.len(),
            snapshot.managers.len()
        );
        return Ok(PurgeOutcome::DryRun(snapshot));
    }

    let job_guid = purge_space(client, space).await?;
    wait_for_space_deletion(client, space, &job_guid, &options.polling).await?;
    info!("Deleted space {} in org {}", space.name, org.name);

    let new_space = recreate_space(client, options, org, details).await?;
    recreate_space_devs_and_managers(client, &new_space, &snapshot).await?;
    info!(
        "Recreated space {} in org {} as {}",
        new_space.name, org.name, new_space.guid
    );

    notifier
        .send_to(
            TemplateKind::Purged,
            org,
            &new_space,
            options.purge_days,
            now.date_naive(),
            &snapshot.usernames(),
            options.dry_run,
        )
        .await?;

    Ok(PurgeOutcome::Recreated(new_space))
}
