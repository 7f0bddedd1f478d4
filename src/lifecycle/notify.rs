//! Warnings for spaces approaching the purge threshold.

use chrono::Duration;
use std::collections::HashSet;

use super::classify::SpaceDetails;
use super::Options;
use crate::cf::resource::{Organization, Role, RoleKind, User};
use crate::cf::{CfResourceClient, ListFilter};
use crate::error::{LifecycleError, LifecycleResult};
use crate::notifications::{is_valid_address, Notifier, TemplateKind};

/// Email addresses of the space's current developers and managers.
///
/// Users who left the organization are skipped. A malformed or missing
/// username fails the whole list.
pub(crate) fn list_recipients(
    user_guids: &HashSet<String>,
    roles: &[Role],
    users: &[User],
) -> LifecycleResult<Vec<String>> {
    let holders: HashSet<&str> = roles
        .iter()
        .filter(|role| matches!(role.kind, RoleKind::SpaceDeveloper | RoleKind::SpaceManager))
        .filter_map(Role::user_guid)
        .filter(|guid| user_guids.contains(*guid))
        .collect();

    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    for user in users {
        if !holders.contains(user.guid.as_str()) || !seen.insert(user.guid.as_str()) {
            continue;
        }

        let address = user.username.clone().unwrap_or_default();
        if !is_valid_address(&address) {
            return Err(LifecycleError::InvalidRecipient {
                user: user.guid.clone(),
                address,
            });
        }
        addresses.push(address);
    }
    Ok(addresses)
}

/// Warns the space's developers and managers of the upcoming purge.
///
/// Returns false when no mail went out (dry run, or nobody to tell).
pub(crate) async fn notify_space(
    client: &CfResourceClient,
    notifier: &Notifier,
    options: &Options,
    user_guids: &HashSet<String>,
    org: &Organization,
    details: &SpaceDetails,
) -> LifecycleResult<bool> {
    let space = &details.space;
    let (roles, users) = client
        .roles
        .list_include_users(&ListFilter::space(&space.guid))
        .await
        .map_err(|e| LifecycleError::list("roles", &space.name, e))?;

    let recipients = list_recipients(user_guids, &roles, &users)?;
    let purge_date = (details.timestamp + Duration::days(i64::from(options.purge_days))).date_naive();

    notifier
        .send_to(
            TemplateKind::Notify,
            org,
            space,
            options.purge_days,
            purge_date,
            &recipients,
            options.dry_run,
        )
        .await
}
