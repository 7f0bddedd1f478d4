//! Age classification of sandbox spaces.
//!
//! A space is as old as its oldest app or service instance. That
//! timestamp is clamped to the program epoch and truncated to a UTC day
//! so thresholds do not drift within a day.

use chrono::{DateTime, NaiveTime, Utc};
use std::collections::HashMap;

use super::Options;
use crate::cf::resource::{App, ServiceInstance, Space, SpaceResource};

/// A space paired with its classification timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpaceDetails {
    pub timestamp: DateTime<Utc>,
    pub space: Space,
}

/// Spaces due for a warning and spaces due for a purge. Never overlapping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Classification {
    pub to_notify: Vec<SpaceDetails>,
    pub to_purge: Vec<SpaceDetails>,
}

fn group_by_space<R: SpaceResource>(resources: &[R]) -> HashMap<&str, Vec<&R>> {
    let mut grouped: HashMap<&str, Vec<&R>> = HashMap::new();
    for resource in resources {
        if let Some(space_guid) = resource.space_guid() {
            grouped.entry(space_guid).or_default().push(resource);
        }
    }
    grouped
}

fn earliest<R: SpaceResource>(resources: Option<&Vec<&R>>) -> Option<DateTime<Utc>> {
    resources?.iter().map(|r| r.created_at()).min()
}

/// Truncate to midnight UTC.
pub(crate) fn truncate_to_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Classification timestamp of every space that owns at least one resource.
pub(crate) fn first_resource_times<'a>(
    spaces: &'a [Space],
    apps: &[App],
    instances: &[ServiceInstance],
    time_starts_at: DateTime<Utc>,
) -> Vec<(&'a Space, DateTime<Utc>)> {
    let grouped_apps = group_by_space(apps);
    let grouped_instances = group_by_space(instances);

    spaces
        .iter()
        .filter_map(|space| {
            let guid = space.guid.as_str();
            let first = match (
                earliest(grouped_apps.get(guid)),
                earliest(grouped_instances.get(guid)),
            ) {
                (Some(a), Some(b)) => a.min(b),
                (Some(t), None) | (None, Some(t)) => t,
                (None, None) => return None,
            };
            Some((space, truncate_to_day(first.max(time_starts_at))))
        })
        .collect()
}

/// Splits spaces into notify and purge lists relative to `now`.
///
/// Spaces without resources cannot be aged and are left out of both.
pub(crate) fn list_purge_spaces(
    spaces: &[Space],
    apps: &[App],
    instances: &[ServiceInstance],
    options: &Options,
    now: DateTime<Utc>,
) -> Classification {
    let mut classification = Classification::default();

    for (space, timestamp) in first_resource_times(spaces, apps, instances, options.time_starts_at)
    {
        let delta = (now - timestamp).num_days();
        let details = SpaceDetails {
            timestamp,
            space: space.clone(),
        };

        if !options.disable_purge && delta >= i64::from(options.purge_days) {
            classification.to_purge.push(details);
        } else if delta >= i64::from(options.notify_days) {
            classification.to_notify.push(details);
        }
    }

    classification
}
