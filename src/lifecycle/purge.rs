//! Space destruction and deletion-job tracking.

use tracing::{debug, info, warn};

use crate::cf::resource::Space;
use crate::cf::{CfResourceClient, ListFilter, PollingOptions};
use crate::error::{LifecycleError, LifecycleResult};

/// Deletes a space and returns the deletion job guid.
///
/// A populated space is commonly rejected. When the delete fails, every
/// app in the space is deleted individually so the next run has a better
/// chance, and the original delete error is returned. Failures of that
/// cleanup are only logged.
pub(crate) async fn purge_space(
    client: &CfResourceClient,
    space: &Space,
) -> LifecycleResult<String> {
    match client.spaces.delete(&space.guid).await {
        Ok(job_guid) => Ok(job_guid),
        Err(source) => {
            warn!(
                "Deleting space {} failed, removing its apps: {}",
                space.name, source
            );
            delete_space_apps(client, space).await;
            Err(LifecycleError::SpaceDelete {
                space: space.name.clone(),
                source,
            })
        }
    }
}

async fn delete_space_apps(client: &CfResourceClient, space: &Space) {
    let apps = match client
        .applications
        .list_all(&ListFilter::space(&space.guid))
        .await
    {
        Ok(apps) => apps,
        Err(e) => {
            warn!("Failed to list apps in space {}: {}", space.name, e);
            return;
        }
    };

    for app in apps {
        match client.applications.delete(&app.guid).await {
            Ok(_) => info!("Deleted app {} in space {}", app.name, space.name),
            Err(e) => warn!("Failed to delete app {} in space {}: {}", app.name, space.name, e),
        }
    }
}

/// Blocks until the space deletion job completes.
///
/// An empty job guid fails without polling.
pub(crate) async fn wait_for_space_deletion(
    client: &CfResourceClient,
    space: &Space,
    job_guid: &str,
    polling: &PollingOptions,
) -> LifecycleResult<()> {
    if job_guid.is_empty() {
        return Err(LifecycleError::NoSpaceDeleteJobGuid {
            space: space.name.clone(),
        });
    }

    debug!("Waiting on job {} for space {}", job_guid, space.name);
    client
        .jobs
        .poll_complete(job_guid, polling)
        .await
        .map_err(|source| LifecycleError::JobPoll {
            space: space.name.clone(),
            source,
        })
}
