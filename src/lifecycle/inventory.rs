//! Read-only inventory of sandbox organizations.

use std::collections::HashSet;

use crate::cf::resource::{App, Organization, ServiceInstance, Space};
use crate::cf::{CfResourceClient, ListFilter};
use crate::error::{LifecycleError, LifecycleResult};

/// Everything in one organization that can age a space.
#[derive(Debug, Default)]
pub(crate) struct OrgResources {
    pub spaces: Vec<Space>,
    pub apps: Vec<App>,
    pub instances: Vec<ServiceInstance>,
}

/// Lists organizations whose name starts with `prefix`.
pub(crate) async fn list_sandbox_orgs(
    client: &CfResourceClient,
    prefix: &str,
) -> LifecycleResult<Vec<Organization>> {
    let orgs = client
        .organizations
        .list_all(&ListFilter::default())
        .await
        .map_err(|e| LifecycleError::list("organizations", "platform", e))?;

    Ok(orgs
        .into_iter()
        .filter(|org| org.name.starts_with(prefix))
        .collect())
}

/// Fetches apps, service instances and spaces within an organization.
///
/// Any failing listing fails the whole read.
pub(crate) async fn list_org_resources(
    client: &CfResourceClient,
    org: &Organization,
) -> LifecycleResult<OrgResources> {
    let filter = ListFilter::organization(&org.guid);

    let apps = client
        .applications
        .list_all(&filter)
        .await
        .map_err(|e| LifecycleError::list("apps", &org.name, e))?;

    let instances = client
        .service_instances
        .list_all(&filter)
        .await
        .map_err(|e| LifecycleError::list("service instances", &org.name, e))?;

    let spaces = client
        .spaces
        .list_all(&filter)
        .await
        .map_err(|e| LifecycleError::list("spaces", &org.name, e))?;

    Ok(OrgResources {
        spaces,
        apps,
        instances,
    })
}

/// Guids of the users currently belonging to the organization.
pub(crate) async fn list_org_user_guids(
    client: &CfResourceClient,
    org: &Organization,
) -> LifecycleResult<HashSet<String>> {
    let users = client
        .organizations
        .list_users(&org.guid)
        .await
        .map_err(|e| LifecycleError::list("organization users", &org.name, e))?;

    Ok(users.into_iter().map(|user| user.guid).collect())
}
