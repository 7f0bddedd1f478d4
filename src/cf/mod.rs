//! Platform API access.
//!
//! Each resource kind the lifecycle engine touches has its own narrow
//! trait so it can be substituted independently:
//! - `Organizations`, `Spaces`, `Applications`, `ServiceInstances`
//! - `Roles`, `SpaceQuotas`, `Jobs`
//!
//! `CfClient` implements all of them against the v3 HTTP API.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod resource;

pub(crate) use client::CfClient;
pub(crate) use error::{CfError, CfResult};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use resource::{
    App, Organization, Role, RoleKind, ServiceInstance, Space, SpaceCreate, SpaceQuota, User,
};

/// Query filter shared by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ListFilter {
    pub organization_guids: Vec<String>,
    pub space_guids: Vec<String>,
    pub names: Vec<String>,
}

impl ListFilter {
    pub fn organization(guid: &str) -> Self {
        Self {
            organization_guids: vec![guid.to_string()],
            ..Default::default()
        }
    }

    pub fn space(guid: &str) -> Self {
        Self {
            space_guids: vec![guid.to_string()],
            ..Default::default()
        }
    }

    /// Adds a name constraint.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.names.push(name.to_string());
        self
    }

    /// Query parameters for the v3 API.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if !self.organization_guids.is_empty() {
            query.push(("organization_guids", self.organization_guids.join(",")));
        }
        if !self.space_guids.is_empty() {
            query.push(("space_guids", self.space_guids.join(",")));
        }
        if !self.names.is_empty() {
            query.push(("names", self.names.join(",")));
        }
        query
    }
}

/// How to wait for an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollingOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

#[async_trait]
pub(crate) trait Organizations: Send + Sync {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<Organization>>;

    /// Users with any role in the organization.
    async fn list_users(&self, org_guid: &str) -> CfResult<Vec<User>>;
}

#[async_trait]
pub(crate) trait Spaces: Send + Sync {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<Space>>;

    async fn create(&self, request: &SpaceCreate) -> CfResult<Space>;

    /// Deletes a space. Returns the deletion job guid, empty if none was issued.
    async fn delete(&self, guid: &str) -> CfResult<String>;

    async fn list_users(&self, space_guid: &str) -> CfResult<Vec<User>>;
}

#[async_trait]
pub(crate) trait Applications: Send + Sync {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<App>>;

    /// Deletes an app. Returns the deletion job guid, empty if none was issued.
    async fn delete(&self, guid: &str) -> CfResult<String>;
}

#[async_trait]
pub(crate) trait ServiceInstances: Send + Sync {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<ServiceInstance>>;
}

#[async_trait]
pub(crate) trait Roles: Send + Sync {
    /// Lists roles together with the users they bind.
    async fn list_include_users(&self, filter: &ListFilter) -> CfResult<(Vec<Role>, Vec<User>)>;

    async fn create_space_role(
        &self,
        space_guid: &str,
        user_guid: &str,
        kind: RoleKind,
    ) -> CfResult<Role>;
}

#[async_trait]
pub(crate) trait SpaceQuotas: Send + Sync {
    /// Returns the only quota matching the filter, `None` if nothing matches.
    async fn single(&self, filter: &ListFilter) -> CfResult<Option<SpaceQuota>>;

    /// Applies a quota to spaces. Returns the guids the quota now covers.
    async fn apply(&self, quota_guid: &str, space_guids: &[String]) -> CfResult<Vec<String>>;
}

#[async_trait]
pub(crate) trait Jobs: Send + Sync {
    /// Waits until the job completes, fails or the polling timeout elapses.
    async fn poll_complete(&self, job_guid: &str, options: &PollingOptions) -> CfResult<()>;
}

/// Bundle of resource clients handed to the lifecycle engine.
#[derive(Clone)]
pub(crate) struct CfResourceClient {
    pub organizations: Arc<dyn Organizations>,
    pub spaces: Arc<dyn Spaces>,
    pub applications: Arc<dyn Applications>,
    pub service_instances: Arc<dyn ServiceInstances>,
    pub roles: Arc<dyn Roles>,
    pub space_quotas: Arc<dyn SpaceQuotas>,
    pub jobs: Arc<dyn Jobs>,
}

impl CfResourceClient {
    /// Uses one HTTP client for every resource kind.
    pub fn new(client: CfClient) -> Self {
        let client = Arc::new(client);
        Self {
            organizations: client.clone(),
            spaces: client.clone(),
            applications: client.clone(),
            service_instances: client.clone(),
            roles: client.clone(),
            space_quotas: client.clone(),
            jobs: client,
        }
    }
}
