//! In-memory platform fake for testing.
//!
//! Serves canned inventory, checks the filters the engine sends, and
//! records every write so tests can assert on the resulting calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use super::resource::{
    App, Organization, Role, RoleKind, RoleRelationships, ServiceInstance, Space, SpaceCreate,
    SpaceQuota, SpaceRelationships, SpaceScoped, ToOneRelationship, User,
};
use super::{
    Applications, CfError, CfResourceClient, CfResult, Jobs, ListFilter, Organizations,
    PollingOptions, Roles, ServiceInstances, SpaceQuotas, Spaces,
};

/// A role binding created through the fake.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CreatedRole {
    pub space_guid: String,
    pub user_guid: String,
    pub kind: RoleKind,
}

/// Writes observed by the fake.
#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub created_spaces: Vec<SpaceCreate>,
    pub created_roles: Vec<CreatedRole>,
    pub deleted_spaces: Vec<String>,
    pub deleted_apps: Vec<String>,
    pub polled_jobs: Vec<String>,
    pub applied_quotas: Vec<(String, Vec<String>)>,
    pub role_listings: usize,
}

/// Configurable platform fake implementing every resource trait.
#[derive(Debug, Default)]
pub(crate) struct MockCloud {
    pub orgs: Vec<Organization>,
    pub org_users: Vec<User>,
    pub spaces: Vec<Space>,
    pub apps: Vec<App>,
    pub instances: Vec<ServiceInstance>,
    /// Space the role and user listings are expected to be scoped to.
    pub space_guid: String,
    pub space_users: Vec<User>,
    pub roles: Vec<Role>,
    pub role_users: Vec<User>,
    pub quota: Option<SpaceQuota>,
    pub expected_quota_filter: Option<ListFilter>,
    pub expected_space_create: Option<SpaceCreate>,
    pub created_space: Option<Space>,
    pub delete_job_guid: String,
    pub expected_job_guid: String,
    /// Resource kinds whose listing fails.
    pub failing_lists: Vec<&'static str>,
    pub fail_space_delete: bool,
    pub fail_app_delete: bool,
    pub fail_poll: bool,
    pub fail_role_create: bool,
    pub calls: Mutex<Calls>,
}

impl MockCloud {
    /// Wraps the fake for the engine, keeping a handle for assertions.
    pub fn into_client(self) -> (Arc<Self>, CfResourceClient) {
        let cloud = Arc::new(self);
        let client = CfResourceClient {
            organizations: cloud.clone(),
            spaces: cloud.clone(),
            applications: cloud.clone(),
            service_instances: cloud.clone(),
            roles: cloud.clone(),
            space_quotas: cloud.clone(),
            jobs: cloud.clone(),
        };
        (cloud, client)
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }

    fn check_list(&self, kind: &'static str) -> CfResult<()> {
        if self.failing_lists.contains(&kind) {
            return Err(rejected("GET", kind, 500, "listing unavailable"));
        }
        Ok(())
    }

    fn check_space_scope(&self, space_guid: &str) -> CfResult<()> {
        if space_guid != self.space_guid {
            return Err(rejected(
                "GET",
                "roles",
                400,
                &format!("expected space {}, got {space_guid}", self.space_guid),
            ));
        }
        Ok(())
    }
}

fn rejected(method: &str, url: &str, status: u16, body: &str) -> CfError {
    CfError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl Organizations for MockCloud {
    async fn list_all(&self, _filter: &ListFilter) -> CfResult<Vec<Organization>> {
        self.check_list("organizations")?;
        Ok(self.orgs.clone())
    }

    async fn list_users(&self, _org_guid: &str) -> CfResult<Vec<User>> {
        self.check_list("organization_users")?;
        Ok(self.org_users.clone())
    }
}

#[async_trait]
impl Spaces for MockCloud {
    async fn list_all(&self, _filter: &ListFilter) -> CfResult<Vec<Space>> {
        self.check_list("spaces")?;
        Ok(self.spaces.clone())
    }

    async fn create(&self, request: &SpaceCreate) -> CfResult<Space> {
        if let Some(expected) = &self.expected_space_create {
            if expected != request {
                return Err(rejected(
                    "POST",
                    "spaces",
                    422,
                    &format!("expected {expected:?}, got {request:?}"),
                ));
            }
        }
        self.calls().created_spaces.push(request.clone());
        Ok(self.created_space.clone().unwrap_or_else(|| Space {
            guid: format!("new-{}-guid", request.name),
            name: request.name.clone(),
            relationships: request.relationships.clone(),
        }))
    }

    async fn delete(&self, guid: &str) -> CfResult<String> {
        self.calls().deleted_spaces.push(guid.to_string());
        if self.fail_space_delete {
            return Err(rejected("DELETE", "spaces", 422, "space is not empty"));
        }
        Ok(self.delete_job_guid.clone())
    }

    async fn list_users(&self, space_guid: &str) -> CfResult<Vec<User>> {
        self.check_list("space_users")?;
        self.check_space_scope(space_guid)?;
        Ok(self.space_users.clone())
    }
}

#[async_trait]
impl Applications for MockCloud {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<App>> {
        self.check_list("apps")?;
        Ok(self
            .apps
            .iter()
            .filter(|app| {
                filter.space_guids.is_empty()
                    || app
                        .relationships
                        .space
                        .guid()
                        .is_some_and(|guid| filter.space_guids.iter().any(|s| s == guid))
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, guid: &str) -> CfResult<String> {
        self.calls().deleted_apps.push(guid.to_string());
        if self.fail_app_delete {
            return Err(rejected("DELETE", "apps", 500, "app delete failed"));
        }
        Ok(String::new())
    }
}

#[async_trait]
impl ServiceInstances for MockCloud {
    async fn list_all(&self, _filter: &ListFilter) -> CfResult<Vec<ServiceInstance>> {
        self.check_list("service_instances")?;
        Ok(self.instances.clone())
    }
}

#[async_trait]
impl Roles for MockCloud {
    async fn list_include_users(&self, filter: &ListFilter) -> CfResult<(Vec<Role>, Vec<User>)> {
        self.check_list("roles")?;
        if filter.space_guids != [self.space_guid.clone()] {
            return Err(rejected(
                "GET",
                "roles",
                400,
                &format!("unexpected role filter {filter:?}"),
            ));
        }
        self.calls().role_listings += 1;
        Ok((self.roles.clone(), self.role_users.clone()))
    }

    async fn create_space_role(
        &self,
        space_guid: &str,
        user_guid: &str,
        kind: RoleKind,
    ) -> CfResult<Role> {
        if self.fail_role_create {
            return Err(rejected("POST", "roles", 422, "role already exists"));
        }
        self.calls().created_roles.push(CreatedRole {
            space_guid: space_guid.to_string(),
            user_guid: user_guid.to_string(),
            kind: kind.clone(),
        });
        Ok(Role {
            guid: format!("role-{user_guid}"),
            kind,
            relationships: RoleRelationships {
                user: ToOneRelationship::new(user_guid),
                space: Some(ToOneRelationship::new(space_guid)),
            },
        })
    }
}

#[async_trait]
impl SpaceQuotas for MockCloud {
    async fn single(&self, filter: &ListFilter) -> CfResult<Option<SpaceQuota>> {
        if let Some(expected) = &self.expected_quota_filter {
            if expected != filter {
                return Err(rejected(
                    "GET",
                    "space_quotas",
                    400,
                    &format!("expected {expected:?}, got {filter:?}"),
                ));
            }
        }
        Ok(self.quota.clone())
    }

    async fn apply(&self, quota_guid: &str, space_guids: &[String]) -> CfResult<Vec<String>> {
        self.calls()
            .applied_quotas
            .push((quota_guid.to_string(), space_guids.to_vec()));
        Ok(space_guids.to_vec())
    }
}

#[async_trait]
impl Jobs for MockCloud {
    async fn poll_complete(&self, job_guid: &str, _options: &PollingOptions) -> CfResult<()> {
        self.calls().polled_jobs.push(job_guid.to_string());
        if !self.expected_job_guid.is_empty() && self.expected_job_guid != job_guid {
            return Err(CfError::JobFailed {
                job: job_guid.to_string(),
                message: format!("expected job {}", self.expected_job_guid),
            });
        }
        if self.fail_poll {
            return Err(CfError::JobFailed {
                job: job_guid.to_string(),
                message: "space deletion failed".to_string(),
            });
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Fixture builders
// -----------------------------------------------------------------------------

pub(crate) fn org(guid: &str, name: &str) -> Organization {
    Organization {
        guid: guid.to_string(),
        name: name.to_string(),
    }
}

pub(crate) fn space(guid: &str, name: &str, org_guid: &str) -> Space {
    Space {
        guid: guid.to_string(),
        name: name.to_string(),
        relationships: SpaceRelationships {
            organization: Some(ToOneRelationship::new(org_guid)),
            quota: None,
        },
    }
}

pub(crate) fn user(guid: &str, username: &str) -> User {
    User {
        guid: guid.to_string(),
        username: Some(username.to_string()),
    }
}

pub(crate) fn role(kind: RoleKind, space_guid: &str, user_guid: &str) -> Role {
    Role {
        guid: format!("{}-{user_guid}", kind.as_str()),
        kind,
        relationships: RoleRelationships {
            user: ToOneRelationship::new(user_guid),
            space: Some(ToOneRelationship::new(space_guid)),
        },
    }
}

pub(crate) fn app(guid: &str, space_guid: &str, created_at: DateTime<Utc>) -> App {
    App {
        guid: guid.to_string(),
        name: guid.to_string(),
        created_at,
        relationships: SpaceScoped {
            space: ToOneRelationship::new(space_guid),
        },
    }
}

pub(crate) fn instance(guid: &str, space_guid: &str, created_at: DateTime<Utc>) -> ServiceInstance {
    ServiceInstance {
        guid: guid.to_string(),
        name: guid.to_string(),
        created_at,
        relationships: SpaceScoped {
            space: ToOneRelationship::new(space_guid),
        },
    }
}
