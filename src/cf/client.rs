use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::resource::{
    App, Job, JobState, Organization, Role, RoleCreate, RoleKind, ServiceInstance, Space,
    SpaceCreate, SpaceQuota, User,
};
use super::{
    Applications, CfError, CfResult, Jobs, ListFilter, Organizations, PollingOptions, Roles,
    ServiceInstances, SpaceQuotas, Spaces,
};

/// Largest page size the v3 API accepts.
const PER_PAGE: &str = "5000";

/// HTTP client for the platform v3 API.
///
/// Authenticates every request with a pre-issued bearer token.
#[derive(Clone)]
pub(crate) struct CfClient {
    client: Client,
    api_url: String,
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<Link>,
}

#[derive(Debug, Default, Deserialize)]
struct Included {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Page<T> {
    #[serde(default)]
    pagination: Pagination,
    resources: Vec<T>,
    #[serde(default)]
    included: Included,
}

#[derive(Debug, Deserialize)]
struct RelationshipList {
    data: Vec<super::resource::Relationship>,
}

impl CfClient {
    pub fn new(api_url: &str, token: String, timeout: Duration) -> CfResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CfError::Http {
                url: api_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// Send a request and fail on any non-success status.
    #[allow(tail_expr_drop_order)]
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> CfResult<Response> {
        debug!("{} {} {:?}", method, url, query);

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| CfError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CfError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> CfResult<T> {
        let bytes = response.bytes().await.map_err(|source| CfError::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| CfError::decode(url, e))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> CfResult<T> {
        let response = self.send::<()>(Method::GET, url, query, None).await?;
        Self::decode(url, response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CfResult<T> {
        let url = self.url(path);
        let response = self.send(Method::POST, &url, &[], Some(body)).await?;
        Self::decode(&url, response).await
    }

    /// Issue a DELETE and return the job guid from the `Location` header.
    async fn delete_resource(&self, path: &str) -> CfResult<String> {
        let url = self.url(path);
        let response = self.send::<()>(Method::DELETE, &url, &[], None).await?;
        let job_guid = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(job_guid_from_location)
            .unwrap_or_default();
        Ok(job_guid)
    }

    /// Fetch every page of a list endpoint, following `pagination.next`.
    async fn list_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&'static str, String)>,
    ) -> CfResult<(Vec<T>, Vec<User>)> {
        query.push(("per_page", PER_PAGE.to_string()));

        let mut url = self.url(path);
        let mut resources = Vec::new();
        let mut users = Vec::new();

        loop {
            let page: Page<T> = self.get(&url, &query).await?;
            resources.extend(page.resources);
            users.extend(page.included.users);

            match page.pagination.next {
                Some(next) => {
                    // The next link already carries the query string.
                    url = next.href;
                    query.clear();
                }
                None => break,
            }
        }

        Ok((resources, users))
    }

    async fn list_resources<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &ListFilter,
    ) -> CfResult<Vec<T>> {
        let (resources, _) = self.list_pages(path, filter.query()).await?;
        Ok(resources)
    }
}

/// Extract the trailing guid from a `.../v3/jobs/<guid>` location.
fn job_guid_from_location(location: &str) -> String {
    let trimmed = location.trim_end_matches('/');
    if !trimmed.contains("/jobs/") {
        return String::new();
    }
    trimmed.rsplit('/').next().unwrap_or_default().to_string()
}

fn single<T>(resource: &'static str, mut matches: Vec<T>) -> CfResult<Option<T>> {
    match matches.len() {
        0 | 1 => Ok(matches.pop()),
        count => Err(CfError::MultipleResults { resource, count }),
    }
}

#[async_trait]
impl Organizations for CfClient {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<Organization>> {
        self.list_resources("/v3/organizations", filter).await
    }

    async fn list_users(&self, org_guid: &str) -> CfResult<Vec<User>> {
        let path = format!("/v3/organizations/{org_guid}/users");
        self.list_resources(&path, &ListFilter::default()).await
    }
}

#[async_trait]
impl Spaces for CfClient {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<Space>> {
        self.list_resources("/v3/spaces", filter).await
    }

    async fn create(&self, request: &SpaceCreate) -> CfResult<Space> {
        self.post("/v3/spaces", request).await
    }

    async fn delete(&self, guid: &str) -> CfResult<String> {
        self.delete_resource(&format!("/v3/spaces/{guid}")).await
    }

    async fn list_users(&self, space_guid: &str) -> CfResult<Vec<User>> {
        let path = format!("/v3/spaces/{space_guid}/users");
        self.list_resources(&path, &ListFilter::default()).await
    }
}

#[async_trait]
impl Applications for CfClient {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<App>> {
        self.list_resources("/v3/apps", filter).await
    }

    async fn delete(&self, guid: &str) -> CfResult<String> {
        self.delete_resource(&format!("/v3/apps/{guid}")).await
    }
}

#[async_trait]
impl ServiceInstances for CfClient {
    async fn list_all(&self, filter: &ListFilter) -> CfResult<Vec<ServiceInstance>> {
        self.list_resources("/v3/service_instances", filter).await
    }
}

#[async_trait]
impl Roles for CfClient {
    async fn list_include_users(&self, filter: &ListFilter) -> CfResult<(Vec<Role>, Vec<User>)> {
        let mut query = filter.query();
        query.push(("include", "user".to_string()));
        self.list_pages("/v3/roles", query).await
    }

    async fn create_space_role(
        &self,
        space_guid: &str,
        user_guid: &str,
        kind: RoleKind,
    ) -> CfResult<Role> {
        let body = RoleCreate::space(space_guid, user_guid, kind);
        self.post("/v3/roles", &body).await
    }
}

#[async_trait]
impl SpaceQuotas for CfClient {
    async fn single(&self, filter: &ListFilter) -> CfResult<Option<SpaceQuota>> {
        let quotas = self.list_resources("/v3/space_quotas", filter).await?;
        single("space quota", quotas)
    }

    async fn apply(&self, quota_guid: &str, space_guids: &[String]) -> CfResult<Vec<String>> {
        let body = json!({
            "data": space_guids
                .iter()
                .map(|guid| json!({ "guid": guid }))
                .collect::<Vec<_>>(),
        });
        let path = format!("/v3/space_quotas/{quota_guid}/relationships/spaces");
        let applied: RelationshipList = self.post(&path, &body).await?;
        Ok(applied.data.into_iter().map(|r| r.guid).collect())
    }
}

#[async_trait]
impl Jobs for CfClient {
    async fn poll_complete(&self, job_guid: &str, options: &PollingOptions) -> CfResult<()> {
        let url = self.url(&format!("/v3/jobs/{job_guid}"));

        let poll = async {
            loop {
                let job: Job = self.get(&url, &[]).await?;
                match job.state {
                    JobState::Complete => return Ok::<(), CfError>(()),
                    JobState::Failed => {
                        let message = job
                            .errors
                            .iter()
                            .map(|e| e.detail.as_str())
                            .collect::<Vec<_>>()
                            .join("; ");
                        return Err(CfError::JobFailed {
                            job: job.guid,
                            message,
                        });
                    }
                    JobState::Processing | JobState::Polling => {
                        debug!("Job {} still {:?}", job_guid, job.state);
                        tokio::time::sleep(options.interval).await;
                    }
                }
            }
        };

        tokio::time::timeout(options.timeout, poll)
            .await
            .map_err(|_| CfError::job_timeout(job_guid, options.timeout))?
    }
}
