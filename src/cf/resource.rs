//! Platform resource types as returned by the v3 API.
//!
//! Only the fields the lifecycle engine reads are modelled; everything
//! else in the API payloads is ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to another resource by guid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Relationship {
    pub guid: String,
}

/// To-one relationship wrapper (`{"data": {"guid": ...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ToOneRelationship {
    #[serde(default)]
    pub data: Option<Relationship>,
}

impl ToOneRelationship {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            data: Some(Relationship { guid: guid.into() }),
        }
    }

    /// The referenced guid, if the relationship is populated.
    pub fn guid(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.guid.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Organization {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SpaceRelationships {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<ToOneRelationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<ToOneRelationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Space {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub relationships: SpaceRelationships,
}

/// Request body for creating a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SpaceCreate {
    pub name: String,
    pub relationships: SpaceRelationships,
}

/// Relationship to the owning space, shared by apps and service instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct SpaceScoped {
    #[serde(default)]
    pub space: ToOneRelationship,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct App {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub relationships: SpaceScoped,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ServiceInstance {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub relationships: SpaceScoped,
}

/// Anything that lives in a space and carries a creation time.
pub(crate) trait SpaceResource {
    fn space_guid(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
}

impl SpaceResource for App {
    fn space_guid(&self) -> Option<&str> {
        self.relationships.space.guid()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl SpaceResource for ServiceInstance {
    fn space_guid(&self) -> Option<&str> {
        self.relationships.space.guid()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Kind of a role binding. Only space developer and space manager roles
/// are acted upon; every other platform role kind is carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum RoleKind {
    SpaceDeveloper,
    SpaceManager,
    Other(String),
}

impl RoleKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SpaceDeveloper => "space_developer",
            Self::SpaceManager => "space_manager",
            Self::Other(kind) => kind,
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for RoleKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "space_developer" => Self::SpaceDeveloper,
            "space_manager" => Self::SpaceManager,
            _ => Self::Other(value),
        }
    }
}

impl<'de> Deserialize<'de> for RoleKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for RoleKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RoleRelationships {
    #[serde(default)]
    pub user: ToOneRelationship,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<ToOneRelationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Role {
    #[serde(default)]
    pub guid: String,
    #[serde(rename = "type")]
    pub kind: RoleKind,
    #[serde(default)]
    pub relationships: RoleRelationships,
}

impl Role {
    pub fn user_guid(&self) -> Option<&str> {
        self.relationships.user.guid()
    }
}

/// Request body for creating a role.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RoleCreate {
    #[serde(rename = "type")]
    pub kind: RoleKind,
    pub relationships: RoleRelationships,
}

impl RoleCreate {
    pub fn space(space_guid: &str, user_guid: &str, kind: RoleKind) -> Self {
        Self {
            kind,
            relationships: RoleRelationships {
                user: ToOneRelationship::new(user_guid),
                space: Some(ToOneRelationship::new(space_guid)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct User {
    pub guid: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct SpaceQuota {
    pub guid: String,
    #[serde(default)]
    pub name: String,
}

/// Asynchronous job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum JobState {
    Processing,
    Polling,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobError {
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Job {
    pub guid: String,
    pub state: JobState,
    #[serde(default)]
    pub errors: Vec<JobError>,
}
