//! Domain-specific error types for the sandbox lifecycle.
//!
//! Each variant names the step of a notify or purge cycle that failed so
//! operators can tell, for example, a deletion that never started from
//! one that started and failed.

use crate::cf::CfError;
use crate::notifications::MailError;

/// Errors that can occur while processing a sandbox organization or space.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LifecycleError {
    /// An inventory read failed.
    #[error("failed to list {resource} for {scope}: {source}")]
    List {
        resource: &'static str,
        scope: String,
        #[source]
        source: CfError,
    },

    /// No quota matched at recreation time.
    #[error("no space quota {quota:?} found for space {space} in org {org}")]
    QuotaNotFound {
        quota: String,
        space: String,
        org: String,
    },

    /// Quota lookup was rejected by the platform.
    #[error("error finding quota {quota:?} for space {space} in org {org}: {source}")]
    QuotaLookup {
        quota: String,
        space: String,
        org: String,
        #[source]
        source: CfError,
    },

    /// The resolved quota could not be applied to the recreated space.
    #[error("error applying space quota {quota:?} to space {space}: {source}")]
    QuotaApply {
        quota: String,
        space: String,
        #[source]
        source: CfError,
    },

    /// The delete call returned no job to track.
    #[error("no job guid returned for deletion of space {space}")]
    NoSpaceDeleteJobGuid { space: String },

    /// The deletion job failed or could not be tracked.
    #[error("error waiting for deletion of space {space}: {source}")]
    JobPoll {
        space: String,
        #[source]
        source: CfError,
    },

    /// The platform rejected the delete call.
    #[error("error deleting space {space}: {source}")]
    SpaceDelete {
        space: String,
        #[source]
        source: CfError,
    },

    /// The replacement space could not be created.
    #[error("error creating space {space} in org {org}: {source}")]
    SpaceCreate {
        space: String,
        org: String,
        #[source]
        source: CfError,
    },

    /// A snapshotted role could not be recreated.
    #[error("error creating {kind} role for user {user} in space {space}: {source}")]
    RoleCreate {
        kind: String,
        user: String,
        space: String,
        #[source]
        source: CfError,
    },

    /// A recipient username is not an email address.
    #[error("invalid recipient {address:?} for user {user}")]
    InvalidRecipient { user: String, address: String },

    /// Mail could not be handed to the transport.
    #[error("error sending notification for space {space}: {source}")]
    Mail {
        space: String,
        #[source]
        source: MailError,
    },
}

impl LifecycleError {
    /// Creates a `List` error.
    pub fn list(resource: &'static str, scope: impl Into<String>, source: CfError) -> Self {
        Self::List {
            resource,
            scope: scope.into(),
            source,
        }
    }

    /// Returns true if an inventory read failed.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List { .. })
    }

    /// Returns true if no quota matched at recreation time.
    pub fn is_quota_not_found(&self) -> bool {
        matches!(self, Self::QuotaNotFound { .. })
    }

    /// Returns true if the delete call returned no job to track.
    pub fn is_no_job_guid(&self) -> bool {
        matches!(self, Self::NoSpaceDeleteJobGuid { .. })
    }

    /// Returns true if the deletion job failed or timed out.
    pub fn is_job_poll(&self) -> bool {
        matches!(self, Self::JobPoll { .. })
    }

    /// Returns true if a recipient username was malformed.
    pub fn is_invalid_recipient(&self) -> bool {
        matches!(self, Self::InvalidRecipient { .. })
    }

    /// What an operator should check after this failure, if anything.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::JobPoll { source, .. } if source.is_job_error() => {
                Some("the deletion job failed or stalled; the space may be partly deleted")
            }
            Self::SpaceDelete { source, .. } if source.status() == Some(422) => {
                Some("the platform refused the delete; the space still holds resources")
            }
            _ if self.is_job_poll() || self.is_no_job_guid() => {
                Some("deletion state is unknown; check the space before the next run")
            }
            _ if self.is_quota_not_found() => {
                Some("create the sandbox space quota in this organization")
            }
            _ if self.is_invalid_recipient() => {
                Some("the user's username is not an email address")
            }
            _ if self.is_list() => Some("nothing was changed for this scope"),
            _ => None,
        }
    }
}

/// Result type for lifecycle operations.
pub(crate) type LifecycleResult<T> = Result<T, LifecycleError>;
