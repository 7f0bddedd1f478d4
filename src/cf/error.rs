//! Error types for platform API calls.
//!
//! Typed errors let the lifecycle engine tell a rejected request from a
//! transport failure or a failed asynchronous job.

use std::time::Duration;

/// Errors returned by the platform client.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CfError {
    /// Request could not be sent or the response could not be read.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Platform answered with a non-success status.
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A single-result lookup matched more than one resource.
    #[error("expected exactly one {resource}, found {count}")]
    MultipleResults { resource: &'static str, count: usize },

    /// Asynchronous job finished in the FAILED state.
    #[error("job {job} failed: {message}")]
    JobFailed { job: String, message: String },

    /// Asynchronous job did not finish in time.
    #[error("job {job} did not complete within {timeout_secs} seconds")]
    JobTimeout { job: String, timeout_secs: u64 },
}

impl CfError {
    /// Creates a `Decode` error.
    pub fn decode(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Creates a `JobTimeout` error from a `Duration`.
    pub fn job_timeout(job: impl Into<String>, timeout: Duration) -> Self {
        Self::JobTimeout {
            job: job.into(),
            timeout_secs: timeout.as_secs(),
        }
    }

    /// Returns the HTTP status if the platform rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this is a job failure or timeout.
    pub fn is_job_error(&self) -> bool {
        matches!(self, Self::JobFailed { .. } | Self::JobTimeout { .. })
    }
}

/// Result type for platform calls.
pub(crate) type CfResult<T> = Result<T, CfError>;
