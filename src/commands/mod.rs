//! CLI command implementations.
//!
//! Each submodule implements a command with pure formatting separated
//! from IO for testability.

pub mod plan;
pub mod run;

use anyhow::{anyhow, bail, Context, Result};
use std::future::Future;
use std::time::Duration;

use crate::cf::{CfClient, CfResourceClient};
use crate::config::Config;

/// Builds the platform client from configuration and the API token.
pub(crate) fn connect(config: &Config, token: Option<&str>) -> Result<CfResourceClient> {
    if config.cf.api_url.is_empty() {
        bail!("cf.api_url is not configured");
    }
    let token = token
        .filter(|t| !t.is_empty())
        .context("No platform API token; set CF_API_TOKEN or pass --cf-token")?;

    let client = CfClient::new(
        &config.cf.api_url,
        token.to_string(),
        Duration::from_secs(config.cf.timeout_secs),
    )
    .context("Failed to build platform API client")?;
    Ok(CfResourceClient::new(client))
}

/// Runs `fut` until it finishes, the deadline passes, or Ctrl-C.
///
/// Dropping the future aborts the in-flight request or job poll.
pub(crate) async fn until_interrupted<F, T>(fut: F, deadline: Option<Duration>) -> Result<T>
where
    F: Future<Output = T>,
{
    let guarded = async {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| anyhow!("Run exceeded its deadline of {}s", limit.as_secs())),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        result = guarded => result,
        _ = tokio::signal::ctrl_c() => bail!("Interrupted; the space being processed was left mid-cycle"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_until_interrupted_returns_output() {
        let value = until_interrupted(async { 7 }, None).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_until_interrupted_enforces_deadline() {
        let result = until_interrupted(
            std::future::pending::<()>(),
            Some(Duration::from_millis(20)),
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("deadline"));
    }

    #[test]
    fn test_connect_requires_api_url() {
        let err = connect(&Config::default(), Some("token")).err().unwrap();
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn test_connect_requires_token() {
        let mut config = Config::default();
        config.cf.api_url = "https://api.example.com".to_string();
        assert!(connect(&config, None).is_err());
        assert!(connect(&config, Some("")).is_err());
        assert!(connect(&config, Some("token")).is_ok());
    }
}
