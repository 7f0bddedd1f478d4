use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cf::PollingOptions;
use crate::lifecycle::Options;
use crate::notifications::is_valid_address;

pub(crate) const CONFIG_FILE: &str = "sandbox-purge.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cf: CfConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// Platform API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfConfig {
    /// Base URL of the v3 API, e.g. "https://api.example.com"
    #[serde(default)]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for CfConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            timeout_secs: default_request_timeout(),
        }
    }
}

/// Sandbox lifecycle thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Organizations whose name starts with this prefix are sandboxes
    #[serde(default = "default_org_prefix")]
    pub org_prefix: String,

    /// Days after the first resource before owners are warned
    #[serde(default = "default_notify_days")]
    pub notify_days: u32,

    /// Days after the first resource before the space is purged
    #[serde(default = "default_purge_days")]
    pub purge_days: u32,

    /// Only ever notify
    #[serde(default)]
    pub disable_purge: bool,

    /// Read and report, change nothing
    #[serde(default)]
    pub dry_run: bool,

    /// Quota applied to recreated spaces (empty = the org's only space quota)
    #[serde(default)]
    pub quota_name: String,

    /// Resources created before this are treated as created at this time
    #[serde(default = "default_time_starts_at")]
    pub time_starts_at: DateTime<Utc>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            org_prefix: default_org_prefix(),
            notify_days: default_notify_days(),
            purge_days: default_purge_days(),
            disable_purge: false,
            dry_run: false,
            quota_name: String::new(),
            time_starts_at: default_time_starts_at(),
        }
    }
}

/// Deletion job polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_job_timeout")]
    pub timeout_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_job_timeout(),
        }
    }
}

/// Mail relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// URL the rendered mail is POSTed to
    #[serde(default)]
    pub relay_url: String,

    /// From address
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: String::new(),
            sender: default_sender(),
        }
    }
}

// Default value functions
fn default_request_timeout() -> u64 {
    30
}

fn default_org_prefix() -> String {
    "sandbox-".to_string()
}

fn default_notify_days() -> u32 {
    30
}

fn default_purge_days() -> u32 {
    60
}

fn default_time_starts_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_job_timeout() -> u64 {
    600
}

fn default_sender() -> String {
    "no-reply@example.com".to_string()
}

impl Config {
    /// Load configuration from file, using defaults if not found
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.lifecycle.purge_days < self.lifecycle.notify_days {
            bail!(
                "purge_days ({}) must not be less than notify_days ({})",
                self.lifecycle.purge_days,
                self.lifecycle.notify_days
            );
        }
        if !is_valid_address(&self.mail.sender) {
            bail!("mail sender {:?} is not a valid address", self.mail.sender);
        }
        if self.jobs.poll_interval_secs == 0 {
            bail!("jobs.poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Engine options derived from this configuration
    pub(crate) fn options(&self) -> Options {
        let lifecycle = &self.lifecycle;
        Options {
            notify_days: lifecycle.notify_days,
            purge_days: lifecycle.purge_days,
            disable_purge: lifecycle.disable_purge,
            dry_run: lifecycle.dry_run,
            sandbox_quota_name: lifecycle.quota_name.clone(),
            time_starts_at: lifecycle.time_starts_at,
            org_prefix: lifecycle.org_prefix.clone(),
            polling: PollingOptions {
                interval: Duration::from_secs(self.jobs.poll_interval_secs),
                timeout: Duration::from_secs(self.jobs.timeout_secs),
            },
        }
    }
}
