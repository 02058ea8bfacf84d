//! Runtime configuration for the router, task client and health monitor.
//!
//! # Overview
//! Every setting comes from a `TODO_`-prefixed environment variable and has
//! a default, so an empty environment yields a usable local setup. The CLI
//! layers its flags on top of the loaded `Config`.
//!
//! # Design
//! - `envy` deserializes the environment straight into `Config`; defaults
//!   and validation live in serde attributes.
//! - Derived values (`RoutePolicy`, `MirrorMode`, durations) are computed on
//!   demand rather than stored.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer};

use crate::router::{MirrorMode, RoutePolicy};

/// Client configuration loaded from `TODO_`-prefixed environment variables.
///
/// Read once at startup; endpoints never change afterwards.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Primary task API (default: https://localhost:5001)
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Secondary service that receives mirrors and fallbacks
    /// (default: http://localhost:6000)
    #[serde(default = "default_secondary_url")]
    pub secondary_url: String,

    /// Retry against the secondary when the primary is unreachable (default: true)
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// Mirror reads as well as writes, with no fallback (default: false)
    #[serde(default)]
    pub mirror_reads: bool,

    /// Wait for mirror calls before returning (default: false)
    #[serde(default)]
    pub await_mirror: bool,

    /// Per-request timeout in seconds; unset means no deadline
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Health check interval in seconds, must be positive (default: 5)
    #[serde(
        default = "default_health_check_interval",
        deserialize_with = "positive_secs"
    )]
    pub health_check_interval_secs: u64,

    /// Health check path (default: /health)
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Task collection path on both endpoints (default: /tasks)
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_primary_url() -> String {
    "https://localhost:5001".to_string()
}

fn default_secondary_url() -> String {
    "http://localhost:6000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_health_check_interval() -> u64 {
    5
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_collection() -> String {
    "/tasks".to_string()
}

fn positive_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 {
        return Err(de::Error::custom("interval must be at least 1 second"));
    }
    Ok(secs)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Example: `TODO_PRIMARY_URL`, `TODO_SECONDARY_URL`, `TODO_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("TODO_").from_env()
    }

    /// Load configuration from explicit `(name, value)` pairs, names including
    /// the `TODO_` prefix.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("TODO_").from_iter(vars)
    }

    pub fn route_policy(&self) -> RoutePolicy {
        if self.mirror_reads {
            RoutePolicy::mirror_all()
        } else if self.fallback_enabled {
            RoutePolicy::default()
        } else {
            RoutePolicy::default().without_fallback()
        }
    }

    pub fn mirror_mode(&self) -> MirrorMode {
        if self.await_mirror {
            MirrorMode::Await
        } else {
            MirrorMode::Detach
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }
}
