// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the unlock status relay.
//!
//! All values are environment-supplied with documented defaults; `main`
//! performs the actual env reads.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the unlock relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:3000)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Identifier validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Upstream profile service configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Item catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds; one admission per client per window
    /// (default: 1000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Entry-count threshold that triggers an inline purge of expired
    /// entries (default: 65536)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Interval between background sweeps of the limiter map in seconds
    /// (default: 60)
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_secs: u64,
}

/// XPlatformId validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Accepted platform tokens (default: DMO, OVR-ORG)
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,

    /// Accept account ids with a leading sign that parse negative
    /// (default: false)
    #[serde(default)]
    pub allow_signed_account_ids: bool,
}

/// Upstream profile service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the profile service (default: http://127.0.0.1:8080/)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Shared secret sent as X-Api-Key (default: empty)
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in milliseconds (default: 10000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Item catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Flat JSON array of item identifiers (default: items.json)
    #[serde(default = "default_items_path")]
    pub items_path: String,

    /// Nested assignment document to derive the catalog from when the flat
    /// file is absent (default: unset)
    #[serde(default)]
    pub assignment_path: Option<String>,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_window_ms() -> u64 {
    1000 // one request per second
}

fn default_max_entries() -> usize {
    65536
}

fn default_sweep_secs() -> u64 {
    60
}

fn default_platforms() -> Vec<String> {
    vec!["DMO".to_string(), "OVR-ORG".to_string()]
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_timeout_ms() -> u64 {
    10000
}

fn default_items_path() -> String {
    "items.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            upstream: UpstreamConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            allow_signed_account_ids: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            items_path: default_items_path(),
            assignment_path: None,
        }
    }
}

impl RateLimitConfig {
    /// Get the window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Get the background sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Window length in seconds, as reported by X-RateLimit-Limit
    pub fn window_secs(&self) -> f64 {
        self.window_ms as f64 / 1000.0
    }
}

impl UpstreamConfig {
    /// Get the per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(config.validation.platforms, vec!["DMO", "OVR-ORG"]);
        assert!(!config.validation.allow_signed_account_ids);
        assert_eq!(config.upstream.endpoint, "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_window_secs_reporting() {
        let config = RateLimitConfig {
            window_ms: 500,
            ..Default::default()
        };
        assert_eq!(config.window_secs(), 0.5);
        assert_eq!(RateLimitConfig::default().window_secs(), 1.0);
    }
}
