//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

// == Defaults ==
pub const DEFAULT_MAX_SIZE: usize = 1000;
pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOCALES: &[&str] = &["en", "es", "pl"];
pub const DEFAULT_MAX_SCENARIOS: usize = 500;
pub const DEFAULT_MIN_PRIORITY: u8 = 5;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Zero or negative numbers are treated as misconfiguration and replaced by the default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of scenarios held by the cache
    pub cache_max_size: usize,
    /// Sliding TTL in seconds for cached scenarios
    pub cache_ttl: u64,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Number of scenarios generated concurrently
    pub generation_concurrency: usize,
    /// Per-item content generation timeout in seconds
    pub generation_timeout: u64,
    /// Extra attempts per failed item
    pub generation_max_retries: u32,
    /// Locales pre-generated by default
    pub locales: Vec<String>,
    /// Cap on (combination, locale) pairs per pre-generation run
    pub max_scenarios: usize,
    /// Lowest priority included in pre-generation
    pub min_priority: u8,
    /// Warm the cache when the server starts
    pub pregenerate_on_start: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cached scenarios (default: 1000)
    /// - `CACHE_TTL_SECS` - Sliding TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `GENERATION_CONCURRENCY` - Concurrent generations (default: 8)
    /// - `GENERATION_TIMEOUT_SECS` - Per-item timeout (default: 30)
    /// - `GENERATION_MAX_RETRIES` - Extra attempts per item (default: 0)
    /// - `PREGENERATE_LOCALES` - Comma separated locales (default: en,es,pl)
    /// - `PREGENERATE_MAX_SCENARIOS` - Work cap per run (default: 500)
    /// - `PREGENERATE_MIN_PRIORITY` - Priority floor (default: 5)
    /// - `PREGENERATE_ON_START` - Warm cache at startup (default: false)
    pub fn from_env() -> Self {
        Self {
            cache_max_size: positive_var("CACHE_MAX_SIZE", DEFAULT_MAX_SIZE as i64) as usize,
            cache_ttl: positive_var("CACHE_TTL_SECS", DEFAULT_TTL_SECS as i64) as u64,
            cleanup_interval: positive_var(
                "CLEANUP_INTERVAL_SECS",
                DEFAULT_CLEANUP_INTERVAL_SECS as i64,
            ) as u64,
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            generation_concurrency: positive_var(
                "GENERATION_CONCURRENCY",
                DEFAULT_CONCURRENCY as i64,
            ) as usize,
            generation_timeout: positive_var(
                "GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS as i64,
            ) as u64,
            generation_max_retries: env::var("GENERATION_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            locales: env::var("PREGENERATE_LOCALES")
                .ok()
                .map(|v| parse_locales(&v))
                .filter(|l| !l.is_empty())
                .unwrap_or_else(default_locales),
            max_scenarios: positive_var(
                "PREGENERATE_MAX_SCENARIOS",
                DEFAULT_MAX_SCENARIOS as i64,
            ) as usize,
            min_priority: env::var("PREGENERATE_MIN_PRIORITY")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .map(|p| p.clamp(1, 10))
                .unwrap_or(DEFAULT_MIN_PRIORITY),
            pregenerate_on_start: env::var("PREGENERATE_ON_START")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Sliding TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Sweep interval as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    /// Per-item generation timeout as a Duration.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_size: DEFAULT_MAX_SIZE,
            cache_ttl: DEFAULT_TTL_SECS,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL_SECS,
            server_port: DEFAULT_SERVER_PORT,
            generation_concurrency: DEFAULT_CONCURRENCY,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT_SECS,
            generation_max_retries: 0,
            locales: default_locales(),
            max_scenarios: DEFAULT_MAX_SCENARIOS,
            min_priority: DEFAULT_MIN_PRIORITY,
            pregenerate_on_start: false,
        }
    }
}

fn default_locales() -> Vec<String> {
    DEFAULT_LOCALES.iter().map(|l| l.to_string()).collect()
}

/// Splits a comma separated locale list, dropping blanks.
pub fn parse_locales(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a signed integer variable, falling back to `default` when it is
/// missing, unparsable, or not strictly positive.
fn positive_var(name: &str, default: i64) -> i64 {
    match env::var(name).ok().map(|v| v.trim().parse::<i64>()) {
        Some(Ok(value)) if value > 0 => value,
        Some(Ok(value)) => {
            warn!("{}={} is not positive, using default {}", name, value, default);
            default
        }
        Some(Err(_)) => {
            warn!("{} is not a number, using default {}", name, default);
            default
        }
        None => default,
    }
}
