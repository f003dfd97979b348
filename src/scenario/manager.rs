//! Scenario Cache Manager
//!
//! Binds (slug, locale) pairs to rendered scenario content on top of
//! [`GenericCache`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheStats, GenericCache};
use crate::config::Config;
use crate::scenario::ScenarioParams;

/// Separator between slug and locale in cache keys.
pub const KEY_SEPARATOR: &str = "::";

// == Cached Scenario ==
/// Generation metadata stored next to the content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioMetadata {
    pub slug: String,
    pub locale: String,
    pub params: ScenarioParams,
    /// Set when the scenario is written, never on reads
    pub generated_at: DateTime<Utc>,
}

/// Rendered scenario content with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedScenario {
    pub content: String,
    pub metadata: ScenarioMetadata,
}

/// Cache key of a scenario in one locale.
pub fn scenario_key(slug: &str, locale: &str) -> String {
    format!("{slug}{KEY_SEPARATOR}{locale}")
}

fn slug_prefix(slug: &str) -> String {
    format!("{slug}{KEY_SEPARATOR}")
}

// == Scenario Cache Manager ==
/// Scenario-level view of a [`GenericCache`].
#[derive(Debug)]
pub struct ScenarioCacheManager {
    cache: GenericCache<CachedScenario>,
}

impl ScenarioCacheManager {
    /// Wraps an existing cache.
    pub fn new(cache: GenericCache<CachedScenario>) -> Self {
        Self { cache }
    }

    /// Creates a manager with a cache built from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(GenericCache::from_config(config))
    }

    /// Stores rendered content for `slug` in `locale`, stamping `generated_at`.
    pub async fn cache_scenario(
        &self,
        slug: &str,
        content: impl Into<String>,
        params: ScenarioParams,
        locale: &str,
    ) {
        let value = CachedScenario {
            content: content.into(),
            metadata: ScenarioMetadata {
                slug: slug.to_string(),
                locale: locale.to_string(),
                params,
                generated_at: Utc::now(),
            },
        };
        self.cache.set(scenario_key(slug, locale), value, None).await;
        debug!(slug, locale, "Cached scenario");
    }

    /// Returns the cached scenario, sliding its expiry.
    pub async fn get_scenario(&self, slug: &str, locale: &str) -> Option<CachedScenario> {
        self.cache.get(&scenario_key(slug, locale)).await
    }

    /// Checks for a cached scenario in `locale`, or in any locale when None.
    pub async fn has_scenario(&self, slug: &str, locale: Option<&str>) -> bool {
        match locale {
            Some(locale) => self.cache.has(&scenario_key(slug, locale)).await,
            None => self.cache.has_prefix(&slug_prefix(slug)).await,
        }
    }

    /// Removes the scenario in `locale`, or every locale variant when None.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_scenario(&self, slug: &str, locale: Option<&str>) -> usize {
        let removed = match locale {
            Some(locale) => usize::from(self.cache.delete(&scenario_key(slug, locale)).await),
            None => self.cache.delete_prefix(&slug_prefix(slug)).await,
        };
        debug!(slug, ?locale, removed, "Invalidated scenario");
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn size(&self) -> usize {
        self.cache.size().await
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    /// Stops the underlying cache's sweep and drops all scenarios.
    pub async fn destroy(&self) {
        self.cache.destroy().await;
    }
}
