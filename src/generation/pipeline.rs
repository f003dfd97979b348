//! Batch Generation Pipeline
//!
//! Walks the parameter space, generates content for every (combination,
//! locale) pair and writes successes into the scenario cache and store.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::{future, stream, StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_GENERATION_TIMEOUT_SECS};
use crate::enumerator::ParameterSpace;
use crate::error::{Result, ScenarioError};
use crate::generation::{
    ContentGenerator, ContentSections, GenerationFailure, GenerationResult, GoalDetector,
    RoundedSlugGenerator, RuleGoalDetector, ScenarioRecord, ScenarioStore, SlugGenerator,
    TemplateContentGenerator,
};
use crate::scenario::{ScenarioCacheManager, ScenarioParams};

// == Collaborators ==
/// External services the pipeline drives.
#[derive(Clone)]
pub struct Collaborators {
    pub content: Arc<dyn ContentGenerator>,
    pub slugs: Arc<dyn SlugGenerator>,
    pub goals: Arc<dyn GoalDetector>,
}

impl Collaborators {
    pub fn new(
        content: Arc<dyn ContentGenerator>,
        slugs: Arc<dyn SlugGenerator>,
        goals: Arc<dyn GoalDetector>,
    ) -> Self {
        Self {
            content,
            slugs,
            goals,
        }
    }

    /// Template content, rounded slugs and rule-based goals.
    pub fn reference() -> Self {
        Self::new(
            Arc::new(TemplateContentGenerator),
            Arc::new(RoundedSlugGenerator),
            Arc::new(RuleGoalDetector),
        )
    }

    /// Reference slugs and goals around a custom content generator.
    pub fn with_content(content: Arc<dyn ContentGenerator>) -> Self {
        Self {
            content,
            ..Self::reference()
        }
    }
}

// == Options ==
/// Execution limits of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Items generated at the same time
    pub concurrency: usize,
    /// Time budget of one content generation attempt
    pub item_timeout: Duration,
    /// Extra attempts after a failed or timed out generation
    pub max_retries: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            item_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.generation_concurrency.max(1),
            item_timeout: config.generation_timeout(),
            max_retries: config.generation_max_retries,
        }
    }
}

/// What to pre-generate in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreGenerateOptions {
    /// Cap on (combination, locale) pairs
    pub max_scenarios: usize,
    /// Combinations below this priority are skipped
    pub min_priority: u8,
    pub locales: Vec<String>,
}

impl PreGenerateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_scenarios: config.max_scenarios,
            min_priority: config.min_priority,
            locales: config.locales.clone(),
        }
    }
}

// == Stop Handle ==
/// Asks runs to stop after their in-flight items.
///
/// Counts stop requests and is never reset. A run watching a handle halts
/// once the count moves past the value it saw when it started.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicU64>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// True once any stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.requests() > 0
    }

    fn requests(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Stop state of one run.
struct RunStop<'a> {
    shared: &'a StopHandle,
    shared_seen: u64,
    own: Option<&'a StopHandle>,
}

impl<'a> RunStop<'a> {
    fn new(shared: &'a StopHandle, own: Option<&'a StopHandle>) -> Self {
        Self {
            shared,
            shared_seen: shared.requests(),
            own,
        }
    }

    fn requested(&self) -> bool {
        self.shared.requests() != self.shared_seen || self.own.is_some_and(StopHandle::is_stopped)
    }
}

enum ItemOutcome {
    Generated { goal: String, locale: String },
    Failed(GenerationFailure),
}

// == Pipeline ==
/// Pre-generates scenario content into the cache (and optional store).
pub struct BatchGenerationPipeline {
    cache: Arc<ScenarioCacheManager>,
    space: ParameterSpace,
    collaborators: Collaborators,
    store: Option<Arc<dyn ScenarioStore>>,
    options: PipelineOptions,
    stop: StopHandle,
}

impl BatchGenerationPipeline {
    pub fn new(
        cache: Arc<ScenarioCacheManager>,
        space: ParameterSpace,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            cache,
            space,
            collaborators,
            store: None,
            options: PipelineOptions::default(),
            stop: StopHandle::new(),
        }
    }

    /// Also hands every generated scenario to `store`.
    pub fn with_store(mut self, store: Arc<dyn ScenarioStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = PipelineOptions {
            concurrency: options.concurrency.max(1),
            ..options
        };
        self
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn cache(&self) -> &Arc<ScenarioCacheManager> {
        &self.cache
    }

    /// Pipeline-wide handle: `stop()` halts every run in progress at the
    /// time of the call. Runs started afterwards are unaffected.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    // == Pre-Generate ==
    /// Generates the most popular combinations for every locale.
    ///
    /// Combinations below `min_priority` are skipped; at most `max_scenarios`
    /// (combination, locale) pairs are attempted, highest priority first.
    pub async fn pre_generate_scenarios(&self, options: &PreGenerateOptions) -> GenerationResult {
        self.pre_generate(options, None).await
    }

    /// Like [`Self::pre_generate_scenarios`], also halting when `stop` is
    /// requested, before or during the run.
    pub async fn pre_generate_scenarios_with_stop(
        &self,
        options: &PreGenerateOptions,
        stop: &StopHandle,
    ) -> GenerationResult {
        self.pre_generate(options, Some(stop)).await
    }

    async fn pre_generate(
        &self,
        options: &PreGenerateOptions,
        stop: Option<&StopHandle>,
    ) -> GenerationResult {
        info!(
            "Pre-generating up to {} scenarios (min priority {}, locales {:?})",
            options.max_scenarios, options.min_priority, options.locales
        );

        let items: Vec<_> = self
            .space
            .by_priority(options.min_priority)
            .flat_map(|combo| {
                options
                    .locales
                    .iter()
                    .map(move |locale| (combo.params, locale.clone()))
            })
            .take(options.max_scenarios)
            .collect();

        self.run(items, stop).await
    }

    /// Generates caller-supplied combinations for every locale, bypassing
    /// the enumerator.
    pub async fn pre_generate_custom_scenarios(
        &self,
        combinations: &[ScenarioParams],
        locales: &[String],
    ) -> GenerationResult {
        self.pre_generate_custom(combinations, locales, None).await
    }

    /// Like [`Self::pre_generate_custom_scenarios`], also halting when
    /// `stop` is requested, before or during the run.
    pub async fn pre_generate_custom_scenarios_with_stop(
        &self,
        combinations: &[ScenarioParams],
        locales: &[String],
        stop: &StopHandle,
    ) -> GenerationResult {
        self.pre_generate_custom(combinations, locales, Some(stop)).await
    }

    async fn pre_generate_custom(
        &self,
        combinations: &[ScenarioParams],
        locales: &[String],
        stop: Option<&StopHandle>,
    ) -> GenerationResult {
        info!(
            "Pre-generating {} custom combinations for {} locales",
            combinations.len(),
            locales.len()
        );

        let items: Vec<_> = combinations
            .iter()
            .flat_map(|params| locales.iter().map(move |locale| (*params, locale.clone())))
            .collect();

        self.run(items, stop).await
    }

    async fn run(
        &self,
        items: Vec<(ScenarioParams, String)>,
        own_stop: Option<&StopHandle>,
    ) -> GenerationResult {
        let started = Instant::now();
        let run_stop = RunStop::new(&self.stop, own_stop);
        let halted = AtomicBool::new(false);

        let mut outcomes = stream::iter(items)
            .take_while(|_| {
                let stop = run_stop.requested();
                if stop {
                    halted.store(true, Ordering::Relaxed);
                }
                future::ready(!stop)
            })
            .map(|(params, locale)| self.process_item(params, locale))
            .buffer_unordered(self.options.concurrency);

        let mut result = GenerationResult::default();
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                ItemOutcome::Generated { goal, locale } => result.record_success(&goal, &locale),
                ItemOutcome::Failed(failure) => result.record_failure(failure),
            }
        }
        drop(outcomes);

        result.stopped = halted.load(Ordering::Relaxed);
        result.processing_time_ms = started.elapsed().as_millis() as u64;

        if result.stopped {
            warn!(
                "Pre-generation stopped early: {} generated, {} failed",
                result.total_generated,
                result.failed()
            );
        } else {
            info!(
                "Pre-generation finished: {} generated, {} failed in {}ms",
                result.total_generated,
                result.failed(),
                result.processing_time_ms
            );
        }
        result
    }

    async fn process_item(&self, params: ScenarioParams, locale: String) -> ItemOutcome {
        let slug = self.collaborators.slugs.slug(&params);
        let goal = self.collaborators.goals.detect(&params);

        let outcome = match self.generate(&params, &locale).await {
            Ok(sections) => self.persist(&slug, &goal, params, &locale, sections).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                debug!(slug = %slug, locale = %locale, goal = %goal, "Generated scenario");
                ItemOutcome::Generated { goal, locale }
            }
            Err(err) => {
                warn!(slug = %slug, locale = %locale, error = %err, "Scenario generation failed");
                ItemOutcome::Failed(GenerationFailure {
                    params,
                    locale,
                    message: err.to_string(),
                })
            }
        }
    }

    /// Calls the content generator under the item timeout, retrying up to
    /// `max_retries` times.
    async fn generate(&self, params: &ScenarioParams, locale: &str) -> Result<ContentSections> {
        let mut attempt = 0;
        loop {
            let err = match timeout(
                self.options.item_timeout,
                self.collaborators.content.generate(params, locale),
            )
            .await
            {
                Ok(Ok(sections)) => return Ok(sections),
                Ok(Err(err)) => err,
                Err(_) => ScenarioError::Timeout(self.options.item_timeout),
            };

            if attempt >= self.options.max_retries {
                return Err(err);
            }
            attempt += 1;
            debug!(locale, attempt, error = %err, "Retrying scenario generation");
        }
    }

    async fn persist(
        &self,
        slug: &str,
        goal: &str,
        params: ScenarioParams,
        locale: &str,
        sections: ContentSections,
    ) -> Result<()> {
        let content = sections.render();
        self.cache
            .cache_scenario(slug, content.clone(), params, locale)
            .await;

        if let Some(store) = &self.store {
            let record = ScenarioRecord {
                slug: slug.to_string(),
                locale: locale.to_string(),
                goal: goal.to_string(),
                params,
                content,
                generated_at: Utc::now(),
            };
            store.save(&record).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use crate::cache::GenericCache;
    use crate::generation::InMemoryScenarioStore;

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentGenerator for CountingGenerator {
        async fn generate(&self, params: &ScenarioParams, locale: &str) -> Result<ContentSections> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TemplateContentGenerator.generate(params, locale).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ScenarioStore for FailingStore {
        async fn save(&self, _record: &ScenarioRecord) -> Result<()> {
            Err(ScenarioError::Store("disk full".into()))
        }
    }

    struct FlakyGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentGenerator for FlakyGenerator {
        async fn generate(&self, params: &ScenarioParams, locale: &str) -> Result<ContentSections> {
            // Fails on the first call only
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ScenarioError::Generation("transient".into()));
            }
            TemplateContentGenerator.generate(params, locale).await
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl ContentGenerator for SlowGenerator {
        async fn generate(&self, params: &ScenarioParams, locale: &str) -> Result<ContentSections> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            TemplateContentGenerator.generate(params, locale).await
        }
    }

    fn slow_pipeline() -> BatchGenerationPipeline {
        BatchGenerationPipeline::new(
            cache(),
            ParameterSpace::default(),
            Collaborators::with_content(Arc::new(SlowGenerator)),
        )
        .with_options(PipelineOptions {
            concurrency: 1,
            ..Default::default()
        })
    }

    fn many_params(n: u32) -> Vec<ScenarioParams> {
        (1..=n)
            .map(|years| ScenarioParams::new(1_000.0, 100.0, 7.0, years).unwrap())
            .collect()
    }

    fn cache() -> Arc<ScenarioCacheManager> {
        let long = Duration::from_secs(300);
        Arc::new(ScenarioCacheManager::new(GenericCache::new(10_000, long, long)))
    }

    fn locales(list: &[&str]) -> Vec<String> {
        list.iter().map(|l| l.to_string()).collect()
    }

    #[tokio::test]
    async fn test_generates_highest_priority_first() {
        let cache = cache();
        let pipeline =
            BatchGenerationPipeline::new(cache.clone(), ParameterSpace::default(), Collaborators::reference());

        let result = pipeline
            .pre_generate_scenarios(&PreGenerateOptions {
                max_scenarios: 6,
                min_priority: 1,
                locales: locales(&["en", "es"]),
            })
            .await;

        assert_eq!(result.total_generated, 6);
        assert_eq!(result.by_locale["en"], 3);
        assert_eq!(result.by_locale["es"], 3);
        assert!(!result.stopped);

        let top = ParameterSpace::default().by_priority(1).next().unwrap();
        let slug = RoundedSlugGenerator.slug(&top.params);
        assert!(cache.has_scenario(&slug, Some("en")).await);
        assert!(cache.has_scenario(&slug, Some("es")).await);
    }

    #[tokio::test]
    async fn test_min_priority_filter() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let pipeline = BatchGenerationPipeline::new(
            cache(),
            ParameterSpace::default(),
            Collaborators::with_content(generator.clone()),
        );

        let result = pipeline
            .pre_generate_scenarios(&PreGenerateOptions {
                max_scenarios: usize::MAX,
                min_priority: 10,
                locales: locales(&["en"]),
            })
            .await;

        let expected = ParameterSpace::default()
            .combinations()
            .filter(|c| c.priority == 10)
            .count();
        assert_eq!(result.total_generated, expected);
        assert_eq!(generator.calls.load(Ordering::SeqCst), expected);
    }

    #[tokio::test]
    async fn test_store_receives_successes() {
        let store = Arc::new(InMemoryScenarioStore::new());
        let pipeline =
            BatchGenerationPipeline::new(cache(), ParameterSpace::default(), Collaborators::reference())
                .with_store(store.clone());

        let params = ScenarioParams::new(10_000.0, 500.0, 7.0, 20).unwrap();
        let result = pipeline
            .pre_generate_custom_scenarios(&[params], &locales(&["en", "pl"]))
            .await;

        assert_eq!(result.total_generated, 2);
        assert_eq!(store.len().await, 2);
        let record = store
            .get("invest-10000-monthly-500-at-7-percent-for-20-years", "pl")
            .await
            .unwrap();
        assert_eq!(record.goal, "wealth");
    }

    #[tokio::test]
    async fn test_store_failure_is_recorded() {
        let pipeline =
            BatchGenerationPipeline::new(cache(), ParameterSpace::default(), Collaborators::reference())
                .with_store(Arc::new(FailingStore));

        let params = ScenarioParams::new(10_000.0, 500.0, 7.0, 20).unwrap();
        let result = pipeline
            .pre_generate_custom_scenarios(&[params], &locales(&["en"]))
            .await;

        assert_eq!(result.total_generated, 0);
        assert_eq!(result.failed(), 1);
        assert!(result.errors[0].message.contains("disk full"));
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_failure() {
        let generator = Arc::new(FlakyGenerator {
            calls: AtomicUsize::new(0),
        });
        let pipeline = BatchGenerationPipeline::new(
            cache(),
            ParameterSpace::default(),
            Collaborators::with_content(generator.clone()),
        )
        .with_options(PipelineOptions {
            concurrency: 1,
            max_retries: 1,
            ..Default::default()
        });

        let params = ScenarioParams::new(1_000.0, 100.0, 7.0, 10).unwrap();
        let result = pipeline
            .pre_generate_custom_scenarios(&[params], &locales(&["en"]))
            .await;

        assert_eq!(result.total_generated, 1);
        assert!(result.errors.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let generator = Arc::new(FlakyGenerator {
            calls: AtomicUsize::new(0),
        });
        let pipeline = BatchGenerationPipeline::new(
            cache(),
            ParameterSpace::default(),
            Collaborators::with_content(generator.clone()),
        );

        let params = ScenarioParams::new(1_000.0, 100.0, 7.0, 10).unwrap();
        let result = pipeline
            .pre_generate_custom_scenarios(&[params], &locales(&["en"]))
            .await;

        assert_eq!(result.total_generated, 0);
        assert_eq!(result.failed(), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let pipeline =
            BatchGenerationPipeline::new(cache(), ParameterSpace::default(), Collaborators::reference());

        let result = pipeline.pre_generate_custom_scenarios(&[], &locales(&["en"])).await;
        assert_eq!(result.attempted, 0);

        let result = pipeline
            .pre_generate_scenarios(&PreGenerateOptions {
                max_scenarios: 10,
                min_priority: 1,
                locales: Vec::new(),
            })
            .await;
        assert_eq!(result.attempted, 0);
        assert!(!result.stopped);
    }

    #[tokio::test]
    async fn test_stop_survives_a_later_run() {
        let pipeline = slow_pipeline();
        let en = locales(&["en"]);
        let long = many_params(100);
        let short = many_params(1);

        let (first, second) = tokio::join!(
            pipeline.pre_generate_custom_scenarios(&long, &en),
            async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                pipeline.stop_handle().stop();
                pipeline.pre_generate_custom_scenarios(&short, &en).await
            }
        );

        assert!(first.stopped);
        assert!(first.attempted < 100);
        assert!(!second.stopped);
        assert_eq!(second.total_generated, 1);
    }

    #[tokio::test]
    async fn test_shared_stop_before_run_is_ignored() {
        let pipeline = slow_pipeline();
        pipeline.stop_handle().stop();

        let result = pipeline
            .pre_generate_custom_scenarios(&many_params(2), &locales(&["en"]))
            .await;

        assert!(!result.stopped);
        assert_eq!(result.total_generated, 2);
    }

    #[tokio::test]
    async fn test_own_stop_halts_only_its_run() {
        let pipeline = slow_pipeline();
        let en = locales(&["en"]);
        let (long, short) = (many_params(100), many_params(10));
        let own = StopHandle::new();

        let (stopped, untouched) = tokio::join!(
            pipeline.pre_generate_custom_scenarios_with_stop(&long, &en, &own),
            async {
                tokio::time::sleep(Duration::from_millis(40)).await;
                own.stop();
                pipeline.pre_generate_custom_scenarios(&short, &en).await
            }
        );

        assert!(stopped.stopped);
        assert!(stopped.attempted < 100);
        assert!(!untouched.stopped);
        assert_eq!(untouched.total_generated, 10);
    }

    #[tokio::test]
    async fn test_own_stop_requested_before_start() {
        let pipeline = slow_pipeline();
        let own = StopHandle::new();
        own.stop();

        let options = PreGenerateOptions {
            max_scenarios: 5,
            min_priority: 1,
            locales: locales(&["en"]),
        };
        let result = pipeline.pre_generate_scenarios_with_stop(&options, &own).await;

        assert!(result.stopped);
        assert_eq!(result.attempted, 0);
    }

    #[tokio::test]
    async fn test_runs_on_spawned_task() {
        let pipeline = Arc::new(BatchGenerationPipeline::new(
            cache(),
            ParameterSpace::default(),
            Collaborators::reference(),
        ));
        let options = PreGenerateOptions {
            max_scenarios: 4,
            min_priority: 1,
            locales: locales(&["en", "pl"]),
        };

        let grid = {
            let pipeline = pipeline.clone();
            let options = options.clone();
            tokio::spawn(async move { pipeline.pre_generate_scenarios(&options).await })
        };
        let custom = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .pre_generate_custom_scenarios(&many_params(3), &locales(&["es"]))
                    .await
            })
        };

        assert_eq!(grid.await.unwrap().total_generated, 4);
        assert_eq!(custom.await.unwrap().total_generated, 3);
    }
}
