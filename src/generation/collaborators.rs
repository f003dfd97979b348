//! Pipeline Collaborators
//!
//! Narrow interfaces to the content generator, slug generator, goal detector
//! and persistent store, plus the reference implementations used by the
//! binary and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::enumerator::classify_goal;
use crate::error::Result;
use crate::scenario::{scenario_key, ScenarioParams};

// == Content ==
/// One titled block of a scenario page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: String,
}

/// Generated page content before rendering to a single string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentSections {
    pub title: String,
    pub sections: Vec<ContentSection>,
}

impl ContentSections {
    /// Renders the sections as a Markdown document.
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n", self.title);
        for section in &self.sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.heading, section.body));
        }
        out
    }
}

// == Traits ==
/// Produces page content for a scenario in one locale. May fail or be slow.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, params: &ScenarioParams, locale: &str) -> Result<ContentSections>;
}

/// Maps parameters to a URL slug. Must be deterministic.
pub trait SlugGenerator: Send + Sync {
    fn slug(&self, params: &ScenarioParams) -> String;
}

/// Labels a scenario with the goal it most likely serves.
pub trait GoalDetector: Send + Sync {
    fn detect(&self, params: &ScenarioParams) -> String;
}

/// A generated scenario handed to the persistent store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRecord {
    pub slug: String,
    pub locale: String,
    pub goal: String,
    pub params: ScenarioParams,
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

/// Durable storage for generated scenarios; the system of record.
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    async fn save(&self, record: &ScenarioRecord) -> Result<()>;
}

// == Future Value ==
/// Balance after `time_horizon` years of monthly compounding with monthly
/// contributions at the end of each month.
pub fn future_value(params: &ScenarioParams) -> f64 {
    let months = f64::from(params.time_horizon * 12);
    let rate = params.annual_return / 100.0 / 12.0;
    if rate == 0.0 {
        return params.initial_amount + params.monthly_contribution * months;
    }
    let growth = (1.0 + rate).powf(months);
    params.initial_amount * growth + params.monthly_contribution * (growth - 1.0) / rate
}

// == Template Content Generator ==
struct LocaleText {
    title: &'static str,
    summary: &'static str,
    contributions: &'static str,
    growth: &'static str,
}

fn locale_text(locale: &str) -> LocaleText {
    match locale.split(|c: char| c == '-' || c == '_').next().unwrap_or_default() {
        "es" => LocaleText {
            title: "Inversión de {initial} con {monthly} al mes durante {years} años",
            summary: "Resumen",
            contributions: "Aportaciones",
            growth: "Crecimiento",
        },
        "pl" => LocaleText {
            title: "Inwestycja {initial} z wpłatą {monthly} miesięcznie przez {years} lat",
            summary: "Podsumowanie",
            contributions: "Wpłaty",
            growth: "Wzrost",
        },
        _ => LocaleText {
            title: "Investing {initial} with {monthly} a month for {years} years",
            summary: "Summary",
            contributions: "Contributions",
            growth: "Growth",
        },
    }
}

/// Builds scenario pages from fixed per-locale templates.
///
/// Knows English, Spanish and Polish headings; other locales get English.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContentGenerator;

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn generate(&self, params: &ScenarioParams, locale: &str) -> Result<ContentSections> {
        let text = locale_text(locale);
        let final_value = future_value(params);
        let paid_in = params.total_contributions();

        let title = text
            .title
            .replace("{initial}", &format!("{:.0}", params.initial_amount))
            .replace("{monthly}", &format!("{:.0}", params.monthly_contribution))
            .replace("{years}", &params.time_horizon.to_string());

        Ok(ContentSections {
            title,
            sections: vec![
                ContentSection {
                    heading: text.summary.to_string(),
                    body: format!("{:.2} @ {}% / {}y", final_value, params.annual_return, params.time_horizon),
                },
                ContentSection {
                    heading: text.contributions.to_string(),
                    body: format!("{:.2}", paid_in),
                },
                ContentSection {
                    heading: text.growth.to_string(),
                    body: format!("{:.2}", final_value - paid_in),
                },
            ],
        })
    }
}

// == Rounded Slug Generator ==
/// Slugs from rounded parameters, so near-identical inputs share a slug.
///
/// Initial amount rounds to the nearest 100, monthly contribution to the
/// nearest 10 and the return to one decimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundedSlugGenerator;

impl SlugGenerator for RoundedSlugGenerator {
    fn slug(&self, params: &ScenarioParams) -> String {
        format!(
            "invest-{}-monthly-{}-at-{}-percent-for-{}-years",
            round_to(params.initial_amount, 100.0),
            round_to(params.monthly_contribution, 10.0),
            format_rate(params.annual_return),
            params.time_horizon
        )
    }
}

fn round_to(value: f64, step: f64) -> i64 {
    ((value / step).round() * step) as i64
}

fn format_rate(rate: f64) -> String {
    let tenths = (rate * 10.0).round() as i64;
    let sign = if tenths < 0 { "minus-" } else { "" };
    let (whole, frac) = (tenths.abs() / 10, tenths.abs() % 10);
    if frac == 0 {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}-{frac}")
    }
}

// == Rule Goal Detector ==
/// Goal labels from horizon and amount rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleGoalDetector;

impl GoalDetector for RuleGoalDetector {
    fn detect(&self, params: &ScenarioParams) -> String {
        classify_goal(params).to_string()
    }
}

// == In-Memory Store ==
/// Store keeping records in a map, keyed like the cache.
#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    records: RwLock<HashMap<String, ScenarioRecord>>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, slug: &str, locale: &str) -> Option<ScenarioRecord> {
        self.records.read().await.get(&scenario_key(slug, locale)).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ScenarioStore for InMemoryScenarioStore {
    async fn save(&self, record: &ScenarioRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(scenario_key(&record.slug, &record.locale), record.clone());
        Ok(())
    }
}
