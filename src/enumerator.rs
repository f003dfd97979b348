//! Parameter Space Enumerator
//!
//! Deterministic, lazily evaluated walk over the grid of scenario parameters,
//! with priority scoring, goal labels and a count estimator.

use serde::Serialize;

use crate::scenario::ScenarioParams;

/// Share of the raw cross product expected to survive plausibility filtering.
pub const PLAUSIBLE_SHARE: f64 = 0.85;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

// == Default Tiers ==
pub const DEFAULT_AMOUNTS: &[f64] = &[0.0, 1_000.0, 5_000.0, 10_000.0, 25_000.0, 50_000.0, 100_000.0];
pub const DEFAULT_MONTHLY: &[f64] = &[0.0, 100.0, 250.0, 500.0, 1_000.0, 2_000.0];
pub const DEFAULT_RETURNS: &[f64] = &[4.0, 6.0, 7.0, 8.0, 10.0];
pub const DEFAULT_YEARS: &[u32] = &[5, 10, 15, 20, 25, 30];

const POPULAR_AMOUNTS: &[f64] = &[10_000.0, 25_000.0, 50_000.0, 100_000.0];
const POPULAR_MONTHLY: &[f64] = &[100.0, 250.0, 500.0, 1_000.0];
const TYPICAL_RETURN: f64 = 7.0;
const ROUND_HORIZONS: &[u32] = &[10, 20, 30];

// == Estimate ==
/// Estimated number of scenarios for a grid of the given tier sizes.
///
/// `floor(amounts * monthly * returns * years * 0.85) * goal_multiplier`,
/// or 0 when any tier is empty.
pub fn estimate_count(
    amount_tiers: u64,
    monthly_tiers: u64,
    return_tiers: u64,
    years_tiers: u64,
    goal_multiplier: u64,
) -> u64 {
    if amount_tiers == 0 || monthly_tiers == 0 || return_tiers == 0 || years_tiers == 0 {
        return 0;
    }
    let raw = amount_tiers as f64 * monthly_tiers as f64 * return_tiers as f64 * years_tiers as f64;
    (raw * PLAUSIBLE_SHARE).floor() as u64 * goal_multiplier
}

// == Scoring ==
/// Popularity score in `1..=10`; higher values are generated first.
pub fn priority_score(params: &ScenarioParams) -> u8 {
    let mut score: u8 = 3;
    if POPULAR_AMOUNTS.contains(&params.initial_amount) {
        score += 2;
    }
    if POPULAR_MONTHLY.contains(&params.monthly_contribution) {
        score += 2;
    }
    if params.annual_return == TYPICAL_RETURN {
        score += 1;
    }
    if ROUND_HORIZONS.contains(&params.time_horizon) {
        score += 2;
    }
    score.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// Goal label derived from the parameters.
pub fn classify_goal(params: &ScenarioParams) -> &'static str {
    match params.time_horizon {
        years if years >= 25 => "retirement",
        15..=18 if params.monthly_contribution > 0.0 => "education",
        0..=3 => "emergency-fund",
        4..=10 if params.initial_amount >= 10_000.0 => "home-purchase",
        _ => "wealth",
    }
}

// == Parameter Combination ==
/// One point of the grid with its derived labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterCombination {
    pub params: ScenarioParams,
    pub goal: String,
    pub priority: u8,
}

impl ParameterCombination {
    /// Derives goal and priority for validated parameters.
    pub fn from_params(params: ScenarioParams) -> Self {
        Self {
            goal: classify_goal(&params).to_string(),
            priority: priority_score(&params),
            params,
        }
    }
}

// == Parameter Space ==
/// Tiered grid of scenario parameters.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    amounts: Vec<f64>,
    monthly: Vec<f64>,
    returns: Vec<f64>,
    years: Vec<u32>,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new(
            DEFAULT_AMOUNTS.to_vec(),
            DEFAULT_MONTHLY.to_vec(),
            DEFAULT_RETURNS.to_vec(),
            DEFAULT_YEARS.to_vec(),
        )
    }
}

impl ParameterSpace {
    pub fn new(amounts: Vec<f64>, monthly: Vec<f64>, returns: Vec<f64>, years: Vec<u32>) -> Self {
        Self {
            amounts,
            monthly,
            returns,
            years,
        }
    }

    /// Size of the raw cross product.
    pub fn grid_size(&self) -> usize {
        self.amounts.len() * self.monthly.len() * self.returns.len() * self.years.len()
    }

    /// [`estimate_count`] over this grid's tier sizes, one goal per point.
    pub fn estimated_count(&self) -> u64 {
        estimate_count(
            self.amounts.len() as u64,
            self.monthly.len() as u64,
            self.returns.len() as u64,
            self.years.len() as u64,
            1,
        )
    }

    /// All plausible combinations in grid order.
    ///
    /// Lazy and restartable: each call starts a fresh walk. Points with no
    /// money at all, or that fail validation, are skipped.
    pub fn combinations(&self) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.amounts.iter().flat_map(move |&amount| {
            self.monthly.iter().flat_map(move |&monthly| {
                self.returns.iter().flat_map(move |&annual_return| {
                    self.years.iter().filter_map(move |&years| {
                        if amount == 0.0 && monthly == 0.0 {
                            return None;
                        }
                        ScenarioParams::new(amount, monthly, annual_return, years)
                            .ok()
                            .map(ParameterCombination::from_params)
                    })
                })
            })
        })
    }

    /// Combinations with priority >= `min_priority`, most popular first.
    ///
    /// Walks the grid once per priority level from the highest down, so a
    /// caller taking the first `n` items never materializes the whole grid.
    /// Within a level, grid order is kept. A floor above the highest
    /// priority yields nothing.
    pub fn by_priority(&self, min_priority: u8) -> impl Iterator<Item = ParameterCombination> + '_ {
        (min_priority.max(MIN_PRIORITY)..=MAX_PRIORITY)
            .rev()
            .flat_map(move |level| self.combinations().filter(move |c| c.priority == level))
    }
}
