//! Scenario Parameters
//!
//! Validated numeric inputs of an investment scenario.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScenarioError};

// == Accepted Ranges ==
pub const MAX_INITIAL_AMOUNT: f64 = 10_000_000.0;
pub const MAX_MONTHLY_CONTRIBUTION: f64 = 1_000_000.0;
pub const MIN_ANNUAL_RETURN: f64 = -50.0;
pub const MAX_ANNUAL_RETURN: f64 = 50.0;
pub const MIN_TIME_HORIZON: u32 = 1;
pub const MAX_TIME_HORIZON: u32 = 100;

// == Scenario Params ==
/// Inputs of an investment scenario.
///
/// Values are range-checked on construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScenarioParams")]
pub struct ScenarioParams {
    /// Starting balance
    pub initial_amount: f64,
    /// Amount added every month
    pub monthly_contribution: f64,
    /// Expected yearly return in percent
    pub annual_return: f64,
    /// Investment length in years
    pub time_horizon: u32,
}

#[derive(Deserialize)]
struct RawScenarioParams {
    initial_amount: f64,
    monthly_contribution: f64,
    annual_return: f64,
    time_horizon: u32,
}

impl TryFrom<RawScenarioParams> for ScenarioParams {
    type Error = ScenarioError;

    fn try_from(raw: RawScenarioParams) -> Result<Self> {
        ScenarioParams::new(
            raw.initial_amount,
            raw.monthly_contribution,
            raw.annual_return,
            raw.time_horizon,
        )
    }
}

impl ScenarioParams {
    // == Constructor ==
    /// Creates validated scenario parameters.
    ///
    /// # Errors
    /// `ScenarioError::InvalidParameters` when a value is not finite or out of range.
    pub fn new(
        initial_amount: f64,
        monthly_contribution: f64,
        annual_return: f64,
        time_horizon: u32,
    ) -> Result<Self> {
        check_range("initial_amount", initial_amount, 0.0, MAX_INITIAL_AMOUNT)?;
        check_range(
            "monthly_contribution",
            monthly_contribution,
            0.0,
            MAX_MONTHLY_CONTRIBUTION,
        )?;
        check_range(
            "annual_return",
            annual_return,
            MIN_ANNUAL_RETURN,
            MAX_ANNUAL_RETURN,
        )?;
        if !(MIN_TIME_HORIZON..=MAX_TIME_HORIZON).contains(&time_horizon) {
            return Err(ScenarioError::InvalidParameters(format!(
                "time_horizon must be between {} and {} years, got {}",
                MIN_TIME_HORIZON, MAX_TIME_HORIZON, time_horizon
            )));
        }

        Ok(Self {
            initial_amount,
            monthly_contribution,
            annual_return,
            time_horizon,
        })
    }

    /// Total amount paid in over the horizon.
    pub fn total_contributions(&self) -> f64 {
        self.initial_amount + self.monthly_contribution * 12.0 * f64::from(self.time_horizon)
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ScenarioError::InvalidParameters(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params() {
        let params = ScenarioParams::new(10_000.0, 500.0, 7.0, 20).unwrap();
        assert_eq!(params.time_horizon, 20);
        assert_eq!(params.total_contributions(), 10_000.0 + 500.0 * 240.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(ScenarioParams::new(-1.0, 0.0, 7.0, 10).is_err());
        assert!(ScenarioParams::new(0.0, 2_000_000.0, 7.0, 10).is_err());
        assert!(ScenarioParams::new(0.0, 100.0, 75.0, 10).is_err());
        assert!(ScenarioParams::new(0.0, 100.0, 7.0, 0).is_err());
        assert!(ScenarioParams::new(0.0, 100.0, 7.0, 101).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = ScenarioParams::new(f64::NAN, 0.0, 7.0, 10).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidParameters(_)));
        assert!(ScenarioParams::new(0.0, f64::INFINITY, 7.0, 10).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ScenarioParams = serde_json::from_str(
            r#"{"initial_amount":1000,"monthly_contribution":100,"annual_return":6.5,"time_horizon":15}"#,
        )
        .unwrap();
        assert_eq!(ok.annual_return, 6.5);

        let bad = serde_json::from_str::<ScenarioParams>(
            r#"{"initial_amount":1000,"monthly_contribution":100,"annual_return":6.5,"time_horizon":0}"#,
        );
        assert!(bad.is_err());
    }
}
