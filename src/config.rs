//! # Configuration
//!
//! $$
//! \text{request}=(\mathcal T,[t_0,t_1),A),\qquad \text{config}=(f,r_f,\epsilon,\text{models})
//! $$
//!
//! Optimizer knobs and the explicit per-call request.

use std::collections::HashSet;

use chrono::Duration;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::allocation::validate_amount;
use crate::efficient_frontier::DEFAULT_CUTOFF;
use crate::efficient_frontier::DEFAULT_ROUNDING;
use crate::error::FrontierError;
use crate::error::Result;
use crate::expected_returns::ReturnsModel;
use crate::expected_returns::TRADING_DAYS;
use crate::risk_models::RiskModel;

/// Calendar days covered when a request gives no start date.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Which point of the efficient frontier to solve for.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
  /// Highest Sharpe ratio.
  #[default]
  MaxSharpe,
  /// Lowest variance.
  MinVolatility,
  /// Lowest variance with at least the given annual return.
  EfficientReturn(f64),
}

/// Runtime configuration for [`crate::optimizer::PortfolioOptimizer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
  /// Periods per year used to annualize returns and covariance.
  pub frequency: usize,
  /// Risk-free rate for the Sharpe objective and ratio.
  pub risk_free_rate: f64,
  /// Weights smaller than this are reported as zero.
  pub weight_cutoff: f64,
  /// Decimal places kept in reported weights.
  pub weight_rounding: Option<u32>,
  /// Geometric rather than arithmetic return annualization.
  pub compounding: bool,
  pub returns_model: ReturnsModel,
  pub risk_model: RiskModel,
  pub objective: Objective,
}

impl Default for OptimizerConfig {
  fn default() -> Self {
    Self {
      frequency: TRADING_DAYS,
      risk_free_rate: 0.0,
      weight_cutoff: DEFAULT_CUTOFF,
      weight_rounding: Some(DEFAULT_ROUNDING),
      compounding: true,
      returns_model: ReturnsModel::MeanHistorical,
      risk_model: RiskModel::LedoitWolf,
      objective: Objective::MaxSharpe,
    }
  }
}

impl OptimizerConfig {
  pub fn validate(&self) -> Result<()> {
    if self.frequency == 0 {
      return Err(FrontierError::InvalidInput("frequency must be positive".into()));
    }
    if !self.risk_free_rate.is_finite() {
      return Err(FrontierError::InvalidInput("risk-free rate must be finite".into()));
    }
    if !self.weight_cutoff.is_finite() || self.weight_cutoff < 0.0 {
      return Err(FrontierError::InvalidInput(
        "weight cutoff must be a non-negative number".into(),
      ));
    }
    Ok(())
  }
}

/// What to optimize on one call: which tickers, which dates and how much money.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRequest {
  /// Tickers to include; empty means every column of the price table.
  pub tickers: Vec<String>,
  /// First date included.
  pub start: Option<NaiveDate>,
  /// First date excluded.
  pub end: Option<NaiveDate>,
  pub investment_amount: Option<f64>,
}

impl PortfolioRequest {
  /// Fill a missing `start` with one lookback window before `end`, or before the
  /// day after `last` when `end` is open too.
  pub fn with_default_window(mut self, last: NaiveDate) -> Self {
    if self.start.is_none() {
      let anchor = self.end.unwrap_or(last + Duration::days(1));
      self.start = Some(anchor - Duration::days(DEFAULT_LOOKBACK_DAYS));
    }
    self
  }

  pub fn validate(&self) -> Result<()> {
    if !self.tickers.is_empty() {
      let unique: HashSet<&str> = self.tickers.iter().map(String::as_str).collect();
      if unique.len() < 2 {
        return Err(FrontierError::InvalidInput(
          "please select at least 2 tickers".into(),
        ));
      }
      if unique.len() != self.tickers.len() {
        return Err(FrontierError::InvalidInput("tickers must be unique".into()));
      }
    }
    if let (Some(start), Some(end)) = (self.start, self.end) {
      if start >= end {
        return Err(FrontierError::InvalidInput(format!(
          "start date {start} must be before end date {end}"
        )));
      }
    }
    if let Some(amount) = self.investment_amount {
      validate_amount(amount)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_follow_daily_max_sharpe() {
    let cfg = OptimizerConfig::default();
    assert_eq!(cfg.frequency, 252);
    assert_eq!(cfg.risk_free_rate, 0.0);
    assert_eq!(cfg.objective, Objective::MaxSharpe);
    assert_eq!(cfg.risk_model, RiskModel::LedoitWolf);
    assert!(cfg.validate().is_ok());
  }

  #[test]
  fn config_deserializes_with_defaults() {
    let cfg: OptimizerConfig =
      serde_json::from_str(r#"{"risk_free_rate":0.02,"risk_model":{"shrunk":{"delta":0.3}}}"#)
        .unwrap();
    assert_eq!(cfg.risk_free_rate, 0.02);
    assert_eq!(cfg.risk_model, RiskModel::Shrunk { delta: 0.3 });
    assert_eq!(cfg.frequency, 252);
  }

  #[test]
  fn bad_config_values_are_rejected() {
    let cfg = OptimizerConfig {
      frequency: 0,
      ..OptimizerConfig::default()
    };
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn request_needs_two_unique_tickers() {
    let one = PortfolioRequest {
      tickers: vec!["AAPL".into()],
      ..Default::default()
    };
    assert!(matches!(one.validate(), Err(FrontierError::InvalidInput(_))));

    let dup = PortfolioRequest {
      tickers: vec!["AAPL".into(), "AAPL".into()],
      ..Default::default()
    };
    assert!(dup.validate().is_err());

    let ok = PortfolioRequest {
      tickers: vec!["AAPL".into(), "MSFT".into()],
      investment_amount: Some(1000.0),
      ..Default::default()
    };
    assert!(ok.validate().is_ok());
  }

  #[test]
  fn default_window_covers_the_last_year() {
    let last = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

    let open = PortfolioRequest::default().with_default_window(last);
    assert_eq!(open.start, NaiveDate::from_ymd_opt(2023, 7, 2));
    assert_eq!(open.end, None);

    let bounded = PortfolioRequest {
      end: NaiveDate::from_ymd_opt(2024, 1, 1),
      ..Default::default()
    }
    .with_default_window(last);
    assert_eq!(bounded.start, NaiveDate::from_ymd_opt(2023, 1, 1));

    let explicit = PortfolioRequest {
      start: NaiveDate::from_ymd_opt(2020, 1, 1),
      ..Default::default()
    }
    .with_default_window(last);
    assert_eq!(explicit.start, NaiveDate::from_ymd_opt(2020, 1, 1));
  }

  #[test]
  fn request_rejects_reversed_dates_and_bad_amount() {
    let reversed = PortfolioRequest {
      start: NaiveDate::from_ymd_opt(2024, 6, 1),
      end: NaiveDate::from_ymd_opt(2024, 1, 1),
      ..Default::default()
    };
    assert!(reversed.validate().is_err());

    let broke = PortfolioRequest {
      investment_amount: Some(-10.0),
      ..Default::default()
    };
    assert!(broke.validate().is_err());
  }
}
