//! # Portfolio Optimizer
//!
//! $$
//! \text{prices}\xrightarrow{\ \hat\mu,\ \hat\Sigma_{LW}\ }\mathbf{w}^\*\xrightarrow{\text{clean}}\big(\mathbf{w},\ \mathbb E[R_p],\ \sigma_p,\ \text{SR},\ \mathbf{w}A\big)
//! $$
//!
//! End-to-end pipeline from a price table to a cleaned allocation.

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::allocation::dollar_values;
use crate::allocation::validate_amount;
use crate::allocation::DollarValue;
use crate::config::Objective;
use crate::config::OptimizerConfig;
use crate::config::PortfolioRequest;
use crate::efficient_frontier::EfficientFrontier;
use crate::error::FrontierError;
use crate::error::Result;
use crate::prices::PriceTable;
use crate::types::PortfolioPerformance;
use crate::types::Weights;

/// Output of one optimization call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizationResult {
  /// Cleaned weights; tickers whose weight rounds to zero are omitted.
  pub weights: Weights,
  /// Solver weights for every input ticker, summing to one.
  pub raw_weights: Weights,
  /// Expected return, volatility and risk-adjusted ratio of the portfolio.
  pub metrics: PortfolioPerformance,
  /// Per-ticker dollar amounts, present when an investment amount was given.
  pub value: Option<Vec<DollarValue>>,
}

impl OptimizationResult {
  /// `(ticker, "$1234.57")` pairs, when an investment amount was given.
  pub fn formatted_values(&self) -> Option<Vec<(String, String)>> {
    self.value.as_ref().map(|values| {
      values
        .iter()
        .map(|v| (v.ticker.clone(), v.formatted()))
        .collect()
    })
  }
}

/// Single entry point for the optimization pipeline.
#[derive(Clone, Debug, Default)]
pub struct PortfolioOptimizer {
  config: OptimizerConfig,
}

impl PortfolioOptimizer {
  pub fn new(config: OptimizerConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &OptimizerConfig {
    &self.config
  }

  /// Optimize over every column of `prices`.
  pub fn optimize(
    &self,
    prices: &PriceTable,
    investment_amount: Option<f64>,
  ) -> Result<OptimizationResult> {
    let cfg = &self.config;
    cfg.validate()?;

    if prices.n_assets() < 2 {
      return Err(FrontierError::InvalidInput(format!(
        "please select at least 2 tickers, got {}",
        prices.n_assets()
      )));
    }
    let amount = investment_amount.map(validate_amount).transpose()?;

    let mu = cfg
      .returns_model
      .estimate(prices, cfg.compounding, cfg.frequency)?;
    let cov = cfg.risk_model.estimate(prices, cfg.frequency)?;
    debug!(mu = ?mu.to_vec(), rows = prices.len(), "estimated inputs");

    let mut ef = EfficientFrontier::new(prices.tickers().to_vec(), mu, cov)?;
    let raw_weights = match cfg.objective {
      Objective::MaxSharpe => ef.max_sharpe(cfg.risk_free_rate)?,
      Objective::MinVolatility => ef.min_volatility()?,
      Objective::EfficientReturn(target) => ef.efficient_return(target)?,
    };

    let weights = ef
      .clean_weights(cfg.weight_cutoff, cfg.weight_rounding)?
      .without_zeros();
    let metrics = ef.portfolio_performance(cfg.risk_free_rate)?;
    let value = amount.map(|a| dollar_values(&weights, a)).transpose()?;

    info!(
      held = weights.len(),
      of = prices.n_assets(),
      expected_return = metrics.expected_return,
      volatility = metrics.volatility,
      "optimized portfolio"
    );

    Ok(OptimizationResult {
      weights,
      raw_weights,
      metrics,
      value,
    })
  }

  /// Restrict `prices` to the request's tickers and date window, then optimize.
  pub fn run(&self, prices: &PriceTable, request: &PortfolioRequest) -> Result<OptimizationResult> {
    request.validate()?;

    let selected = if request.tickers.is_empty() {
      prices.clone()
    } else {
      prices.select(&request.tickers)?
    };
    let window = selected.between(request.start, request.end);
    debug!(
      from = ?window.dates().first(),
      to = ?window.dates().last(),
      rows = window.len(),
      "request window"
    );

    self.optimize(&window, request.investment_amount)
  }
}

/// Max-Sharpe allocation with the default configuration.
pub fn optimize(prices: &PriceTable, investment_amount: Option<f64>) -> Result<OptimizationResult> {
  PortfolioOptimizer::default().optimize(prices, investment_amount)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use ndarray::Array2;
  use tracing_test::traced_test;

  use super::*;
  use crate::fixtures::dominant_pair;
  use crate::fixtures::synthetic_prices;

  fn five_assets() -> PriceTable {
    synthetic_prices(
      300,
      &[
        (0.0008, 0.010),
        (0.0005, 0.012),
        (0.0003, 0.009),
        (0.0006, 0.020),
        (0.0001, 0.015),
      ],
      2024,
    )
  }

  #[test]
  fn raw_weights_are_a_long_only_full_allocation() {
    let result = optimize(&five_assets(), None).unwrap();

    assert_eq!(result.raw_weights.len(), 5);
    assert!((result.raw_weights.sum() - 1.0).abs() < 1e-6);
    for (_, w) in result.raw_weights.iter() {
      assert!((0.0..=1.0).contains(&w));
    }
    for (_, w) in result.weights.iter() {
      assert!(w > 0.0 && w <= 1.0);
    }
    assert!(result.value.is_none());
  }

  #[test]
  fn omitted_tickers_hold_zero() {
    let prices = five_assets();
    let result = optimize(&prices, None).unwrap();

    for ticker in prices.tickers() {
      if result.weights.get(ticker).is_none() {
        assert!(result.raw_weights.get(ticker).unwrap() < 1e-4);
      }
    }
    assert!((result.weights.sum() - 1.0).abs() < 1e-3);
  }

  #[test]
  fn identical_inputs_give_identical_results() {
    let prices = five_assets();
    let a = optimize(&prices, Some(25_000.0)).unwrap();
    let b = optimize(&prices, Some(25_000.0)).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn doubling_the_amount_doubles_dollar_values() {
    let prices = five_assets();
    let single = optimize(&prices, Some(10_000.0)).unwrap();
    let double = optimize(&prices, Some(20_000.0)).unwrap();

    let single = single.value.unwrap();
    let double = double.value.unwrap();
    assert_eq!(single.len(), double.len());
    for (a, b) in single.iter().zip(double.iter()) {
      assert_eq!(a.ticker, b.ticker);
      assert_eq!(b.amount, 2.0 * a.amount);
    }
  }

  #[test]
  fn dollar_values_round_trip_against_weights() {
    let amount = 12_345.67;
    let result = optimize(&five_assets(), Some(amount)).unwrap();
    let values = result.value.as_ref().unwrap();

    assert_eq!(values.len(), result.weights.len());
    for v in values {
      let w = result.weights.get(&v.ticker).unwrap();
      let expected = (w * amount * 100.0).round() / 100.0;
      assert!((v.rounded() - expected).abs() < 0.005 + 1e-9);
      assert_eq!(v.formatted(), format!("${expected:.2}"));
    }
  }

  #[test]
  fn dominant_asset_gets_the_larger_weight() {
    let result = optimize(&dominant_pair(), Some(1_000.0)).unwrap();

    let a = result.weights.get("A").unwrap_or(0.0);
    let b = result.weights.get("B").unwrap_or(0.0);
    assert!(a > 0.0);
    assert!(a > b, "A={a} B={b}");
  }

  #[test]
  fn single_ticker_is_invalid_input() {
    let prices = synthetic_prices(100, &[(0.001, 0.01)], 1);
    let err = optimize(&prices, None).unwrap_err();
    assert!(matches!(err, FrontierError::InvalidInput(_)));
  }

  #[test]
  fn constant_prices_are_an_estimation_error() {
    let prices = PriceTable::new(
      (0..20)
        .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i))
        .collect(),
      vec!["A".into(), "B".into()],
      Array2::from_elem((20, 2), 50.0),
    )
    .unwrap();

    let err = optimize(&prices, None).unwrap_err();
    assert!(matches!(err, FrontierError::Estimation(_)), "{err}");
  }

  #[test]
  fn too_short_history_is_an_estimation_error() {
    let prices = synthetic_prices(2, &[(0.001, 0.01), (0.0, 0.02)], 3);
    let err = optimize(&prices, None).unwrap_err();
    assert!(matches!(err, FrontierError::Estimation(_)));
  }

  #[test]
  fn bad_amount_is_invalid_input() {
    let err = optimize(&five_assets(), Some(-1.0)).unwrap_err();
    assert!(matches!(err, FrontierError::InvalidInput(_)));
  }

  #[test]
  fn csv_gaps_surface_as_data_errors() {
    let csv = "Date,A,B\n2024-01-02,10.0,20.0\n2024-01-03,,20.5\n";
    let err = PriceTable::from_csv_reader(csv.as_bytes())
      .and_then(|prices| optimize(&prices, None))
      .unwrap_err();
    assert!(matches!(err, FrontierError::Data(_)));
  }

  #[test]
  fn request_selects_tickers_and_window() {
    let prices = five_assets();
    let start = prices.dates()[50];
    let end = prices.dates()[250];
    let request = PortfolioRequest {
      tickers: vec!["T2".into(), "T0".into()],
      start: Some(start),
      end: Some(end),
      investment_amount: Some(5_000.0),
    };

    let result = PortfolioOptimizer::default().run(&prices, &request).unwrap();
    let held: Vec<&str> = result.raw_weights.tickers().collect();
    assert_eq!(held, vec!["T2", "T0"]);
    assert!(result.value.is_some());

    let lonely = PortfolioRequest {
      tickers: vec!["T2".into()],
      ..Default::default()
    };
    assert!(matches!(
      PortfolioOptimizer::default().run(&prices, &lonely).unwrap_err(),
      FrontierError::InvalidInput(_)
    ));
  }

  #[test]
  fn alternative_objectives_and_models() {
    let prices = five_assets();
    let base = optimize(&prices, None).unwrap();

    let min_vol = PortfolioOptimizer::new(OptimizerConfig {
      objective: Objective::MinVolatility,
      ..OptimizerConfig::default()
    })
    .optimize(&prices, None)
    .unwrap();
    assert!(min_vol.metrics.volatility <= base.metrics.volatility + 1e-9);

    let sample = PortfolioOptimizer::new(OptimizerConfig {
      risk_model: crate::risk_models::RiskModel::Sample,
      returns_model: crate::expected_returns::ReturnsModel::Ema { span: 60 },
      ..OptimizerConfig::default()
    })
    .optimize(&prices, None)
    .unwrap();
    assert_eq!(sample.raw_weights.len(), 5);
    assert!((sample.raw_weights.sum() - 1.0).abs() < 1e-6);
    for (_, w) in sample.raw_weights.iter() {
      assert!((0.0..=1.0).contains(&w));
    }
    assert!(!sample.weights.is_empty());
    assert!(sample.metrics.volatility > 0.0);
  }

  #[test]
  #[traced_test]
  fn pipeline_logs_the_solution() {
    optimize(&dominant_pair(), None).unwrap();
    assert!(logs_contain("optimized portfolio"));
  }
}
