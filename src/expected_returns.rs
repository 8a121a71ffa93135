//! # Expected Returns
//!
//! $$
//! \mu_i = \Big(\prod_{t=1}^{T}(1+r_{t,i})\Big)^{f/T}-1
//! $$
//!
//! Annualized expected-return estimators from historical prices.

use ndarray::Array1;
use ndarray::Array2;
use serde::Deserialize;
use serde::Serialize;

use crate::error::FrontierError;
use crate::error::Result;
use crate::prices::PriceTable;

/// Trading days per year.
pub const TRADING_DAYS: usize = 252;

/// Expected-return estimator.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnsModel {
  /// Geometric (or arithmetic) mean of historical returns.
  #[default]
  MeanHistorical,
  /// Exponentially weighted mean of historical returns.
  Ema {
    /// Span of the exponential window, in periods.
    span: usize,
  },
}

impl ReturnsModel {
  pub fn estimate(
    &self,
    prices: &PriceTable,
    compounding: bool,
    frequency: usize,
  ) -> Result<Array1<f64>> {
    match *self {
      Self::MeanHistorical => mean_historical_return(prices, compounding, frequency),
      Self::Ema { span } => ema_historical_return(prices, compounding, span, frequency),
    }
  }
}

fn checked_returns(prices: &PriceTable) -> Result<Array2<f64>> {
  let returns = prices.returns();
  if returns.nrows() == 0 {
    return Err(FrontierError::Estimation(format!(
      "need at least 2 price observations to estimate returns, got {}",
      prices.len()
    )));
  }
  Ok(returns)
}

/// Annualized mean historical return per ticker.
///
/// With `compounding` the geometric mean is used, `(prod(1+r))^(frequency/T) - 1`;
/// otherwise the arithmetic mean scaled by `frequency`.
pub fn mean_historical_return(
  prices: &PriceTable,
  compounding: bool,
  frequency: usize,
) -> Result<Array1<f64>> {
  let returns = checked_returns(prices)?;
  let n = returns.nrows() as f64;
  let f = frequency as f64;

  Ok(
    returns
      .columns()
      .into_iter()
      .map(|col| {
        if compounding {
          let growth: f64 = col.iter().map(|r| 1.0 + r).product();
          growth.powf(f / n) - 1.0
        } else {
          col.sum() / n * f
        }
      })
      .collect(),
  )
}

/// Annualized exponentially weighted mean return per ticker.
///
/// Uses `alpha = 2 / (span + 1)` with bias-adjusted weights, the most recent
/// return weighted highest.
pub fn ema_historical_return(
  prices: &PriceTable,
  compounding: bool,
  span: usize,
  frequency: usize,
) -> Result<Array1<f64>> {
  if span == 0 {
    return Err(FrontierError::InvalidInput("ema span must be positive".into()));
  }

  let returns = checked_returns(prices)?;
  let alpha = 2.0 / (span as f64 + 1.0);
  let t = returns.nrows();
  let weights: Array1<f64> = (0..t).map(|i| (1.0 - alpha).powi((t - 1 - i) as i32)).collect();
  let norm = weights.sum();
  let f = frequency as f64;

  Ok(
    returns
      .columns()
      .into_iter()
      .map(|col| {
        let ema = col.dot(&weights) / norm;
        if compounding {
          (1.0 + ema).powf(f) - 1.0
        } else {
          ema * f
        }
      })
      .collect(),
  )
}
