//! # Efficient Frontier
//!
//! $$
//! \max_{\mathbf w \ge 0,\ \mathbf 1^\top\mathbf w = 1} \frac{\mathbf w^\top\mu - r_f}{\sqrt{\mathbf w^\top\Sigma\mathbf w}}
//! \iff
//! \min_{\mathbf y \ge 0} \mathbf y^\top\Sigma\mathbf y\ \ \text{s.t.}\ (\mu - r_f)^\top\mathbf y = 1,\ \ \mathbf w = \mathbf y / \mathbf 1^\top\mathbf y
//! $$
//!
//! Long-only, fully-invested mean-variance portfolios.

use nalgebra::Cholesky;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use crate::error::FrontierError;
use crate::error::Result;
use crate::risk_models::to_dmatrix;
use crate::solver::QuadraticProgram;
use crate::types::PortfolioPerformance;
use crate::types::Weights;

/// Weights below this magnitude are treated as numerical noise.
pub const DEFAULT_CUTOFF: f64 = 1e-4;
/// Decimal places kept by [`EfficientFrontier::clean_weights`].
pub const DEFAULT_ROUNDING: u32 = 5;

/// Mean-variance optimizer over a fixed set of assets.
#[derive(Clone, Debug)]
pub struct EfficientFrontier {
  tickers: Vec<String>,
  mu: Array1<f64>,
  cov: Array2<f64>,
  weights: Option<Array1<f64>>,
}

impl EfficientFrontier {
  /// `mu` and `cov` must be annualized consistently; `cov` must be positive definite.
  pub fn new(tickers: Vec<String>, mu: Array1<f64>, cov: Array2<f64>) -> Result<Self> {
    let n = tickers.len();
    if n < 2 {
      return Err(FrontierError::InvalidInput(format!(
        "at least 2 assets are required, got {n}"
      )));
    }
    if mu.len() != n || cov.dim() != (n, n) {
      return Err(FrontierError::InvalidInput(format!(
        "expected returns ({}) and covariance {:?} do not match {n} tickers",
        mu.len(),
        cov.dim()
      )));
    }
    if mu.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
      return Err(FrontierError::Estimation(
        "expected returns or covariance contain non-finite values".into(),
      ));
    }

    let cov = (&cov + &cov.t()) * 0.5;
    if Cholesky::new(to_dmatrix(&cov)).is_none() {
      return Err(FrontierError::Estimation(
        "covariance matrix is singular or not positive definite".into(),
      ));
    }

    Ok(Self {
      tickers,
      mu,
      cov,
      weights: None,
    })
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn expected_returns(&self) -> &Array1<f64> {
    &self.mu
  }

  pub fn covariance(&self) -> &Array2<f64> {
    &self.cov
  }

  fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  /// Tangency portfolio: the long-only portfolio with the highest Sharpe ratio.
  pub fn max_sharpe(&mut self, risk_free_rate: f64) -> Result<Weights> {
    if !risk_free_rate.is_finite() {
      return Err(FrontierError::InvalidInput("risk-free rate must be finite".into()));
    }
    if self.mu.iter().all(|&m| m <= risk_free_rate) {
      return Err(FrontierError::Estimation(
        "at least one asset must have an expected return exceeding the risk-free rate".into(),
      ));
    }

    let n = self.n_assets();
    let excess = &self.mu - risk_free_rate;
    let y = QuadraticProgram::new(&self.cov * 2.0, Array1::zeros(n))
      .equal(excess, 1.0)
      .solve()?;
    self.set_weights(y)
  }

  /// Global minimum-variance portfolio.
  pub fn min_volatility(&mut self) -> Result<Weights> {
    let n = self.n_assets();
    let w = QuadraticProgram::new(&self.cov * 2.0, Array1::zeros(n))
      .equal(Array1::ones(n), 1.0)
      .solve()?;
    self.set_weights(w)
  }

  /// Minimum-variance portfolio with an expected return of at least `target_return`.
  pub fn efficient_return(&mut self, target_return: f64) -> Result<Weights> {
    let best = self.mu.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !target_return.is_finite() || target_return > best {
      return Err(FrontierError::InvalidInput(format!(
        "target return {target_return} is above the highest expected return {best}"
      )));
    }

    let n = self.n_assets();
    let w = QuadraticProgram::new(&self.cov * 2.0, Array1::zeros(n))
      .equal(Array1::ones(n), 1.0)
      .at_least(self.mu.clone(), target_return)
      .solve()?;
    self.set_weights(w)
  }

  /// Clamp solver noise below zero and rescale to a fully-invested portfolio.
  fn set_weights(&mut self, raw: Array1<f64>) -> Result<Weights> {
    let clipped = raw.mapv(|v| v.max(0.0));
    let total = clipped.sum();
    if !total.is_finite() || total <= 0.0 {
      return Err(FrontierError::Optimization(
        "solver returned a degenerate weight vector".into(),
      ));
    }

    let w = clipped / total;
    debug!(weights = ?w.to_vec(), "solved weights");
    let out = Weights::from_parts(&self.tickers, &w);
    self.weights = Some(w);
    Ok(out)
  }

  /// Raw weights of the last solve.
  pub fn weights(&self) -> Option<Weights> {
    self
      .weights
      .as_ref()
      .map(|w| Weights::from_parts(&self.tickers, w))
  }

  fn solved(&self) -> Result<&Array1<f64>> {
    self.weights.as_ref().ok_or_else(|| {
      FrontierError::InvalidInput("no portfolio has been optimized yet".into())
    })
  }

  /// Zero weights below `cutoff` in magnitude and round the rest to `rounding` decimals.
  pub fn clean_weights(&self, cutoff: f64, rounding: Option<u32>) -> Result<Weights> {
    let w = self.solved()?;
    let cleaned = w.mapv(|v| {
      if v.abs() < cutoff {
        0.0
      } else {
        match rounding {
          Some(places) => {
            let scale = 10f64.powi(places as i32);
            (v * scale).round() / scale
          }
          None => v,
        }
      }
    });
    Ok(Weights::from_parts(&self.tickers, &cleaned))
  }

  /// Expected return, volatility and Sharpe ratio of the raw weights.
  pub fn portfolio_performance(&self, risk_free_rate: f64) -> Result<PortfolioPerformance> {
    let w = self.solved()?;
    let expected_return = w.dot(&self.mu);
    let volatility = w.dot(&self.cov.dot(w)).max(0.0).sqrt();
    let sharpe = if volatility > 1e-15 {
      (expected_return - risk_free_rate) / volatility
    } else {
      0.0
    };

    Ok(PortfolioPerformance {
      expected_return,
      volatility,
      sharpe,
    })
  }
}
