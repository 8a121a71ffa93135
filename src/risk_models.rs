//! # Risk Models
//!
//! $$
//! \hat\Sigma = \delta\,\bar\sigma^2 I + (1-\delta)\,S
//! $$
//!
//! Sample and shrinkage covariance estimators, annualized.

use nalgebra::Cholesky;
use nalgebra::DMatrix;
use nalgebra::SymmetricEigen;
use ndarray::Array2;
use ndarray::Axis;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::error::FrontierError;
use crate::error::Result;
use crate::prices::PriceTable;

/// Covariance estimator.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskModel {
  /// Ledoit-Wolf shrinkage towards a scaled identity.
  #[default]
  LedoitWolf,
  /// Unbiased sample covariance.
  Sample,
  /// Shrinkage towards a scaled identity with a fixed intensity.
  Shrunk {
    /// Shrinkage intensity in `[0, 1]`.
    delta: f64,
  },
}

impl RiskModel {
  pub fn estimate(&self, prices: &PriceTable, frequency: usize) -> Result<Array2<f64>> {
    match *self {
      Self::LedoitWolf => CovarianceShrinkage::new(prices, frequency)?.ledoit_wolf(),
      Self::Sample => sample_cov(prices, frequency),
      Self::Shrunk { delta } => {
        CovarianceShrinkage::new(prices, frequency)?.shrunk_covariance(delta)
      }
    }
  }
}

pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
  DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

pub(crate) fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
  Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

fn returns_matrix(prices: &PriceTable) -> Result<Array2<f64>> {
  let returns = prices.returns();
  if returns.nrows() < 2 {
    return Err(FrontierError::Estimation(format!(
      "need at least 3 price observations to estimate a covariance matrix, got {}",
      prices.len()
    )));
  }
  Ok(returns)
}

/// Unbiased sample covariance of the columns of `x`.
fn unbiased_cov(x: &Array2<f64>) -> Array2<f64> {
  let n = x.nrows() as f64;
  let centered = demean(x);
  centered.t().dot(&centered) / (n - 1.0)
}

fn demean(x: &Array2<f64>) -> Array2<f64> {
  match x.mean_axis(Axis(0)) {
    Some(mean) => x - &mean,
    None => x.clone(),
  }
}

/// Annualized sample covariance of returns, repaired to be positive semidefinite.
pub fn sample_cov(prices: &PriceTable, frequency: usize) -> Result<Array2<f64>> {
  let returns = returns_matrix(prices)?;
  let cov = unbiased_cov(&returns) * frequency as f64;
  Ok(fix_nonpositive_semidefinite(&cov))
}

/// Whether `cov` admits a Cholesky factorization.
pub fn is_positive_semidefinite(cov: &Array2<f64>) -> bool {
  if cov.iter().any(|v| !v.is_finite()) {
    return false;
  }
  let n = cov.nrows();
  let jittered = to_dmatrix(cov) + DMatrix::<f64>::identity(n, n) * 1e-16;
  Cholesky::new(jittered).is_some()
}

/// Clip negative eigenvalues to zero and rebuild the matrix.
pub fn fix_nonpositive_semidefinite(cov: &Array2<f64>) -> Array2<f64> {
  if is_positive_semidefinite(cov) {
    return cov.clone();
  }

  warn!("covariance matrix is not positive semidefinite, clipping negative eigenvalues");
  let eigen = SymmetricEigen::new(to_dmatrix(cov));
  let clipped = eigen.eigenvalues.map(|v| v.max(0.0));
  let fixed = &eigen.eigenvectors * DMatrix::from_diagonal(&clipped) * eigen.eigenvectors.transpose();
  let fixed = (&fixed + fixed.transpose()) * 0.5;

  if !is_positive_semidefinite(&from_dmatrix(&fixed)) {
    warn!("covariance matrix could not be made positive semidefinite");
  }
  from_dmatrix(&fixed)
}

/// Shrinkage estimators over a price table's return series.
#[derive(Clone, Debug)]
pub struct CovarianceShrinkage {
  returns: Array2<f64>,
  frequency: usize,
  delta: Option<f64>,
}

impl CovarianceShrinkage {
  pub fn new(prices: &PriceTable, frequency: usize) -> Result<Self> {
    let returns = returns_matrix(prices)?;
    if returns.iter().any(|v| !v.is_finite()) {
      return Err(FrontierError::Data("returns contain non-finite values".into()));
    }
    Ok(Self {
      returns,
      frequency,
      delta: None,
    })
  }

  /// Shrinkage intensity used by the last estimate.
  pub fn delta(&self) -> Option<f64> {
    self.delta
  }

  /// Fixed-intensity shrinkage of the sample covariance towards `tr(S)/N * I`.
  pub fn shrunk_covariance(&mut self, delta: f64) -> Result<Array2<f64>> {
    if !(0.0..=1.0).contains(&delta) {
      return Err(FrontierError::InvalidInput(format!(
        "shrinkage intensity must be in [0, 1], got {delta}"
      )));
    }

    let s = unbiased_cov(&self.returns);
    let shrunk = Self::shrink_towards_identity(&s, delta);
    self.delta = Some(delta);
    Ok(shrunk * self.frequency as f64)
  }

  /// Ledoit-Wolf estimate with the optimal intensity towards a constant-variance target.
  pub fn ledoit_wolf(&mut self) -> Result<Array2<f64>> {
    let x = demean(&self.returns);
    let n = x.nrows() as f64;
    let p = x.ncols() as f64;

    let emp_cov = x.t().dot(&x) / n;
    let x2 = x.mapv(|v| v * v);
    let emp_cov_trace = x2.sum_axis(Axis(0)) / n;
    let mu = emp_cov_trace.sum() / p;

    let beta_ = x2.t().dot(&x2).sum();
    let delta_ = emp_cov.mapv(|v| v * v).sum();
    let beta = (beta_ / n - delta_) / (p * n);
    let delta = (delta_ - 2.0 * mu * emp_cov_trace.sum() + p * mu * mu) / p;
    let beta = beta.min(delta);

    let shrinkage = if beta == 0.0 || delta <= 0.0 {
      0.0
    } else {
      (beta / delta).clamp(0.0, 1.0)
    };
    debug!(shrinkage, observations = x.nrows(), assets = x.ncols(), "ledoit-wolf");

    let shrunk = Self::shrink_towards_identity(&emp_cov, shrinkage);
    self.delta = Some(shrinkage);
    Ok(shrunk * self.frequency as f64)
  }

  fn shrink_towards_identity(s: &Array2<f64>, delta: f64) -> Array2<f64> {
    let n = s.nrows();
    let mu = s.diag().sum() / n as f64;
    let mut shrunk = s * (1.0 - delta);
    for i in 0..n {
      shrunk[[i, i]] += delta * mu;
    }
    shrunk
  }
}
