//! # Errors
//!
//! $$
//! \text{optimize}:\ \text{prices}\to\text{weights}\ \cup\ \{\text{InvalidInput},\text{Data},\text{Estimation},\text{Optimization}\}
//! $$
//!
use thiserror::Error;

/// Failure raised by any stage of the optimization pipeline.
///
/// The pipeline either fully succeeds or fails with exactly one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontierError {
  /// The request itself is malformed (too few tickers, bad amount, bad config).
  #[error("invalid input: {0}")]
  InvalidInput(String),
  /// The price data is missing, non-numeric or otherwise unusable.
  #[error("data error: {0}")]
  Data(String),
  /// Expected returns or covariance could not be estimated, or the program is infeasible.
  #[error("estimation error: {0}")]
  Estimation(String),
  /// The numerical solver did not converge.
  #[error("optimization failed: {0}")]
  Optimization(String),
}

impl FrontierError {
  /// Short machine-readable name of the error kind.
  pub fn kind(&self) -> &'static str {
    match self {
      FrontierError::InvalidInput(_) => "invalid_input",
      FrontierError::Data(_) => "data",
      FrontierError::Estimation(_) => "estimation",
      FrontierError::Optimization(_) => "optimization",
    }
  }
}

impl From<csv::Error> for FrontierError {
  fn from(err: csv::Error) -> Self {
    FrontierError::Data(format!("malformed price csv: {err}"))
  }
}

impl From<std::io::Error> for FrontierError {
  fn from(err: std::io::Error) -> Self {
    FrontierError::Data(format!("cannot read price data: {err}"))
  }
}

impl From<ndarray::ShapeError> for FrontierError {
  fn from(err: ndarray::ShapeError) -> Self {
    FrontierError::InvalidInput(format!("price matrix has the wrong shape: {err}"))
  }
}

pub type Result<T> = std::result::Result<T, FrontierError>;
