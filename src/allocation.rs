//! # Dollar Allocation
//!
//! $$
//! V_i = w_i \cdot A
//! $$
//!
//! Split an investment amount across the retained tickers.

use std::fmt::Display;

use impl_new_derive::ImplNew;
use serde::Serialize;

use crate::error::FrontierError;
use crate::error::Result;
use crate::types::Weights;

/// Dollar amount assigned to one ticker.
#[derive(ImplNew, Clone, Debug, PartialEq, Serialize)]
pub struct DollarValue {
  pub ticker: String,
  /// Unrounded `weight * investment_amount`.
  pub amount: f64,
}

impl DollarValue {
  /// Amount rounded to cents.
  pub fn rounded(&self) -> f64 {
    (self.amount * 100.0).round() / 100.0
  }

  /// Currency string, e.g. `$1234.57`.
  pub fn formatted(&self) -> String {
    format!("${:.2}", self.rounded())
  }
}

impl Display for DollarValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.ticker, self.formatted())
  }
}

/// Check that an investment amount is a finite, strictly positive number.
pub fn validate_amount(amount: f64) -> Result<f64> {
  if amount.is_finite() && amount > 0.0 {
    Ok(amount)
  } else {
    Err(FrontierError::InvalidInput(format!(
      "investment amount must be a positive number, got {amount}"
    )))
  }
}

/// One [`DollarValue`] per weight entry, in the same order.
pub fn dollar_values(weights: &Weights, amount: f64) -> Result<Vec<DollarValue>> {
  let amount = validate_amount(amount)?;
  Ok(
    weights
      .iter()
      .map(|(ticker, w)| DollarValue::new(ticker.to_string(), w * amount))
      .collect(),
  )
}
