//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Shared containers for weights and performance figures.

use std::fmt::Display;

use ndarray::Array1;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

/// Ticker-keyed portfolio weights, kept in price-table column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Weights(Vec<(String, f64)>);

impl Weights {
  pub fn new(entries: Vec<(String, f64)>) -> Self {
    Self(entries)
  }

  /// Zip tickers with a weight vector of the same length.
  pub(crate) fn from_parts(tickers: &[String], values: &Array1<f64>) -> Self {
    Self(
      tickers
        .iter()
        .cloned()
        .zip(values.iter().copied())
        .collect(),
    )
  }

  pub fn get(&self, ticker: &str) -> Option<f64> {
    self
      .0
      .iter()
      .find(|(t, _)| t == ticker)
      .map(|(_, w)| *w)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
    self.0.iter().map(|(t, w)| (t.as_str(), *w))
  }

  pub fn tickers(&self) -> impl Iterator<Item = &str> + '_ {
    self.0.iter().map(|(t, _)| t.as_str())
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn sum(&self) -> f64 {
    self.0.iter().map(|(_, w)| w).sum()
  }

  /// Drop every entry whose weight is exactly zero.
  pub fn without_zeros(&self) -> Self {
    Self(
      self
        .0
        .iter()
        .filter(|(_, w)| *w != 0.0)
        .cloned()
        .collect(),
    )
  }
}

impl Serialize for Weights {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (ticker, weight) in &self.0 {
      map.serialize_entry(ticker, weight)?;
    }
    map.end()
  }
}

/// Model performance of a weight vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioPerformance {
  /// Expected annual return `w'mu`.
  pub expected_return: f64,
  /// Annual volatility `sqrt(w'Sw)`.
  pub volatility: f64,
  /// Risk-adjusted return `(expected_return - risk_free) / volatility`.
  pub sharpe: f64,
}

impl PortfolioPerformance {
  /// Display rows: return and risk as percentages with 2 decimals, the ratio as a plain float.
  pub fn rows(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Expected return", format!("{:.2}%", self.expected_return * 100.0)),
      ("Semivariance", format!("{:.2}%", self.volatility * 100.0)),
      ("Sortino ratio", format!("{}", self.sharpe)),
    ]
  }
}

impl Display for PortfolioPerformance {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let rows = self
      .rows()
      .into_iter()
      .map(|(label, value)| format!("{label}: {value}"))
      .collect::<Vec<_>>();
    write!(f, "{}", rows.join(", "))
  }
}
