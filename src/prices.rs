//! # Price Table
//!
//! $$
//! r_{t,i} = \frac{P_{t,i}}{P_{t-1,i}} - 1
//! $$
//!
//! Date-indexed closing prices, one column per ticker.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use ndarray::s;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use tracing::debug;

use crate::error::FrontierError;
use crate::error::Result;
use crate::types::Weights;

/// Closing prices, rows sorted by ascending unique date, columns keyed by unique ticker.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTable {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  values: Array2<f64>,
}

impl PriceTable {
  /// Build a table, sorting rows by date.
  ///
  /// Every price must be finite and strictly positive, and no date may repeat.
  pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, values: Array2<f64>) -> Result<Self> {
    if values.nrows() != dates.len() || values.ncols() != tickers.len() {
      return Err(FrontierError::InvalidInput(format!(
        "price matrix is {}x{} but there are {} dates and {} tickers",
        values.nrows(),
        values.ncols(),
        dates.len(),
        tickers.len()
      )));
    }

    let mut seen = HashSet::with_capacity(tickers.len());
    for ticker in &tickers {
      if ticker.trim().is_empty() {
        return Err(FrontierError::InvalidInput("ticker symbols must be non-empty".into()));
      }
      if !seen.insert(ticker.as_str()) {
        return Err(FrontierError::InvalidInput(format!("duplicate ticker {ticker}")));
      }
    }

    for ((row, col), &v) in values.indexed_iter() {
      if !v.is_finite() || v <= 0.0 {
        return Err(FrontierError::Data(format!(
          "price for {} on {} must be a positive number, got {v}",
          tickers[col], dates[row]
        )));
      }
    }

    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);

    let sorted_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
    if let Some(w) = sorted_dates.windows(2).find(|w| w[0] == w[1]) {
      return Err(FrontierError::Data(format!("duplicate price row for {}", w[0])));
    }

    let values = if order.iter().enumerate().all(|(pos, &i)| pos == i) {
      values
    } else {
      values.select(Axis(0), &order)
    };

    Ok(Self {
      dates: sorted_dates,
      tickers,
      values,
    })
  }

  /// Parse a CSV whose first column is the date and whose other columns are tickers.
  pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
    let mut rdr = csv::ReaderBuilder::new()
      .trim(csv::Trim::All)
      .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
      return Err(FrontierError::Data(
        "price csv needs a date column followed by ticker columns".into(),
      ));
    }
    let tickers: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut flat = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
      let record = record?;
      // header is line 1
      let line = idx + 2;

      let raw_date = record.get(0).unwrap_or_default();
      let date = parse_date(raw_date).ok_or_else(|| {
        FrontierError::Data(format!("line {line}: cannot parse date '{raw_date}'"))
      })?;

      for (col, ticker) in tickers.iter().enumerate() {
        let cell = record.get(col + 1).unwrap_or_default();
        if cell.is_empty() {
          return Err(FrontierError::Data(format!(
            "line {line}: missing price for {ticker}"
          )));
        }
        let price = cell.parse::<f64>().map_err(|_| {
          FrontierError::Data(format!(
            "line {line}: non-numeric price '{cell}' for {ticker}"
          ))
        })?;
        flat.push(price);
      }
      dates.push(date);
    }

    debug!(rows = dates.len(), tickers = tickers.len(), "parsed price csv");
    let values = Array2::from_shape_vec((dates.len(), tickers.len()), flat)?;
    Self::new(dates, tickers, values)
  }

  pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
    let file = File::open(path.as_ref()).map_err(|err| {
      FrontierError::Data(format!("cannot open {}: {err}", path.as_ref().display()))
    })?;
    Self::from_csv_reader(file)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  /// Number of trading dates.
  pub fn len(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
    self
      .tickers
      .iter()
      .position(|t| t == ticker)
      .map(|j| self.values.column(j))
  }

  /// Keep only the requested tickers, in the requested order.
  pub fn select<S: AsRef<str>>(&self, tickers: &[S]) -> Result<Self> {
    let mut seen = HashSet::with_capacity(tickers.len());
    let mut idx = Vec::with_capacity(tickers.len());
    for ticker in tickers {
      let ticker = ticker.as_ref();
      if !seen.insert(ticker) {
        return Err(FrontierError::InvalidInput(format!(
          "ticker {ticker} requested twice"
        )));
      }
      let j = self
        .tickers
        .iter()
        .position(|t| t == ticker)
        .ok_or_else(|| FrontierError::InvalidInput(format!("no price data for {ticker}")))?;
      idx.push(j);
    }

    Ok(Self {
      dates: self.dates.clone(),
      tickers: idx.iter().map(|&j| self.tickers[j].clone()).collect(),
      values: self.values.select(Axis(1), &idx),
    })
  }

  /// Rows with `start <= date < end`; a missing bound is open.
  pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
    let rows: Vec<usize> = self
      .dates
      .iter()
      .enumerate()
      .filter(|(_, d)| start.map_or(true, |s| **d >= s) && end.map_or(true, |e| **d < e))
      .map(|(i, _)| i)
      .collect();

    Self {
      dates: rows.iter().map(|&i| self.dates[i]).collect(),
      tickers: self.tickers.clone(),
      values: self.values.select(Axis(0), &rows),
    }
  }

  /// Simple periodic returns, one row fewer than the table.
  pub fn returns(&self) -> Array2<f64> {
    if self.values.nrows() < 2 {
      return Array2::zeros((0, self.values.ncols()));
    }

    let prev = self.values.slice(s![..-1, ..]);
    let next = self.values.slice(s![1.., ..]);
    &next / &prev - 1.0
  }

  /// Weighted price series `sum_i P_{t,i} w_i` over the tickers in `weights`.
  pub fn portfolio_value(&self, weights: &Weights) -> Result<Vec<(NaiveDate, f64)>> {
    let mut cols = Vec::with_capacity(weights.len());
    for (ticker, w) in weights.iter() {
      let j = self
        .tickers
        .iter()
        .position(|t| t == ticker)
        .ok_or_else(|| FrontierError::InvalidInput(format!("no price data for {ticker}")))?;
      cols.push((j, w));
    }

    Ok(
      self
        .dates
        .iter()
        .zip(self.values.rows())
        .map(|(date, row)| (*date, cols.iter().map(|&(j, w)| row[j] * w).sum()))
        .collect(),
    )
  }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` (optionally with offset) and RFC 3339.
fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Some(d);
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
    return Some(dt.date());
  }
  if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
    return Some(dt.date_naive());
  }
  DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}
