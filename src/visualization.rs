//! # Visualization
//!
//! $$
//! \{(t, V_t)\},\ \{(i, w_i)\} \mapsto \text{HTML charts}
//! $$
//!
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use plotly::Bar;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::common::Line;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Axis;
use tracing::info;

use crate::allocation::DollarValue;
use crate::error::Result;
use crate::types::Weights;

/// Line chart of a portfolio value series.
pub fn plot_portfolio_value(series: &[(NaiveDate, f64)], title: &str) -> Plot {
  let dates: Vec<String> = series
    .iter()
    .map(|(d, _)| d.format("%Y-%m-%d").to_string())
    .collect();
  let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();

  let trace = Scatter::new(dates, values)
    .name("Portfolio")
    .mode(Mode::Lines)
    .line(Line::new().color("#1f77b4"));

  let mut plot = Plot::new();
  plot.add_trace(trace);
  plot.set_layout(
    Layout::new()
      .title(Title::from(title))
      .x_axis(Axis::new().title("Date"))
      .y_axis(Axis::new().title("Value")),
  );
  plot
}

/// Bar chart of portfolio weights, optionally annotated with dollar amounts.
pub fn plot_weights(weights: &Weights, values: Option<&[DollarValue]>, title: &str) -> Plot {
  let tickers: Vec<String> = weights.tickers().map(str::to_string).collect();
  let pct: Vec<f64> = weights.iter().map(|(_, w)| w * 100.0).collect();

  let mut trace = Bar::new(tickers, pct).name("Weight (%)");
  if let Some(values) = values {
    trace = trace.text_array(values.iter().map(DollarValue::formatted).collect());
  }

  let mut plot = Plot::new();
  plot.add_trace(trace);
  plot.set_layout(
    Layout::new()
      .title(Title::from(title))
      .x_axis(Axis::new().title("Ticker"))
      .y_axis(Axis::new().title("Weight (%)")),
  );
  plot
}

/// Write `plot` as a standalone HTML file, creating parent directories.
pub fn write_html<P: AsRef<Path>>(plot: &Plot, path: P) -> Result<()> {
  let path = path.as_ref();
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }
  plot.write_html(path);
  info!(path = %path.display(), "wrote chart");
  Ok(())
}
