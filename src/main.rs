//! Command line front end: read a price CSV, optimize, print the allocation.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use clap::ValueEnum;
use frontier_rs::visualization;
use frontier_rs::Objective;
use frontier_rs::OptimizationResult;
use frontier_rs::OptimizerConfig;
use frontier_rs::PortfolioOptimizer;
use frontier_rs::PortfolioRequest;
use frontier_rs::PriceTable;
use prettytable::row;
use prettytable::Table;
use serde_json::json;
use tracing::debug;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ObjectiveArg {
  MaxSharpe,
  MinVolatility,
  EfficientReturn,
}

#[derive(Parser, Debug)]
#[command(name = "frontier")]
#[command(about = "Long-only max-Sharpe portfolio optimizer", long_about = None)]
struct Cli {
  /// Price CSV: a date column followed by one column of closing prices per ticker
  #[arg(short, long)]
  prices: PathBuf,

  /// Tickers to include, comma separated (default: every column)
  #[arg(short, long, value_delimiter = ',')]
  tickers: Vec<String>,

  /// First date included (YYYY-MM-DD; default: one year before the end of the window)
  #[arg(long)]
  start: Option<NaiveDate>,

  /// First date excluded (YYYY-MM-DD)
  #[arg(long)]
  end: Option<NaiveDate>,

  /// Use every row of the CSV when --start is omitted
  #[arg(long)]
  full_history: bool,

  /// Amount of money to split across the portfolio
  #[arg(short, long)]
  amount: Option<f64>,

  /// JSON file with optimizer settings
  #[arg(long)]
  config: Option<PathBuf>,

  /// Annual risk-free rate
  #[arg(long)]
  risk_free_rate: Option<f64>,

  /// Which frontier portfolio to solve for
  #[arg(long, value_enum)]
  objective: Option<ObjectiveArg>,

  /// Annual return floor for `efficient-return`
  #[arg(long)]
  target_return: Option<f64>,

  /// Print the result as JSON
  #[arg(long)]
  json: bool,

  /// Write an HTML chart of the portfolio's historical value, plus a
  /// `<name>_weights.html` allocation chart next to it
  #[arg(long)]
  plot: Option<PathBuf>,
}

fn main() -> ExitCode {
  init_tracing();

  match run(Cli::parse()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("Error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn init_tracing() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    )
    .with_writer(std::io::stderr)
    .init();
}

fn load_config(cli: &Cli) -> Result<OptimizerConfig> {
  let mut config = match &cli.config {
    Some(path) => {
      let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
      serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?
    }
    None => OptimizerConfig::default(),
  };

  if let Some(rf) = cli.risk_free_rate {
    config.risk_free_rate = rf;
  }
  match cli.objective {
    Some(ObjectiveArg::MaxSharpe) => config.objective = Objective::MaxSharpe,
    Some(ObjectiveArg::MinVolatility) => config.objective = Objective::MinVolatility,
    Some(ObjectiveArg::EfficientReturn) => {
      let target = cli
        .target_return
        .context("--target-return is required with --objective efficient-return")?;
      config.objective = Objective::EfficientReturn(target);
    }
    None => {}
  }
  Ok(config)
}

fn run(cli: Cli) -> Result<()> {
  let config = load_config(&cli)?;
  debug!(?config, "configuration");

  let prices = PriceTable::from_csv_path(&cli.prices)
    .with_context(|| format!("failed to load prices from {}", cli.prices.display()))?;

  let mut request = PortfolioRequest {
    tickers: cli.tickers.clone(),
    start: cli.start,
    end: cli.end,
    investment_amount: cli.amount,
  };
  if !cli.full_history {
    if let Some(&last) = prices.dates().last() {
      request = request.with_default_window(last);
    }
  }
  debug!(start = ?request.start, end = ?request.end, "date window");
  let result = PortfolioOptimizer::new(config).run(&prices, &request)?;

  if cli.json {
    println!("{}", render_json(&result)?);
  } else {
    print_tables(&result);
  }

  if let Some(path) = &cli.plot {
    let held: Vec<&str> = result.weights.tickers().collect();
    let window = prices.select(&held)?.between(request.start, request.end);
    let series = window.portfolio_value(&result.weights)?;
    let plot = visualization::plot_portfolio_value(&series, "Portfolio value");
    visualization::write_html(&plot, path)?;

    let allocation =
      visualization::plot_weights(&result.weights, result.value.as_deref(), "Allocation");
    visualization::write_html(&allocation, weights_chart_path(path))?;
  }

  Ok(())
}

fn weights_chart_path(value_chart: &Path) -> PathBuf {
  let stem = value_chart
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "portfolio".to_string());
  value_chart.with_file_name(format!("{stem}_weights.html"))
}

fn render_json(result: &OptimizationResult) -> Result<String> {
  let metrics: serde_json::Map<String, serde_json::Value> = result
    .metrics
    .rows()
    .into_iter()
    .map(|(label, value)| (label.to_string(), value.into()))
    .collect();
  let value = result.formatted_values().map(|values| {
    values
      .into_iter()
      .map(|(ticker, amount)| (ticker, serde_json::Value::from(amount)))
      .collect::<serde_json::Map<_, _>>()
  });

  Ok(serde_json::to_string_pretty(&json!({
    "weights": result.weights,
    "metrics": metrics,
    "value": value,
  }))?)
}

fn print_tables(result: &OptimizationResult) {
  let mut weights = Table::new();
  weights.set_titles(row!["Ticker", "Weight"]);
  for (ticker, w) in result.weights.iter() {
    weights.add_row(row![ticker, format!("{:.2}%", w * 100.0)]);
  }
  weights.printstd();

  let mut metrics = Table::new();
  for (label, value) in result.metrics.rows() {
    metrics.add_row(row![label, value]);
  }
  metrics.printstd();

  if let Some(values) = result.formatted_values() {
    let mut table = Table::new();
    table.set_titles(row!["Ticker", "Value"]);
    for (ticker, amount) in values {
      table.add_row(row![ticker, amount]);
    }
    table.printstd();
  }
}
