//! # frontier-rs
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf w \ge 0,\ \mathbf 1^\top\mathbf w = 1}\frac{\mathbf w^\top\hat\mu - r_f}{\sqrt{\mathbf w^\top\hat\Sigma_{LW}\mathbf w}}
//! $$
//!
//! Long-only mean-variance portfolio optimization over historical prices.
//!
//! ```ignore
//! use frontier_rs::PriceTable;
//!
//! let prices = PriceTable::from_csv_path("prices.csv")?;
//! let result = frontier_rs::optimize(&prices, Some(10_000.0))?;
//! println!("{}", result.metrics);
//! ```

pub mod allocation;
pub mod config;
pub mod efficient_frontier;
pub mod error;
pub mod expected_returns;
pub mod optimizer;
pub mod prices;
pub mod risk_models;
pub mod solver;
pub mod types;
pub mod visualization;

#[cfg(test)]
mod fixtures;

pub use allocation::DollarValue;
pub use config::Objective;
pub use config::OptimizerConfig;
pub use config::PortfolioRequest;
pub use error::FrontierError;
pub use optimizer::optimize;
pub use optimizer::OptimizationResult;
pub use optimizer::PortfolioOptimizer;
pub use prices::PriceTable;
pub use types::PortfolioPerformance;
pub use types::Weights;
