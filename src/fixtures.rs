//! Seeded synthetic price tables shared by the unit tests.

use chrono::Duration;
use chrono::NaiveDate;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;

use crate::prices::PriceTable;

/// Geometric random walks, one per `(daily drift, daily volatility)` pair, starting at 100.
pub(crate) fn synthetic_prices(rows: usize, specs: &[(f64, f64)], seed: u64) -> PriceTable {
  let mut rng = StdRng::seed_from_u64(seed);
  let mut values = Array2::<f64>::zeros((rows, specs.len()));

  for (j, &(drift, vol)) in specs.iter().enumerate() {
    let normal = Normal::new(drift, vol).unwrap();
    let mut price = 100.0;
    for i in 0..rows {
      if i > 0 {
        price *= f64::exp(normal.sample(&mut rng));
      }
      values[[i, j]] = price;
    }
  }

  let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  let dates = (0..rows).map(|i| start + Duration::days(i as i64)).collect();
  let tickers = (0..specs.len()).map(|j| format!("T{j}")).collect();
  PriceTable::new(dates, tickers, values).unwrap()
}

/// Two assets over 252 trading days where `A` has the higher drift and the lower volatility.
pub(crate) fn dominant_pair() -> PriceTable {
  let prices = synthetic_prices(253, &[(0.0015, 0.008), (-0.0005, 0.02)], 42);
  let values = prices.values().clone();
  PriceTable::new(
    prices.dates().to_vec(),
    vec!["A".to_string(), "B".to_string()],
    values,
  )
  .unwrap()
}
