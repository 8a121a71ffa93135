//! # Quadratic Programs
//!
//! $$
//! \min_{x \ge 0}\ \tfrac12 x^\top P x + q^\top x \quad \text{s.t.}\quad A_{eq}x=b_{eq},\ A_{ge}x\ge b_{ge}
//! $$
//!
//! Long-only quadratic programs handed to the Clarabel interior-point solver.

use clarabel::algebra::*;
use clarabel::solver::*;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use crate::error::FrontierError;
use crate::error::Result;

/// A long-only quadratic program with linear equality and `>=` constraints.
#[derive(Clone, Debug)]
pub struct QuadraticProgram {
  p: Array2<f64>,
  q: Array1<f64>,
  eq: Vec<(Array1<f64>, f64)>,
  ge: Vec<(Array1<f64>, f64)>,
  max_iter: Option<u32>,
}

impl QuadraticProgram {
  /// Objective `1/2 x'Px + q'x`; `p` must be symmetric positive semidefinite.
  pub fn new(p: Array2<f64>, q: Array1<f64>) -> Self {
    Self {
      p,
      q,
      eq: Vec::new(),
      ge: Vec::new(),
      max_iter: None,
    }
  }

  /// Add `a'x = b`.
  pub fn equal(mut self, a: Array1<f64>, b: f64) -> Self {
    self.eq.push((a, b));
    self
  }

  /// Add `a'x >= b`.
  pub fn at_least(mut self, a: Array1<f64>, b: f64) -> Self {
    self.ge.push((a, b));
    self
  }

  /// Cap the number of interior-point iterations (Clarabel's default otherwise).
  pub fn max_iterations(mut self, max_iter: u32) -> Self {
    self.max_iter = Some(max_iter);
    self
  }

  pub fn n_vars(&self) -> usize {
    self.q.len()
  }

  /// Solve the program, returning the primal solution.
  pub fn solve(&self) -> Result<Array1<f64>> {
    let n = self.n_vars();
    if self.p.dim() != (n, n) {
      return Err(FrontierError::InvalidInput(format!(
        "objective matrix is {:?}, expected {n}x{n}",
        self.p.dim()
      )));
    }
    if self
      .eq
      .iter()
      .chain(self.ge.iter())
      .any(|(a, _)| a.len() != n)
    {
      return Err(FrontierError::InvalidInput(
        "constraint row length does not match the number of variables".into(),
      ));
    }

    // Clarabel form: Ax + s = b, s in K. Equalities go to the zero cone,
    // `a'x >= b` becomes `-a'x + s = -b` and `x >= 0` becomes `-x + s = 0`.
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(self.eq.len() + self.ge.len() + n);
    let mut b = Vec::with_capacity(rows.capacity());
    for (a, rhs) in &self.eq {
      rows.push(a.to_vec());
      b.push(*rhs);
    }
    for (a, rhs) in &self.ge {
      rows.push(a.iter().map(|v| -v).collect());
      b.push(-rhs);
    }
    for i in 0..n {
      let mut row = vec![0.0; n];
      row[i] = -1.0;
      rows.push(row);
      b.push(0.0);
    }

    let p_rows: Vec<Vec<f64>> = self.p.outer_iter().map(|r| r.to_vec()).collect();
    let p = CscMatrix::from(&p_rows).to_triu();
    let a = CscMatrix::from(&rows);
    let q = self.q.to_vec();

    let mut cones = Vec::with_capacity(2);
    if !self.eq.is_empty() {
      cones.push(ZeroConeT(self.eq.len()));
    }
    cones.push(NonnegativeConeT(self.ge.len() + n));

    let mut settings = DefaultSettings::<f64> {
      verbose: false,
      ..DefaultSettings::default()
    };
    if let Some(max_iter) = self.max_iter {
      settings.max_iter = max_iter;
    }

    let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
    solver.solve();

    let status = solver.solution.status.clone();
    debug!(?status, "clarabel finished");
    match status {
      SolverStatus::Solved | SolverStatus::AlmostSolved => {
        Ok(Array1::from_vec(solver.solution.x.clone()))
      }
      SolverStatus::PrimalInfeasible
      | SolverStatus::AlmostPrimalInfeasible
      | SolverStatus::DualInfeasible
      | SolverStatus::AlmostDualInfeasible => Err(
        FrontierError::Estimation(format!("quadratic program is infeasible ({status:?})")),
      ),
      other => Err(FrontierError::Optimization(format!(
        "solver did not converge ({other:?})"
      ))),
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn minimum_variance_of_two_uncorrelated_assets() {
    // var 0.04 and 0.01: optimum is inverse variance, (0.2, 0.8)
    let p = array![[0.08, 0.0], [0.0, 0.02]];
    let x = QuadraticProgram::new(p, Array1::zeros(2))
      .equal(array![1.0, 1.0], 1.0)
      .solve()
      .unwrap();

    assert_abs_diff_eq!(x[0], 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(x[1], 0.8, epsilon = 1e-6);
  }

  #[test]
  fn nonnegativity_binds() {
    // unconstrained optimum would short the second asset
    let p = array![[2.0, 0.0], [0.0, 2.0]];
    let q = array![-2.0, 2.0];
    let x = QuadraticProgram::new(p, q).solve().unwrap();

    assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-6);
  }

  #[test]
  fn inequality_row_is_respected() {
    let p = array![[0.08, 0.0], [0.0, 0.02]];
    let x = QuadraticProgram::new(p, Array1::zeros(2))
      .equal(array![1.0, 1.0], 1.0)
      .at_least(array![0.10, 0.05], 0.08)
      .solve()
      .unwrap();

    assert!(0.10 * x[0] + 0.05 * x[1] >= 0.08 - 1e-6);
    assert_abs_diff_eq!(x[0] + x[1], 1.0, epsilon = 1e-6);
  }

  #[test]
  fn infeasible_program_is_reported() {
    let p = array![[1.0, 0.0], [0.0, 1.0]];
    let err = QuadraticProgram::new(p, Array1::zeros(2))
      .equal(array![1.0, 1.0], -1.0)
      .solve()
      .unwrap_err();

    assert!(matches!(err, FrontierError::Estimation(_)));
  }

  #[test]
  fn iteration_cap_reports_non_convergence() {
    let p = array![[0.08, 0.0], [0.0, 0.02]];
    let err = QuadraticProgram::new(p, Array1::zeros(2))
      .equal(array![1.0, 1.0], 1.0)
      .max_iterations(1)
      .solve()
      .unwrap_err();

    assert!(matches!(err, FrontierError::Optimization(_)), "{err}");
  }

  #[test]
  fn objective_uses_both_triangles_of_a_correlated_matrix() {
    // cov [[0.04, 0.01], [0.01, 0.02]]: w_A = (0.02 - 0.01) / (0.04 + 0.02 - 2 * 0.01)
    let p = array![[0.08, 0.02], [0.02, 0.04]];
    let x = QuadraticProgram::new(p, Array1::zeros(2))
      .equal(array![1.0, 1.0], 1.0)
      .solve()
      .unwrap();

    assert_abs_diff_eq!(x[0], 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(x[1], 0.75, epsilon = 1e-6);
  }

  #[test]
  fn dimension_mismatch_is_invalid_input() {
    let err = QuadraticProgram::new(array![[1.0]], Array1::zeros(2))
      .solve()
      .unwrap_err();
    assert!(matches!(err, FrontierError::InvalidInput(_)));
  }
}
