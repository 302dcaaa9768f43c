//! Principal fundamental matrix of x' = A(t)x by Chebyshev collocation.
//!
//! The collocation operator couples the spectral differentiation matrix
//! with the coefficient matrix at each interior node; the rows of the
//! initial node are replaced by identity rows so that Φ(0) = I. One LU
//! factorization serves all n columns of the fundamental matrix.

use crate::chebyshev::{ChebyshevGrid, MatrixSeries};
use crate::traits::PeriodicLinearSystem;
use anyhow::{anyhow, bail, Result};
use nalgebra::DMatrix;

/// The principal fundamental matrix Φ(t) on [0, T], with Φ(0) = I.
#[derive(Debug, Clone)]
pub struct FundamentalMatrix {
    grid: ChebyshevGrid,
    values: Vec<DMatrix<f64>>,
    series: MatrixSeries,
    monodromy: DMatrix<f64>,
    dimension: usize,
}

pub fn solve_fundamental(
    system: &impl PeriodicLinearSystem,
    intervals: usize,
) -> Result<FundamentalMatrix> {
    let dim = system.dimension();
    if dim == 0 {
        bail!("System has zero dimension.");
    }
    let period = system.period();
    if !period.is_finite() || period <= 0.0 {
        bail!("System period must be positive and finite.");
    }

    let grid = ChebyshevGrid::new(intervals, period)?;
    let node_count = grid.node_count();
    let derivative = grid.differentiation_matrix();
    let size = node_count * dim;

    // Unknown ordering: component r at node k lives at index k*dim + r.
    let mut operator: DMatrix<f64> = DMatrix::zeros(size, size);
    let mut coefficient = DMatrix::zeros(dim, dim);
    for (k, &t) in grid.nodes().iter().enumerate() {
        if k == 0 {
            // Boundary rows: Φ(0) = I.
            for r in 0..dim {
                operator[(r, r)] = 1.0;
            }
            continue;
        }
        system.coefficients(t, &mut coefficient);
        for r in 0..dim {
            let row = k * dim + r;
            for j in 0..node_count {
                operator[(row, j * dim + r)] += derivative[(k, j)];
            }
            for c in 0..dim {
                operator[(row, k * dim + c)] -= coefficient[(r, c)];
            }
        }
    }

    let mut rhs: DMatrix<f64> = DMatrix::zeros(size, dim);
    for r in 0..dim {
        rhs[(r, r)] = 1.0;
    }

    let solution = operator.lu().solve(&rhs).ok_or_else(|| {
        anyhow!("Collocation operator is singular; cannot solve for the fundamental matrix.")
    })?;

    let mut values = Vec::with_capacity(node_count);
    for k in 0..node_count {
        let mut value = DMatrix::zeros(dim, dim);
        for r in 0..dim {
            for c in 0..dim {
                value[(r, c)] = solution[(k * dim + r, c)];
            }
        }
        values.push(value);
    }

    let series = MatrixSeries::from_nodal_values(&grid, &values)?;
    let monodromy = values[node_count - 1].clone();

    Ok(FundamentalMatrix {
        grid,
        values,
        series,
        monodromy,
        dimension: dim,
    })
}

impl FundamentalMatrix {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn period(&self) -> f64 {
        self.grid.length()
    }

    pub fn grid(&self) -> &ChebyshevGrid {
        &self.grid
    }

    /// Φ at the grid nodes, one matrix per node.
    pub fn nodal_values(&self) -> &[DMatrix<f64>] {
        &self.values
    }

    /// Evaluates Φ(t) for t in [0, T].
    pub fn evaluate(&self, t: f64) -> DMatrix<f64> {
        self.series.evaluate(t)
    }

    /// The monodromy matrix Φ(T).
    pub fn monodromy(&self) -> &DMatrix<f64> {
        &self.monodromy
    }

    /// Evaluates Φ(t) for any t ≥ 0 through Φ(t + kT) = Φ(t)·Φ(T)^k.
    pub fn evaluate_extended(&self, t: f64) -> Result<DMatrix<f64>> {
        if t < 0.0 {
            bail!("Extended evaluation requires t >= 0.");
        }
        let period = self.period();
        let wraps = (t / period).floor();
        let reduced = t - wraps * period;
        let mut result = self.series.evaluate(reduced);
        for _ in 0..wraps as usize {
            result = &result * &self.monodromy;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matfun::MatrixExponential;
    use crate::systems::{ConstantSystem, CoupledMathieu};

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    struct DegenerateSystem;

    impl PeriodicLinearSystem for DegenerateSystem {
        fn dimension(&self) -> usize {
            0
        }
        fn period(&self) -> f64 {
            1.0
        }
        fn coefficients(&self, _t: f64, _out: &mut DMatrix<f64>) {}
    }

    struct NonPositivePeriod;

    impl PeriodicLinearSystem for NonPositivePeriod {
        fn dimension(&self) -> usize {
            1
        }
        fn period(&self) -> f64 {
            0.0
        }
        fn coefficients(&self, _t: f64, out: &mut DMatrix<f64>) {
            out[(0, 0)] = 0.0;
        }
    }

    #[test]
    fn solve_rejects_invalid_systems() {
        assert_err_contains(solve_fundamental(&DegenerateSystem, 16), "zero dimension");
        assert_err_contains(
            solve_fundamental(&NonPositivePeriod, 16),
            "positive and finite",
        );
        let system = CoupledMathieu::default();
        assert_err_contains(solve_fundamental(&system, 1), "at least 2 intervals");
    }

    #[test]
    fn fundamental_matrix_starts_at_identity() {
        let system = CoupledMathieu::default();
        let fundamental = solve_fundamental(&system, 32).expect("solve should succeed");
        let at_zero = fundamental.evaluate(0.0);
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!(
                    (at_zero[(r, c)] - expected).abs() < 1e-10,
                    "entry ({r}, {c}): got {}",
                    at_zero[(r, c)]
                );
            }
        }
    }

    #[test]
    fn constant_system_matches_matrix_exponential() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -2.0, -3.0]);
        let system = ConstantSystem::new(a.clone(), 1.0).expect("system should build");
        let fundamental = solve_fundamental(&system, 24).expect("solve should succeed");
        let reference = MatrixExponential::new(&a).expect("exponential should build");

        for &t in &[0.25, 0.6, 1.0] {
            let computed = fundamental.evaluate(t);
            let exact = reference.evaluate(t);
            for r in 0..2 {
                for c in 0..2 {
                    let diff = (exact[(r, c)] - nalgebra::Complex::new(computed[(r, c)], 0.0))
                        .norm();
                    assert!(diff < 1e-8, "t = {t}, entry ({r}, {c}): residual {diff}");
                }
            }
        }
    }

    #[test]
    fn extended_evaluation_continues_the_flow() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -2.0, -3.0]);
        let system = ConstantSystem::new(a.clone(), 1.0).expect("system should build");
        let fundamental = solve_fundamental(&system, 24).expect("solve should succeed");
        let reference = MatrixExponential::new(&a).expect("exponential should build");

        let computed = fundamental
            .evaluate_extended(2.5)
            .expect("extended evaluation should succeed");
        let exact = reference.evaluate(2.5);
        for r in 0..2 {
            for c in 0..2 {
                let diff =
                    (exact[(r, c)] - nalgebra::Complex::new(computed[(r, c)], 0.0)).norm();
                assert!(diff < 1e-7, "entry ({r}, {c}): residual {diff}");
            }
        }

        assert_err_contains(fundamental.evaluate_extended(-0.1), "t >= 0");
    }
}
