use crate::traits::PeriodicLinearSystem;
use anyhow::{bail, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Two Mathieu oscillators with linear cross-coupling:
///
/// ```text
///     x'' + (1 + a·cos 2t)·x = x − y
///     y'' + (1 + a·cos 2t)·y = y − x
/// ```
///
/// In first-order form with state u = (x, y, x', y') the coefficient
/// matrix has period π and zero trace, so det Φ(T) = 1 by Liouville's
/// identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoupledMathieu {
    pub amplitude: f64,
}

impl Default for CoupledMathieu {
    fn default() -> Self {
        Self { amplitude: 0.15 }
    }
}

impl PeriodicLinearSystem for CoupledMathieu {
    fn dimension(&self) -> usize {
        4
    }

    fn period(&self) -> f64 {
        PI
    }

    fn coefficients(&self, t: f64, out: &mut DMatrix<f64>) {
        let forcing = self.amplitude * (2.0 * t).cos();
        out.fill(0.0);
        out[(0, 2)] = 1.0;
        out[(1, 3)] = 1.0;
        out[(2, 0)] = -forcing;
        out[(2, 1)] = -1.0;
        out[(3, 0)] = -1.0;
        out[(3, 1)] = -forcing;
    }
}

/// A system with a constant coefficient matrix, declared periodic with an
/// arbitrary period. Φ(t) = e^(tA) in closed form, which makes this the
/// reference problem for the solver and decomposition tests.
#[derive(Debug, Clone)]
pub struct ConstantSystem {
    matrix: DMatrix<f64>,
    period: f64,
}

impl ConstantSystem {
    pub fn new(matrix: DMatrix<f64>, period: f64) -> Result<Self> {
        if matrix.nrows() == 0 {
            bail!("Coefficient matrix must be non-empty.");
        }
        if matrix.nrows() != matrix.ncols() {
            bail!("Coefficient matrix must be square.");
        }
        if !period.is_finite() || period <= 0.0 {
            bail!("Period must be positive and finite.");
        }
        Ok(Self { matrix, period })
    }
}

impl PeriodicLinearSystem for ConstantSystem {
    fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    fn period(&self) -> f64 {
        self.period
    }

    fn coefficients(&self, _t: f64, out: &mut DMatrix<f64>) {
        out.copy_from(&self.matrix);
    }
}
