//! Floquet decomposition Φ(t) = P(t)·e^(tB) of the principal fundamental
//! matrix of a linear periodic system.
//!
//! B = log(Φ(T))/T with the principal branch taken eigenvalue-wise; the
//! Floquet exponents are ln(μᵢ)/T for the multipliers μᵢ (eigenvalues of
//! the monodromy matrix), built from one shared eigendecomposition so the
//! multiplier-exponent relation holds by construction.

use crate::chebyshev::{fourier_mode_count, ComplexMatrixSeries};
use crate::fundamental::{solve_fundamental, FundamentalMatrix};
use crate::matfun::{eigendecompose, MatrixExponential};
use crate::traits::PeriodicLinearSystem;
use anyhow::{bail, Result};
use nalgebra::DMatrix;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FloquetSettings {
    /// Chebyshev intervals for the fundamental matrix solve.
    pub intervals: usize,
    /// Relative cutoff for coefficient counts in the periodicity report.
    pub coefficient_tolerance: f64,
    /// Uniform samples per period for the Fourier re-expansion of P.
    pub samples_per_period: usize,
}

impl Default for FloquetSettings {
    fn default() -> Self {
        Self {
            intervals: 64,
            coefficient_tolerance: 1e-8,
            samples_per_period: 64,
        }
    }
}

/// Empirical evidence that the factor P is periodic: Fourier mode counts
/// of P sampled over one and over two periods, and the defect between
/// P(T) and P(0). Reported as diagnostics, not asserted against a
/// threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodicityReport {
    pub single_period_modes: usize,
    pub double_period_modes: usize,
    pub chebyshev_coefficients: usize,
    pub endpoint_defect: f64,
}

/// Serializable summary of a decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloquetSummary {
    pub dimension: usize,
    pub period: f64,
    pub exponents: Vec<Complex<f64>>,
    pub multipliers: Vec<Complex<f64>>,
    pub monodromy_determinant: f64,
    pub multiplier_product: Complex<f64>,
    pub periodicity: PeriodicityReport,
}

#[derive(Debug)]
pub struct FloquetDecomposition {
    fundamental: FundamentalMatrix,
    generator: DMatrix<Complex<f64>>,
    exponents: Vec<Complex<f64>>,
    multipliers: Vec<Complex<f64>>,
    exponential: MatrixExponential,
    periodic_factor: ComplexMatrixSeries,
    periodicity: PeriodicityReport,
}

pub fn decompose(
    system: &impl PeriodicLinearSystem,
    settings: FloquetSettings,
) -> Result<FloquetDecomposition> {
    if settings.coefficient_tolerance <= 0.0 {
        bail!("coefficient_tolerance must be positive.");
    }
    if settings.samples_per_period < 4 {
        bail!("samples_per_period must be at least 4.");
    }

    let fundamental = solve_fundamental(system, settings.intervals)?;
    let period = fundamental.period();

    let mut eigendecomposition = eigendecompose(fundamental.monodromy())?;
    let multipliers = eigendecomposition.eigenvalues.clone();
    for mu in &multipliers {
        if mu.norm() <= f64::EPSILON {
            bail!("Monodromy matrix is singular; no Floquet generator exists.");
        }
    }

    let exponents: Vec<Complex<f64>> = multipliers.iter().map(|mu| mu.ln() / period).collect();
    let generator = eigendecomposition.map_spectrum(|mu| mu.ln() / period);

    // Rewrite the spectrum so the shared decomposition generates e^(tB).
    eigendecomposition.eigenvalues = exponents.clone();
    let exponential = MatrixExponential::from_eigendecomposition(eigendecomposition);

    // Periodic factor at the solver nodes: P(t_k) = Φ(t_k)·e^(-t_k·B).
    let grid = fundamental.grid().clone();
    let mut factor_values = Vec::with_capacity(grid.node_count());
    for (k, &t) in grid.nodes().iter().enumerate() {
        let phi = fundamental.nodal_values()[k].map(|v| Complex::new(v, 0.0));
        factor_values.push(&phi * exponential.evaluate(-t));
    }
    let periodic_factor = ComplexMatrixSeries::from_nodal_values(&grid, &factor_values)?;

    let mut decomposition = FloquetDecomposition {
        fundamental,
        generator,
        exponents,
        multipliers,
        exponential,
        periodic_factor,
        periodicity: PeriodicityReport {
            single_period_modes: 0,
            double_period_modes: 0,
            chebyshev_coefficients: 0,
            endpoint_defect: 0.0,
        },
    };
    decomposition.periodicity = decomposition.periodicity_report(&settings)?;
    Ok(decomposition)
}

impl FloquetDecomposition {
    pub fn dimension(&self) -> usize {
        self.fundamental.dimension()
    }

    pub fn period(&self) -> f64 {
        self.fundamental.period()
    }

    pub fn fundamental(&self) -> &FundamentalMatrix {
        &self.fundamental
    }

    pub fn monodromy(&self) -> &DMatrix<f64> {
        self.fundamental.monodromy()
    }

    /// B = log(Φ(T))/T.
    pub fn generator(&self) -> &DMatrix<Complex<f64>> {
        &self.generator
    }

    /// Eigenvalues of B.
    pub fn exponents(&self) -> &[Complex<f64>] {
        &self.exponents
    }

    /// Eigenvalues of the monodromy matrix, equal to exp(exponent·T).
    pub fn multipliers(&self) -> &[Complex<f64>] {
        &self.multipliers
    }

    /// The function s ↦ e^(s·B).
    pub fn exponential(&self) -> &MatrixExponential {
        &self.exponential
    }

    /// P(t) = Φ(t)·e^(-tB) on [0, T].
    pub fn periodic_factor(&self) -> &ComplexMatrixSeries {
        &self.periodic_factor
    }

    pub fn periodicity(&self) -> PeriodicityReport {
        self.periodicity
    }

    /// Evaluates P(t) for any t ≥ 0 through the extended fundamental
    /// matrix, so periodicity can be probed across several periods.
    pub fn periodic_factor_extended(&self, t: f64) -> Result<DMatrix<Complex<f64>>> {
        let phi = self
            .fundamental
            .evaluate_extended(t)?
            .map(|v| Complex::new(v, 0.0));
        Ok(&phi * self.exponential.evaluate(-t))
    }

    pub fn summary(&self) -> FloquetSummary {
        let product = self
            .multipliers
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, mu| acc * mu);
        FloquetSummary {
            dimension: self.dimension(),
            period: self.period(),
            exponents: self.exponents.clone(),
            multipliers: self.multipliers.clone(),
            monodromy_determinant: self.monodromy().determinant(),
            multiplier_product: product,
            periodicity: self.periodicity,
        }
    }

    fn periodicity_report(&self, settings: &FloquetSettings) -> Result<PeriodicityReport> {
        let period = self.period();
        let samples = settings.samples_per_period;

        let single = self.sample_factor(period, samples)?;
        let double = self.sample_factor(2.0 * period, 2 * samples)?;
        let single_period_modes = fourier_mode_count(&single, settings.coefficient_tolerance)?;
        let double_period_modes = fourier_mode_count(&double, settings.coefficient_tolerance)?;

        let defect = (self.periodic_factor_extended(period)? - self.periodic_factor.evaluate(0.0))
            .norm();

        Ok(PeriodicityReport {
            single_period_modes,
            double_period_modes,
            chebyshev_coefficients: self
                .periodic_factor
                .significant_count(settings.coefficient_tolerance),
            endpoint_defect: defect,
        })
    }

    fn sample_factor(&self, window: f64, count: usize) -> Result<Vec<DMatrix<Complex<f64>>>> {
        let mut samples = Vec::with_capacity(count);
        for j in 0..count {
            let t = window * j as f64 / count as f64;
            samples.push(self.periodic_factor_extended(t)?);
        }
        Ok(samples)
    }
}
