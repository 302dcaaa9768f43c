//! Chebyshev collocation machinery on an interval [0, L].
//!
//! Functions are represented by their values on a Chebyshev-Gauss-Lobatto
//! grid or, equivalently, by the coefficients of their Chebyshev expansion.
//! The grid carries the spectral differentiation matrix; the series types
//! support Clenshaw evaluation at arbitrary points of the interval.

use anyhow::{bail, Result};
use nalgebra::DMatrix;
use num_complex::Complex;
use num_traits::Zero;
use rustfft::FftPlanner;

/// Chebyshev-Gauss-Lobatto grid on [0, L], nodes ascending in t.
#[derive(Debug, Clone)]
pub struct ChebyshevGrid {
    nodes: Vec<f64>,
    length: f64,
}

impl ChebyshevGrid {
    /// Builds a grid with `intervals` + 1 nodes on [0, `length`].
    pub fn new(intervals: usize, length: f64) -> Result<Self> {
        if intervals < 2 {
            bail!("Chebyshev grid requires at least 2 intervals.");
        }
        if !length.is_finite() || length <= 0.0 {
            bail!("Grid length must be positive and finite.");
        }
        let n = intervals;
        let mut nodes = Vec::with_capacity(n + 1);
        for k in 0..=n {
            let x = (k as f64 * std::f64::consts::PI / n as f64).cos();
            nodes.push(0.5 * length * (1.0 - x));
        }
        // Pin the endpoints exactly.
        nodes[0] = 0.0;
        nodes[n] = length;
        Ok(Self { nodes, length })
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Spectral differentiation matrix D such that (D·v)_k approximates
    /// f'(t_k) when v holds the nodal values of f.
    pub fn differentiation_matrix(&self) -> DMatrix<f64> {
        let n = self.nodes.len() - 1;
        let mut x = vec![0.0; n + 1];
        let mut c = vec![0.0; n + 1];
        for k in 0..=n {
            x[k] = (k as f64 * std::f64::consts::PI / n as f64).cos();
            let weight = if k == 0 || k == n { 2.0 } else { 1.0 };
            c[k] = weight * if k % 2 == 0 { 1.0 } else { -1.0 };
        }

        let mut d = DMatrix::zeros(n + 1, n + 1);
        for i in 0..=n {
            let mut row_sum = 0.0;
            for j in 0..=n {
                if i == j {
                    continue;
                }
                let entry = (c[i] / c[j]) / (x[i] - x[j]);
                d[(i, j)] = entry;
                row_sum += entry;
            }
            d[(i, i)] = -row_sum;
        }

        // Chain rule for t = L(1 - x)/2.
        d.scale(-2.0 / self.length)
    }

    /// Chebyshev coefficients of the interpolant through complex nodal
    /// values, computed with a length-2N FFT.
    pub fn coefficients_complex(&self, values: &[Complex<f64>]) -> Result<Vec<Complex<f64>>> {
        let n = self.nodes.len() - 1;
        if values.len() != n + 1 {
            bail!(
                "Expected {} nodal values, got {}.",
                n + 1,
                values.len()
            );
        }

        // Even extension of the nodal data, so the DCT-I becomes a plain FFT.
        let m = 2 * n;
        let mut buffer = Vec::with_capacity(m);
        buffer.extend_from_slice(values);
        for k in (1..n).rev() {
            buffer.push(values[k]);
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(m);
        fft.process(&mut buffer);

        let scale = 1.0 / n as f64;
        let mut coefficients = Vec::with_capacity(n + 1);
        for k in 0..=n {
            let weight = if k == 0 || k == n { 0.5 } else { 1.0 };
            coefficients.push(buffer[k] * (weight * scale));
        }
        Ok(coefficients)
    }

    /// Chebyshev coefficients of the interpolant through real nodal values.
    pub fn coefficients(&self, values: &[f64]) -> Result<Vec<f64>> {
        let complex_values: Vec<Complex<f64>> =
            values.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let coefficients = self.coefficients_complex(&complex_values)?;
        Ok(coefficients.into_iter().map(|c| c.re).collect())
    }
}

/// A real matrix-valued function on [0, L], stored as Chebyshev
/// coefficient matrices.
#[derive(Debug, Clone)]
pub struct MatrixSeries {
    coefficients: Vec<DMatrix<f64>>,
    length: f64,
}

impl MatrixSeries {
    /// Builds the series from one matrix of nodal values per grid node.
    pub fn from_nodal_values(grid: &ChebyshevGrid, values: &[DMatrix<f64>]) -> Result<Self> {
        let (rows, cols) = validate_nodal_values(grid, values, |m| (m.nrows(), m.ncols()))?;
        let node_count = grid.node_count();
        let mut coefficients = vec![DMatrix::zeros(rows, cols); node_count];
        let mut entry = vec![0.0; node_count];
        for r in 0..rows {
            for c in 0..cols {
                for (k, value) in values.iter().enumerate() {
                    entry[k] = value[(r, c)];
                }
                let transformed = grid.coefficients(&entry)?;
                for (k, a) in transformed.into_iter().enumerate() {
                    coefficients[k][(r, c)] = a;
                }
            }
        }
        Ok(Self {
            coefficients,
            length: grid.length(),
        })
    }

    /// Clenshaw evaluation at t in [0, L].
    pub fn evaluate(&self, t: f64) -> DMatrix<f64> {
        let rows = self.coefficients[0].nrows();
        let cols = self.coefficients[0].ncols();
        let x = 1.0 - 2.0 * t / self.length;
        let mut b1 = DMatrix::zeros(rows, cols);
        let mut b2 = DMatrix::zeros(rows, cols);
        for a in self.coefficients.iter().skip(1).rev() {
            let next = a + &b1 * (2.0 * x) - &b2;
            b2 = b1;
            b1 = next;
        }
        &self.coefficients[0] + &b1 * x - &b2
    }

    pub fn length(&self) -> f64 {
        self.length
    }
}

/// Complex counterpart of [`MatrixSeries`].
#[derive(Debug, Clone)]
pub struct ComplexMatrixSeries {
    coefficients: Vec<DMatrix<Complex<f64>>>,
    length: f64,
}

impl ComplexMatrixSeries {
    pub fn from_nodal_values(
        grid: &ChebyshevGrid,
        values: &[DMatrix<Complex<f64>>],
    ) -> Result<Self> {
        let (rows, cols) = validate_nodal_values(grid, values, |m| (m.nrows(), m.ncols()))?;
        let node_count = grid.node_count();
        let mut coefficients = vec![DMatrix::zeros(rows, cols); node_count];
        let mut entry = vec![Complex::zero(); node_count];
        for r in 0..rows {
            for c in 0..cols {
                for (k, value) in values.iter().enumerate() {
                    entry[k] = value[(r, c)];
                }
                let transformed = grid.coefficients_complex(&entry)?;
                for (k, a) in transformed.into_iter().enumerate() {
                    coefficients[k][(r, c)] = a;
                }
            }
        }
        Ok(Self {
            coefficients,
            length: grid.length(),
        })
    }

    pub fn evaluate(&self, t: f64) -> DMatrix<Complex<f64>> {
        let rows = self.coefficients[0].nrows();
        let cols = self.coefficients[0].ncols();
        let x = Complex::new(1.0 - 2.0 * t / self.length, 0.0);
        let mut b1: DMatrix<Complex<f64>> = DMatrix::zeros(rows, cols);
        let mut b2: DMatrix<Complex<f64>> = DMatrix::zeros(rows, cols);
        for a in self.coefficients.iter().skip(1).rev() {
            let next = a + &b1 * (x * 2.0) - &b2;
            b2 = b1;
            b1 = next;
        }
        &self.coefficients[0] + &b1 * x - &b2
    }

    /// Number of leading coefficients needed to represent the series to the
    /// given relative tolerance.
    pub fn significant_count(&self, tolerance: f64) -> usize {
        let magnitudes: Vec<f64> = self
            .coefficients
            .iter()
            .map(|a| a.iter().map(|v| v.norm()).fold(0.0, f64::max))
            .collect();
        let peak = magnitudes.iter().cloned().fold(0.0, f64::max);
        if peak == 0.0 {
            return 0;
        }
        magnitudes
            .iter()
            .rposition(|&m| m > tolerance * peak)
            .map_or(0, |k| k + 1)
    }

    pub fn length(&self) -> f64 {
        self.length
    }
}

fn validate_nodal_values<M, F>(grid: &ChebyshevGrid, values: &[M], dims: F) -> Result<(usize, usize)>
where
    F: Fn(&M) -> (usize, usize),
{
    if values.len() != grid.node_count() {
        bail!(
            "Expected {} nodal matrices, got {}.",
            grid.node_count(),
            values.len()
        );
    }
    let (rows, cols) = dims(&values[0]);
    if rows == 0 || cols == 0 {
        bail!("Nodal matrices must be non-empty.");
    }
    for value in values {
        if dims(value) != (rows, cols) {
            bail!("Nodal matrices must all have the same shape.");
        }
    }
    Ok((rows, cols))
}

/// Number of Fourier modes above the relative tolerance in a signal of
/// matrices sampled uniformly over a periodic window.
pub fn fourier_mode_count(
    samples: &[DMatrix<Complex<f64>>],
    tolerance: f64,
) -> Result<usize> {
    if samples.len() < 2 {
        bail!("Fourier analysis requires at least 2 samples.");
    }
    if tolerance <= 0.0 {
        bail!("Tolerance must be positive.");
    }
    let rows = samples[0].nrows();
    let cols = samples[0].ncols();
    for sample in samples {
        if sample.nrows() != rows || sample.ncols() != cols {
            bail!("Samples must all have the same shape.");
        }
    }

    let m = samples.len();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(m);
    let mut buffer = vec![Complex::zero(); m];
    let mut magnitudes = vec![0.0; m];

    for r in 0..rows {
        for c in 0..cols {
            for (j, sample) in samples.iter().enumerate() {
                buffer[j] = sample[(r, c)];
            }
            fft.process(&mut buffer);
            for (j, value) in buffer.iter().enumerate() {
                let magnitude = value.norm();
                if magnitude > magnitudes[j] {
                    magnitudes[j] = magnitude;
                }
            }
        }
    }

    let peak = magnitudes.iter().cloned().fold(0.0, f64::max);
    if peak == 0.0 {
        return Ok(0);
    }
    Ok(magnitudes.iter().filter(|&&m| m > tolerance * peak).count())
}
