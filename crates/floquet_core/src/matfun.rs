//! Dense matrix functions built on a shared eigendecomposition: the
//! matrix exponential as a function of a scalar argument, and the
//! principal matrix logarithm.
//!
//! All routines assume a diagonalizable input. A defective or
//! near-defective matrix surfaces as a singular eigenvector matrix and is
//! reported as an error; there is no Jordan or Schur fallback.

use anyhow::{anyhow, bail, Result};
use nalgebra::linalg::SVD;
use nalgebra::DMatrix;
use num_complex::Complex;

/// Eigendecomposition M = V·diag(λ)·V⁻¹ of a real square matrix, with
/// complex eigenvalues and eigenvectors.
#[derive(Debug, Clone)]
pub struct Eigendecomposition {
    pub eigenvalues: Vec<Complex<f64>>,
    pub vectors: DMatrix<Complex<f64>>,
    pub vectors_inv: DMatrix<Complex<f64>>,
}

pub fn eigendecompose(matrix: &DMatrix<f64>) -> Result<Eigendecomposition> {
    let dim = matrix.nrows();
    if dim == 0 {
        bail!("Matrix has zero dimension.");
    }
    if matrix.ncols() != dim {
        bail!("Eigendecomposition requires a square matrix.");
    }

    let eigenvalues: Vec<Complex<f64>> = matrix
        .clone()
        .complex_eigenvalues()
        .iter()
        .cloned()
        .collect();
    let complex_matrix = matrix.map(|v| Complex::new(v, 0.0));

    let mut vectors: DMatrix<Complex<f64>> = DMatrix::zeros(dim, dim);
    for (idx, &lambda) in eigenvalues.iter().enumerate() {
        let mut shifted = complex_matrix.clone();
        for i in 0..dim {
            shifted[(i, i)] -= lambda;
        }
        // The null direction of the shifted matrix is the last right
        // singular vector: the conjugate of the last row of Vᴴ.
        let svd = SVD::new(shifted, true, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| anyhow!("Failed to compute eigenvector for eigenvalue index {}", idx))?;
        let row_index = v_t.nrows().saturating_sub(1);
        for i in 0..dim {
            vectors[(i, idx)] = v_t[(row_index, i)].conj();
        }
    }
    normalize_columns(&mut vectors);

    let vectors_inv = vectors.clone().try_inverse().ok_or_else(|| {
        anyhow!("Eigenvector matrix is singular; the matrix may be defective.")
    })?;

    Ok(Eigendecomposition {
        eigenvalues,
        vectors,
        vectors_inv,
    })
}

impl Eigendecomposition {
    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Applies f to the spectrum and reassembles V·diag(f(λ))·V⁻¹.
    pub fn map_spectrum<F>(&self, f: F) -> DMatrix<Complex<f64>>
    where
        F: Fn(Complex<f64>) -> Complex<f64>,
    {
        let dim = self.dimension();
        let mut diagonal: DMatrix<Complex<f64>> = DMatrix::zeros(dim, dim);
        for (i, &lambda) in self.eigenvalues.iter().enumerate() {
            diagonal[(i, i)] = f(lambda);
        }
        &self.vectors * diagonal * &self.vectors_inv
    }
}

/// The matrix-valued function s ↦ e^(s·M), constructed once from the
/// eigendecomposition of M and evaluable at any scalar argument.
#[derive(Debug, Clone)]
pub struct MatrixExponential {
    eigendecomposition: Eigendecomposition,
}

impl MatrixExponential {
    pub fn new(matrix: &DMatrix<f64>) -> Result<Self> {
        Ok(Self {
            eigendecomposition: eigendecompose(matrix)?,
        })
    }

    /// Wraps an existing decomposition whose eigenvalues already describe
    /// the generator.
    pub fn from_eigendecomposition(eigendecomposition: Eigendecomposition) -> Self {
        Self { eigendecomposition }
    }

    /// Evaluates e^(s·M) = V·diag(exp(λᵢ·s))·V⁻¹.
    pub fn evaluate(&self, s: f64) -> DMatrix<Complex<f64>> {
        self.eigendecomposition.map_spectrum(|lambda| (lambda * s).exp())
    }

    pub fn eigenvalues(&self) -> &[Complex<f64>] {
        &self.eigendecomposition.eigenvalues
    }
}

/// Principal matrix logarithm of a diagonalizable real matrix, taken
/// eigenvalue-wise with the principal branch of the complex logarithm.
pub fn principal_log(matrix: &DMatrix<f64>) -> Result<DMatrix<Complex<f64>>> {
    let eigendecomposition = eigendecompose(matrix)?;
    for lambda in &eigendecomposition.eigenvalues {
        if lambda.norm() <= f64::EPSILON {
            bail!("Matrix is singular; no logarithm exists.");
        }
    }
    Ok(eigendecomposition.map_spectrum(|lambda| lambda.ln()))
}

fn normalize_columns(matrix: &mut DMatrix<Complex<f64>>) {
    let (rows, cols) = matrix.shape();
    for c in 0..cols {
        let norm = (0..rows)
            .map(|r| matrix[(r, c)].norm_sqr())
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for r in 0..rows {
                matrix[(r, c)] /= norm;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &DMatrix<Complex<f64>>, expected: &DMatrix<f64>, tol: f64) {
        for r in 0..expected.nrows() {
            for c in 0..expected.ncols() {
                let diff = (actual[(r, c)] - Complex::new(expected[(r, c)], 0.0)).norm();
                assert!(
                    diff < tol,
                    "entry ({r}, {c}): got {}, expected {}",
                    actual[(r, c)],
                    expected[(r, c)]
                );
            }
        }
    }

    #[test]
    fn eigendecompose_reconstructs_real_spectrum_matrix() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -2.0, -3.0]);
        let eig = eigendecompose(&a).expect("decomposition should succeed");
        assert_close(&eig.map_spectrum(|l| l), &a, 1e-8);
    }

    #[test]
    fn eigendecompose_reconstructs_rotation_matrix() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0]);
        let eig = eigendecompose(&a).expect("decomposition should succeed");
        assert_close(&eig.map_spectrum(|l| l), &a, 1e-8);
        for lambda in &eig.eigenvalues {
            assert!(lambda.re.abs() < 1e-10);
            assert!((lambda.im.abs() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn eigendecompose_rejects_bad_shapes() {
        let empty = DMatrix::<f64>::zeros(0, 0);
        let err = format!("{}", eigendecompose(&empty).expect_err("expected error"));
        assert!(err.contains("zero dimension"));

        let rect = DMatrix::<f64>::zeros(2, 3);
        let err = format!("{}", eigendecompose(&rect).expect_err("expected error"));
        assert!(err.contains("square"));
    }

    #[test]
    fn matrix_exponential_at_zero_is_identity() {
        let a = DMatrix::from_row_slice(2, 2, &[0.3, -1.0, 1.0, 0.1]);
        let exp = MatrixExponential::new(&a).expect("construction should succeed");
        let identity = DMatrix::identity(2, 2);
        assert_close(&exp.evaluate(0.0), &identity, 1e-10);
    }

    #[test]
    fn matrix_exponential_matches_scalar_case() {
        let a = DMatrix::from_row_slice(1, 1, &[-0.7]);
        let exp = MatrixExponential::new(&a).expect("construction should succeed");
        for &s in &[0.5, 1.0, 3.0] {
            let value = exp.evaluate(s)[(0, 0)];
            assert!((value.re - (-0.7 * s).exp()).abs() < 1e-12);
            assert!(value.im.abs() < 1e-12);
        }
    }

    #[test]
    fn principal_log_of_diagonal_matrix() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.5]);
        let log = principal_log(&m).expect("logarithm should succeed");
        let expected = DMatrix::from_row_slice(2, 2, &[2.0f64.ln(), 0.0, 0.0, 0.5f64.ln()]);
        assert_close(&log, &expected, 1e-10);
    }

    #[test]
    fn principal_log_rejects_singular_matrix() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let err = format!("{}", principal_log(&m).expect_err("expected error"));
        assert!(err.contains("singular"));
    }

    #[test]
    fn exponential_inverts_logarithm() {
        let m = DMatrix::from_row_slice(2, 2, &[0.9, 0.1, 0.0, 0.5]);
        let eig = eigendecompose(&m).expect("decomposition should succeed");
        let round_trip = eig.map_spectrum(|l| l.ln().exp());
        assert_close(&round_trip, &m, 1e-9);
    }
}
