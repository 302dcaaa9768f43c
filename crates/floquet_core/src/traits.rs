use nalgebra::DMatrix;

/// A linear ODE system x'(t) = A(t)·x(t) whose coefficient matrix is
/// periodic in time: A(t + T) = A(t) for all t.
///
/// Implementations define the problem; the solver and decomposition layers
/// only see this interface.
pub trait PeriodicLinearSystem {
    /// Returns the dimension n of the state space.
    fn dimension(&self) -> usize;

    /// Returns the period T of the coefficient matrix.
    fn period(&self) -> f64;

    /// Evaluates the coefficient matrix at time t.
    /// out: n-by-n buffer to write A(t) into.
    fn coefficients(&self, t: f64, out: &mut DMatrix<f64>);
}
