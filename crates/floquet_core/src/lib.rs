pub mod chebyshev;
pub mod floquet;
pub mod fundamental;
pub mod matfun;
pub mod propagate;
pub mod systems;
/// The `floquet_core` crate computes Floquet decompositions of linear ODE
/// systems with periodic coefficients.
///
/// Key components:
/// - **Traits**: `PeriodicLinearSystem` (problem definitions).
/// - **Chebyshev**: collocation grid, spectral differentiation, series
///   evaluation.
/// - **Fundamental**: the principal fundamental matrix Φ(t) with Φ(0) = I.
/// - **Matfun**: eigendecomposition-based matrix exponential and logarithm.
/// - **Floquet**: Φ(t) = P(t)·e^(tB), exponents, multipliers, periodicity
///   diagnostics.
/// - **Propagate**: x(t) = Re(P(t)·e^(tB)·x₀) over long horizons.
pub mod traits;
