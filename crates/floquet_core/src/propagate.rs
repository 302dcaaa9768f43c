//! Long-horizon propagation through the Floquet decomposition:
//! x(t) = Re(P(t mod T)·e^(tB)·x₀).
//!
//! The complex intermediate arithmetic cancels to a real state for a real
//! initial condition; the largest imaginary residue actually discarded is
//! reported alongside the trajectory instead of being dropped silently.

use crate::floquet::FloquetDecomposition;
use anyhow::{bail, Result};
use nalgebra::{DVector, DMatrix};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub dimension: usize,
    pub times: Vec<f64>,
    /// One state vector per sample time.
    pub states: Vec<Vec<f64>>,
    /// Largest |Im| discarded when taking the real part.
    pub max_imaginary_residue: f64,
}

/// Evaluates x(t) for a single time t ≥ 0.
pub fn propagate(
    decomposition: &FloquetDecomposition,
    initial_state: &DVector<f64>,
    t: f64,
) -> Result<DVector<f64>> {
    let state = propagate_complex(decomposition, initial_state, t)?;
    Ok(state.map(|v| v.re))
}

/// Samples x(t) uniformly over `periods` periods.
pub fn trajectory(
    decomposition: &FloquetDecomposition,
    initial_state: &DVector<f64>,
    periods: usize,
    samples_per_period: usize,
) -> Result<Trajectory> {
    if periods == 0 {
        bail!("Trajectory must cover at least one period.");
    }
    if samples_per_period == 0 {
        bail!("samples_per_period must be at least 1.");
    }

    let period = decomposition.period();
    let count = periods * samples_per_period;
    let mut times = Vec::with_capacity(count + 1);
    let mut states = Vec::with_capacity(count + 1);
    let mut max_residue = 0.0f64;

    for j in 0..=count {
        let t = period * periods as f64 * j as f64 / count as f64;
        let state = propagate_complex(decomposition, initial_state, t)?;
        let residue = state.iter().map(|v| v.im.abs()).fold(0.0, f64::max);
        if residue > max_residue {
            max_residue = residue;
        }
        times.push(t);
        states.push(state.iter().map(|v| v.re).collect());
    }

    Ok(Trajectory {
        dimension: decomposition.dimension(),
        times,
        states,
        max_imaginary_residue: max_residue,
    })
}

fn propagate_complex(
    decomposition: &FloquetDecomposition,
    initial_state: &DVector<f64>,
    t: f64,
) -> Result<DVector<Complex<f64>>> {
    let dim = decomposition.dimension();
    if initial_state.len() != dim {
        bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            dim,
            initial_state.len()
        );
    }
    if t < 0.0 {
        bail!("Propagation requires t >= 0.");
    }

    let period = decomposition.period();
    let reduced = t - (t / period).floor() * period;
    let factor: DMatrix<Complex<f64>> = decomposition.periodic_factor().evaluate(reduced);
    let growth = decomposition.exponential().evaluate(t);
    let state = initial_state.map(|v| Complex::new(v, 0.0));
    Ok(factor * growth * state)
}
