use anyhow::{anyhow, Result};
use floquet_core::floquet::{decompose, FloquetSettings};
use floquet_core::propagate::{trajectory, Trajectory};
use floquet_core::systems::CoupledMathieu;
use nalgebra::DVector;
use plotters::prelude::*;
use rand::Rng;

const PLOT_PATH: &str = "floquet_solution.svg";
const PLOT_PERIODS: usize = 10;
const SAMPLES_PER_PERIOD: usize = 120;

fn main() -> Result<()> {
    let system = CoupledMathieu { amplitude: 0.15 };
    let decomposition = decompose(&system, FloquetSettings::default())?;
    let summary = decomposition.summary();

    println!(
        "Coupled Mathieu pair: n = {}, T = {:.6}, a = {}",
        summary.dimension,
        summary.period,
        system.amplitude
    );

    println!("\nFloquet exponents (eigenvalues of B):");
    for exponent in &summary.exponents {
        println!("  {:+.10} {:+.10}i", exponent.re, exponent.im);
    }

    println!("\nFloquet multipliers (eigenvalues of the monodromy matrix):");
    for multiplier in &summary.multipliers {
        println!("  {:+.10} {:+.10}i", multiplier.re, multiplier.im);
    }

    // Liouville: the coefficient matrix is trace-free, so both sides
    // should sit at 1.
    println!(
        "\nProduct of multipliers: {:+.10} {:+.10}i",
        summary.multiplier_product.re, summary.multiplier_product.im
    );
    println!(
        "det of monodromy matrix: {:+.10}",
        summary.monodromy_determinant
    );

    let periodicity = summary.periodicity;
    println!(
        "\nPeriodic factor P: {} Chebyshev coefficients, {} Fourier modes over one period, {} over two, |P(T) - P(0)| = {:.3e}",
        periodicity.chebyshev_coefficients,
        periodicity.single_period_modes,
        periodicity.double_period_modes,
        periodicity.endpoint_defect
    );

    let mut rng = rand::thread_rng();
    let initial_state = DVector::from_fn(summary.dimension, |_, _| rng.gen_range(-1.0..1.0));
    println!(
        "\nRandom initial condition: [{}]",
        initial_state
            .iter()
            .map(|v| format!("{v:+.6}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let result = trajectory(
        &decomposition,
        &initial_state,
        PLOT_PERIODS,
        SAMPLES_PER_PERIOD,
    )?;
    println!(
        "Propagated over {} periods ({} samples); discarded imaginary residue <= {:.3e}",
        PLOT_PERIODS,
        result.times.len(),
        result.max_imaginary_residue
    );

    plot_trajectory(&result).map_err(|e| anyhow!("Failed to render {PLOT_PATH}: {e}"))?;
    println!("Wrote {PLOT_PATH}");
    Ok(())
}

fn plot_trajectory(result: &Trajectory) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let t_max = result.times[result.times.len() - 1];
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for state in &result.states {
        for &value in state {
            y_min = y_min.min(value);
            y_max = y_max.max(value);
        }
    }
    let pad = 0.05 * (y_max - y_min).max(1e-12);

    let root = SVGBackend::new(PLOT_PATH, (900, 540)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption("Coupled Mathieu pair over 10 periods", ("sans-serif", 20))
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..t_max, (y_min - pad)..(y_max + pad))?;

    chart.configure_mesh().x_desc("t").y_desc("state").draw()?;

    let labels = ["x", "y", "x'", "y'"];
    let colors = [&RED, &BLUE, &GREEN, &MAGENTA];
    for component in 0..result.dimension {
        let color = colors[component % colors.len()];
        chart
            .draw_series(LineSeries::new(
                result
                    .times
                    .iter()
                    .zip(&result.states)
                    .map(|(&t, state)| (t, state[component])),
                color,
            ))?
            .label(labels[component % labels.len()])
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
