//! Calibration walkthrough on synthetic field data.
//!
//! Generates noisy readings from a known coefficient, fits it back and prints
//! the calibrated curve next to the material curves.
//!
//! Run with:
//!   cargo run -p pipe-core --example calibrate_demo

use pipe_core::measurements::{Measurement, MeasurementSet};
use pipe_core::ScenarioParams;

fn main() {
    println!("=== Calibration Demo ===");

    // 1. Fake a survey along the default line with α = 0.009 dB/m.
    let params = ScenarioParams::default();
    let context = params.fit_context();
    let true_alpha = 0.009;
    let jitter = [0.4, -0.3, 0.1, -0.5, 0.2, 0.0];
    let points = [150.0, 600.0, 1_400.0, 2_200.0, 3_500.0, 5_000.0]
        .iter()
        .zip(jitter)
        .map(|(&d, j)| Measurement {
            distance_m: d,
            level_db: context.level(d, true_alpha) + j,
        })
        .collect();
    let measurements = MeasurementSet::new(points);
    println!(
        "{} readings generated with α = {true_alpha} dB/m",
        measurements.len()
    );

    // 2. Run the full pipeline.
    let result = pipe_core::compute(&params, Some(&measurements));

    match result.calibration {
        Some(Ok(c)) => println!(
            "Best α: {:.4} dB/m, mean residual ±{:.2} dB",
            c.coefficient, c.mean_absolute_residual
        ),
        Some(Err(e)) => println!("{} ({e})", e.user_message()),
        None => unreachable!("measurements were supplied"),
    }

    // 3. Print each curve at a few distances.
    for curve in &result.curves {
        let samples: Vec<String> = [0.0, 2_500.0, 5_000.0, 10_000.0]
            .iter()
            .map(|&d| format!("{:6.1}", curve.level(&params, d)))
            .collect();
        println!("{:<32} {}", curve.label, samples.join(" "));
    }
}
