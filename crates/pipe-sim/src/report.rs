use std::fmt::Write as _;

use pipe_core::fit::{CalibrationError, CalibrationResult, PointResidual};
use pipe_core::measurements::MeasurementSet;
use pipe_core::scenario::Curve;
use pipe_core::{ScenarioParams, SimResult, SourceParameters};
use serde::Serialize;

/// Outcome of a calibration request as shown to the user.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationReport {
    Calibrated(CalibrationResult),
    Failed { message: String, detail: String },
}

impl From<&Result<CalibrationResult, CalibrationError>> for CalibrationReport {
    fn from(outcome: &Result<CalibrationResult, CalibrationError>) -> Self {
        match outcome {
            Ok(result) => CalibrationReport::Calibrated(*result),
            Err(e) => CalibrationReport::Failed {
                message: e.user_message().to_string(),
                detail: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(skip)]
    params: &'a ScenarioParams,
    pub source: SourceParameters,
    pub fixed_losses_db: f64,
    pub curves: &'a [Curve],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationReport>,
    /// Measurements against the calibrated curve; empty unless calibration
    /// succeeded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparison: Vec<PointResidual>,
}

impl<'a> Report<'a> {
    pub fn new(
        params: &'a ScenarioParams,
        result: &'a SimResult,
        measurements: Option<&MeasurementSet>,
    ) -> Self {
        let comparison = match (&result.calibration, measurements) {
            (Some(Ok(c)), Some(m)) => params.fit_context().compare(m, c.coefficient),
            _ => Vec::new(),
        };
        Self {
            params,
            source: params.source,
            fixed_losses_db: params.fixed_losses.total(),
            curves: &result.curves,
            calibration: result.calibration.as_ref().map(CalibrationReport::from),
            comparison,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text table with each curve evaluated at `distances` metres.
    pub fn to_table(&self, distances: &[f64]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Attenuation – {} Hz, {} dB at the source ({} dB fixed losses)",
            self.source.f0, self.source.l0, self.fixed_losses_db
        );

        let width = self
            .curves
            .iter()
            .map(|c| c.label.chars().count())
            .max()
            .unwrap_or(0)
            .max("Curve".len());

        let _ = write!(out, "{:<width$}", "Curve");
        for d in distances {
            let _ = write!(out, " {:>9}", format!("{:.0} m", d));
        }
        out.push('\n');

        for curve in self.curves {
            let _ = write!(out, "{:<width$}", curve.label);
            let model = curve.kind.model(self.params);
            for &d in distances {
                let _ = write!(out, " {:>9.1}", model.level(d));
            }
            out.push('\n');
        }

        match &self.calibration {
            Some(CalibrationReport::Calibrated(c)) => {
                let _ = writeln!(
                    out,
                    "Best-fit α: {:.4} dB/m (mean residual ±{:.2} dB)",
                    c.coefficient, c.mean_absolute_residual
                );
            }
            Some(CalibrationReport::Failed { message, .. }) => {
                let _ = writeln!(out, "Calibration failed: {message}");
            }
            None => {}
        }

        if !self.comparison.is_empty() {
            let _ = writeln!(out, "Measurements vs calibrated model");
            let _ = writeln!(
                out,
                "{:>10} {:>9} {:>9} {:>9}",
                "Distance", "Measured", "Model", "Residual"
            );
            for row in &self.comparison {
                let _ = writeln!(
                    out,
                    "{:>10} {:>9.1} {:>9.1} {:>+9.1}",
                    format!("{:.0} m", row.distance_m),
                    row.measured_db,
                    row.model_db,
                    row.residual_db
                );
            }
        }
        out
    }
}
