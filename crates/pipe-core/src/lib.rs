pub mod attenuation;
pub mod constants;
pub mod fit;
pub mod grid;
pub mod losses;
pub mod materials;
pub mod measurements;
pub mod scenario;

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use attenuation::Obstruction;
use fit::{CalibrationError, CalibrationResult, FitContext, LevenbergMarquardt};
use grid::{DistanceGrid, GridSettings};
use losses::{BranchLayout, FixedLosses, LossParameters};
use materials::Material;
use measurements::MeasurementSet;
use scenario::{Curve, ScenarioRunner};

// ---------------------------------------------------------------------------
// Shared interface types
// ---------------------------------------------------------------------------

/// The sound source at the head of the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceParameters {
    /// Source level in dB SPL.
    pub l0: f64,
    /// Frequency in Hz. Only used for display.
    pub f0: f64,
}

impl Default for SourceParameters {
    fn default() -> Self {
        Self { l0: 100.0, f0: 50.0 }
    }
}

/// Full parameter set for one evaluation of the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub source: SourceParameters,
    pub fixed_losses: FixedLosses,
    /// Periodic branch losses; `None` for a line without branches.
    pub branches: Option<BranchLayout>,
    /// User-chosen attenuation coefficient in dB/m.
    pub alpha: f64,
    /// Materials to compare against, in display order.
    pub materials: Vec<Material>,
    /// Also draw free-field spreading.
    pub open_field: bool,
    /// Also draw the free field behind a wall.
    pub obstruction: Option<Obstruction>,
    pub grid: GridSettings,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            source: SourceParameters::default(),
            fixed_losses: FixedLosses::default(),
            branches: None,
            alpha: 0.01,
            materials: vec![Material::CastIron, Material::Pvc],
            open_field: false,
            obstruction: None,
            grid: GridSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("{name} = {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("distance grid needs at least 2 points, got {0}")]
    GridTooSmall(usize),
    #[error("distance grid must increase: start {start} m, end {end} m")]
    GridNotIncreasing { start: f64, end: f64 },
}

fn check_range(name: &'static str, value: f64, range: RangeInclusive<f64>) -> Result<(), ParamError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ParamError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl ScenarioParams {
    /// Check every input against the range the tool accepts.
    ///
    /// The models themselves accept any value; this is for inputs coming
    /// from outside.
    pub fn validate(&self) -> Result<(), ParamError> {
        check_range("source.l0", self.source.l0, 50.0..=140.0)?;
        check_range("source.f0", self.source.f0, 20.0..=2000.0)?;
        check_range("fixed_losses.junction_db", self.fixed_losses.junction_db, 0.0..=50.0)?;
        check_range("fixed_losses.reflection_db", self.fixed_losses.reflection_db, 0.0..=20.0)?;
        check_range("fixed_losses.flow_db", self.fixed_losses.flow_db, 0.0..=10.0)?;
        if let Some(b) = &self.branches {
            check_range("branches.branch_loss_db", b.branch_loss_db, 1.0..=5.0)?;
            check_range("branches.branch_spacing_m", b.branch_spacing_m, 100.0..=1000.0)?;
        }
        check_range("alpha", self.alpha, 0.002..=0.020)?;
        if self.grid.points < 2 {
            return Err(ParamError::GridTooSmall(self.grid.points));
        }
        if !(self.grid.end_m > self.grid.start_m) {
            return Err(ParamError::GridNotIncreasing {
                start: self.grid.start_m,
                end: self.grid.end_m,
            });
        }
        Ok(())
    }

    pub fn loss_parameters(&self) -> LossParameters {
        LossParameters::new(self.fixed_losses.total(), self.branches)
    }

    pub fn fit_context(&self) -> FitContext {
        FitContext::new(self.source.l0, self.loss_parameters())
    }
}

/// Results of one evaluation, ready for display.
#[derive(Debug, Clone)]
pub struct SimResult {
    /// Distance axis shared by every curve.
    pub grid: DistanceGrid,
    pub curves: Vec<Curve>,
    /// `None` when no measurements were supplied.
    pub calibration: Option<Result<CalibrationResult, CalibrationError>>,
}

/// Trait for anything that yields a sound level as a function of distance.
pub trait LevelModel: Send + Sync {
    /// Sound level in dB SPL at `distance` metres from the source.
    fn level(&self, distance: f64) -> f64;
}

/// Run the full pipeline: build the grid, calibrate against `measurements`
/// if given, and evaluate every requested curve.
///
/// Calibration is seeded with the custom coefficient. When it fails the
/// error is kept in the result and no calibrated curve is produced.
pub fn compute(params: &ScenarioParams, measurements: Option<&MeasurementSet>) -> SimResult {
    let grid = DistanceGrid::from_settings(&params.grid);

    let calibration = measurements.map(|data| {
        fit::calibrate(
            data,
            params.alpha,
            &params.fit_context(),
            &LevenbergMarquardt::default(),
        )
    });

    let calibrated = match &calibration {
        Some(Ok(result)) => Some(result),
        _ => None,
    };
    let curves = ScenarioRunner::new(params, &grid).run(calibrated);

    tracing::debug!(
        curves = curves.len(),
        points = grid.len(),
        "Evaluated scenario"
    );

    SimResult {
        grid,
        curves,
        calibration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert_eq!(ScenarioParams::default().validate(), Ok(()));
    }

    #[test]
    fn test_out_of_range_inputs() {
        let params = ScenarioParams {
            alpha: 0.05,
            ..ScenarioParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamError::OutOfRange { name: "alpha", .. })
        ));

        let params = ScenarioParams {
            branches: Some(BranchLayout::new(2.5, 50.0)),
            ..ScenarioParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamError::OutOfRange {
                name: "branches.branch_spacing_m",
                ..
            })
        ));
    }

    #[test]
    fn test_grid_validation() {
        let mut params = ScenarioParams::default();
        params.grid.points = 1;
        assert_eq!(params.validate(), Err(ParamError::GridTooSmall(1)));

        params.grid.points = 10;
        params.grid.end_m = params.grid.start_m;
        assert!(matches!(
            params.validate(),
            Err(ParamError::GridNotIncreasing { .. })
        ));
    }

    #[test]
    fn test_compute_without_measurements() {
        let result = compute(&ScenarioParams::default(), None);
        assert!(result.calibration.is_none());
        assert_eq!(result.curves.len(), 3);
        assert_eq!(result.grid.len(), 500);
    }
}
