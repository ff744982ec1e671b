use crate::attenuation::{BehindWall, Obstruction, OpenField, PipeAttenuation};
use crate::fit::CalibrationResult;
use crate::grid::DistanceGrid;
use crate::materials::Material;
use crate::{LevelModel, ScenarioParams};
use serde::Serialize;

/// What a curve represents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveKind {
    /// The user-chosen coefficient.
    Custom { alpha: f64 },
    Material { material: Material, alpha: f64 },
    OpenField,
    BehindWall { attenuation_db: f64, threshold_m: f64 },
    Calibrated { alpha: f64 },
}

impl CurveKind {
    /// The level model behind curves of this kind for the given scenario.
    pub fn model(&self, params: &ScenarioParams) -> Box<dyn LevelModel> {
        let l0 = params.source.l0;
        match *self {
            CurveKind::Custom { alpha }
            | CurveKind::Material { alpha, .. }
            | CurveKind::Calibrated { alpha } => {
                Box::new(PipeAttenuation::new(l0, alpha, params.loss_parameters()))
            }
            CurveKind::OpenField => Box::new(OpenField { l0 }),
            CurveKind::BehindWall {
                attenuation_db,
                threshold_m,
            } => Box::new(BehindWall {
                l0,
                obstruction: Obstruction {
                    attenuation_db,
                    threshold_m,
                },
            }),
        }
    }
}

/// Levels evaluated over a distance grid, one `[distance, level]` pair per
/// grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub label: String,
    pub kind: CurveKind,
    pub points: Vec<[f64; 2]>,
}

impl Curve {
    /// Level at an arbitrary `distance`, evaluated with the curve's model
    /// rather than read off the grid.
    pub fn level(&self, params: &ScenarioParams, distance: f64) -> f64 {
        self.kind.model(params).level(distance)
    }

    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p[1])
    }
}

/// Map `model` over every distance in `grid`.
pub fn evaluate_curve(
    grid: &DistanceGrid,
    model: &dyn LevelModel,
    label: impl Into<String>,
    kind: CurveKind,
) -> Curve {
    let points = grid
        .distances()
        .iter()
        .map(|&d| [d, model.level(d)])
        .collect();
    Curve {
        label: label.into(),
        kind,
        points,
    }
}

/// Evaluates the curves of one scenario against a shared grid.
pub struct ScenarioRunner<'a> {
    params: &'a ScenarioParams,
    grid: &'a DistanceGrid,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(params: &'a ScenarioParams, grid: &'a DistanceGrid) -> Self {
        Self { params, grid }
    }

    fn curve(&self, kind: CurveKind, label: String) -> Curve {
        let model = kind.model(self.params);
        evaluate_curve(self.grid, model.as_ref(), label, kind)
    }

    pub fn custom(&self) -> Curve {
        let alpha = self.params.alpha;
        self.curve(
            CurveKind::Custom { alpha },
            format!("Custom (α={alpha:.3} dB/m)"),
        )
    }

    pub fn material(&self, material: Material) -> Curve {
        let alpha = material.coefficient();
        self.curve(
            CurveKind::Material { material, alpha },
            format!("{material} (α={alpha:.3} dB/m)"),
        )
    }

    pub fn open_field(&self) -> Curve {
        self.curve(CurveKind::OpenField, "Open field".to_string())
    }

    pub fn behind_wall(&self) -> Option<Curve> {
        let obstruction = self.params.obstruction?;
        Some(self.curve(
            CurveKind::BehindWall {
                attenuation_db: obstruction.attenuation_db,
                threshold_m: obstruction.threshold_m,
            },
            format!("Open field + wall ({:.0} dB)", obstruction.attenuation_db),
        ))
    }

    pub fn calibrated(&self, calibration: &CalibrationResult) -> Curve {
        let alpha = calibration.coefficient;
        self.curve(
            CurveKind::Calibrated { alpha },
            format!("Calibrated (α={alpha:.4} dB/m)"),
        )
    }

    /// Every curve the scenario asks for: custom, selected materials in
    /// order, open field, wall, then the calibrated curve if there is one.
    pub fn run(&self, calibration: Option<&CalibrationResult>) -> Vec<Curve> {
        let mut curves = vec![self.custom()];
        curves.extend(self.params.materials.iter().map(|&m| self.material(m)));
        if self.params.open_field {
            curves.push(self.open_field());
        }
        curves.extend(self.behind_wall());
        curves.extend(calibration.map(|c| self.calibrated(c)));
        curves
    }
}
