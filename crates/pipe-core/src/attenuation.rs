use crate::constants::{clamp_to_floor, WALL_ATTENUATION_DB, WALL_THRESHOLD_M};
use crate::losses::{junction_loss, LossParameters};
use crate::LevelModel;
use serde::{Deserialize, Serialize};

/// Sound level after `distance` metres of pipe.
///
/// L(d) = max(L₀ − (α·d + fixed + branches(d)), 0)
///
/// A result of 0 means "at or below audibility" for this model, not that the
/// sound vanishes exactly there.
pub fn level_at(
    distance: f64,
    l0: f64,
    alpha_total: f64,
    fixed_losses: f64,
    branch_loss_db: f64,
    branch_spacing_m: f64,
) -> f64 {
    let total_loss = fixed_losses + junction_loss(distance, branch_loss_db, branch_spacing_m);
    clamp_to_floor(l0 - (alpha_total * distance + total_loss))
}

/// Spherical spreading in the free field: L₀ − 20·log₁₀(d).
///
/// Distances at or below zero return `l0` so the curve starts at the source
/// level instead of diverging.
pub fn level_open_field(distance: f64, l0: f64) -> f64 {
    if distance > 0.0 {
        l0 - 20.0 * distance.log10()
    } else {
        l0
    }
}

/// A wall standing in the free field at some distance from the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Obstruction {
    /// Attenuation through the wall in dB.
    pub attenuation_db: f64,
    /// Distance of the wall from the source in metres.
    pub threshold_m: f64,
}

impl Default for Obstruction {
    fn default() -> Self {
        Self {
            attenuation_db: WALL_ATTENUATION_DB,
            threshold_m: WALL_THRESHOLD_M,
        }
    }
}

/// Free-field level with the wall's attenuation applied from its position
/// onwards, floored at 0 dB.
pub fn level_behind_wall(distance: f64, l0: f64, obstruction: &Obstruction) -> f64 {
    let free = level_open_field(distance, l0);
    if distance >= obstruction.threshold_m {
        clamp_to_floor(free - obstruction.attenuation_db)
    } else {
        clamp_to_floor(free)
    }
}

/// Linear in-pipe attenuation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeAttenuation {
    /// Source level in dB SPL.
    pub l0: f64,
    /// Attenuation coefficient in dB/m.
    pub alpha: f64,
    pub losses: LossParameters,
}

impl PipeAttenuation {
    pub fn new(l0: f64, alpha: f64, losses: LossParameters) -> Self {
        Self { l0, alpha, losses }
    }
}

impl LevelModel for PipeAttenuation {
    fn level(&self, distance: f64) -> f64 {
        level_at(
            distance,
            self.l0,
            self.alpha,
            self.losses.fixed_losses,
            self.losses.branch_loss_db(),
            self.losses.branch_spacing_m(),
        )
    }
}

/// Free-field spreading from a point source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenField {
    pub l0: f64,
}

impl LevelModel for OpenField {
    fn level(&self, distance: f64) -> f64 {
        clamp_to_floor(level_open_field(distance, self.l0))
    }
}

/// Free field with a wall in the way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehindWall {
    pub l0: f64,
    pub obstruction: Obstruction,
}

impl LevelModel for BehindWall {
    fn level(&self, distance: f64) -> f64 {
        level_behind_wall(distance, self.l0, &self.obstruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::losses::BranchLayout;

    #[test]
    fn test_reference_scenario() {
        // L0 = 100 dB, 20 + 5 + 3 dB of fixed losses, α = 0.01 dB/m, no branches.
        assert_eq!(level_at(0.0, 100.0, 0.01, 28.0, 0.0, 0.0), 72.0);
        assert!((level_at(1_000.0, 100.0, 0.01, 28.0, 0.0, 0.0) - 62.0).abs() < 1e-12);
        assert_eq!(level_at(10_000.0, 100.0, 0.01, 28.0, 0.0, 0.0), 0.0);

        // Zero branch loss with a non-zero spacing behaves the same.
        assert!((level_at(1_000.0, 100.0, 0.01, 28.0, 0.0, 400.0) - 62.0).abs() < 1e-12);
    }

    #[test]
    fn test_never_below_floor() {
        let params = [
            (50.0, 0.02, 50.0, 5.0, 100.0),
            (140.0, 0.002, 0.0, 1.0, 1000.0),
            (100.0, 0.01, 28.0, 2.5, 400.0),
            (60.0, 0.5, 10.0, 0.0, 0.0),
        ];
        for (l0, alpha, fixed, b, s) in params {
            for i in 0..=2_000 {
                let d = i as f64 * 10.0;
                let level = level_at(d, l0, alpha, fixed, b, s);
                assert!(level >= 0.0, "negative level {level} at {d} m");
            }
        }
    }

    #[test]
    fn test_level_never_increases_with_distance() {
        let model = PipeAttenuation::new(
            120.0,
            0.008,
            LossParameters::new(15.0, Some(BranchLayout::new(3.0, 250.0))),
        );
        let mut previous = model.level(0.0);
        for i in 1..=20_000 {
            let d = i as f64 * 0.5;
            let level = model.level(d);
            assert!(
                level <= previous,
                "level rose from {previous} to {level} at {d} m"
            );
            previous = level;
        }
    }

    #[test]
    fn test_branch_steps_show_in_level() {
        let before = level_at(399.0, 100.0, 0.0, 10.0, 2.5, 400.0);
        let after = level_at(400.0, 100.0, 0.0, 10.0, 2.5, 400.0);
        assert_eq!(before, 90.0);
        assert_eq!(after, 87.5);
    }

    #[test]
    fn test_open_field_singularity_guard() {
        assert_eq!(level_open_field(0.0, 94.0), 94.0);
        assert_eq!(level_open_field(1.0, 94.0), 94.0);
        assert!((level_open_field(10.0, 94.0) - 74.0).abs() < 1e-12);
        assert!((level_open_field(100.0, 94.0) - 54.0).abs() < 1e-12);
        assert!(level_open_field(0.0, 94.0).is_finite());
    }

    #[test]
    fn test_open_field_model_is_floored() {
        let model = OpenField { l0: 60.0 };
        // 60 − 20·log10(10 000) = −20 dB before flooring.
        assert_eq!(model.level(10_000.0), 0.0);
    }

    #[test]
    fn test_wall_applies_from_threshold() {
        let wall = Obstruction::default();
        let l0 = 100.0;
        let just_before = level_behind_wall(9.999, l0, &wall);
        assert!((just_before - level_open_field(9.999, l0)).abs() < 1e-12);

        let at_wall = level_behind_wall(10.0, l0, &wall);
        assert!((at_wall - (80.0 - 45.0)).abs() < 1e-12, "got {at_wall}");

        // 100 − 60 − 45 < 0
        assert_eq!(level_behind_wall(1_000.0, l0, &wall), 0.0);
    }
}
