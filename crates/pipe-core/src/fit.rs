//! Calibration of the attenuation coefficient against field measurements.
//!
//! The in-pipe model has a single free parameter, α. [`calibrate`] holds the
//! source level and the losses fixed, fits α to the measured levels with a
//! [`LeastSquaresSolver`] and reports the mean absolute residual of the fit.
//!
//! The fit target keeps the model's 0 dB floor, so measurements taken where
//! the model is already floored contribute nothing to the gradient. A set
//! that is floored everywhere surfaces as a degenerate Jacobian.

use crate::attenuation::PipeAttenuation;
use crate::losses::LossParameters;
use crate::measurements::MeasurementSet;
use crate::LevelModel;
use serde::{Deserialize, Serialize};

/// Message shown to users whenever calibration fails, whatever the cause.
pub const CALIBRATION_FAILED_MESSAGE: &str = "calibration not possible with this data";

/// Number of free parameters in the fit.
const FREE_PARAMETERS: usize = 1;

/// Everything held constant while α is fitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitContext {
    /// Source level in dB SPL.
    pub l0: f64,
    pub losses: LossParameters,
}

impl FitContext {
    pub fn new(l0: f64, losses: LossParameters) -> Self {
        Self { l0, losses }
    }

    /// Model level at `distance` for a trial coefficient `alpha`.
    pub fn level(&self, distance: f64, alpha: f64) -> f64 {
        PipeAttenuation::new(self.l0, alpha, self.losses).level(distance)
    }

    /// Each measurement next to the model level for `alpha`.
    pub fn compare(&self, measurements: &MeasurementSet, alpha: f64) -> Vec<PointResidual> {
        measurements
            .points()
            .iter()
            .map(|m| {
                let model_db = self.level(m.distance_m, alpha);
                PointResidual {
                    distance_m: m.distance_m,
                    measured_db: m.level_db,
                    model_db,
                    residual_db: model_db - m.level_db,
                }
            })
            .collect()
    }
}

/// One measurement against the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointResidual {
    pub distance_m: f64,
    pub measured_db: f64,
    pub model_db: f64,
    /// `model_db - measured_db`.
    pub residual_db: f64,
}

/// Fitted coefficient and how well it matches the measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Best-fit attenuation coefficient in dB/m.
    pub coefficient: f64,
    /// Mean of |model − measured| over all points, in dB.
    pub mean_absolute_residual: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("need at least {required} measurement(s) to fit {required} parameter(s), got {points}")]
    TooFewPoints { points: usize, required: usize },
    #[error("measurement {index} is not finite")]
    NonFiniteData { index: usize },
    #[error("initial guess {0} is not finite")]
    NonFiniteInitialGuess(f64),
    #[error("all {points} measurements were taken at the same distance")]
    ZeroSpread { points: usize },
    #[error("the model does not depend on the coefficient at α = {parameter} (degenerate Jacobian)")]
    DegenerateJacobian { parameter: f64 },
    #[error("residuals are not finite at α = {parameter}")]
    NonFiniteResidual { parameter: f64 },
    #[error("no convergence after {evaluations} model evaluations")]
    NotConverged { evaluations: usize },
}

impl CalibrationError {
    /// The single message to surface to users.
    pub fn user_message(&self) -> &'static str {
        CALIBRATION_FAILED_MESSAGE
    }
}

/// Raw outcome of a solver run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Best-fit value of the free parameter.
    pub parameter: f64,
    /// Sum of squared residuals at `parameter`.
    pub cost: f64,
    pub iterations: usize,
    /// Number of passes over the data, Jacobian included.
    pub evaluations: usize,
}

/// A nonlinear least-squares solver for one free parameter.
///
/// `objective(x, p)` is the model value at abscissa `x` for parameter `p`;
/// the solver minimises Σ (objective(xᵢ, p) − yᵢ)² over the measurement set.
pub trait LeastSquaresSolver {
    fn fit(
        &self,
        objective: &dyn Fn(f64, f64) -> f64,
        initial_guess: f64,
        data: &MeasurementSet,
    ) -> Result<FitResult, CalibrationError>;
}

/// Levenberg–Marquardt with a forward-difference Jacobian.
///
/// Tolerances and the evaluation budget follow MINPACK's `lmdif` defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    /// Stop when an accepted step reduces the cost by less than this fraction.
    pub ftol: f64,
    /// Stop when an accepted step is smaller than this, relative to α.
    pub xtol: f64,
    pub max_evaluations: usize,
    pub initial_damping: f64,
}

const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e16;

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            max_evaluations: 200 * (FREE_PARAMETERS + 1),
            initial_damping: 1e-3,
        }
    }
}

/// Residual evaluation with bookkeeping of how often the model was swept.
struct Problem<'a> {
    objective: &'a dyn Fn(f64, f64) -> f64,
    data: &'a MeasurementSet,
    evaluations: usize,
}

impl Problem<'_> {
    fn residuals(&mut self, p: f64) -> Vec<f64> {
        self.evaluations += 1;
        self.data
            .points()
            .iter()
            .map(|m| (self.objective)(m.distance_m, p) - m.level_db)
            .collect()
    }

    /// ∂rᵢ/∂p by forward differences, reusing the residuals at `p`.
    fn jacobian(&mut self, p: f64, residuals: &[f64]) -> Vec<f64> {
        let eps = f64::EPSILON.sqrt();
        let mut h = eps * p.abs();
        if h == 0.0 {
            h = eps;
        }
        let shifted = self.residuals(p + h);
        shifted
            .iter()
            .zip(residuals)
            .map(|(rh, r)| (rh - r) / h)
            .collect()
    }
}

fn sum_of_squares(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn fit(
        &self,
        objective: &dyn Fn(f64, f64) -> f64,
        initial_guess: f64,
        data: &MeasurementSet,
    ) -> Result<FitResult, CalibrationError> {
        if data.len() < FREE_PARAMETERS {
            return Err(CalibrationError::TooFewPoints {
                points: data.len(),
                required: FREE_PARAMETERS,
            });
        }
        if !initial_guess.is_finite() {
            return Err(CalibrationError::NonFiniteInitialGuess(initial_guess));
        }

        let mut problem = Problem {
            objective,
            data,
            evaluations: 0,
        };

        let mut p = initial_guess;
        let mut residuals = problem.residuals(p);
        let mut cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(CalibrationError::NonFiniteResidual { parameter: p });
        }

        let mut damping = self.initial_damping;
        let mut iterations = 0;
        let done = |parameter: f64, cost: f64, iterations: usize, evaluations: usize| FitResult {
            parameter,
            cost,
            iterations,
            evaluations,
        };

        loop {
            if cost == 0.0 {
                return Ok(done(p, cost, iterations, problem.evaluations));
            }
            if problem.evaluations >= self.max_evaluations {
                return Err(CalibrationError::NotConverged {
                    evaluations: problem.evaluations,
                });
            }

            iterations += 1;
            let jac = problem.jacobian(p, &residuals);
            let jtj: f64 = jac.iter().map(|j| j * j).sum();
            let jtr: f64 = jac.iter().zip(&residuals).map(|(j, r)| j * r).sum();
            if jtj == 0.0 || !jtj.is_finite() {
                return Err(CalibrationError::DegenerateJacobian { parameter: p });
            }

            loop {
                if problem.evaluations >= self.max_evaluations {
                    return Err(CalibrationError::NotConverged {
                        evaluations: problem.evaluations,
                    });
                }

                let step = -jtr / (jtj * (1.0 + damping));
                let candidate = p + step;
                let trial = problem.residuals(candidate);
                let trial_cost = sum_of_squares(&trial);

                if trial_cost.is_finite() && trial_cost < cost {
                    let reduction = cost - trial_cost;
                    let converged = step.abs() <= self.xtol * (candidate.abs() + self.xtol)
                        || reduction <= self.ftol * cost;

                    tracing::debug!(
                        iteration = iterations,
                        alpha = candidate,
                        cost = trial_cost,
                        damping,
                        "accepted step"
                    );

                    p = candidate;
                    residuals = trial;
                    cost = trial_cost;
                    damping = (damping / 10.0).max(MIN_DAMPING);

                    if converged {
                        return Ok(done(p, cost, iterations, problem.evaluations));
                    }
                    break;
                }

                damping *= 10.0;
                if damping > MAX_DAMPING {
                    // Even a vanishing step no longer lowers the cost: p is a
                    // minimum at working precision.
                    return Ok(done(p, cost, iterations, problem.evaluations));
                }
            }
        }
    }
}

/// Solver-independent sanity checks on the measurements.
fn check_measurements(data: &MeasurementSet) -> Result<(), CalibrationError> {
    if data.len() < FREE_PARAMETERS {
        return Err(CalibrationError::TooFewPoints {
            points: data.len(),
            required: FREE_PARAMETERS,
        });
    }
    if let Some(index) = data
        .points()
        .iter()
        .position(|m| !m.distance_m.is_finite() || !m.level_db.is_finite())
    {
        return Err(CalibrationError::NonFiniteData { index });
    }
    let first = data.points()[0].distance_m;
    if data.len() > 1 && data.distances().all(|d| d == first) {
        return Err(CalibrationError::ZeroSpread { points: data.len() });
    }
    Ok(())
}

/// Fit α to `measurements`, starting from `initial_guess`.
///
/// Fails with a [`CalibrationError`] rather than returning a fallback value
/// when the data cannot support a fit.
pub fn calibrate(
    measurements: &MeasurementSet,
    initial_guess: f64,
    context: &FitContext,
    solver: &dyn LeastSquaresSolver,
) -> Result<CalibrationResult, CalibrationError> {
    let outcome = check_measurements(measurements).and_then(|()| {
        let objective = |distance: f64, alpha: f64| context.level(distance, alpha);
        solver.fit(&objective, initial_guess, measurements)
    });

    let fit = match outcome {
        Ok(fit) => fit,
        Err(e) => {
            tracing::warn!("Calibration failed: {e}");
            return Err(e);
        }
    };

    let coefficient = fit.parameter;
    let mean_absolute_residual = context
        .compare(measurements, coefficient)
        .iter()
        .map(|r| r.residual_db.abs())
        .sum::<f64>()
        / measurements.len() as f64;

    tracing::info!(
        coefficient,
        mean_absolute_residual,
        iterations = fit.iterations,
        evaluations = fit.evaluations,
        "Calibrated attenuation coefficient"
    );

    Ok(CalibrationResult {
        coefficient,
        mean_absolute_residual,
    })
}
