use serde::{Deserialize, Serialize};

/// Constant losses along the line, entered as separate contributions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedLosses {
    /// Losses at pipe junctions in dB.
    pub junction_db: f64,
    /// Losses from reflections in dB.
    pub reflection_db: f64,
    /// Losses caused by the flow in dB.
    pub flow_db: f64,
}

impl FixedLosses {
    pub fn new(junction_db: f64, reflection_db: f64, flow_db: f64) -> Self {
        Self {
            junction_db,
            reflection_db,
            flow_db,
        }
    }

    /// Sum of all constant losses in dB.
    pub fn total(&self) -> f64 {
        self.junction_db + self.reflection_db + self.flow_db
    }
}

impl Default for FixedLosses {
    fn default() -> Self {
        Self {
            junction_db: 20.0,
            reflection_db: 5.0,
            flow_db: 3.0,
        }
    }
}

/// Branches tapped off the main line at a regular spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchLayout {
    /// Loss per branch passed, in dB.
    pub branch_loss_db: f64,
    /// Distance between consecutive branches in metres.
    pub branch_spacing_m: f64,
}

impl BranchLayout {
    pub fn new(branch_loss_db: f64, branch_spacing_m: f64) -> Self {
        Self {
            branch_loss_db,
            branch_spacing_m,
        }
    }
}

/// Everything subtracted from the source level apart from the per-metre
/// attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LossParameters {
    pub fixed_losses: f64,
    pub branches: Option<BranchLayout>,
}

impl LossParameters {
    pub fn new(fixed_losses: f64, branches: Option<BranchLayout>) -> Self {
        Self {
            fixed_losses,
            branches,
        }
    }

    pub fn branch_loss_db(&self) -> f64 {
        self.branches.map_or(0.0, |b| b.branch_loss_db)
    }

    pub fn branch_spacing_m(&self) -> f64 {
        self.branches.map_or(0.0, |b| b.branch_spacing_m)
    }
}

/// Loss from the branches fully passed after `distance` metres.
///
/// A spacing of zero means there are no branches and yields 0 dB.
pub fn junction_loss(distance: f64, branch_loss_db: f64, branch_spacing_m: f64) -> f64 {
    if branch_spacing_m == 0.0 {
        return 0.0;
    }
    (distance / branch_spacing_m).floor() * branch_loss_db
}
