use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pipe_core::materials::Material;
use pipe_core::ScenarioParams;

/// Distances sampled by the table report when none are given.
pub const DEFAULT_PROBES_M: [f64; 5] = [0.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0];

/// Sound level decay along a pipe network, with calibration against field
/// measurements.
#[derive(Debug, Clone, Parser)]
#[clap(name = "pipe-sim", long_about = None)]
pub struct Cli {
    /// Scenario file (TOML). Defaults to `config/scenario`, which may be absent.
    #[clap(value_parser, short = 'c', long)]
    pub config: Option<PathBuf>,
    /// CSV file with `distance_m` and `niveau_dB` columns to calibrate against.
    #[clap(value_parser, short = 'm', long)]
    pub measurements: Option<PathBuf>,
    /// Material to compare against (Fonte, Béton, PVC, PEHD). Repeat for
    /// several; replaces the materials from the scenario file.
    #[clap(value_parser, long = "material")]
    pub materials: Vec<Material>,
    /// Custom attenuation coefficient in dB/m.
    #[clap(value_parser, short = 'a', long)]
    pub alpha: Option<f64>,
    /// Distance in metres at which the table shows each curve. Repeatable.
    #[clap(value_parser, short = 'p', long = "probe")]
    pub probes: Vec<f64>,
    #[clap(value_enum, short = 'f', long, default_value = "table")]
    pub format: OutputFormat,
    /// Print the effective scenario as TOML and exit.
    #[clap(long)]
    pub print_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded scenario.
    pub fn apply_overrides(&self, params: &mut ScenarioParams) {
        if !self.materials.is_empty() {
            params.materials = self.materials.clone();
        }
        if let Some(alpha) = self.alpha {
            params.alpha = alpha;
        }
    }

    pub fn probes(&self) -> Vec<f64> {
        if self.probes.is_empty() {
            DEFAULT_PROBES_M.to_vec()
        } else {
            self.probes.clone()
        }
    }
}
