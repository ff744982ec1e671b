use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipe materials with a tabulated attenuation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "Fonte", alias = "fonte", alias = "cast-iron")]
    CastIron,
    #[serde(rename = "Béton", alias = "beton", alias = "Beton", alias = "concrete")]
    Concrete,
    #[serde(rename = "PVC", alias = "pvc")]
    Pvc,
    #[serde(rename = "PEHD", alias = "pehd", alias = "hdpe")]
    Pehd,
}

impl Material {
    pub const ALL: [Material; 4] = [
        Material::CastIron,
        Material::Concrete,
        Material::Pvc,
        Material::Pehd,
    ];

    /// Typical attenuation coefficient in dB/m.
    pub const fn coefficient(self) -> f64 {
        match self {
            Material::CastIron => 0.005,
            Material::Concrete => 0.01,
            Material::Pvc => 0.012,
            Material::Pehd => 0.02,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Material::CastIron => "Fonte",
            Material::Concrete => "Béton",
            Material::Pvc => "PVC",
            Material::Pehd => "PEHD",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown material `{0}` (expected one of Fonte, Béton, PVC, PEHD)")]
pub struct UnknownMaterial(pub String);

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fonte" | "cast-iron" | "cast_iron" => Ok(Material::CastIron),
            "béton" | "beton" | "concrete" => Ok(Material::Concrete),
            "pvc" => Ok(Material::Pvc),
            "pehd" | "hdpe" => Ok(Material::Pehd),
            _ => Err(UnknownMaterial(s.to_string())),
        }
    }
}
