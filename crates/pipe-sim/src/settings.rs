use std::path::Path;

use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use pipe_core::ScenarioParams;

/// Scenario file read when `--config` is not given. It may be absent.
pub const DEFAULT_CONFIG: &str = "config/scenario";

/// Prefix of environment variables overriding scenario keys, e.g.
/// `PIPE_SIM__SOURCE__L0=90`.
pub const ENV_PREFIX: &str = "PIPE_SIM";

/// Load the scenario from a TOML file, then apply environment overrides.
pub fn load_scenario(path: Option<&Path>) -> anyhow::Result<ScenarioParams> {
    let file = match path {
        Some(p) => File::from(p).format(FileFormat::Toml).required(true),
        None => File::with_name(DEFAULT_CONFIG).required(false),
    };
    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );
    let params = deserialize(builder).with_context(|| match path {
        Some(p) => format!("failed to load scenario from {}", p.display()),
        None => format!("failed to load scenario from {DEFAULT_CONFIG}"),
    })?;
    tracing::debug!(?params, "Loaded scenario");
    Ok(params)
}

/// Parse a scenario from TOML text, without environment overrides.
pub fn scenario_from_toml(text: &str) -> anyhow::Result<ScenarioParams> {
    deserialize(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
}

fn deserialize(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<ScenarioParams> {
    let settings = builder.build()?;
    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipe_core::losses::BranchLayout;
    use pipe_core::materials::Material;

    #[test]
    fn test_empty_file_gives_defaults() {
        let params = scenario_from_toml("").unwrap();
        assert_eq!(params, ScenarioParams::default());
    }

    #[test]
    fn test_full_scenario() {
        let text = r#"
            alpha = 0.012
            materials = ["Béton", "PEHD"]
            open_field = true

            [source]
            l0 = 110
            f0 = 250

            [fixed_losses]
            junction_db = 10
            reflection_db = 4.5
            flow_db = 0

            [branches]
            branch_loss_db = 2.5
            branch_spacing_m = 400

            [obstruction]
            attenuation_db = 30

            [grid]
            end_m = 5000
            points = 101
        "#;
        let params = scenario_from_toml(text).unwrap();

        assert_eq!(params.alpha, 0.012);
        assert_eq!(params.materials, vec![Material::Concrete, Material::Pehd]);
        assert!(params.open_field);
        assert_eq!(params.source.l0, 110.0);
        assert_eq!(params.source.f0, 250.0);
        assert_eq!(params.fixed_losses.total(), 14.5);
        assert_eq!(params.branches, Some(BranchLayout::new(2.5, 400.0)));

        let wall = params.obstruction.unwrap();
        assert_eq!(wall.attenuation_db, 30.0);
        assert_eq!(wall.threshold_m, 10.0);

        assert_eq!(params.grid.start_m, 0.0);
        assert_eq!(params.grid.end_m, 5_000.0);
        assert_eq!(params.grid.points, 101);
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn test_unknown_material_fails() {
        assert!(scenario_from_toml(r#"materials = ["Acier"]"#).is_err());
    }

    #[test]
    fn test_effective_config_round_trips_through_toml() {
        let params = ScenarioParams {
            branches: Some(BranchLayout::new(1.5, 300.0)),
            ..ScenarioParams::default()
        };
        let text = toml::to_string_pretty(&params).unwrap();
        assert_eq!(scenario_from_toml(&text).unwrap(), params);
    }
}
