//! Planning configuration loading

use std::path::Path;

use spkplan_core::PlanningConfig;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Load the planning configuration from `path`, or the defaults when no file
/// was given or it does not exist
pub fn load_planning_config(path: Option<&Path>) -> CliResult<PlanningConfig> {
    let config = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)?;
            let config: PlanningConfig = toml::from_str(&content)
                .map_err(|e| CliError::config(format!("Invalid config file: {}", e)))?;
            debug!("Loaded planning configuration from {}", path.display());
            config
        }
        Some(path) => {
            debug!("{} not found, using default configuration", path.display());
            PlanningConfig::default()
        }
        None => PlanningConfig::default(),
    };
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_planning_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, PlanningConfig::default());
        assert_eq!(load_planning_config(None).unwrap(), PlanningConfig::default());
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, "[simulation]\ntimestep_us = 100.0\n").unwrap();
        let config = load_planning_config(Some(&path)).unwrap();
        assert_eq!(config.simulation.timestep_us, 100.0);
        assert_eq!(config.simulation.ring_buffer_sigma, 5.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, "[simulation]\nring_buffer_sigma = 0.0\n").unwrap();
        assert!(matches!(load_planning_config(Some(&path)), Err(CliError::Config(_))));
    }
}
