//! Home Assistant Rust - scene runner
//!
//! Loads vacuums and scenes from `configuration.yaml`, applies one scene
//! through state reproduction and logs the resulting states.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use ha_components::scene::{apply_scene, find_scene, SceneConfig, SceneError};
use ha_components::vacuum::{
    load_vacuums, register_vacuum_services, VacuumConfig, VacuumReproducePlatform,
};
use ha_core::Context;
use ha_reproduce_state::{ReproduceReport, StateReproducer};
use ha_service_registry::ServiceRegistry;
use ha_state_store::StateStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Apply a scene from configuration.yaml
#[derive(Parser, Debug)]
#[command(name = "ha-reproduce")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration directory containing configuration.yaml
    #[arg(short, long, default_value = ".")]
    config: PathBuf,

    /// Scene to apply; lists the configured scenes when omitted
    #[arg(short, long)]
    scene: Option<String>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Entities, services and the reproducer wired together
pub struct HomeAssistant {
    pub states: Arc<StateStore>,
    pub services: Arc<ServiceRegistry>,
    pub reproducer: StateReproducer,
}

impl HomeAssistant {
    pub fn new() -> Result<Self> {
        let states = Arc::new(StateStore::new());
        let services = Arc::new(ServiceRegistry::new());
        register_vacuum_services(&services, states.clone())?;

        let mut reproducer = StateReproducer::new(states.clone(), services.clone());
        reproducer.register_platform(Arc::new(VacuumReproducePlatform));

        Ok(Self {
            states,
            services,
            reproducer,
        })
    }

    fn log_states(&self) {
        for state in self.states.domain_states(ha_components::vacuum::DOMAIN) {
            info!(
                entity_id = %state.entity_id,
                state = %state.state,
                attributes = ?state.attributes,
                "Current state"
            );
        }
    }
}

struct Configuration {
    vacuums: HashMap<String, Option<VacuumConfig>>,
    scenes: Vec<SceneConfig>,
}

fn load_configuration(config_dir: &Path) -> Result<Configuration> {
    let config = ha_config::load_yaml(config_dir, "configuration.yaml")
        .with_context(|| format!("loading configuration from {}", config_dir.display()))?;

    Ok(Configuration {
        vacuums: ha_config::section(&config, "vacuum")?,
        scenes: ha_config::section(&config, "scene")?,
    })
}

fn log_report(report: &ReproduceReport) {
    for (entity_id, outcome) in report.outcomes() {
        info!(entity_id = %entity_id, outcome = ?outcome, "Reproduced");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Home Assistant (Rust) scene runner");

    let config = load_configuration(&args.config)?;
    let hass = HomeAssistant::new()?;
    load_vacuums(&config.vacuums, &hass.states);
    info!(
        services = hass.services.service_count(),
        domains = ?hass.services.domains(),
        scenes = config.scenes.len(),
        "Home Assistant initialized"
    );

    let Some(name) = args.scene else {
        for scene in &config.scenes {
            info!(scene = %scene.name, entities = scene.entities.len(), "Configured scene");
        }
        hass.log_states();
        return Ok(());
    };

    let scene = find_scene(&config.scenes, &name)?;
    match apply_scene(&hass.reproducer, scene, Some(Context::new())).await {
        Ok(report) => log_report(&report),
        Err(SceneError::Reproduce(err)) => {
            warn!(error = %err, "Scene applied with failures");
            log_report(err.report());
        }
        Err(err) => return Err(err.into()),
    }

    hass.log_states();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIGURATION: &str = r#"
vacuum:
  downstairs:
    initial: docked
    fan_speed_list: [low, max]
scene: !include scenes.yaml
"#;

    const SCENES: &str = r#"
- name: Cleanup
  entities:
    vacuum.downstairs:
      state: cleaning
      fan_speed: max
"#;

    #[tokio::test]
    async fn test_load_configuration_and_apply_scene() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("configuration.yaml"), CONFIGURATION).unwrap();
        fs::write(dir.path().join("scenes.yaml"), SCENES).unwrap();

        let config = load_configuration(dir.path()).unwrap();
        assert_eq!(config.scenes.len(), 1);

        let hass = HomeAssistant::new().unwrap();
        assert_eq!(load_vacuums(&config.vacuums, &hass.states), 1);

        let scene = find_scene(&config.scenes, "Cleanup").unwrap();
        let report = apply_scene(&hass.reproducer, scene, None).await.unwrap();
        assert_eq!(report.service_calls(), 2);

        let state = hass.states.get("vacuum.downstairs").unwrap();
        assert_eq!(state.state, "cleaning");
        assert_eq!(state.attr("fan_speed").and_then(|v| v.as_str()), Some("max"));
    }

    #[test]
    fn test_missing_configuration() {
        let dir = TempDir::new().unwrap();
        assert!(load_configuration(dir.path()).is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from(["ha-reproduce", "--config", "/config", "-s", "Cleanup"]);
        assert_eq!(args.config, PathBuf::from("/config"));
        assert_eq!(args.scene.as_deref(), Some("Cleanup"));
        assert_eq!(args.log_level, "info");
    }
}
