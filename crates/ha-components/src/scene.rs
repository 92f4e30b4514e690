//! Scenes
//!
//! A scene is a named set of entity snapshots. Applying it reproduces every
//! snapshot through a [`StateReproducer`].
//!
//! ```yaml
//! scene:
//!   - name: Cleanup
//!     entities:
//!       vacuum.downstairs: cleaning
//!       vacuum.upstairs:
//!         state: docked
//!         fan_speed: low
//! ```

use std::collections::{BTreeMap, HashMap};

use ha_core::{Context, EntityId, EntityIdError, State};
use ha_reproduce_state::{ReproduceError, ReproduceOptions, ReproduceReport, StateReproducer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene '{scene}': invalid entity id '{entity_id}': {source}")]
    InvalidEntityId {
        scene: String,
        entity_id: String,
        #[source]
        source: EntityIdError,
    },

    #[error("scene not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Reproduce(#[from] ReproduceError),
}

/// Desired state of one entity in a scene
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SceneEntity {
    /// Bare state value
    State(String),
    /// State value plus attributes
    Full {
        state: String,
        #[serde(flatten)]
        attributes: HashMap<String, Value>,
    },
}

impl SceneEntity {
    pub fn state(&self) -> &str {
        match self {
            SceneEntity::State(state) => state,
            SceneEntity::Full { state, .. } => state,
        }
    }
}

/// Scene configuration from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    #[serde(default)]
    pub entities: BTreeMap<String, SceneEntity>,
}

impl SceneConfig {
    /// The scene's entities as snapshots, ordered by entity id
    pub fn snapshots(&self) -> Result<Vec<State>, SceneError> {
        self.entities
            .iter()
            .map(|(entity_id, entity)| -> Result<State, SceneError> {
                let id: EntityId = entity_id.parse().map_err(|source| SceneError::InvalidEntityId {
                    scene: self.name.clone(),
                    entity_id: entity_id.clone(),
                    source,
                })?;
                Ok(match entity {
                    SceneEntity::State(state) => State::snapshot(id, state.clone(), HashMap::new()),
                    SceneEntity::Full { state, attributes } => {
                        State::snapshot(id, state.clone(), attributes.clone())
                    }
                })
            })
            .collect()
    }
}

/// Find a scene by name
pub fn find_scene<'a>(scenes: &'a [SceneConfig], name: &str) -> Result<&'a SceneConfig, SceneError> {
    scenes
        .iter()
        .find(|scene| scene.name == name)
        .ok_or_else(|| SceneError::NotFound(name.to_string()))
}

/// Reproduce every entity of `scene`
pub async fn apply_scene(
    reproducer: &StateReproducer,
    scene: &SceneConfig,
    context: Option<Context>,
) -> Result<ReproduceReport, SceneError> {
    let snapshots = scene.snapshots()?;
    info!(scene = %scene.name, entities = snapshots.len(), "Applying scene");
    Ok(reproducer
        .reproduce(snapshots, context, ReproduceOptions::default())
        .await?)
}
