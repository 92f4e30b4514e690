//! Home Assistant Built-in Components
//!
//! Integrations implemented natively: vacuum entities with their services and
//! state reproduction, Xiaomi Aqara gateway device actions, and scenes.

pub mod scene;
pub mod vacuum;
pub mod xiaomi_aqara;

pub use scene::{apply_scene, find_scene, SceneConfig, SceneEntity, SceneError};
pub use vacuum::{
    async_reproduce_states, load_vacuums, register_vacuum_services, VacuumConfig,
    VacuumReproducePlatform, VacuumState,
};
