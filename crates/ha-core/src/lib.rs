//! Core types for Home Assistant
//!
//! This crate provides the fundamental types shared by the rest of the
//! workspace: EntityId, State, Context, and ServiceCall.

mod context;
mod entity_id;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{split_entity_id, EntityId, EntityIdError};
pub use service_call::ServiceCall;
pub use state::State;

/// Attribute and service names shared across integrations
pub mod consts {
    /// Service data key naming the targeted entity
    pub const ATTR_ENTITY_ID: &str = "entity_id";

    pub const SERVICE_TURN_ON: &str = "turn_on";
    pub const SERVICE_TURN_OFF: &str = "turn_off";

    pub const STATE_ON: &str = "on";
    pub const STATE_OFF: &str = "off";
    pub const STATE_IDLE: &str = "idle";
    pub const STATE_PAUSED: &str = "paused";
}
