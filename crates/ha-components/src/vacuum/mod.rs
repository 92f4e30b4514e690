//! Vacuum component
//!
//! Vacuum states, the vacuum services that drive the state store, and the
//! state reproduction platform for vacuum entities.

mod reproduce_state;
mod services;

pub use reproduce_state::{async_reproduce_states, VacuumReproducePlatform};
pub use services::{load_vacuums, register_vacuum_services, VacuumConfig};

use ha_core::consts::{
    SERVICE_TURN_OFF, SERVICE_TURN_ON, STATE_IDLE, STATE_OFF, STATE_ON, STATE_PAUSED,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DOMAIN: &str = "vacuum";

pub const ATTR_FAN_SPEED: &str = "fan_speed";
pub const ATTR_FAN_SPEED_LIST: &str = "fan_speed_list";
pub const ATTR_OPTION: &str = "option";
pub const ATTR_OPTION_LIST: &str = "option_list";
pub const ATTR_VALUE: &str = "value";

pub const SERVICE_START: &str = "start";
pub const SERVICE_PAUSE: &str = "pause";
pub const SERVICE_STOP: &str = "stop";
pub const SERVICE_RETURN_TO_BASE: &str = "return_to_base";
pub const SERVICE_SET_FAN_SPEED: &str = "set_fan_speed";
pub const SERVICE_SET_OPTION: &str = "set_option";

pub const STATE_CLEANING: &str = "cleaning";
pub const STATE_DOCKED: &str = "docked";
pub const STATE_RETURNING: &str = "returning";

/// Error for state values that are not vacuum states
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid vacuum state '{0}'")]
pub struct InvalidVacuumState(pub String);

/// The state values a vacuum entity can be reproduced into
///
/// Simple vacuums only toggle between `on` and `off`; state-aware vacuums
/// report their cleaning lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VacuumState {
    On,
    Off,
    Cleaning,
    Docked,
    Idle,
    Returning,
    Paused,
}

impl VacuumState {
    pub const ALL: [VacuumState; 7] = [
        Self::On,
        Self::Off,
        Self::Cleaning,
        Self::Docked,
        Self::Idle,
        Self::Returning,
        Self::Paused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => STATE_ON,
            Self::Off => STATE_OFF,
            Self::Cleaning => STATE_CLEANING,
            Self::Docked => STATE_DOCKED,
            Self::Idle => STATE_IDLE,
            Self::Returning => STATE_RETURNING,
            Self::Paused => STATE_PAUSED,
        }
    }

    /// Service that moves a vacuum into this state
    pub fn service(self) -> &'static str {
        match self {
            Self::On => SERVICE_TURN_ON,
            Self::Off => SERVICE_TURN_OFF,
            Self::Cleaning => SERVICE_START,
            Self::Docked | Self::Returning => SERVICE_RETURN_TO_BASE,
            Self::Idle => SERVICE_STOP,
            Self::Paused => SERVICE_PAUSE,
        }
    }
}

impl FromStr for VacuumState {
    type Err = InvalidVacuumState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| InvalidVacuumState(s.to_string()))
    }
}

impl fmt::Display for VacuumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
