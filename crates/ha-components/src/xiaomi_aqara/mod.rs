//! Xiaomi Gateway (Aqara)
//!
//! Constants shared by the gateway services and its device actions.

pub mod device_action;

pub use device_action::{
    call_action_from_config, get_action_capabilities, get_actions, ActionType, DeviceAction,
    DeviceActionError,
};

pub const DOMAIN: &str = "xiaomi_aqara";

/// Service data key carrying the gateway's sid
pub const ATTR_GW_MAC: &str = "gw_mac";
pub const ATTR_RINGTONE_ID: &str = "ringtone_id";
pub const ATTR_RINGTONE_VOL: &str = "ringtone_vol";

pub const SERVICE_PLAY_RINGTONE: &str = "play_ringtone";
pub const SERVICE_STOP_RINGTONE: &str = "stop_ringtone";

/// Built-in ringtones: alarms, doorbells and alarm clocks
pub const RINGTONES: &[u32] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29,
];

/// Loudest ringtone volume
pub const MAX_RINGTONE_VOL: i64 = 100;
