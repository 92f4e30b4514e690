//! Device actions for Xiaomi Gateway (Aqara)
//!
//! Gateways expose two actions, playing and stopping a ringtone. Devices
//! paired through a gateway have none.

use ha_core::Context;
use ha_registries::DeviceRegistry;
use ha_reproduce_state::ServiceDispatcher;
use ha_service_registry::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use super::{
    ATTR_GW_MAC, ATTR_RINGTONE_ID, ATTR_RINGTONE_VOL, DOMAIN, MAX_RINGTONE_VOL, RINGTONES,
    SERVICE_PLAY_RINGTONE, SERVICE_STOP_RINGTONE,
};

#[derive(Debug, Error)]
pub enum DeviceActionError {
    #[error("invalid device action config: {0}")]
    InvalidConfig(String),

    #[error("device action is for domain '{0}', expected xiaomi_aqara")]
    WrongDomain(String),

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("ringtone_id is required to play a ringtone")]
    MissingRingtone,

    #[error("unknown ringtone: {0}")]
    InvalidRingtone(Value),

    #[error("invalid ringtone volume: {0}")]
    InvalidVolume(Value),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    PlayRingtone,
    StopRingtone,
}

impl ActionType {
    pub const ALL: [ActionType; 2] = [ActionType::PlayRingtone, ActionType::StopRingtone];

    fn service(self) -> &'static str {
        match self {
            ActionType::PlayRingtone => SERVICE_PLAY_RINGTONE,
            ActionType::StopRingtone => SERVICE_STOP_RINGTONE,
        }
    }
}

/// An action offered by a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAction {
    pub device_id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
}

/// Action config as written in an automation
#[derive(Debug, Clone, Deserialize)]
struct ActionConfig {
    device_id: String,
    domain: String,
    #[serde(rename = "type")]
    action_type: ActionType,
    #[serde(default)]
    ringtone_id: Option<Value>,
    #[serde(default)]
    ringtone_vol: Option<Value>,
}

/// Sid of the gateway behind `device_id`, `None` for sub-devices
fn gateway_sid(
    devices: &DeviceRegistry,
    device_id: &str,
) -> Result<Option<String>, DeviceActionError> {
    let device = devices
        .get(device_id)
        .ok_or_else(|| DeviceActionError::UnknownDevice(device_id.to_string()))?;
    if device.via_device_id.is_some() {
        return Ok(None);
    }
    Ok(device.identifier_for(DOMAIN).map(|i| i.id().to_string()))
}

/// List the actions of a device
pub fn get_actions(devices: &DeviceRegistry, device_id: &str) -> Vec<DeviceAction> {
    match gateway_sid(devices, device_id) {
        Ok(Some(_)) => ActionType::ALL
            .iter()
            .map(|action_type| DeviceAction {
                device_id: device_id.to_string(),
                domain: DOMAIN.to_string(),
                action_type: *action_type,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Extra fields an action accepts, in serialized form-schema layout
pub fn get_action_capabilities(action_type: ActionType) -> Value {
    match action_type {
        ActionType::PlayRingtone => {
            let options: Vec<Value> = RINGTONES.iter().map(|id| json!([id, id])).collect();
            json!({
                "extra_fields": [
                    {
                        "name": ATTR_RINGTONE_ID,
                        "required": true,
                        "type": "select",
                        "options": options,
                    },
                    {
                        "name": ATTR_RINGTONE_VOL,
                        "optional": true,
                        "type": "integer",
                        "valueMin": 0,
                        "valueMax": MAX_RINGTONE_VOL,
                    },
                ]
            })
        }
        ActionType::StopRingtone => json!({}),
    }
}

/// Execute a device action
///
/// `config` is the action as configured, e.g.
/// `{"device_id": ..., "domain": "xiaomi_aqara", "type": "play_ringtone", "ringtone_id": 5}`.
/// Actions on devices paired through a gateway do nothing.
pub async fn call_action_from_config(
    devices: &DeviceRegistry,
    services: &dyn ServiceDispatcher,
    config: &Value,
    context: Option<Context>,
) -> Result<(), DeviceActionError> {
    let config: ActionConfig = serde_json::from_value(config.clone())
        .map_err(|e| DeviceActionError::InvalidConfig(e.to_string()))?;
    if config.domain != DOMAIN {
        return Err(DeviceActionError::WrongDomain(config.domain));
    }

    let ringtone_id = config.ringtone_id.as_ref().map(valid_ringtone_id).transpose()?;
    let ringtone_vol = config.ringtone_vol.as_ref().map(valid_ringtone_vol).transpose()?;

    let Some(sid) = gateway_sid(devices, &config.device_id)? else {
        debug!(device_id = %config.device_id, "Not a gateway, ignoring action");
        return Ok(());
    };

    let mut service_data = Map::new();
    service_data.insert(ATTR_GW_MAC.to_string(), Value::String(sid));

    if config.action_type == ActionType::PlayRingtone {
        let ringtone_id = ringtone_id.ok_or(DeviceActionError::MissingRingtone)?;
        service_data.insert(ATTR_RINGTONE_ID.to_string(), json!(ringtone_id));
        if let Some(vol) = ringtone_vol {
            service_data.insert(ATTR_RINGTONE_VOL.to_string(), json!(vol));
        }
    }

    services
        .dispatch(
            DOMAIN,
            config.action_type.service(),
            Value::Object(service_data),
            context.unwrap_or_default(),
            true,
        )
        .await?;
    Ok(())
}

fn valid_ringtone_id(value: &Value) -> Result<u32, DeviceActionError> {
    value
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .filter(|id| RINGTONES.contains(id))
        .ok_or_else(|| DeviceActionError::InvalidRingtone(value.clone()))
}

/// Coerce to an integer, then clamp into 0..=100
fn valid_ringtone_vol(value: &Value) -> Result<i64, DeviceActionError> {
    let vol = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    vol.map(|v| v.clamp(0, MAX_RINGTONE_VOL))
        .ok_or_else(|| DeviceActionError::InvalidVolume(value.clone()))
}
