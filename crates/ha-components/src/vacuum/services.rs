//! Vacuum entities backed by the state store
//!
//! Loads vacuum entities from YAML and registers the vacuum services that
//! move them between states.

use ha_core::consts::{ATTR_ENTITY_ID, SERVICE_TURN_OFF, SERVICE_TURN_ON};
use ha_core::{Context, EntityId, ServiceCall};
use ha_service_registry::{ServiceDescription, ServiceError, ServiceRegistry};
use ha_state_store::StateStore;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    VacuumState, ATTR_FAN_SPEED, ATTR_FAN_SPEED_LIST, ATTR_OPTION, ATTR_OPTION_LIST, ATTR_VALUE,
    DOMAIN, SERVICE_PAUSE, SERVICE_RETURN_TO_BASE, SERVICE_SET_FAN_SPEED, SERVICE_SET_OPTION,
    SERVICE_START, SERVICE_STOP,
};

/// Vacuum configuration from YAML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacuumConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Initial state (default: docked)
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub fan_speed: Option<String>,
    /// Fan speeds accepted by `set_fan_speed`; empty accepts any
    #[serde(default)]
    pub fan_speed_list: Vec<String>,
    /// Named options with their initial values
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// Load vacuum entities from config into the state store
pub fn load_vacuums(config: &HashMap<String, Option<VacuumConfig>>, states: &StateStore) -> usize {
    let mut count = 0;

    for (id, config) in config {
        let entity_id = match EntityId::new(DOMAIN, id) {
            Ok(e) => e,
            Err(e) => {
                warn!("Invalid vacuum id '{}': {}", id, e);
                continue;
            }
        };
        let config = config.clone().unwrap_or_default();

        let initial = match config.initial.as_deref().map(str::parse::<VacuumState>) {
            None => VacuumState::Docked,
            Some(Ok(state)) => state,
            Some(Err(e)) => {
                warn!("vacuum.{}: {}", id, e);
                continue;
            }
        };

        let mut attributes = HashMap::new();
        if let Some(name) = &config.name {
            attributes.insert("friendly_name".to_string(), json!(name));
        }
        if let Some(fan_speed) = &config.fan_speed {
            attributes.insert(ATTR_FAN_SPEED.to_string(), json!(fan_speed));
        }
        if !config.fan_speed_list.is_empty() {
            attributes.insert(ATTR_FAN_SPEED_LIST.to_string(), json!(config.fan_speed_list));
        }
        if !config.options.is_empty() {
            let names: Vec<&String> = config.options.keys().collect();
            attributes.insert(ATTR_OPTION_LIST.to_string(), json!(names));
            for (option, value) in &config.options {
                attributes.insert(option.clone(), value.clone());
            }
        }

        states.set(entity_id, initial.as_str(), attributes, Context::new());
        debug!("Loaded vacuum.{} = {}", id, initial);
        count += 1;
    }

    if count > 0 {
        info!("Loaded {} vacuum entities", count);
    }
    count
}

/// Register the vacuum services
pub fn register_vacuum_services(
    services: &ServiceRegistry,
    states: Arc<StateStore>,
) -> Result<(), ServiceError> {
    let transitions = [
        (SERVICE_TURN_ON, VacuumState::On),
        (SERVICE_TURN_OFF, VacuumState::Off),
        (SERVICE_START, VacuumState::Cleaning),
        (SERVICE_PAUSE, VacuumState::Paused),
        (SERVICE_STOP, VacuumState::Idle),
        (SERVICE_RETURN_TO_BASE, VacuumState::Returning),
    ];

    for (service, new_state) in transitions {
        let states = states.clone();
        services.register_with_description(
            ServiceDescription::new(DOMAIN, service).with_schema(entity_schema(json!({}), &[])),
            move |call: ServiceCall| {
                let states = states.clone();
                async move {
                    for entity_id in target_entities(&call) {
                        if let Some(current) = states.get(&entity_id.to_string()) {
                            states.set(
                                entity_id,
                                new_state.as_str(),
                                current.attributes,
                                call.context.clone(),
                            );
                        }
                    }
                    Ok(())
                }
            },
        )?;
    }

    let states_clone = states.clone();
    services.register_with_description(
        ServiceDescription::new(DOMAIN, SERVICE_SET_FAN_SPEED)
            .with_name("Set fan speed")
            .with_schema(entity_schema(
                json!({ ATTR_FAN_SPEED: {"type": "string"} }),
                &[ATTR_FAN_SPEED],
            )),
        move |call: ServiceCall| {
            let states = states_clone.clone();
            async move {
                let Some(fan_speed) = call.get::<String>(ATTR_FAN_SPEED) else {
                    return Err(ServiceError::InvalidData("fan_speed is required".into()));
                };

                for entity_id in target_entities(&call) {
                    let Some(current) = states.get(&entity_id.to_string()) else {
                        continue;
                    };
                    let supported: Option<Vec<String>> = current.attribute(ATTR_FAN_SPEED_LIST);
                    if let Some(supported) = supported {
                        if !supported.contains(&fan_speed) {
                            return Err(ServiceError::InvalidData(format!(
                                "{} does not support fan speed '{}'",
                                entity_id, fan_speed
                            )));
                        }
                    }
                    let mut attrs = current.attributes.clone();
                    attrs.insert(ATTR_FAN_SPEED.to_string(), json!(fan_speed));
                    states.set(entity_id, current.state, attrs, call.context.clone());
                }
                Ok(())
            }
        },
    )?;

    let states_clone = states;
    services.register_with_description(
        ServiceDescription::new(DOMAIN, SERVICE_SET_OPTION)
            .with_name("Set option")
            .with_schema(entity_schema(
                json!({ ATTR_OPTION: {"type": "string"} }),
                &[ATTR_OPTION, ATTR_VALUE],
            )),
        move |call: ServiceCall| {
            let states = states_clone.clone();
            async move {
                let Some(option) = call.get::<String>(ATTR_OPTION) else {
                    return Err(ServiceError::InvalidData("option is required".into()));
                };
                let value = call.service_data.get(ATTR_VALUE).cloned().unwrap_or(Value::Null);

                for entity_id in target_entities(&call) {
                    if let Some(current) = states.get(&entity_id.to_string()) {
                        let mut attrs = current.attributes.clone();
                        attrs.insert(option.clone(), value.clone());
                        states.set(entity_id, current.state, attrs, call.context.clone());
                    }
                }
                Ok(())
            }
        },
    )?;

    info!("Vacuum services registered");
    Ok(())
}

/// Object schema requiring `entity_id` plus `required`
fn entity_schema(properties: Value, required: &[&str]) -> Value {
    let mut props = json!({
        ATTR_ENTITY_ID: {
            "anyOf": [
                {"type": "string"},
                {"type": "array", "items": {"type": "string"}}
            ]
        }
    });
    if let (Some(props), Value::Object(extra)) = (props.as_object_mut(), properties) {
        props.extend(extra);
    }

    let mut required_keys = vec![ATTR_ENTITY_ID];
    required_keys.extend_from_slice(required);

    json!({
        "type": "object",
        "properties": props,
        "required": required_keys,
    })
}

/// Vacuum entity IDs targeted by a service call
fn target_entities(call: &ServiceCall) -> Vec<EntityId> {
    call.entity_ids()
        .into_iter()
        .filter_map(|id| id.parse::<EntityId>().ok())
        .filter(|e| e.domain() == DOMAIN)
        .collect()
}
