//! Reproduce a vacuum state
//!
//! A vacuum is reconciled in three steps, each awaited before the next:
//! state value, then fan speed, then every option named in the snapshot's
//! `option_list`. Nothing is called for parts that already match.

use async_trait::async_trait;
use ha_core::consts::ATTR_ENTITY_ID;
use ha_core::State;
use ha_reproduce_state::{
    reproduce_each, EntityOutcome, ReproduceCall, ReproducePlatform, ReproduceReport,
    ReproduceResult,
};
use ha_service_registry::ServiceError;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    VacuumState, ATTR_FAN_SPEED, ATTR_OPTION, ATTR_OPTION_LIST, ATTR_VALUE, DOMAIN,
    SERVICE_SET_FAN_SPEED, SERVICE_SET_OPTION,
};

/// State reproduction for the vacuum domain
#[derive(Debug, Clone, Copy, Default)]
pub struct VacuumReproducePlatform;

#[async_trait]
impl ReproducePlatform for VacuumReproducePlatform {
    fn domain(&self) -> &str {
        DOMAIN
    }

    async fn reproduce_state(
        &self,
        call: &ReproduceCall,
        state: &State,
    ) -> Result<EntityOutcome, ServiceError> {
        reproduce_vacuum_state(call, state).await
    }
}

/// Reproduce vacuum states in parallel
pub async fn async_reproduce_states(
    call: &ReproduceCall,
    states: &[State],
) -> ReproduceResult<ReproduceReport> {
    reproduce_each(&VacuumReproducePlatform, call, states)
        .await
        .into_result()
}

async fn reproduce_vacuum_state(
    call: &ReproduceCall,
    state: &State,
) -> Result<EntityOutcome, ServiceError> {
    let entity_id = state.entity_id.to_string();

    let Some(cur_state) = call.states.get(&entity_id) else {
        warn!(entity_id = %entity_id, "Unable to find entity");
        return Ok(EntityOutcome::UnknownEntity);
    };

    let target = match state.state.parse::<VacuumState>() {
        Ok(target) => target,
        Err(_) => {
            warn!(entity_id = %entity_id, state = %state.state, "Invalid state specified");
            return Ok(EntityOutcome::InvalidState {
                state: state.state.clone(),
            });
        }
    };

    let mut service_calls = 0;

    if cur_state.state != state.state {
        debug!(entity_id = %entity_id, from = %cur_state.state, to = %target, "Wrong state");
        call.call_service(DOMAIN, target.service(), json!({ ATTR_ENTITY_ID: entity_id }))
            .await?;
        service_calls += 1;
    }

    if attr_value(&cur_state, ATTR_FAN_SPEED) != attr_value(state, ATTR_FAN_SPEED) {
        debug!(entity_id = %entity_id, "Wrong fan speed");
        call.call_service(
            DOMAIN,
            SERVICE_SET_FAN_SPEED,
            json!({
                ATTR_ENTITY_ID: entity_id,
                ATTR_FAN_SPEED: target_value(state, ATTR_FAN_SPEED),
            }),
        )
        .await?;
        service_calls += 1;
    }

    for option in option_list(state) {
        if attr_value(&cur_state, option) == attr_value(state, option) {
            continue;
        }
        call.call_service(
            DOMAIN,
            SERVICE_SET_OPTION,
            json!({
                ATTR_ENTITY_ID: entity_id,
                ATTR_OPTION: option,
                ATTR_VALUE: target_value(state, option),
            }),
        )
        .await?;
        service_calls += 1;
    }

    Ok(EntityOutcome::Reproduced { service_calls })
}

/// Attribute value for comparison; `null` counts as unset
fn attr_value<'a>(state: &'a State, key: &str) -> Option<&'a Value> {
    state.attr(key).filter(|value| !value.is_null())
}

/// Attribute of the snapshot, `null` when the snapshot does not set it
fn target_value(state: &State, key: &str) -> Value {
    state.attr(key).cloned().unwrap_or(Value::Null)
}

/// Option names listed by the snapshot, in order
///
/// Entries that are not strings are skipped. Names are not checked against
/// the options the entity actually supports.
fn option_list(state: &State) -> Vec<&str> {
    match state.attr(ATTR_OPTION_LIST) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let name = item.as_str();
                if name.is_none() {
                    debug!(entity_id = %state.entity_id, option = %item, "Skipping non-string option");
                }
                name
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            debug!(entity_id = %state.entity_id, option_list = %other, "Ignoring malformed option list");
            Vec::new()
        }
    }
}
