//! Service call type for invoking Home Assistant services

use crate::consts::ATTR_ENTITY_ID;
use crate::Context;
use serde::{Deserialize, Serialize};

/// A request to run a service such as `vacuum.start`
///
/// Service calls are the only way state reproduction changes an entity: each
/// call names a domain, a service and a JSON object of service data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "vacuum", "xiaomi_aqara")
    pub domain: String,

    /// The service name (e.g., "start", "set_fan_speed")
    pub service: String,

    /// Data passed to the service (e.g., entity_id, fan_speed)
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Entity IDs targeted by this call
    ///
    /// Accepts both a single string and a list of strings.
    pub fn entity_ids(&self) -> Vec<String> {
        match self.service_data.get(ATTR_ENTITY_ID) {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => vec![],
        }
    }
}
