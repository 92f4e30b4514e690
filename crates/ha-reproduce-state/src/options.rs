//! Pass-through options for reproduction platforms

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque options forwarded untouched to every platform
///
/// The core never inspects these; a platform may read whatever keys it
/// understands (for example a light transition time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReproduceOptions(HashMap<String, serde_json::Value>);

impl ReproduceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, serde_json::Value>> for ReproduceOptions {
    fn from(map: HashMap<String, serde_json::Value>) -> Self {
        Self(map)
    }
}
