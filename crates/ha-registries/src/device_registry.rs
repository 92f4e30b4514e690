//! Device Registry
//!
//! Tracks devices by id and by their (domain, id) identifiers. Devices may
//! hang off a parent device (for example a sensor paired with a gateway);
//! the parent is recorded as `via_device_id`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A device identifier (domain, id) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self(domain.into(), id.into())
    }

    pub fn domain(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.1
    }

    /// Index key
    fn key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

/// A registered device entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Internal UUID
    pub id: String,

    /// Unique identifiers by domain (e.g., [["xiaomi_aqara", "34ce00880088"]])
    #[serde(default)]
    pub identifiers: Vec<DeviceIdentifier>,

    /// Config entries that provide this device
    #[serde(default)]
    pub config_entries: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Parent device, if this device is reached through another one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_device_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

impl DeviceEntry {
    fn new(name: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            identifiers: Vec::new(),
            config_entries: Vec::new(),
            name: name.map(str::to_string),
            via_device_id: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Identifier belonging to `domain`, the first one if there are several
    pub fn identifier_for(&self, domain: &str) -> Option<&DeviceIdentifier> {
        self.identifiers.iter().find(|i| i.domain() == domain)
    }
}

/// In-memory device registry
///
/// Entries are stored as `Arc<DeviceEntry>` so reads do not clone.
pub struct DeviceRegistry {
    /// device_id -> entry
    by_id: DashMap<String, Arc<DeviceEntry>>,
    /// identifier key -> device_id
    by_identifier: DashMap<String, String>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_identifier: DashMap::new(),
        }
    }

    pub fn get(&self, device_id: &str) -> Option<Arc<DeviceEntry>> {
        self.by_id.get(device_id).map(|r| r.value().clone())
    }

    pub fn get_by_identifier(&self, domain: &str, id: &str) -> Option<Arc<DeviceEntry>> {
        let key = DeviceIdentifier::new(domain, id).key();
        let device_id = self.by_identifier.get(&key)?.value().clone();
        self.get(&device_id)
    }

    /// Find a device by any of its identifiers, creating it when none match
    ///
    /// An existing device gains the config entry and any new identifiers.
    /// `via_device` is resolved to the id of the device it identifies; an
    /// unknown parent leaves `via_device_id` unchanged.
    pub fn get_or_create(
        &self,
        config_entry_id: &str,
        identifiers: &[DeviceIdentifier],
        via_device: Option<&DeviceIdentifier>,
        name: Option<&str>,
    ) -> Arc<DeviceEntry> {
        let via_device_id = via_device
            .and_then(|via| self.get_by_identifier(via.domain(), via.id()))
            .map(|parent| parent.id.clone());

        let existing = identifiers
            .iter()
            .find_map(|i| self.get_by_identifier(i.domain(), i.id()));

        let mut entry = match existing {
            Some(existing) => {
                debug!(device_id = %existing.id, "Found existing device by identifier");
                let mut entry = (*existing).clone();
                entry.modified_at = Utc::now();
                entry
            }
            None => DeviceEntry::new(name),
        };

        if !entry.config_entries.iter().any(|c| c == config_entry_id) {
            entry.config_entries.push(config_entry_id.to_string());
        }
        for identifier in identifiers {
            if !entry.identifiers.contains(identifier) {
                entry.identifiers.push(identifier.clone());
            }
        }
        if via_device_id.is_some() {
            entry.via_device_id = via_device_id;
        }

        let entry = Arc::new(entry);
        self.index_entry(entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn index_entry(&self, entry: Arc<DeviceEntry>) {
        for identifier in &entry.identifiers {
            self.by_identifier
                .insert(identifier.key(), entry.id.clone());
        }
        self.by_id.insert(entry.id.clone(), entry);
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
