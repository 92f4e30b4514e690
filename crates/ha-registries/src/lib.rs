//! Home Assistant Registries
//!
//! Device lookups used by device automations. Entries live in memory only;
//! nothing is persisted.

pub mod device_registry;

pub use device_registry::{DeviceEntry, DeviceIdentifier, DeviceRegistry};

use std::sync::Arc;

/// Thread-safe wrapper for DeviceRegistry
pub type SharedDeviceRegistry = Arc<DeviceRegistry>;
