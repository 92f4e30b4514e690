//! Entity state storage with domain indexing for Home Assistant
//!
//! The StateStore holds the live state of every entity. State reproduction
//! reads from it to decide which service calls are needed, and service
//! handlers write to it when they change an entity.

use dashmap::DashMap;
use ha_core::{Context, EntityId, State};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Concurrent store of entity states
pub struct StateStore {
    /// All entity states keyed by entity_id string
    states: DashMap<String, State>,
    /// Entity ids per domain, in insertion order
    domain_index: DashMap<String, Vec<String>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
            domain_index: DashMap::new(),
        }
    }

    /// Set the state of an entity
    ///
    /// An existing entity keeps its `last_changed` timestamp when only the
    /// attributes change.
    #[instrument(skip(self, state, attributes, context), fields(entity_id = %entity_id))]
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
        context: Context,
    ) -> State {
        let key = entity_id.to_string();
        let state = state.into();

        let mut is_new = false;
        let new_state = {
            let mut entry = self.states.entry(key.clone()).or_insert_with(|| {
                is_new = true;
                State::new(entity_id.clone(), state.clone(), HashMap::new(), context.clone())
            });
            let updated = entry.with_update(state, attributes, context);
            *entry = updated.clone();
            updated
        };

        if is_new {
            self.domain_index
                .entry(entity_id.domain().to_string())
                .or_default()
                .push(key);
        }

        debug!(state = %new_state.state, new = is_new, "Set entity state");
        new_state
    }

    /// Current state of an entity
    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// Current state value of an entity
    pub fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states.get(entity_id).map(|s| s.state.clone())
    }

    pub fn is_state(&self, entity_id: &str, state: &str) -> bool {
        self.get_state(entity_id).as_deref() == Some(state)
    }

    /// Entity ids of a domain
    pub fn entity_ids(&self, domain: &str) -> Vec<String> {
        self.domain_index
            .get(domain)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// States of every entity in a domain
    pub fn domain_states(&self, domain: &str) -> Vec<State> {
        self.entity_ids(domain)
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Remove an entity's state
    #[instrument(skip(self), fields(entity_id = %entity_id))]
    pub fn remove(&self, entity_id: &EntityId) -> Option<State> {
        let key = entity_id.to_string();
        let old_state = self.states.remove(&key).map(|(_, s)| s);

        if old_state.is_some() {
            trace!("Removed entity state");
            if let Some(mut ids) = self.domain_index.get_mut(entity_id.domain()) {
                ids.retain(|id| id != &key);
            }
        }

        old_state
    }

    pub fn entity_count(&self) -> usize {
        self.states.len()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for StateStore
pub type SharedStateStore = Arc<StateStore>;
