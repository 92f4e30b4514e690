//! Read access to live entity states

use ha_core::State;
use ha_state_store::StateStore;

/// Source of live entity states
///
/// Lookups must not mutate anything and return the state as it is at call
/// time. `None` means the entity is unknown.
pub trait StateLookup: Send + Sync {
    fn get(&self, entity_id: &str) -> Option<State>;
}

impl StateLookup for StateStore {
    fn get(&self, entity_id: &str) -> Option<State> {
        StateStore::get(self, entity_id)
    }
}
