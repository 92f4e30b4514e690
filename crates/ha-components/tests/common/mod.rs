//! Shared helpers for vacuum and scene tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ha_core::{Context, State};
use ha_state_store::StateStore;
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{self, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts WARN events emitted while installed
#[derive(Clone, Default)]
pub struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    /// Install as the thread's default subscriber until the guard drops
    pub fn install() -> (Self, DefaultGuard) {
        let counter = Self::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (counter, guard)
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn attributes(attrs: Value) -> HashMap<String, Value> {
    serde_json::from_value(attrs).unwrap()
}

/// Desired-state snapshot
pub fn snapshot(entity_id: &str, state: &str, attrs: Value) -> State {
    State::snapshot(entity_id.parse().unwrap(), state, attributes(attrs))
}

/// Write a live state into the store
pub fn set_live(states: &StateStore, entity_id: &str, state: &str, attrs: Value) {
    states.set(entity_id.parse().unwrap(), state, attributes(attrs), Context::new());
}
