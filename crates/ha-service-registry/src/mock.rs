//! Recording service handlers for tests
//!
//! `mock_service` registers a handler that stores every call it receives.

use crate::ServiceRegistry;
use ha_core::ServiceCall;
use std::sync::{Arc, Mutex};

/// Calls captured by a mocked service
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<ServiceCall>>>,
}

impl CallLog {
    /// Snapshot of the calls received so far
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, call: ServiceCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

/// Register `domain.service` with a handler that only records its calls
pub fn mock_service(registry: &ServiceRegistry, domain: &str, service: &str) -> CallLog {
    let log = CallLog::default();
    let recorder = log.clone();
    registry.register(domain, service, move |call: ServiceCall| {
        recorder.push(call);
        async { Ok(()) }
    });
    log
}
