//! Recording dispatcher for tests
//!
//! Captures every service call a reproduction issues and can be told to fail
//! specific calls. Optionally forwards to a real dispatcher so state changes
//! still happen.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ha_core::{Context, ServiceCall};
use ha_service_registry::ServiceError;

use crate::ServiceDispatcher;

#[derive(Default)]
pub struct RecordingDispatcher {
    calls: Mutex<Vec<ServiceCall>>,
    /// (service id, entity id) pairs that fail
    failures: Mutex<Vec<(String, String)>>,
    inner: Option<Arc<dyn ServiceDispatcher>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls, then pass them on to `inner`
    pub fn forwarding(inner: Arc<dyn ServiceDispatcher>) -> Self {
        Self {
            inner: Some(inner),
            ..Self::default()
        }
    }

    /// Make `domain.service` fail whenever it targets `entity_id`
    pub fn fail_on(&self, domain: &str, service: &str, entity_id: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((format!("{domain}.{service}"), entity_id.to_string()));
        }
    }

    /// Every call attempted so far, failed ones included
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// `domain.service` of every attempted call, in order
    pub fn service_ids(&self) -> Vec<String> {
        self.calls().iter().map(ServiceCall::service_id).collect()
    }

    /// Attempted calls targeting `entity_id`
    pub fn calls_for(&self, entity_id: &str) -> Vec<ServiceCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.entity_ids().iter().any(|id| id == entity_id))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn should_fail(&self, call: &ServiceCall) -> bool {
        let service_id = call.service_id();
        let targets = call.entity_ids();
        self.failures
            .lock()
            .map(|failures| {
                failures
                    .iter()
                    .any(|(service, entity)| *service == service_id && targets.contains(entity))
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl ServiceDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
        blocking: bool,
    ) -> Result<(), ServiceError> {
        let call = ServiceCall::new(domain, service, service_data.clone(), context.clone());
        let fail = self.should_fail(&call);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if fail {
            return Err(ServiceError::CallFailed(format!("{domain}.{service} failed")));
        }
        match &self.inner {
            Some(inner) => {
                inner
                    .dispatch(domain, service, service_data, context, blocking)
                    .await
            }
            None => Ok(()),
        }
    }
}
