//! Service registry with async handlers for Home Assistant
//!
//! This crate provides the ServiceRegistry, which routes service calls such as
//! `vacuum.start` to registered async handlers. Calls can block until the
//! handler finishes or be fired off onto the runtime, and service data is
//! checked against an optional JSON schema before the handler runs.

#[cfg(any(test, feature = "test-util"))]
mod mock;

#[cfg(any(test, feature = "test-util"))]
pub use mock::{mock_service, CallLog};

use dashmap::DashMap;
use ha_core::{Context, ServiceCall};
use jsonschema::JSONSchema;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Result type for service calls
pub type ServiceResult = Result<(), ServiceError>;

/// Future type for async service handlers
pub type ServiceFuture = Pin<Box<dyn Future<Output = ServiceResult> + Send>>;

/// Service handler function type
pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

/// Errors that can occur when working with services
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },

    #[error("service call failed: {0}")]
    CallFailed(String),

    #[error("invalid service data: {0}")]
    InvalidData(String),

    #[error("invalid schema for {domain}.{service}: {reason}")]
    InvalidSchema {
        domain: String,
        service: String,
        reason: String,
    },
}

/// Information about a registered service
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    pub domain: String,
    pub service: String,
    /// Human-readable name
    pub name: Option<String>,
    /// JSON schema the service data must satisfy
    pub schema: Option<serde_json::Value>,
}

impl ServiceDescription {
    /// Minimal description without schema
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            name: None,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

struct RegisteredService {
    handler: ServiceHandler,
    validator: Option<Arc<JSONSchema>>,
    description: ServiceDescription,
}

/// The service registry manages all registered services
///
/// Services are keyed by `domain.service`. Looking a service up takes a short
/// map lock that is released before the handler runs, so handlers may call
/// other services.
pub struct ServiceRegistry {
    services: DashMap<String, RegisteredService>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service without schema
    pub fn register<F, Fut>(&self, domain: impl Into<String>, service: impl Into<String>, handler: F)
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let description = ServiceDescription::new(domain, service);
        self.insert(description, None, handler);
    }

    /// Register a service with a full description
    ///
    /// Fails when the description carries a schema that does not compile.
    #[instrument(skip(self, handler), fields(domain = %description.domain, service = %description.service))]
    pub fn register_with_description<F, Fut>(
        &self,
        description: ServiceDescription,
        handler: F,
    ) -> Result<(), ServiceError>
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let validator = match &description.schema {
            Some(schema) => {
                let compiled =
                    JSONSchema::compile(schema).map_err(|e| ServiceError::InvalidSchema {
                        domain: description.domain.clone(),
                        service: description.service.clone(),
                        reason: e.to_string(),
                    })?;
                Some(Arc::new(compiled))
            }
            None => None,
        };

        self.insert(description, validator, handler);
        Ok(())
    }

    fn insert<F, Fut>(
        &self,
        description: ServiceDescription,
        validator: Option<Arc<JSONSchema>>,
        handler: F,
    ) where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let key = format!("{}.{}", description.domain, description.service);
        debug!(service = %key, name = ?description.name, "Registering service");

        let handler: ServiceHandler =
            Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);

        self.services.insert(
            key,
            RegisteredService {
                handler,
                validator,
                description,
            },
        );
    }

    /// Call a service
    ///
    /// With `blocking` the handler is awaited and its error returned. Without
    /// it the handler is spawned on the tokio runtime; lookup and validation
    /// errors are still returned, handler errors are only logged.
    #[instrument(skip(self, service_data, context))]
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
        blocking: bool,
    ) -> ServiceResult {
        let key = format!("{}.{}", domain, service);

        let (handler, validator) = {
            let registered = self.services.get(&key).ok_or_else(|| {
                warn!(domain = %domain, service = %service, "Service not found");
                ServiceError::NotFound {
                    domain: domain.to_string(),
                    service: service.to_string(),
                }
            })?;
            (registered.handler.clone(), registered.validator.clone())
        };

        if let Some(validator) = validator {
            if let Err(errors) = validator.validate(&service_data) {
                let reason = errors
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ServiceError::InvalidData(reason));
            }
        }

        let call = ServiceCall::new(domain, service, service_data, context);

        if !blocking {
            debug!(service = %key, "Scheduling service call");
            tokio::spawn(async move {
                if let Err(err) = handler(call).await {
                    warn!(service = %key, error = %err, "Non-blocking service call failed");
                }
            });
            return Ok(());
        }

        debug!(service = %key, "Calling service");
        handler(call).await
    }

    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services.contains_key(&format!("{}.{}", domain, service))
    }

    /// Sorted list of domains with at least one service
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<_> = self
            .services
            .iter()
            .map(|s| s.description.domain.clone())
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_blocking_call_runs_handler() {
        let registry = ServiceRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        registry.register("vacuum", "start", move |call: ServiceCall| {
            let sender = tx.lock().unwrap().take();
            async move {
                if let Some(sender) = sender {
                    let _ = sender.send(call.service_data);
                }
                Ok(())
            }
        });

        let result = registry
            .call(
                "vacuum",
                "start",
                json!({"entity_id": "vacuum.upstairs"}),
                Context::new(),
                true,
            )
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(rx.await.unwrap(), json!({"entity_id": "vacuum.upstairs"}));
    }

    #[test]
    fn test_service_not_found() {
        let registry = ServiceRegistry::new();

        let result = tokio_test::block_on(registry.call(
            "vacuum",
            "start",
            json!({}),
            Context::new(),
            true,
        ));

        assert_eq!(
            result,
            Err(ServiceError::NotFound {
                domain: "vacuum".into(),
                service: "start".into()
            })
        );
    }

    #[tokio::test]
    async fn test_handler_error_propagates_when_blocking() {
        let registry = ServiceRegistry::new();
        registry.register("vacuum", "start", |_: ServiceCall| async {
            Err(ServiceError::CallFailed("stuck on carpet".to_string()))
        });

        let result = registry
            .call("vacuum", "start", json!({}), Context::new(), true)
            .await;

        assert_eq!(
            result,
            Err(ServiceError::CallFailed("stuck on carpet".to_string()))
        );
    }

    #[tokio::test]
    async fn test_non_blocking_call_runs_in_background() {
        let registry = ServiceRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        registry.register("vacuum", "locate", move |call: ServiceCall| {
            let sender = tx.lock().unwrap().take();
            async move {
                if let Some(sender) = sender {
                    let _ = sender.send(call.entity_ids());
                }
                Err(ServiceError::CallFailed("ignored".to_string()))
            }
        });

        let result = registry
            .call(
                "vacuum",
                "locate",
                json!({"entity_id": "vacuum.downstairs"}),
                Context::new(),
                false,
            )
            .await;
        assert_eq!(result, Ok(()));

        let entity_ids = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entity_ids, vec!["vacuum.downstairs"]);
    }

    #[tokio::test]
    async fn test_schema_validation() {
        let registry = ServiceRegistry::new();
        registry
            .register_with_description(
                ServiceDescription::new("vacuum", "set_fan_speed").with_schema(json!({
                    "type": "object",
                    "required": ["entity_id", "fan_speed"],
                })),
                |_: ServiceCall| async { Ok(()) },
            )
            .unwrap();

        let ok = registry
            .call(
                "vacuum",
                "set_fan_speed",
                json!({"entity_id": "vacuum.a", "fan_speed": "max"}),
                Context::new(),
                true,
            )
            .await;
        assert_eq!(ok, Ok(()));

        let missing = registry
            .call(
                "vacuum",
                "set_fan_speed",
                json!({"entity_id": "vacuum.a"}),
                Context::new(),
                true,
            )
            .await;
        assert!(matches!(missing, Err(ServiceError::InvalidData(_))));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let registry = ServiceRegistry::new();
        let result = registry.register_with_description(
            ServiceDescription::new("vacuum", "start").with_schema(json!({"type": 12})),
            |_: ServiceCall| async { Ok(()) },
        );

        assert!(matches!(result, Err(ServiceError::InvalidSchema { .. })));
        assert!(!registry.has_service("vacuum", "start"));
    }

    #[test]
    fn test_domains() {
        let registry = ServiceRegistry::new();
        registry.register("vacuum", "start", |_: ServiceCall| async { Ok(()) });
        registry.register("vacuum", "stop", |_: ServiceCall| async { Ok(()) });
        registry.register("xiaomi_aqara", "play_ringtone", |_: ServiceCall| async {
            Ok(())
        });

        assert_eq!(registry.domains(), vec!["vacuum", "xiaomi_aqara"]);
        assert_eq!(registry.service_count(), 3);
        assert!(registry.has_service("vacuum", "stop"));
        assert!(!registry.has_service("vacuum", "locate"));
    }
}
