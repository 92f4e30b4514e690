//! Issuing service calls on behalf of state reproduction

use async_trait::async_trait;
use ha_core::Context;
use ha_service_registry::{ServiceError, ServiceRegistry};

/// Executes service calls
///
/// With `blocking` the call resolves once the service has finished (or
/// failed). Timeouts and cancellation are the dispatcher's business.
#[async_trait]
pub trait ServiceDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
        blocking: bool,
    ) -> Result<(), ServiceError>;
}

#[async_trait]
impl ServiceDispatcher for ServiceRegistry {
    async fn dispatch(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
        blocking: bool,
    ) -> Result<(), ServiceError> {
        self.call(domain, service, service_data, context, blocking)
            .await
    }
}
