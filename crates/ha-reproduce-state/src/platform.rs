//! Reproduction platforms and the shared per-call environment

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use ha_core::{Context, State};
use ha_service_registry::ServiceError;
use tracing::warn;

use crate::{EntityOutcome, ReproduceOptions, ReproduceReport, ServiceDispatcher, StateLookup};

/// Everything a platform needs while reproducing one batch
#[derive(Clone)]
pub struct ReproduceCall {
    pub states: Arc<dyn StateLookup>,
    pub services: Arc<dyn ServiceDispatcher>,
    /// Context attached to every service call; a fresh one per call when unset
    pub context: Option<Context>,
    pub options: ReproduceOptions,
}

impl ReproduceCall {
    pub fn new(states: Arc<dyn StateLookup>, services: Arc<dyn ServiceDispatcher>) -> Self {
        Self {
            states,
            services,
            context: None,
            options: ReproduceOptions::default(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_options(mut self, options: ReproduceOptions) -> Self {
        self.options = options;
        self
    }

    /// Issue a service call and wait for it to finish
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
    ) -> Result<(), ServiceError> {
        let context = self.context.clone().unwrap_or_default();
        self.services
            .dispatch(domain, service, service_data, context, true)
            .await
    }
}

/// Per-domain state reproduction
#[async_trait]
pub trait ReproducePlatform: Send + Sync {
    /// Domain whose entities this platform reproduces
    fn domain(&self) -> &str;

    /// Converge one entity towards `state`
    ///
    /// Returning `Err` stops work on this entity only.
    async fn reproduce_state(
        &self,
        call: &ReproduceCall,
        state: &State,
    ) -> Result<EntityOutcome, ServiceError>;

    /// Reproduce a batch of states concurrently
    async fn reproduce_states(&self, call: &ReproduceCall, states: &[State]) -> ReproduceReport {
        reproduce_each(self, call, states).await
    }
}

/// Run `platform` over every state at once and collect the outcomes in input order
pub async fn reproduce_each<P>(platform: &P, call: &ReproduceCall, states: &[State]) -> ReproduceReport
where
    P: ReproducePlatform + ?Sized,
{
    let tasks = states
        .iter()
        .map(|state| reproduce_one(Some(platform), call, state));
    ReproduceReport::new(join_all(tasks).await)
}

pub(crate) async fn reproduce_one<P>(
    platform: Option<&P>,
    call: &ReproduceCall,
    state: &State,
) -> (String, EntityOutcome)
where
    P: ReproducePlatform + ?Sized,
{
    let entity_id = state.entity_id.to_string();

    let Some(platform) = platform else {
        warn!(
            entity_id = %entity_id,
            domain = state.entity_id.domain(),
            "No platform to reproduce state for domain"
        );
        return (entity_id, EntityOutcome::UnsupportedDomain);
    };

    let outcome = match platform.reproduce_state(call, state).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(entity_id = %entity_id, error = %err, "Failed to reproduce state");
            EntityOutcome::Failed(err)
        }
    };
    (entity_id, outcome)
}
