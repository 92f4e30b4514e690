//! Domain-routing front end for state reproduction

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use ha_core::{Context, State};
use tracing::{debug, info, instrument};

use crate::platform::reproduce_one;
use crate::{
    ReproduceCall, ReproduceOptions, ReproducePlatform, ReproduceReport, ReproduceResult,
    ServiceDispatcher, StateLookup,
};

/// Reproduces snapshots of any domain with a registered platform
pub struct StateReproducer {
    states: Arc<dyn StateLookup>,
    services: Arc<dyn ServiceDispatcher>,
    platforms: HashMap<String, Arc<dyn ReproducePlatform>>,
}

impl StateReproducer {
    pub fn new(states: Arc<dyn StateLookup>, services: Arc<dyn ServiceDispatcher>) -> Self {
        Self {
            states,
            services,
            platforms: HashMap::new(),
        }
    }

    /// Register a platform, replacing any previous one for the same domain
    pub fn register_platform(&mut self, platform: Arc<dyn ReproducePlatform>) {
        let domain = platform.domain().to_string();
        debug!(domain = %domain, "Registering reproduce state platform");
        self.platforms.insert(domain, platform);
    }

    pub fn has_platform(&self, domain: &str) -> bool {
        self.platforms.contains_key(domain)
    }

    /// Reproduce every snapshot concurrently
    ///
    /// Returns once all snapshots have been processed. The error case still
    /// carries the full report.
    #[instrument(skip_all)]
    pub async fn reproduce(
        &self,
        snapshots: impl IntoIterator<Item = State>,
        context: Option<Context>,
        options: ReproduceOptions,
    ) -> ReproduceResult<ReproduceReport> {
        let snapshots: Vec<State> = snapshots.into_iter().collect();
        let mut call = ReproduceCall::new(self.states.clone(), self.services.clone())
            .with_options(options);
        call.context = context;

        let call = &call;
        let tasks = snapshots.iter().map(|state| {
            let platform = self.platforms.get(state.entity_id.domain());
            reproduce_one(platform.map(Arc::as_ref), call, state)
        });
        let report = ReproduceReport::new(join_all(tasks).await);

        info!(
            states = report.len(),
            service_calls = report.service_calls(),
            "Reproduced states"
        );
        report.into_result()
    }
}
