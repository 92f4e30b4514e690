//! Per-entity results of a reproduction batch

use ha_service_registry::ServiceError;

use crate::{ReproduceError, ReproduceResult};

/// What happened to one snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    /// The entity was processed; zero calls means it already matched
    Reproduced { service_calls: usize },
    /// No live state exists for the entity
    UnknownEntity,
    /// The snapshot's state value is not one the platform recognizes
    InvalidState { state: String },
    /// No platform is registered for the entity's domain
    UnsupportedDomain,
    /// A service call failed; later steps for the entity were skipped
    Failed(ServiceError),
}

impl EntityOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Service calls that completed successfully for this entity
    pub fn service_calls(&self) -> usize {
        match self {
            Self::Reproduced { service_calls } => *service_calls,
            _ => 0,
        }
    }
}

/// Outcomes of a batch, in the order the snapshots were supplied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReproduceReport {
    outcomes: Vec<(String, EntityOutcome)>,
}

impl ReproduceReport {
    pub fn new(outcomes: Vec<(String, EntityOutcome)>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[(String, EntityOutcome)] {
        &self.outcomes
    }

    /// Outcome for an entity, the first one if it was supplied twice
    pub fn outcome(&self, entity_id: &str) -> Option<&EntityOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == entity_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Total successful service calls across the batch
    pub fn service_calls(&self) -> usize {
        self.outcomes.iter().map(|(_, o)| o.service_calls()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ServiceError)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            EntityOutcome::Failed(err) => Some((id.as_str(), err)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(|(_, o)| o.is_failure())
    }

    /// `Ok(self)` unless some entity failed
    pub fn into_result(self) -> ReproduceResult<Self> {
        let Some(first) = self.failures().next().map(|(_, err)| err.clone()) else {
            return Ok(self);
        };

        Err(ReproduceError::PartialFailure {
            failed: self.failures().count(),
            total: self.len(),
            first,
            report: self,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_report() -> ReproduceReport {
        ReproduceReport::new(vec![
            (
                "vacuum.a".to_string(),
                EntityOutcome::Reproduced { service_calls: 2 },
            ),
            ("vacuum.b".to_string(), EntityOutcome::UnknownEntity),
            (
                "vacuum.c".to_string(),
                EntityOutcome::Failed(ServiceError::CallFailed("jammed".to_string())),
            ),
        ])
    }

    #[test]
    fn test_counts() {
        let report = failing_report();
        assert_eq!(report.len(), 3);
        assert_eq!(report.service_calls(), 2);
        assert_eq!(report.outcome("vacuum.b"), Some(&EntityOutcome::UnknownEntity));
        assert_eq!(report.outcome("vacuum.z"), None);
        assert!(!report.is_success());
    }

    #[test]
    fn test_into_result_carries_report() {
        let err = failing_report().into_result().unwrap_err();
        let ReproduceError::PartialFailure {
            failed,
            total,
            ref first,
            ..
        } = err;

        assert_eq!((failed, total), (1, 3));
        assert_eq!(first, &ServiceError::CallFailed("jammed".to_string()));
        assert_eq!(err.report().len(), 3);
        assert!(err.to_string().contains("1 of 3"));
    }

    #[test]
    fn test_into_result_ok_without_failures() {
        let report = ReproduceReport::new(vec![(
            "vacuum.a".to_string(),
            EntityOutcome::InvalidState {
                state: "flying".to_string(),
            },
        )]);
        assert_eq!(report.clone().into_result().unwrap(), report);
    }
}
