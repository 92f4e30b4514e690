//! Error types for state reproduction

use ha_service_registry::ServiceError;
use thiserror::Error;

use crate::ReproduceReport;

/// Result type for batch reproduction
pub type ReproduceResult<T> = Result<T, ReproduceError>;

/// Errors surfaced by a reproduction batch
///
/// Unknown entities, invalid states and unsupported domains are not errors;
/// they show up as outcomes in the report.
#[derive(Debug, Error)]
pub enum ReproduceError {
    /// At least one entity hit a failing service call
    ///
    /// The report still holds the outcome of every entity in the batch.
    #[error("failed to reproduce {failed} of {total} states: {first}")]
    PartialFailure {
        failed: usize,
        total: usize,
        first: ServiceError,
        report: ReproduceReport,
    },
}

impl ReproduceError {
    /// Per-entity outcomes of the failed batch
    pub fn report(&self) -> &ReproduceReport {
        match self {
            Self::PartialFailure { report, .. } => report,
        }
    }
}
