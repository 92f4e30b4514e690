//! State reproduction for Home Assistant
//!
//! Reproducing a state means comparing a desired snapshot of an entity with
//! its live state and issuing the service calls that close the gap. Scenes
//! use this to restore a set of entities at once.
//!
//! Every snapshot is handled by its own future and all futures are joined, so
//! one entity's failure never stops another entity from converging. Within a
//! single entity the service calls are awaited one after the other.
//!
//! Integrations plug in through [`ReproducePlatform`]; [`StateReproducer`]
//! routes each snapshot to the platform registered for its domain.

mod dispatch;
mod error;
mod lookup;
#[cfg(any(test, feature = "test-util"))]
mod mock;
mod options;
mod platform;
mod report;
mod reproducer;

pub use dispatch::ServiceDispatcher;
pub use error::{ReproduceError, ReproduceResult};
pub use lookup::StateLookup;
#[cfg(any(test, feature = "test-util"))]
pub use mock::RecordingDispatcher;
pub use options::ReproduceOptions;
pub use platform::{reproduce_each, ReproduceCall, ReproducePlatform};
pub use report::{EntityOutcome, ReproduceReport};
pub use reproducer::StateReproducer;
