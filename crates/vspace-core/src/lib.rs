#![deny(missing_docs)]
#![doc = "Core types, domain registry and error model for the vspace experiment engine."]

pub mod catalog;
pub mod domain;
pub mod errors;
pub mod insight;
pub mod rng;
pub mod serde;
mod types;

pub use catalog::{CatalogFile, CatalogRegistry};
pub use domain::{resolve_with, Domain, DomainRegistry, DomainSnapshot};
pub use errors::{EngineError, ErrorInfo};
pub use insight::Insight;
pub use rng::{derive_request_seed, derive_substream_seed, entropy_seed, RngHandle};
pub use types::{Bounds, Point, Variable, VariableCategory, VariableId, VariableSource};

/// Hard ceiling on sample counts, iteration counts and seed caps.
pub const MAX_POINTS: usize = 5000;

/// Validates a count against `[1, MAX_POINTS]`.
pub fn check_count(field: &str, value: usize) -> Result<(), EngineError> {
    if value == 0 || value > MAX_POINTS {
        return Err(EngineError::Validation(
            ErrorInfo::new(
                format!("{field}.range"),
                format!("{field} must lie in [1, {MAX_POINTS}]"),
            )
            .with_context(field, value.to_string()),
        ));
    }
    Ok(())
}
