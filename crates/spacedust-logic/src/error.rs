//! Load-time error types.

use thiserror::Error;

/// A whole JSON document (settings, bodies, instruments, densities) could not
/// be loaded.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate entry {name}")]
    Duplicate { name: String },
}

/// One resource declaration could not be turned into bands.
///
/// These never abort a map load; the offending entry is logged and skipped.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("resource definition #{index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("resource definition #{index} has an empty `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("band {band} of {resource} at {body}: minAbundance {min} exceeds maxAbundance {max}")]
    AbundanceRange {
        resource: String,
        body: String,
        band: String,
        min: f64,
        max: f64,
    },
    #[error("band {band} of {resource} at {body}: `{field}` is not a finite number")]
    NonFinite {
        resource: String,
        body: String,
        band: String,
        field: &'static str,
    },
}
