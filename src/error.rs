//! Error types shared by the genetic engine and its collaborators.

use crate::heuristics::genetic::State;

/// Errors raised while building or evolving a population.
#[derive(Debug, thiserror::Error)]
pub enum GaError {
    #[error("Resource exhausted: cannot allocate {requested} entries for {what}")]
    ResourceExhausted { what: &'static str, requested: String },
    #[error("Population too small: need at least {required} members, found {actual}")]
    PopulationTooSmall { required: usize, actual: usize },
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Illegal state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: State, to: State },
    #[error("Missing state data: {0}")]
    MissingStateData(&'static str),
    #[error("Instance error: {0}")]
    Instance(String),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("JsonError: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CsvError: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, GaError>;
