//! Crate-wide error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed DAG file: {0}")]
    InputFormat(String),

    #[error("Cycle detected in task graph")]
    CycleDetected,

    #[error("No ready task available before all tasks were placed")]
    ConstructionStuck,
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
