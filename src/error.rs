//! Error types for scheduling runs.
//!
//! Only structurally invalid requests fail. Partial infeasibility and
//! budget exhaustion are reported on the returned
//! [`Schedule`](crate::models::Schedule) instead.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors produced by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Malformed jobs, machines, or constraints (including precedence cycles).
    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),
    /// Run configuration out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A commit carried a version not above the latest committed one.
    #[error("stale schedule version {got}: latest committed is {latest}")]
    StaleVersion {
        /// Latest committed version.
        latest: u64,
        /// Version of the rejected schedule.
        got: u64,
    },
    /// Snapshot store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl SchedulerError {
    /// Validation errors carried by an `InvalidInput` failure.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            SchedulerError::InvalidInput(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
