// Errors surfaced by dashboard use cases
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to fetch variables: {0}")]
    FetchFailure(String),

    #[error("variable detection failed: {0}")]
    DetectFailure(String),

    #[error("invalid update rate {input:?}: expected an integer between {min} and {max} ms")]
    InvalidRate { input: String, min: u32, max: u32 },

    #[error("unknown variable: {0}")]
    UnknownVariable(String),
}
