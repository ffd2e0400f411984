use thiserror::Error;

use crate::session::RunStatus;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("run session {run_id} cannot move from {from} to {to}")]
    InvalidTransition {
        run_id: String,
        from: RunStatus,
        to: RunStatus,
    },
    #[error("unknown canonical field: {0}")]
    UnknownField(String),
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
