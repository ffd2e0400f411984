//! Error types for run control, session storage and configuration.
//!
//! Store and configuration errors reach a person running the tool, so they
//! carry a user-facing message and an optional remediation hint.

use std::path::PathBuf;

use thiserror::Error;

/// Session store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file written but could not replace the target.
    #[error("failed to replace {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session data")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt session data in {path}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => format!("Could not {operation} {}", path.display()),
            Self::AtomicWriteFailed { target_path, .. } => format!(
                "Could not save the session to {}. Please check disk space and permissions.",
                target_path.display()
            ),
            Self::Serialization { .. } => "An error occurred while saving the session.".to_string(),
            Self::Corrupt { path, .. } => format!(
                "The session file {} could not be read. It may have been edited or truncated.",
                path.display()
            ),
            Self::Unavailable(reason) => format!("The session store is unavailable: {reason}"),
        }
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } | Self::AtomicWriteFailed { .. } => {
                Some("Check that the store directory exists and is writable.")
            }
            Self::Corrupt { .. } => Some("Delete the damaged file and run the validation again."),
            Self::Unavailable(_) => Some("Results are kept in memory until the store recovers."),
            Self::Serialization { .. } => None,
        }
    }
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Io { path, .. } => format!("Could not read the configuration file {}", path.display()),
            Self::Parse { path, source } => format!(
                "The configuration file {} is not valid TOML: {}",
                path.display(),
                source.message()
            ),
            Self::Invalid(reason) => format!("The configuration is invalid: {reason}"),
        }
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } => Some("Check the --config path or remove the flag to use defaults."),
            Self::Parse { .. } => Some("Compare the file against the sections [orchestrator] and [policy]."),
            Self::Invalid(_) => None,
        }
    }
}

/// Run control failure.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("run {0} already exists")]
    DuplicateRun(String),

    #[error("unknown run {0}")]
    UnknownRun(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
