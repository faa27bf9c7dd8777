//! Error types for the gitops provider.
//!
//! Uses thiserror for derive macros. Every failure aborts the operation that
//! raised it; nothing is retried.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// User provided invalid arguments or an unreadable plan/state file.
    #[error("{0}")]
    UserError(String),

    /// Required combination of fields missing or invalid. Raised before any
    /// subprocess is started and before any lock is taken.
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// The executable could not be found or started.
    #[error("failed to start command: {0}")]
    StartError(String),

    /// The subprocess exited with a non-zero status.
    #[error("command failed: {0}")]
    ExecutionError(String),

    /// Reading stdout or stderr of the subprocess failed mid-stream.
    #[error("failed to process command output stream: {0}")]
    StreamError(String),

    /// The result file or buffer was missing or not valid JSON.
    #[error("failed to parse command result: {0}")]
    ParseError(String),

    /// Preparing local files (values, certificates, sealed secrets) failed.
    #[error("file operation failed: {0}")]
    IoError(String),

    /// One or more operations of a plan failed.
    #[error("{0}")]
    OperationsFailed(String),
}

impl ProviderError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProviderError::UserError(_) => exit_codes::USER_ERROR,
            ProviderError::ConfigError(_) => exit_codes::CONFIG_FAILURE,
            ProviderError::StartError(_)
            | ProviderError::ExecutionError(_)
            | ProviderError::StreamError(_) => exit_codes::SUBPROCESS_FAILURE,
            ProviderError::ParseError(_) => exit_codes::OUTPUT_FAILURE,
            ProviderError::IoError(_) => exit_codes::USER_ERROR,
            ProviderError::OperationsFailed(_) => exit_codes::OPERATION_FAILURE,
        }
    }

    /// Short summary used as the diagnostic headline.
    pub fn summary(&self) -> &'static str {
        match self {
            ProviderError::UserError(_) => "Invalid input",
            ProviderError::ConfigError(_) => "Invalid resource configuration",
            ProviderError::StartError(_) => "Unable to start gitops command",
            ProviderError::ExecutionError(_) => "Gitops command failed",
            ProviderError::StreamError(_) => "Unable to read gitops command output",
            ProviderError::ParseError(_) => "Unable to parse gitops command result",
            ProviderError::IoError(_) => "Unable to prepare local files",
            ProviderError::OperationsFailed(_) => "Plan failed",
        }
    }
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
