use std::path::PathBuf;

use solace_turn::ControllerError;
use thiserror::Error;

/// Errors that stop the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading stdin or writing stdout failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file was not valid JSON for [`SolaceConfig`](crate::SolaceConfig).
    #[error("invalid config {path}: {source}")]
    Config {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Bad command-line arguments.
    #[error("{0}")]
    Args(String),

    /// The controller rejected the message.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// A one-shot turn ended without a committed reply.
    #[error("turn ended without a reply")]
    NoReply,

    /// The background turn task panicked or was aborted.
    #[error("turn task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
