//! Error types for the Terraform wrapper.

use thiserror::Error;

use crate::runner::CommandError;

/// Errors raised while driving Terraform.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TerraformError {
    /// Raised when the Terraform binary cannot be started.
    #[error(transparent)]
    Runner(#[from] CommandError),
    /// Raised when a Terraform subcommand exits unsuccessfully.
    #[error("terraform {subcommand} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Subcommand that failed (for example `apply`).
        subcommand: String,
        /// Exit status reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the process.
        stderr: String,
    },
    /// Raised when an output is `null` or empty.
    #[error("terraform output {name} is empty")]
    EmptyOutput {
        /// Output key that was requested.
        name: String,
    },
    /// Raised when `terraform output -json` prints something other than
    /// JSON.
    #[error("failed to parse terraform output {name}: {message}")]
    Parse {
        /// Output key that was requested.
        name: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when resources remain in state after a destroy.
    #[error("resources remain after destroy: {}", addresses.join(", "))]
    NotClean {
        /// Resource addresses still tracked in state.
        addresses: Vec<String>,
    },
}
