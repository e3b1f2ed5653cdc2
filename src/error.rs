//! # Error Taxonomy
//!
//! Every failure of a release run ends up as one of these variants. None of them
//! are recoverable inside a run: the orchestrator stops at the first one and the
//! binary turns it into a process exit code via [`ReleaseError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by all release steps.
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Errors that abort a release run.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The project descriptor has no `<VersionPrefix>` line with a `X.Y.Z` version.
    #[error("failed to extract version number from {path}")]
    VersionNotFound {
        /// Descriptor that was scanned.
        path: PathBuf,
    },

    /// An external tool (`dotnet`, `7z`) exited with a non-zero code.
    #[error("{program} exited with code {code}")]
    ExternalCommandFailed {
        /// Program that was invoked.
        program: String,
        /// Exit code reported by the child, or 1 if it had none.
        code: i32,
    },

    /// The CI environment did not provide a file to export the artifact name to.
    #[error("environment variable {variable} is not set, nowhere to publish the artifact name")]
    MissingEnvTarget {
        /// Name of the variable that was expected to hold the env-file path.
        variable: String,
    },

    /// Copying build output into the staging tree failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of what could not be staged.
        reason: String,
    },

    /// Any other I/O failure (unreadable descriptor, unwritable env file, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReleaseError {
    /// The process exit code this failure maps to.
    ///
    /// External failures propagate the child's own code verbatim; everything
    /// raised internally exits with `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::ExternalCommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
