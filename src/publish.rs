//! # Publishing the Result
//!
//! The release run reports the archive it produced back to CI by appending
//! `zipFile=<archive>` to the env file whose path the CI system exposes in an environment
//! variable (`GITHUB_ENV` on GitHub Actions). Later workflow steps read `zipFile` to upload
//! the archive.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use log::{error, info};
use crate::error::{ReleaseError, Result};
use crate::mode::ArtifactName;
use crate::system::SystemOps;

/// Key the artifact name is exported under.
pub const ARTIFACT_KEY: &str = "zipFile";

/// Looks up the env-file path in `variable`. Unset and empty are both fatal.
pub fn resolve_env_file(system: &impl SystemOps, variable: &str) -> Result<PathBuf> {
    match system.env_var(variable) {
        Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => {
            error!("{} is not set, cannot publish the artifact name", variable);
            Err(ReleaseError::MissingEnvTarget {
                variable: variable.to_string(),
            })
        }
    }
}

/// Appends `zipFile=<artifact>` to `env_file`, creating the file if needed.
pub fn publish_result(artifact: &ArtifactName, env_file: &Path) -> Result<()> {
    // Earlier workflow steps write to the same file, so never truncate it.
    let mut file = OpenOptions::new().create(true).append(true).open(env_file)?;
    writeln!(file, "{}={}", ARTIFACT_KEY, artifact)?;
    info!("Exported {}={} to {:?}", ARTIFACT_KEY, artifact, env_file);
    Ok(())
}
