//! # Build Step
//!
//! Publishes each sub-project with `dotnet publish`. The command mirrors what a developer
//! would type by hand:
//!
//! ```text
//! dotnet publish <descriptor> /p:PublishProfile=<profile> -c Release
//! ```
//!
//! The publish profile depends on the [`BuildMode`]; the output directory the profile
//! writes to is recorded on the [`BuildTarget`] so the stager knows where to pick it up.

use std::path::{Path, PathBuf};
use log::info;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::mode::BuildMode;
use crate::system::{run_checked, CommandSpec, SystemOps};

/// Program used to publish .NET projects.
pub const PUBLISH_TOOL: &str = "dotnet";

/// One buildable sub-project of the release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildTarget {
    /// Human-readable name, used in logs and state transitions.
    pub name: String,
    /// Path to the `.csproj` handed to `dotnet publish`.
    pub descriptor: PathBuf,
    /// Where the publish profile writes its output.
    pub output_dir: PathBuf,
    /// Subdirectory of the staging root the output is copied into.
    pub stage_dir: PathBuf,
    /// Skipped in self-contained mode (the auto-updater does not support it).
    #[serde(default)]
    pub framework_dependent_only: bool,
}

impl BuildTarget {
    /// Whether this target takes part in a run using `mode`.
    pub fn supports(&self, mode: BuildMode) -> bool {
        !(self.framework_dependent_only && mode.is_self_contained())
    }
}

/// Builds the `dotnet publish` invocation for `target`.
pub fn publish_command(target: &BuildTarget, mode: BuildMode, configuration: &str, cwd: &Path) -> CommandSpec {
    CommandSpec::new(PUBLISH_TOOL, cwd)
        .arg("publish")
        .arg(target.descriptor.to_string_lossy())
        .arg(format!("/p:PublishProfile={}", mode.publish_profile()))
        .args(["-c", configuration])
}

/// Publishes a single target, failing with the tool's exit code if it does not succeed.
pub fn run_build(
    system: &impl SystemOps,
    target: &BuildTarget,
    mode: BuildMode,
    configuration: &str,
    cwd: &Path,
) -> Result<()> {
    info!("Building {}...", target.name);
    run_checked(system, &publish_command(target, mode, configuration, cwd))?;
    info!("Finished building {}", target.name);
    Ok(())
}
