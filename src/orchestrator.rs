//! # Release Orchestrator
//!
//! Runs the release workflow as one straight line:
//!
//! 1. Extract the version from the main project descriptor (`extract_version`).
//! 2. Publish every active target with `dotnet` (`run_build`).
//! 3. Copy the outputs and text files into the staging tree (`stage`).
//! 4. Compress the staging tree and append checksums (`archive`).
//! 5. Export the archive name to the CI env file (`publish_result`).
//!
//! The first failure aborts the run. Nothing is retried and nothing already written to disk
//! is cleaned up; a failed release is re-run from scratch.

use std::fmt;
use log::{debug, error, info};
use crate::archive;
use crate::builder;
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::invariant_ppt::{assert_invariant, Invariant};
use crate::mode::ArtifactName;
use crate::publish;
use crate::stager;
use crate::system::SystemOps;
use crate::version;

/// Where the run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseState {
    Init,
    VersionExtracted,
    /// The named target was published successfully.
    Built(String),
    Staged,
    Archived,
    Published,
    Done,
    /// Terminal failure, carrying the exit code of the run.
    Aborted(i32),
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseState::Built(target) => write!(f, "Built({})", target),
            ReleaseState::Aborted(code) => write!(f, "Aborted({})", code),
            other => write!(f, "{:?}", other),
        }
    }
}

pub struct ReleaseOrchestrator<S: SystemOps> {
    config: ReleaseConfig,
    system: S,
    state: ReleaseState,
    history: Vec<ReleaseState>,
}

impl<S: SystemOps> ReleaseOrchestrator<S> {
    pub fn new(config: ReleaseConfig, system: S) -> Self {
        Self {
            config,
            system,
            state: ReleaseState::Init,
            history: vec![ReleaseState::Init],
        }
    }

    pub fn state(&self) -> &ReleaseState {
        &self.state
    }

    /// Every state the run passed through, oldest first.
    pub fn history(&self) -> &[ReleaseState] {
        &self.history
    }

    #[cfg(test)]
    pub fn system(&self) -> &S {
        &self.system
    }

    /// Executes the whole workflow, ending in `Done` or `Aborted`.
    pub fn run(&mut self) -> Result<ArtifactName> {
        match self.execute() {
            Ok(artifact) => {
                self.transition(ReleaseState::Done);
                Ok(artifact)
            }
            Err(e) => {
                error!("Release aborted: {}", e);
                self.transition(ReleaseState::Aborted(e.exit_code()));
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<ArtifactName> {
        info!("Packaging {} release from {:?}", self.config.mode, self.config.root);

        let version = version::extract_version(&self.config.version_descriptor)?;
        let artifact = ArtifactName::new(&version, self.config.mode);
        info!("Version {} -> {}", version, artifact);
        self.transition(ReleaseState::VersionExtracted);

        // Borrowing targets from a copy leaves `self` free for `transition`.
        let config = self.config.clone();
        let targets = config.active_targets();
        for target in &targets {
            let version_known = matches!(
                self.state,
                ReleaseState::VersionExtracted | ReleaseState::Built(_)
            );
            assert_invariant(version_known, Invariant::VersionBeforeBuild);

            builder::run_build(&self.system, target, config.mode, &config.build_configuration, &config.root)?;
            self.transition(ReleaseState::Built(target.name.clone()));
        }

        let tree = stager::stage(&targets, &config.staging_root, &config.readme, &config.changelog)?;
        info!("Staged {} files into {:?}", tree.files.len(), tree.root);
        self.transition(ReleaseState::Staged);

        let artifact_path = config.artifact_path(artifact.as_str());
        archive::archive(
            &self.system,
            &tree,
            &artifact_path,
            &config.checksum_listing,
            config.compression_level,
            &config.root,
        )?;
        self.transition(ReleaseState::Archived);

        self.publish(&artifact)?;
        Ok(artifact)
    }

    /// Exports the artifact name to the CI env file. Only valid straight after archiving.
    fn publish(&mut self, artifact: &ArtifactName) -> Result<()> {
        assert_invariant(self.state == ReleaseState::Archived, Invariant::ArchiveBeforePublish);

        let env_file = publish::resolve_env_file(&self.system, &self.config.env_file_variable)?;
        publish::publish_result(artifact, &env_file)?;
        self.transition(ReleaseState::Published);
        Ok(())
    }

    fn transition(&mut self, next: ReleaseState) {
        debug!("State {} -> {}", self.state, next);
        self.history.push(next.clone());
        self.state = next;
    }
}
