//! # Release Configuration
//!
//! Every path and knob the release run needs, gathered in one struct that is handed to the
//! orchestrator at construction. The defaults mirror the repository layout of JASM; a JSON
//! file passed with `--config` may override any field.
//!
//! Relative paths are interpreted against the repository root (`--root`), see
//! [`ReleaseConfig::rooted_at`].

use std::fs;
use std::path::{Component, Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use crate::builder::BuildTarget;
use crate::mode::BuildMode;

const MAIN_DESCRIPTOR: &str = "src/GIMI-ModManager.WinUI/GIMI-ModManager.WinUI.csproj";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Repository root. Set from the command line, never from the config file.
    #[serde(skip)]
    pub root: PathBuf,
    /// Packaging variant. Set from the command line, never from the config file.
    #[serde(skip)]
    pub mode: BuildMode,
    /// Descriptor holding `<VersionPrefix>`.
    pub version_descriptor: PathBuf,
    /// Targets in build order.
    pub targets: Vec<BuildTarget>,
    pub staging_root: PathBuf,
    pub readme: PathBuf,
    /// Copied into the staging root as `CHANGELOG.txt`.
    pub changelog: PathBuf,
    pub checksum_listing: PathBuf,
    /// 7-Zip `-mx` level, 0..=9.
    pub compression_level: u8,
    /// Variable naming the CI env file the artifact name is appended to.
    pub env_file_variable: String,
    pub build_configuration: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: BuildMode::default(),
            version_descriptor: PathBuf::from(MAIN_DESCRIPTOR),
            targets: default_targets(),
            staging_root: PathBuf::from("output"),
            readme: PathBuf::from("Build/README.txt"),
            changelog: PathBuf::from("CHANGELOG.md"),
            checksum_listing: PathBuf::from("SHA256SUMS.txt"),
            compression_level: 4,
            env_file_variable: "GITHUB_ENV".to_string(),
            build_configuration: "Release".to_string(),
        }
    }
}

/// Elevator, auto-updater and the main application, in the order they are built.
fn default_targets() -> Vec<BuildTarget> {
    vec![
        BuildTarget {
            name: "Elevator".to_string(),
            descriptor: PathBuf::from("src/Elevator/Elevator.csproj"),
            output_dir: PathBuf::from("src/Elevator/bin/Release/Publish"),
            stage_dir: PathBuf::from("JASM"),
            framework_dependent_only: false,
        },
        BuildTarget {
            name: "Updater".to_string(),
            descriptor: PathBuf::from("src/JASM.AutoUpdater/JASM.AutoUpdater.csproj"),
            output_dir: PathBuf::from("src/JASM.AutoUpdater/bin/Release/Publish"),
            // The application looks for its updater in this folder next to itself.
            stage_dir: PathBuf::from("JASM/JASM - Auto Updater"),
            framework_dependent_only: true,
        },
        BuildTarget {
            name: "Main".to_string(),
            descriptor: PathBuf::from(MAIN_DESCRIPTOR),
            output_dir: PathBuf::from("src/GIMI-ModManager.WinUI/bin/Release/Publish"),
            stage_dir: PathBuf::from("JASM"),
            framework_dependent_only: false,
        },
    ]
}

impl ReleaseConfig {
    /// Loads overrides from a JSON file. Fields absent from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: ReleaseConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            bail!("compression_level must be between 0 and 9, got {}", self.compression_level);
        }
        if self.targets.is_empty() {
            bail!("at least one build target is required");
        }
        if self.env_file_variable.trim().is_empty() {
            bail!("env_file_variable must not be empty");
        }
        for target in &self.targets {
            // Staged files are joined onto the staging root, so the stage dir must stay below it.
            let escapes = target
                .stage_dir
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                bail!(
                    "stage_dir of target {} must be a relative path inside the staging root, got {:?}",
                    target.name,
                    target.stage_dir
                );
            }
        }
        Ok(())
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolves every relative path against `root`. Absolute paths are left alone.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let join = |p: &Path| root.join(p);

        self.version_descriptor = join(&self.version_descriptor);
        self.staging_root = join(&self.staging_root);
        self.readme = join(&self.readme);
        self.changelog = join(&self.changelog);
        self.checksum_listing = join(&self.checksum_listing);
        for target in &mut self.targets {
            target.descriptor = join(&target.descriptor);
            target.output_dir = join(&target.output_dir);
        }
        self.root = root.to_path_buf();
        self
    }

    /// Targets taking part in this run, in build order.
    pub fn active_targets(&self) -> Vec<&BuildTarget> {
        self.targets.iter().filter(|t| t.supports(self.mode)).collect()
    }

    /// Where the archive lands: the repository root.
    pub fn artifact_path(&self, artifact: &str) -> PathBuf {
        self.root.join(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn defaults_build_three_targets_in_order() {
        let config = ReleaseConfig::default();
        let names: Vec<&str> = config.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Elevator", "Updater", "Main"]);
        assert_eq!(config.compression_level, 4);
        assert_eq!(config.env_file_variable, "GITHUB_ENV");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn self_contained_drops_the_updater() {
        let config = ReleaseConfig::default().with_mode(BuildMode::SelfContained);
        let names: Vec<&str> = config.active_targets().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Elevator", "Main"]);

        let config = ReleaseConfig::default();
        assert_eq!(config.active_targets().len(), 3);
    }

    #[test]
    fn rooted_at_resolves_relative_paths_only() {
        let mut config = ReleaseConfig::default();
        let absolute = std::env::temp_dir().join("readme.txt");
        config.readme = absolute.clone();

        let config = config.rooted_at(Path::new("/repo"));
        assert_eq!(config.staging_root, Path::new("/repo").join("output"));
        assert_eq!(config.readme, absolute);
        assert_eq!(config.targets[0].descriptor, Path::new("/repo").join("src/Elevator/Elevator.csproj"));
        // Stage directories stay relative to the staging root.
        assert_eq!(config.targets[0].stage_dir, PathBuf::from("JASM"));
        assert_eq!(config.artifact_path("JASM_v1.0.0.7z"), Path::new("/repo").join("JASM_v1.0.0.7z"));
    }

    #[test]
    fn load_merges_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "compression_level": 9, "staging_root": "dist" }}"#).unwrap();

        let config = ReleaseConfig::load(file.path()).unwrap();
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.staging_root, PathBuf::from("dist"));
        assert_eq!(config.targets, default_targets());
    }

    #[test]
    fn load_rejects_out_of_range_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "compression_level": 12 }}"#).unwrap();

        let err = ReleaseConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("compression_level"));
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "compresion_level": 3 }}"#).unwrap();
        assert!(ReleaseConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_reads_custom_targets() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "targets": [ {{ "name": "App", "descriptor": "App.csproj", "output_dir": "out", "stage_dir": "App" }} ] }}"#
        )
        .unwrap();

        let config = ReleaseConfig::load(file.path()).unwrap();
        assert_eq!(config.targets.len(), 1);
        assert!(!config.targets[0].framework_dependent_only);
    }

    #[rstest]
    #[case("../outside")]
    #[case("JASM/../../outside")]
    #[case("/tmp/outside")]
    fn load_rejects_stage_dir_outside_staging_root(#[case] stage_dir: &str) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let targets = serde_json::json!({
            "targets": [{ "name": "App", "descriptor": "App.csproj", "output_dir": "out", "stage_dir": stage_dir }]
        });
        write!(file, "{}", targets).unwrap();

        let err = ReleaseConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("stage_dir"), "{}", err);
    }

    #[test]
    fn default_stage_dirs_are_valid() {
        let config = ReleaseConfig::default();
        assert!(config.targets.iter().any(|t| t.stage_dir == Path::new("JASM/JASM - Auto Updater")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_rejects_empty_targets() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "targets": [] }}"#).unwrap();
        assert!(ReleaseConfig::load(file.path()).is_err());
    }
}
