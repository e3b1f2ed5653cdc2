//! # JASM Release: The Main Entry Point
//!
//! This module handles Command Line Interface (CLI) parsing, logging initialization,
//! and hands the run over to the [`orchestrator`]. Its only job after that is turning the
//! outcome into a process exit code for the calling CI job.
//!
//! ```text
//! jasm-release                  # framework-dependent build + auto updater
//! jasm-release SelfContained    # self-contained build, no auto updater
//! ```

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use simplelog::{Config, SimpleLogger};

mod archive;
mod builder;
mod config;
mod error;
mod invariant_ppt;
mod mode;
mod orchestrator;
mod publish;
mod stager;
mod system;
mod version;

use config::ReleaseConfig;
use mode::BuildMode;
use orchestrator::ReleaseOrchestrator;
use system::HostSystem;

/// The primary Command Line Interface (CLI) configuration.
#[derive(Parser, Debug)]
#[command(name = "jasm-release")]
#[command(about = "Builds, stages and archives a JASM release", long_about = None)]
struct Cli {
    /// Packaging mode.
    ///
    /// `SelfContained` bundles the .NET runtime and leaves out the auto updater.
    /// Any other value, or none, builds the framework-dependent release.
    mode: Option<String>,

    /// Repository root all relative paths are resolved against.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON file overriding the default release configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Turn on verbose logging.
    ///
    /// - `-v`: Debug
    /// - `-vv`: Trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // Logging failure shouldn't stop a release.
    let _ = SimpleLogger::init(log_level, Config::default());

    std::process::exit(run(&cli));
}

/// Runs the release and returns the process exit code.
fn run(cli: &Cli) -> i32 {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let mut orchestrator = ReleaseOrchestrator::new(config, HostSystem);
    let outcome = orchestrator.run();
    debug!(
        "Release path: {}",
        orchestrator
            .history()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    match outcome {
        Ok(artifact) => {
            info!("Release {} is ready", artifact);
            0
        }
        Err(e) => {
            error!("{} ({})", e, orchestrator.state());
            e.exit_code()
        }
    }
}

/// Builds the effective configuration: defaults, then the optional file, then the CLI.
fn load_config(cli: &Cli) -> Result<ReleaseConfig> {
    let base = match &cli.config {
        Some(path) => ReleaseConfig::load(path)?,
        None => ReleaseConfig::default(),
    };

    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("Failed to resolve repository root {:?}", cli.root))?;
    info!("Release root: {:?}", root);

    let mode = BuildMode::from_arg(cli.mode.as_deref());
    Ok(base.with_mode(mode).rooted_at(&root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_framework_dependent() {
        let cli = Cli::try_parse_from(["jasm-release"]).unwrap();
        assert_eq!(cli.mode, None);
        assert_eq!(cli.verbose, 0);

        let config = load_config(&cli).unwrap();
        assert_eq!(config.mode, BuildMode::FrameworkDependent);
        assert!(config.root.is_absolute());
        assert!(config.staging_root.ends_with("output"));
    }

    #[test]
    fn positional_self_contained() {
        let cli = Cli::try_parse_from(["jasm-release", "SelfContained", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(load_config(&cli).unwrap().mode, BuildMode::SelfContained);
    }

    #[test]
    fn unknown_mode_falls_back_to_default() {
        let cli = Cli::try_parse_from(["jasm-release", "Portable"]).unwrap();
        assert_eq!(load_config(&cli).unwrap().mode, BuildMode::FrameworkDependent);
    }

    #[test]
    fn root_and_config_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("release.json");
        std::fs::write(&config_file, r#"{ "staging_root": "dist" }"#).unwrap();

        let args: Vec<std::ffi::OsString> = vec![
            "jasm-release".into(),
            "--root".into(),
            dir.path().into(),
            "--config".into(),
            config_file.as_path().into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.staging_root, dir.path().join("dist"));
    }

    #[test]
    fn unreadable_config_exits_with_one() {
        let cli = Cli::try_parse_from(["jasm-release", "--config", "/definitely/not/here.json"]).unwrap();
        assert!(load_config(&cli).is_err());
        assert_eq!(run(&cli), 1);
    }
}
