#[cfg(test)]
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use log::{debug, error};
use crate::error::{ReleaseError, Result};

/// A structured external command: program, argument list and working directory.
///
/// Arguments are passed to the child verbatim, no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Abstraction for the outside world the release run touches (child processes, environment).
/// This allows us to replace `dotnet` and `7z` with a scripted mock for testing.
pub trait SystemOps {
    /// Run a command to completion with inherited stdio.
    ///
    /// Returns the child's exit code, `None` if it ended without one (killed by a signal).
    /// Spawn failures are returned as I/O errors.
    fn run_command(&self, command: &CommandSpec) -> std::io::Result<Option<i32>>;

    /// Read an environment variable of the invoking process.
    fn env_var(&self, key: &str) -> Option<String>;
}

/// Runs `command` and turns anything but a zero exit into [`ReleaseError::ExternalCommandFailed`].
pub fn run_checked(system: &impl SystemOps, command: &CommandSpec) -> Result<()> {
    debug!("Running: {} (in {:?})", command, command.cwd);
    let code = match system.run_command(command) {
        Ok(Some(code)) => code,
        // Killed by a signal: there is no code to hand back, so report a generic failure.
        Ok(None) => {
            error!("{} terminated without an exit code", command.program);
            1
        }
        Err(e) => {
            error!("Failed to execute {}: {}", command.program, e);
            1
        }
    };

    if code != 0 {
        error!("Exit code: {}", code);
        return Err(ReleaseError::ExternalCommandFailed {
            program: command.program.clone(),
            code,
        });
    }
    Ok(())
}

/// The real host implementation (Production).
pub struct HostSystem;

impl SystemOps for HostSystem {
    fn run_command(&self, command: &CommandSpec) -> std::io::Result<Option<i32>> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.cwd)
            .status()?;
        Ok(status.code())
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A Mock System for Testing.
///
/// Records every command it is asked to run. A command whose rendered form contains
/// one of the `failures` needles returns that needle's exit code, everything else succeeds.
/// Needles are checked in the order they were registered and the first match wins.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockSystem {
    pub invocations: std::sync::Mutex<Vec<CommandSpec>>,
    pub failures: std::sync::Mutex<Vec<(String, i32)>>,
    pub env: std::sync::Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(key: &str, value: &str) -> Self {
        let mut env = HashMap::new();
        env.insert(key.to_string(), value.to_string());
        Self {
            env: std::sync::Mutex::new(env),
            ..Default::default()
        }
    }

    /// Make any command containing `needle` exit with `code`.
    pub fn fail_when(self, needle: &str, code: i32) -> Self {
        self.failures.lock().unwrap().push((needle.to_string(), code));
        self
    }

    pub fn rendered_invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
impl SystemOps for MockSystem {
    fn run_command(&self, command: &CommandSpec) -> std::io::Result<Option<i32>> {
        let rendered = command.to_string();
        self.invocations.lock().unwrap().push(command.clone());

        let failures = self.failures.lock().unwrap();
        let code = failures
            .iter()
            .find(|(needle, _)| rendered.contains(needle.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        Ok(Some(code))
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env.lock().unwrap().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnspawnableSystem;

    impl SystemOps for UnspawnableSystem {
        fn run_command(&self, _command: &CommandSpec) -> std::io::Result<Option<i32>> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"))
        }

        fn env_var(&self, _key: &str) -> Option<String> {
            None
        }
    }

    struct SignalledSystem;

    impl SystemOps for SignalledSystem {
        fn run_command(&self, _command: &CommandSpec) -> std::io::Result<Option<i32>> {
            Ok(None)
        }

        fn env_var(&self, _key: &str) -> Option<String> {
            None
        }
    }

    fn publish_spec() -> CommandSpec {
        CommandSpec::new("dotnet", Path::new("/repo"))
            .arg("publish")
            .args(["app.csproj", "-c", "Release"])
    }

    #[test]
    fn command_spec_renders_program_and_args() {
        assert_eq!(publish_spec().to_string(), "dotnet publish app.csproj -c Release");
        assert_eq!(publish_spec().cwd, PathBuf::from("/repo"));
    }

    #[test]
    fn run_checked_passes_on_zero_exit() {
        let system = MockSystem::new();
        assert!(run_checked(&system, &publish_spec()).is_ok());
        assert_eq!(system.invocations.lock().unwrap().len(), 1);
    }

    #[test]
    fn run_checked_propagates_child_code() {
        let system = MockSystem::new().fail_when("app.csproj", 42);
        let err = run_checked(&system, &publish_spec()).unwrap_err();
        assert_eq!(err.exit_code(), 42);
        assert!(matches!(err, ReleaseError::ExternalCommandFailed { ref program, .. } if program == "dotnet"));
    }

    #[test]
    fn spawn_failure_is_an_external_failure_with_code_one() {
        let err = run_checked(&UnspawnableSystem, &publish_spec()).unwrap_err();
        assert!(matches!(err, ReleaseError::ExternalCommandFailed { code: 1, .. }));
    }

    #[test]
    fn missing_exit_code_is_an_external_failure_with_code_one() {
        let err = run_checked(&SignalledSystem, &publish_spec()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn first_registered_failure_wins() {
        let system = MockSystem::new()
            .fail_when("dotnet", 7)
            .fail_when("app.csproj", 42);
        for _ in 0..8 {
            assert_eq!(run_checked(&system, &publish_spec()).unwrap_err().exit_code(), 7);
        }
    }

    #[test]
    fn mock_env_lookup() {
        let system = MockSystem::with_env("GITHUB_ENV", "/tmp/env");
        assert_eq!(system.env_var("GITHUB_ENV").as_deref(), Some("/tmp/env"));
        assert_eq!(system.env_var("OTHER"), None);
    }
}
