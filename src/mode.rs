//! # Build Modes and Artifact Naming
//!
//! A release is packaged either framework-dependent (the default, expects the .NET runtime
//! on the user's machine and ships the auto-updater) or self-contained (bundles the runtime,
//! no auto-updater). The mode picks the publish profile and prefixes the archive name.

use std::fmt;
use crate::version::Version;

/// The packaging variant, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    FrameworkDependent,
    SelfContained,
}

impl BuildMode {
    /// The only invocation argument that selects [`BuildMode::SelfContained`].
    pub const SELF_CONTAINED_ARG: &'static str = "SelfContained";

    /// Interprets the optional first positional argument.
    ///
    /// Matching is exact; anything else (including absence) means framework-dependent.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some(Self::SELF_CONTAINED_ARG) => BuildMode::SelfContained,
            _ => BuildMode::FrameworkDependent,
        }
    }

    /// Publish profile handed to `dotnet publish`.
    pub fn publish_profile(self) -> &'static str {
        match self {
            BuildMode::FrameworkDependent => "FolderProfile.pubxml",
            BuildMode::SelfContained => "SelfContainedProfile.pubxml",
        }
    }

    pub fn is_self_contained(self) -> bool {
        self == BuildMode::SelfContained
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::FrameworkDependent => f.write_str("framework-dependent"),
            BuildMode::SelfContained => f.write_str("self-contained"),
        }
    }
}

/// File name of the release archive, `[SelfContained_]JASM_v<version>.7z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(version: &Version, mode: BuildMode) -> Self {
        let prefix = if mode.is_self_contained() { "SelfContained_" } else { "" };
        Self(format!("{}JASM_v{}.7z", prefix, version.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::parse_version;
    use proptest::prelude::*;
    use rstest::rstest;

    fn version(v: &str) -> Version {
        parse_version(&format!("<VersionPrefix>{}</VersionPrefix>", v)).unwrap()
    }

    #[rstest]
    #[case(None, BuildMode::FrameworkDependent)]
    #[case(Some("SelfContained"), BuildMode::SelfContained)]
    #[case(Some("selfcontained"), BuildMode::FrameworkDependent)]
    #[case(Some("SelfContained "), BuildMode::FrameworkDependent)]
    #[case(Some("Release"), BuildMode::FrameworkDependent)]
    #[case(Some(""), BuildMode::FrameworkDependent)]
    fn mode_from_argument(#[case] arg: Option<&str>, #[case] expected: BuildMode) {
        assert_eq!(BuildMode::from_arg(arg), expected);
    }

    #[test]
    fn modes_use_distinct_publish_profiles() {
        assert_eq!(BuildMode::FrameworkDependent.publish_profile(), "FolderProfile.pubxml");
        assert_ne!(
            BuildMode::FrameworkDependent.publish_profile(),
            BuildMode::SelfContained.publish_profile()
        );
    }

    #[test]
    fn scenario_artifact_names() {
        let v = version("3.4.0");
        assert_eq!(ArtifactName::new(&v, BuildMode::FrameworkDependent).as_str(), "JASM_v3.4.0.7z");
        assert_eq!(ArtifactName::new(&v, BuildMode::SelfContained).as_str(), "SelfContained_JASM_v3.4.0.7z");
    }

    proptest! {
        #[test]
        fn artifact_name_is_derived_from_version_and_mode(
            major in 0u32..10_000,
            minor in 0u32..10_000,
            patch in 0u32..10_000,
        ) {
            let raw = format!("{}.{}.{}", major, minor, patch);
            let v = version(&raw);

            let default_name = ArtifactName::new(&v, BuildMode::FrameworkDependent);
            prop_assert_eq!(default_name.to_string(), format!("JASM_v{}.7z", raw));

            let sc_name = ArtifactName::new(&v, BuildMode::SelfContained);
            prop_assert_eq!(sc_name.to_string(), format!("SelfContained_JASM_v{}.7z", raw));
        }
    }
}
