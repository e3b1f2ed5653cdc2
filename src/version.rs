//! # Version Extraction
//!
//! The release is named after the version of the main application, which lives in its
//! project descriptor as `<VersionPrefix>X.Y.Z</VersionPrefix>`. This runs before anything
//! else: without a version there is nothing to name the archive after.

use std::fmt;
use std::fs;
use std::path::Path;
use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use crate::error::{ReleaseError, Result};

/// Marker opening the version line in the descriptor.
pub const VERSION_MARKER: &str = "<VersionPrefix>";

lazy_static! {
    static ref VERSION_PATTERN: Regex = Regex::new(r"\d+\.\d+\.\d+").unwrap();
}

/// A three-part `MAJOR.MINOR.PATCH` version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads the descriptor at `path` and extracts the application version.
///
/// # Errors
/// * [`ReleaseError::VersionNotFound`] if no usable `<VersionPrefix>` line exists.
/// * [`ReleaseError::Io`] if the descriptor cannot be read.
pub fn extract_version(path: &Path) -> Result<Version> {
    let contents = fs::read_to_string(path).map_err(|e| {
        error!("Failed to read {:?}: {}", path, e);
        e
    })?;

    match parse_version(&contents) {
        Some(version) => {
            debug!("Found version {} in {:?}", version, path);
            Ok(version)
        }
        None => {
            error!("Failed to extract version number from {:?}", path);
            Err(ReleaseError::VersionNotFound {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Finds the first line starting with [`VERSION_MARKER`] and returns the first `X.Y.Z`
/// on it.
///
/// Only that first marker line is considered; if it holds no version the result is
/// `None`, later marker lines are not consulted.
pub fn parse_version(contents: &str) -> Option<Version> {
    // Descriptors are indented XML.
    let line = contents
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(VERSION_MARKER))?;

    VERSION_PATTERN
        .find(line)
        .map(|m| Version(m.as_str().to_string()))
}
