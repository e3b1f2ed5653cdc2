//! # Archive Step
//!
//! Compresses the staging tree with 7-Zip into a single `.7z` file at the repository root,
//! then adds a SHA-256 listing of everything that was staged so downloads can be verified.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use log::{debug, info};
use sha2::{Digest, Sha256};
use crate::error::Result;
use crate::stager::StagingTree;
use crate::system::{run_checked, CommandSpec, SystemOps};

/// Program used to create the archive.
pub const ARCHIVER: &str = "7z";

/// `7z a -mx<level> <artifact> <staging_root>/*`
///
/// The wildcard is expanded by 7-Zip itself, so the staging root's contents end up at the
/// top of the archive rather than nested under the staging directory name.
pub fn archive_command(staging_root: &Path, artifact: &Path, level: u8, cwd: &Path) -> CommandSpec {
    CommandSpec::new(ARCHIVER, cwd)
        .arg("a")
        .arg(format!("-mx{}", level))
        .arg(artifact.to_string_lossy())
        .arg(staging_root.join("*").to_string_lossy())
}

/// Adds a single file to an existing archive.
pub fn append_command(artifact: &Path, file: &Path, level: u8, cwd: &Path) -> CommandSpec {
    CommandSpec::new(ARCHIVER, cwd)
        .arg("a")
        .arg(format!("-mx{}", level))
        .arg(artifact.to_string_lossy())
        .arg(file.to_string_lossy())
}

/// Compresses the staging tree into `artifact`, then appends the checksum listing.
///
/// The listing is added in both build modes.
pub fn archive(
    system: &impl SystemOps,
    tree: &StagingTree,
    artifact: &Path,
    listing: &Path,
    level: u8,
    cwd: &Path,
) -> Result<()> {
    info!("Zipping release directory...");
    run_checked(system, &archive_command(&tree.root, artifact, level, cwd))?;
    info!("Finished zipping release directory");

    let count = write_checksum_listing(tree, listing)?;
    info!("Adding checksums of {} files to {:?}", count, artifact);
    run_checked(system, &append_command(artifact, listing, level, cwd))?;
    Ok(())
}

/// Writes `<sha256>  <relative/path>` for every file staged by this run, sorted by path.
///
/// Only `tree.files` is listed. Leftovers from earlier runs that still sit under the staging
/// root are not. Paths always use `/` so the listing reads the same on every platform.
/// Returns the number of entries written.
pub fn write_checksum_listing(tree: &StagingTree, listing: &Path) -> Result<usize> {
    let mut entries = Vec::with_capacity(tree.files.len());
    for relative in &tree.files {
        entries.push((listing_path(relative), sha256_file(&tree.root.join(relative))?));
    }
    // BTreeSet<PathBuf> orders by component, the listing orders by the rendered string.
    entries.sort();

    let mut out = File::create(listing)?;
    for (path, digest) in &entries {
        writeln!(out, "{}  {}", digest, path)?;
    }
    debug!("Wrote {} checksums to {:?}", entries.len(), listing);
    Ok(entries.len())
}

fn listing_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
