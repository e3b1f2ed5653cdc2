//! # Stager
//!
//! Assembles the release directory exactly as it will appear inside the archive:
//!
//! ```text
//! output/
//! ├── README.txt
//! ├── CHANGELOG.txt
//! └── JASM/                     <- Elevator + main application
//!     └── JASM - Auto Updater/  <- framework-dependent only
//! ```
//!
//! Staging never deletes anything. Directories are created if missing and files are
//! overwritten, so re-running on a dirty tree is safe.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info};
use walkdir::WalkDir;
use crate::builder::BuildTarget;
use crate::error::{ReleaseError, Result};
use crate::invariant_ppt::{assert_invariant, Invariant};

/// Extension of the debug-symbol files that are kept out of releases.
pub const DEBUG_SYMBOL_EXTENSION: &str = "pdb";

/// The populated staging directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingTree {
    pub root: PathBuf,
    /// Every file copied during this run, relative to `root`.
    pub files: BTreeSet<PathBuf>,
}

impl StagingTree {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            files: BTreeSet::new(),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, relative: impl AsRef<Path>) -> bool {
        self.files.contains(relative.as_ref())
    }

    fn copy_file(&mut self, src: &Path, relative: &Path) -> Result<()> {
        assert_invariant(!is_debug_symbol(relative), Invariant::NoDebugSymbolsStaged);

        let dest = self.root.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, &dest).map_err(|e| ReleaseError::StagingFailed {
            reason: format!("failed to copy {:?} to {:?}: {}", src, dest, e),
        })?;
        self.files.insert(relative.to_path_buf());
        Ok(())
    }
}

/// Returns `true` for `.pdb` files, whatever the case of the extension.
pub fn is_debug_symbol(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(DEBUG_SYMBOL_EXTENSION))
        .unwrap_or(false)
}

/// Copies every target's publish output plus the readme and changelog into `staging_root`.
///
/// The changelog is renamed to `CHANGELOG.txt` so it opens with a double click on Windows.
///
/// # Errors
/// [`ReleaseError::StagingFailed`] if a target's output directory is missing or a copy fails.
pub fn stage(targets: &[&BuildTarget], staging_root: &Path, readme: &Path, changelog: &Path) -> Result<StagingTree> {
    fs::create_dir_all(staging_root)?;
    let mut tree = StagingTree::new(staging_root);

    for target in targets {
        info!("Copying {} to release directory...", target.name);
        let copied = copy_tree(&target.output_dir, &target.stage_dir, &mut tree)?;
        info!("Finished copying {} ({} files)", target.name, copied);
    }

    info!("Copying text files to release directory...");
    tree.copy_file(readme, Path::new("README.txt"))?;
    tree.copy_file(changelog, Path::new("CHANGELOG.txt"))?;

    Ok(tree)
}

/// Recursively copies `src` into `tree.root/stage_dir`, skipping debug symbols.
fn copy_tree(src: &Path, stage_dir: &Path, tree: &mut StagingTree) -> Result<usize> {
    if !src.is_dir() {
        return Err(ReleaseError::StagingFailed {
            reason: format!("publish output {:?} does not exist", src),
        });
    }
    // Created up front so a target that publishes nothing still gets its folder.
    fs::create_dir_all(tree.root.join(stage_dir))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ReleaseError::StagingFailed {
            reason: format!("failed to walk {:?}: {}", src, e),
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ReleaseError::StagingFailed { reason: e.to_string() })?;
        let staged = stage_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(tree.root.join(&staged))?;
        } else if is_debug_symbol(entry.path()) {
            debug!("Skipping debug symbols {:?}", entry.path());
        } else {
            tree.copy_file(entry.path(), &staged)?;
            copied += 1;
        }
    }
    Ok(copied)
}
