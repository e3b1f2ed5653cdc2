use std::collections::HashSet;
use std::sync::Mutex;
use lazy_static::lazy_static;
use log::{error, trace};

/// Workflow rules the release run must never break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invariant {
    /// No `dotnet publish` runs before the version was read.
    VersionBeforeBuild,
    /// A `.pdb` file never lands in the staging tree.
    NoDebugSymbolsStaged,
    /// The env file is only written after the archive exists.
    ArchiveBeforePublish,
}

impl Invariant {
    pub fn description(self) -> &'static str {
        match self {
            Invariant::VersionBeforeBuild => "Version must be extracted before any build step",
            Invariant::NoDebugSymbolsStaged => "Debug symbol files are never staged",
            Invariant::ArchiveBeforePublish => "Artifact must be archived before its name is published",
        }
    }

    pub fn component(self) -> &'static str {
        match self {
            Invariant::VersionBeforeBuild | Invariant::ArchiveBeforePublish => "Orchestrator",
            Invariant::NoDebugSymbolsStaged => "Stager",
        }
    }
}

lazy_static! {
    /// Invariants that have been asserted (and held) at least once in this process.
    static ref CHECKED_INVARIANTS: Mutex<HashSet<Invariant>> = Mutex::new(HashSet::new());
}

/// Asserts that a workflow invariant holds.
///
/// A violation panics in debug and test builds and is logged as critical in release builds.
/// When the condition holds, the invariant is recorded so [`contract_test`] can later prove it
/// was actually checked.
pub fn assert_invariant(condition: bool, invariant: Invariant) {
    if !condition {
        let msg = format!(
            "CRITICAL INVARIANT VIOLATION [{}]: {}",
            invariant.component(),
            invariant.description()
        );
        error!("{}", msg);

        if cfg!(debug_assertions) || cfg!(test) {
            panic!("{}", msg);
        }
    } else {
        trace!("Invariant held: {}", invariant.description());
        if let Ok(mut set) = CHECKED_INVARIANTS.lock() {
            set.insert(invariant);
        }
    }
}

/// Verifies that every invariant in `required` was asserted during execution.
///
/// # Panics
/// Panics listing the invariants nobody checked.
#[cfg(test)]
pub fn contract_test(context: &str, required: &[Invariant]) {
    let checked = CHECKED_INVARIANTS.lock().unwrap();
    let missing: Vec<&str> = required
        .iter()
        .filter(|inv| !checked.contains(inv))
        .map(|inv| inv.description())
        .collect();

    if !missing.is_empty() {
        panic!(
            "Contract Test Failed for '{}'. The following invariants were NOT checked:\n{:#?}",
            context, missing
        );
    }
}
