//! Merge policy between freshly generated artifacts and prior output.
//!
//! Decisions are made on structured [`ArtifactContent`] values and the
//! recorded fingerprints; nothing here touches the filesystem.

use crate::artifact::{Artifact, ArtifactContent};
use crate::state::{fingerprint, StateEntry};
use std::fmt;
use std::path::PathBuf;

/// Why an existing file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The generated region differs from what was last recorded.
    GeneratedRegionEdited,
    /// The file has no generated-region markers.
    MissingMarkers,
    /// The file exists but was never recorded, and its content differs.
    Untracked,
}

/// A file skipped because it was edited by hand inside the generated region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEditConflict {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub reason: ConflictReason,
}

/// What to do with one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// File does not exist; write everything.
    Create,
    /// Replace the generated region, keep the preserved one.
    Update,
    /// Nothing to write.
    Unchanged,
    /// File already matches; start tracking it without writing.
    Adopt,
    /// Leave the file alone and report.
    Conflict(ConflictReason),
}

/// A merge decision with the content to write, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergeDecision {
    pub action: MergeAction,
    /// Full content to write for `Create` and `Update`.
    pub content: Option<ArtifactContent>,
    /// State entry to record once the decision is applied.
    pub entry: Option<StateEntry>,
}

/// Decide how to bring `artifact` onto disk.
///
/// `existing` is the current file text, `recorded` the state entry from the
/// previous run.
pub(crate) fn decide(
    artifact: &Artifact,
    existing: Option<&str>,
    recorded: Option<&StateEntry>,
) -> MergeDecision {
    let fresh = &artifact.content;
    let fresh_fp = fingerprint(&fresh.generated);

    let Some(existing) = existing else {
        return MergeDecision {
            action: MergeAction::Create,
            content: Some(fresh.clone()),
            entry: Some(StateEntry::emitted(&fresh.generated)),
        };
    };

    let Some(on_disk) = ArtifactContent::parse(existing) else {
        return conflict(ConflictReason::MissingMarkers);
    };
    let disk_fp = fingerprint(&on_disk.generated);

    match recorded {
        Some(recorded) if recorded.disk == disk_fp => {
            if recorded.generated == fresh_fp {
                MergeDecision {
                    action: MergeAction::Unchanged,
                    content: None,
                    entry: Some(recorded.clone()),
                }
            } else {
                MergeDecision {
                    action: MergeAction::Update,
                    content: Some(fresh.with_preserved(&on_disk.preserved)),
                    entry: Some(StateEntry::emitted(&fresh.generated)),
                }
            }
        }
        _ if on_disk.generated == fresh.generated => MergeDecision {
            action: MergeAction::Adopt,
            content: None,
            entry: Some(StateEntry::emitted(&fresh.generated)),
        },
        Some(_) => conflict(ConflictReason::GeneratedRegionEdited),
        None => conflict(ConflictReason::Untracked),
    }
}

fn conflict(reason: ConflictReason) -> MergeDecision {
    MergeDecision {
        action: MergeAction::Conflict(reason),
        content: None,
        entry: None,
    }
}

impl MergeAction {
    /// Whether the action writes to disk.
    pub fn writes(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GeneratedRegionEdited => "generated region was edited by hand",
            Self::MissingMarkers => "generated region markers are missing",
            Self::Untracked => "file is not tracked and differs from generated output",
        })
    }
}

impl fmt::Display for ManualEditConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Unchanged => "unchanged",
            Self::Adopt => "adopt",
            Self::Conflict(_) => "conflict",
        })
    }
}
