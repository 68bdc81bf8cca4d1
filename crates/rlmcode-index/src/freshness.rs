//! Commit-based staleness detection.
//!
//! The store remembers the commit the index was last built at. The next run
//! diffs that commit against the current head to find the files that need
//! re-extraction.

use crate::discover::DiscoveredFile;
use rlmcode_core::{ChangeSet, DiffStatus, VersionControl};
use std::collections::HashSet;

/// Metadata key holding the last indexed commit id.
pub const LAST_INDEXED_COMMIT: &str = "last_indexed_commit";

/// Work needed to bring the index up to date.
///
/// A full reindex is returned when no commit was recorded, when `force` is
/// set, when the current head is unknown, or when the diff cannot be
/// computed. Otherwise:
///
/// - modified files are `changed`; those not yet indexed move to `added`
/// - deleted files are `deleted`
/// - a rename deletes the old path and changes the new one
/// - discovered files missing from the index are `added`
/// - indexed files no longer discovered are `deleted`
pub fn compute_changeset(
    vcs: &dyn VersionControl,
    last_commit: Option<&str>,
    head: Option<&str>,
    indexed: &[String],
    discovered: &[DiscoveredFile],
    force: bool,
) -> ChangeSet {
    if force {
        tracing::info!("Forced full reindex");
        return ChangeSet::full();
    }
    let Some(last) = last_commit else {
        tracing::info!("No indexed commit recorded, running full index");
        return ChangeSet::full();
    };
    let Some(head) = head else {
        tracing::info!("Version control unavailable, running full index");
        return ChangeSet::full();
    };
    let Some(diff) = vcs.diff(last, head) else {
        tracing::warn!("Could not diff {last}..{head}, running full index");
        return ChangeSet::full();
    };

    let indexed_set: HashSet<&str> = indexed.iter().map(String::as_str).collect();
    let mut changes = ChangeSet::default();
    let mut classified: HashSet<String> = HashSet::new();

    let mut touch = |path: String, changes: &mut ChangeSet| {
        if classified.insert(path.clone()) {
            if indexed_set.contains(path.as_str()) {
                changes.changed.push(path);
            } else {
                changes.added.push(path);
            }
        }
    };
    let mut deleted: Vec<String> = Vec::new();

    for entry in diff {
        match entry.status {
            DiffStatus::Deleted => deleted.push(entry.path),
            DiffStatus::Renamed => {
                deleted.push(entry.path);
                if let Some(new_path) = entry.new_path {
                    touch(new_path, &mut changes);
                }
            }
            DiffStatus::Copied => {
                if let Some(new_path) = entry.new_path {
                    touch(new_path, &mut changes);
                }
            }
            DiffStatus::Modified | DiffStatus::Added => touch(entry.path, &mut changes),
        }
    }

    // Untracked or otherwise invisible new files.
    for file in discovered {
        if !indexed_set.contains(file.path.as_str()) {
            touch(file.path.clone(), &mut changes);
        }
    }

    // Files that vanished from discovery without a recorded deletion.
    let discovered_set: HashSet<&str> = discovered.iter().map(|f| f.path.as_str()).collect();
    for path in indexed {
        if !discovered_set.contains(path.as_str()) {
            deleted.push(path.clone());
        }
    }

    let mut seen_deleted: HashSet<String> = HashSet::new();
    for path in deleted {
        if !classified.contains(&path) && seen_deleted.insert(path.clone()) {
            changes.deleted.push(path);
        }
    }

    tracing::info!(
        "Changes since {}: {} changed, {} added, {} deleted",
        short(last),
        changes.changed.len(),
        changes.added.len(),
        changes.deleted.len()
    );
    changes
}

fn short(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlmcode_core::{DiffEntry, Language};

    struct FakeVcs {
        diff: Option<Vec<DiffEntry>>,
    }

    impl VersionControl for FakeVcs {
        fn current_head(&self) -> Option<String> {
            Some("head".to_string())
        }
        fn diff(&self, _since: &str, _head: &str) -> Option<Vec<DiffEntry>> {
            self.diff.clone()
        }
    }

    fn entry(status: DiffStatus, path: &str, new_path: Option<&str>) -> DiffEntry {
        DiffEntry {
            status,
            path: path.to_string(),
            new_path: new_path.map(str::to_string),
        }
    }

    fn found(paths: &[&str]) -> Vec<DiscoveredFile> {
        paths
            .iter()
            .map(|p| DiscoveredFile {
                path: p.to_string(),
                language: Language::Python,
            })
            .collect()
    }

    fn owned(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn full_reindex_cases() {
        let vcs = FakeVcs { diff: Some(Vec::new()) };
        let indexed = owned(&["a.py"]);
        let disk = found(&["a.py"]);

        assert!(compute_changeset(&vcs, None, Some("h"), &indexed, &disk, false).is_full_reindex);
        assert!(compute_changeset(&vcs, Some("c"), Some("h"), &indexed, &disk, true).is_full_reindex);
        assert!(compute_changeset(&vcs, Some("c"), None, &indexed, &disk, false).is_full_reindex);

        let broken = FakeVcs { diff: None };
        assert!(compute_changeset(&broken, Some("c"), Some("h"), &indexed, &disk, false).is_full_reindex);
    }

    #[test]
    fn rename_is_delete_plus_change() {
        let vcs = FakeVcs {
            diff: Some(vec![entry(DiffStatus::Renamed, "old.py", Some("new.py"))]),
        };
        let indexed = owned(&["old.py", "new.py"]);
        let disk = found(&["new.py"]);
        let changes = compute_changeset(&vcs, Some("c"), Some("h"), &indexed, &disk, false);
        assert!(!changes.is_full_reindex);
        assert_eq!(changes.deleted, vec!["old.py"]);
        assert_eq!(changes.changed, vec!["new.py"]);
        assert!(changes.added.is_empty());
    }

    #[test]
    fn unindexed_changes_become_added() {
        let vcs = FakeVcs {
            diff: Some(vec![
                entry(DiffStatus::Modified, "a.py", None),
                entry(DiffStatus::Added, "b.py", None),
                entry(DiffStatus::Deleted, "gone.py", None),
            ]),
        };
        let indexed = owned(&["a.py", "gone.py"]);
        let disk = found(&["a.py", "b.py", "untracked.py"]);
        let changes = compute_changeset(&vcs, Some("c"), Some("h"), &indexed, &disk, false);
        assert_eq!(changes.changed, vec!["a.py"]);
        assert_eq!(changes.added, vec!["b.py", "untracked.py"]);
        assert_eq!(changes.deleted, vec!["gone.py"]);
    }

    #[test]
    fn vanished_files_are_deleted_once() {
        let vcs = FakeVcs {
            diff: Some(vec![entry(DiffStatus::Deleted, "x.py", None)]),
        };
        let indexed = owned(&["x.py", "y.py", "z.py"]);
        let disk = found(&["z.py"]);
        let changes = compute_changeset(&vcs, Some("c"), Some("h"), &indexed, &disk, false);
        assert_eq!(changes.deleted, vec!["x.py", "y.py"]);
        assert!(changes.changed.is_empty());
        assert!(changes.added.is_empty());
    }

    #[test]
    fn unchanged_tree_has_nothing_to_do() {
        let vcs = FakeVcs { diff: Some(Vec::new()) };
        let indexed = owned(&["a.py", "b.py"]);
        let disk = found(&["a.py", "b.py"]);
        let changes = compute_changeset(&vcs, Some("c"), Some("c"), &indexed, &disk, false);
        assert_eq!(changes, ChangeSet::default());
    }
}
