//! Project file discovery.
//!
//! Walks the project root with the `ignore` crate's walker, pruning excluded
//! directory names and applying the root `.gitignore` explicitly so that
//! ignore rules hold whether or not the tree is a git checkout.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use rlmcode_core::Language;
use std::collections::HashSet;
use std::path::Path;

/// A source file selected for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub language: Language,
}

/// Every wanted source file under `root`, sorted by path.
///
/// A file is skipped when any segment of its relative path is an excluded
/// directory name, when the root `.gitignore` ignores it, or when its
/// extension maps to no wanted language. Never fails; unreadable entries are
/// logged and skipped.
pub fn discover(root: &Path, exclude_dirs: &[String], languages: &[Language]) -> Vec<DiscoveredFile> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let excluded: HashSet<String> = exclude_dirs.iter().cloned().collect();
    let wanted: HashSet<Language> = languages.iter().copied().collect();
    let gitignore = load_gitignore(&root);

    let prune = excluded.clone();
    let walker = WalkBuilder::new(&root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_some_and(|ft| ft.is_dir())
                || !prune.contains(entry.file_name().to_string_lossy().as_ref())
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("Walk error: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&root) else {
            continue;
        };

        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if segments.iter().any(|s| excluded.contains(s)) {
            continue;
        }
        if gitignore.matched_path_or_any_parents(rel, false).is_ignore() {
            continue;
        }

        let path = segments.join("/");
        let Some(language) = Language::from_path(&path) else {
            continue;
        };
        if wanted.contains(&language) {
            files.push(DiscoveredFile { path, language });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!("Discovered {} source files under {}", files.len(), root.display());
    files
}

fn load_gitignore(root: &Path) -> Gitignore {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return Gitignore::empty();
    }
    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&path) {
        tracing::warn!("Some ignore rules in {} were skipped: {}", path.display(), err);
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Ignoring {}: {}", path.display(), err);
        Gitignore::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlmcode_core::DEFAULT_EXCLUDE_DIRS;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x = 1\n").unwrap();
    }

    fn default_excludes() -> Vec<String> {
        DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect()
    }

    fn paths(files: &[DiscoveredFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn finds_sorted_forward_slash_paths() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "zeta.py");
        touch(dir.path(), "pkg/sub/mod.py");
        touch(dir.path(), "src/App.java");
        touch(dir.path(), "web/ui.tsx");
        touch(dir.path(), "web/api.ts");
        touch(dir.path(), "README.md");

        let files = discover(dir.path(), &default_excludes(), &Language::ALL);
        assert_eq!(
            paths(&files),
            vec!["pkg/sub/mod.py", "src/App.java", "web/api.ts", "web/ui.tsx", "zeta.py"]
        );
        assert_eq!(files[3].language, Language::Tsx);
        assert!(files.iter().all(|f| !f.path.contains('\\')));
    }

    #[test]
    fn excluded_directory_segments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.py");
        touch(dir.path(), "node_modules/lib/index.ts");
        touch(dir.path(), "pkg/__pycache__/cached.py");
        touch(dir.path(), ".venv/lib/site.py");
        touch(dir.path(), "deep/a/b/build/gen.java");

        let files = discover(dir.path(), &default_excludes(), &Language::ALL);
        assert_eq!(paths(&files), vec!["keep.py"]);
    }

    #[test]
    fn gitignore_rules_apply_without_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "generated/\n*_pb2.py\n!keep_pb2.py\n").unwrap();
        touch(dir.path(), "main.py");
        touch(dir.path(), "generated/models.py");
        touch(dir.path(), "proto/api_pb2.py");
        touch(dir.path(), "proto/keep_pb2.py");

        let files = discover(dir.path(), &[], &Language::ALL);
        assert_eq!(paths(&files), vec!["main.py", "proto/keep_pb2.py"]);
    }

    #[test]
    fn language_allowlist_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.py");
        touch(dir.path(), "B.java");
        touch(dir.path(), "c.ts");

        let files = discover(dir.path(), &[], &[Language::Java]);
        assert_eq!(paths(&files), vec!["B.java"]);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover(&dir.path().join("absent"), &[], &Language::ALL);
        assert!(files.is_empty());
    }
}
