//! Integration tests for rlmcode-index: full and incremental runs against
//! an in-memory store.

use rlmcode_core::{
    CodeStore, DiffEntry, DiffStatus, EdgeKind, IndexConfig, Summary, SummaryKind,
    VersionControl,
};
use rlmcode_graph::GraphEngine;
use rlmcode_index::{GitCli, IndexStats, Indexer};
use rlmcode_storage::Storage;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

// ── Helpers ────────────────────────────────────────────────────────────────

/// Version control stand-in with a settable head and diff.
struct FakeVcs {
    head: Mutex<Option<String>>,
    diff: Mutex<Vec<DiffEntry>>,
}

impl FakeVcs {
    fn at(head: &str) -> Self {
        Self {
            head: Mutex::new(Some(head.to_string())),
            diff: Mutex::new(Vec::new()),
        }
    }

    fn none() -> Self {
        Self {
            head: Mutex::new(None),
            diff: Mutex::new(Vec::new()),
        }
    }

    fn advance(&self, head: &str, diff: Vec<DiffEntry>) {
        *self.head.lock().unwrap() = Some(head.to_string());
        *self.diff.lock().unwrap() = diff;
    }
}

impl VersionControl for FakeVcs {
    fn current_head(&self) -> Option<String> {
        self.head.lock().unwrap().clone()
    }

    fn diff(&self, _since: &str, _head: &str) -> Option<Vec<DiffEntry>> {
        Some(self.diff.lock().unwrap().clone())
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn modified(path: &str) -> DiffEntry {
    DiffEntry {
        status: DiffStatus::Modified,
        path: path.to_string(),
        new_path: None,
    }
}

fn run(root: &Path, store: &Storage, vcs: &dyn VersionControl, force: bool) -> IndexStats {
    Indexer::new(root, &IndexConfig::default(), store, vcs)
        .run(force)
        .unwrap()
}

fn foo_bar_project(root: &Path) {
    write(root, "a.py", "def foo():\n    bar()\n");
    write(root, "b.py", "def bar():\n    pass\n");
}

// ── End-to-end ─────────────────────────────────────────────────────────────

#[test]
fn two_file_call_graph() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();

    let stats = run(dir.path(), &store, &FakeVcs::none(), false);
    assert!(stats.full_reindex);
    assert_eq!(stats.files_discovered, 2);
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.symbols, 2);

    let edges = store.all_edges().unwrap();
    let resolved_calls: Vec<_> = edges
        .iter()
        .filter(|e| e.resolved && e.kind == EdgeKind::Calls)
        .collect();
    assert_eq!(resolved_calls.len(), 1);
    assert_eq!(resolved_calls[0].source_id, "a.py::foo");
    assert_eq!(resolved_calls[0].target_id, "b.py::bar");

    let graph = GraphEngine::from_store(&store).unwrap();
    assert_eq!(graph.in_degree("b.py::bar"), 1);

    let foo = store.get_metrics("a.py::foo").unwrap().unwrap();
    let bar = store.get_metrics("b.py::bar").unwrap().unwrap();
    assert_eq!(bar.in_degree, 1);
    assert_eq!(foo.out_degree, 1);
    assert!(
        bar.pagerank > foo.pagerank,
        "bar {} should outrank foo {}",
        bar.pagerank,
        foo.pagerank
    );

    let file = store.get_file("a.py").unwrap().unwrap();
    assert_eq!(file.line_count, 3);
    assert_eq!(file.content_hash.len(), 64);
}

#[test]
fn unchanged_tree_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();
    let vcs = FakeVcs::at("c1");

    let first = run(dir.path(), &store, &vcs, false);
    assert!(first.full_reindex);
    assert_eq!(store.get_meta("last_indexed_commit").unwrap().as_deref(), Some("c1"));

    let second = run(dir.path(), &store, &vcs, false);
    assert!(!second.full_reindex);
    assert!(second.up_to_date);
    assert_eq!(second.files_processed, 0);
    assert_eq!(second.symbols, first.symbols);
    assert_eq!(second.edges, first.edges);
}

#[test]
fn incremental_run_touches_only_changed_files() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();
    let vcs = FakeVcs::at("c1");
    run(dir.path(), &store, &vcs, false);

    store
        .upsert_summary(&Summary {
            target_id: "b.py".to_string(),
            target_kind: SummaryKind::File,
            summary_text: "defines bar".to_string(),
            model: "test".to_string(),
            generated_at: chrono::Utc::now(),
            is_stale: false,
        })
        .unwrap();

    write(dir.path(), "b.py", "def bar():\n    helper()\n\ndef helper():\n    pass\n");
    write(dir.path(), "c.py", "def qux():\n    foo()\n");
    vcs.advance("c2", vec![modified("b.py")]);

    let stats = run(dir.path(), &store, &vcs, false);
    assert!(!stats.full_reindex);
    // b.py from the diff, c.py as an untracked addition.
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.symbols, 4);
    assert_eq!(store.get_meta("last_indexed_commit").unwrap().as_deref(), Some("c2"));

    // The untouched caller in a.py still resolves to bar.
    let callers = store.callers("b.py::bar").unwrap();
    assert_eq!(callers.len(), 1);
    assert_eq!(callers[0].source_id, "a.py::foo");
    // New edges resolve against symbols stored by earlier runs.
    let foo_callers = store.callers("a.py::foo").unwrap();
    assert_eq!(foo_callers.len(), 1);
    assert_eq!(foo_callers[0].source_id, "c.py::qux");
    assert_eq!(store.callees("b.py::bar").unwrap().len(), 1);

    assert!(store.get_summary("b.py").unwrap().unwrap().is_stale);
    assert_eq!(
        store.all_metrics().unwrap().len(),
        4,
        "metrics are recomputed for every symbol"
    );
}

#[test]
fn rename_moves_symbols_to_new_path() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();
    let vcs = FakeVcs::at("c1");
    run(dir.path(), &store, &vcs, false);

    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::rename(dir.path().join("b.py"), dir.path().join("lib/b.py")).unwrap();
    vcs.advance(
        "c2",
        vec![DiffEntry {
            status: DiffStatus::Renamed,
            path: "b.py".to_string(),
            new_path: Some("lib/b.py".to_string()),
        }],
    );

    let stats = run(dir.path(), &store, &vcs, false);
    assert_eq!(stats.files_deleted, 1);
    assert_eq!(stats.files_processed, 1);
    assert_eq!(
        store.all_file_paths().unwrap(),
        vec!["a.py".to_string(), "lib/b.py".to_string()]
    );
    assert!(store.get_symbol("b.py::bar").unwrap().is_none());
    assert!(store.get_symbol("lib/b.py::bar").unwrap().is_some());
    assert!(store.symbols_for_file("b.py").unwrap().is_empty());
}

#[test]
fn deleted_files_leave_the_index() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();
    let vcs = FakeVcs::at("c1");
    run(dir.path(), &store, &vcs, false);

    fs::remove_file(dir.path().join("a.py")).unwrap();
    vcs.advance(
        "c2",
        vec![DiffEntry {
            status: DiffStatus::Deleted,
            path: "a.py".to_string(),
            new_path: None,
        }],
    );

    let stats = run(dir.path(), &store, &vcs, false);
    assert_eq!(stats.files_deleted, 1);
    assert_eq!(stats.files_processed, 0);
    assert!(!stats.up_to_date);
    assert_eq!(stats.symbols, 1);
    assert!(store.callers("b.py::bar").unwrap().is_empty());
    let metrics = store.all_metrics().unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].in_degree, 0);
}

#[test]
fn force_rebuilds_everything() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();
    let vcs = FakeVcs::at("c1");
    let first = run(dir.path(), &store, &vcs, false);

    let forced = run(dir.path(), &store, &vcs, true);
    assert!(forced.full_reindex);
    assert_eq!(forced.files_processed, 2);
    assert_eq!(forced.symbols, first.symbols);
    assert_eq!(forced.edges, first.edges);
}

#[test]
fn exclusions_and_gitignore_limit_the_index() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    write(dir.path(), "node_modules/dep/index.ts", "export function dep() {}\n");
    write(dir.path(), "gen/out.py", "def generated():\n    pass\n");
    write(dir.path(), ".gitignore", "gen/\n");
    let store = Storage::open_in_memory().unwrap();

    let stats = run(dir.path(), &store, &FakeVcs::none(), false);
    assert_eq!(stats.files_discovered, 2);
    assert_eq!(
        store.all_file_paths().unwrap(),
        vec!["a.py".to_string(), "b.py".to_string()]
    );
}

#[test]
fn mixed_languages_resolve_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/Repo.java",
        "class Repo extends Base {\n  void save() { flush(); }\n  void flush() {}\n}\nclass Base {}\n",
    );
    write(
        dir.path(),
        "web/api.ts",
        "import { render } from './view';\nexport function show() { render(); }\n",
    );
    write(dir.path(), "web/view.tsx", "export const render = () => <div />;\n");
    let store = Storage::open_in_memory().unwrap();

    let stats = run(dir.path(), &store, &FakeVcs::none(), false);
    assert_eq!(stats.files_processed, 3);
    assert_eq!(stats.errors, 0);

    let edges = store.all_edges().unwrap();
    let has = |src: &str, dst: &str, kind: EdgeKind| {
        edges
            .iter()
            .any(|e| e.resolved && e.source_id == src && e.target_id == dst && e.kind == kind)
    };
    assert!(has("src/Repo.java::Repo", "src/Repo.java::Base", EdgeKind::Inherits));
    assert!(has("src/Repo.java::Repo.save", "src/Repo.java::Repo.flush", EdgeKind::Calls));
    assert!(has("web/api.ts::show", "web/view.tsx::render", EdgeKind::Calls));
    assert!(has("web/api.ts::__module__", "web/view.tsx::render", EdgeKind::Imports));
}

#[test]
fn without_git_every_run_is_full() {
    let dir = tempfile::tempdir().unwrap();
    foo_bar_project(dir.path());
    let store = Storage::open_in_memory().unwrap();
    let git = GitCli::new(dir.path(), &Default::default());

    let first = run(dir.path(), &store, &git, false);
    let second = run(dir.path(), &store, &git, false);
    assert!(first.full_reindex && second.full_reindex);
    assert!(first.head.is_none());
    assert_eq!(second.files_processed, 2);
    assert!(store.get_meta("last_indexed_commit").unwrap().is_none());
}

// ── Real git ───────────────────────────────────────────────────────────────

fn git(root: &Path, args: &[&str]) -> bool {
    std::process::Command::new("git")
        .args(["-c", "user.name=rlm", "-c", "user.email=rlm@example.com"])
        .args(args)
        .current_dir(root)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn git_commits_drive_incremental_runs() {
    let dir = tempfile::tempdir().unwrap();
    if !git(dir.path(), &["init", "-q"]) {
        eprintln!("git unavailable, skipping");
        return;
    }
    foo_bar_project(dir.path());
    assert!(git(dir.path(), &["add", "."]));
    assert!(git(dir.path(), &["commit", "-q", "-m", "initial"]));

    let store = Storage::open_in_memory().unwrap();
    let vcs = GitCli::new(dir.path(), &Default::default());
    let first = run(dir.path(), &store, &vcs, false);
    assert!(first.full_reindex);
    assert!(first.head.is_some());

    write(dir.path(), "b.py", "def bar():\n    return 1\n\ndef baz():\n    pass\n");
    assert!(git(dir.path(), &["commit", "-q", "-am", "add baz"]));

    let second = run(dir.path(), &store, &vcs, false);
    assert!(!second.full_reindex);
    assert_eq!(second.files_processed, 1);
    assert_eq!(second.symbols, 3);
    assert_ne!(first.head, second.head);
}

#[test]
fn project_in_repository_subdirectory_tracks_commits() {
    let dir = tempfile::tempdir().unwrap();
    if !git(dir.path(), &["init", "-q"]) {
        eprintln!("git unavailable, skipping");
        return;
    }
    let project = dir.path().join("proj");
    foo_bar_project(&project);
    write(dir.path(), "other/c.py", "def unrelated():\n    pass\n");
    assert!(git(dir.path(), &["add", "."]));
    assert!(git(dir.path(), &["commit", "-q", "-m", "initial"]));

    let store = Storage::open_in_memory().unwrap();
    let vcs = GitCli::new(&project, &Default::default());
    let first = run(&project, &store, &vcs, false);
    assert!(first.full_reindex);
    assert_eq!(first.files, 2);

    write(&project, "a.py", "def foo():\n    bar()\n\ndef baz():\n    pass\n");
    write(dir.path(), "other/c.py", "def unrelated():\n    return 2\n");
    assert!(git(dir.path(), &["commit", "-q", "-am", "add baz"]));

    let second = run(&project, &store, &vcs, false);
    assert!(!second.full_reindex);
    assert!(!second.up_to_date);
    assert_eq!(second.files_processed, 1);
    assert!(store.get_symbol("a.py::baz").unwrap().is_some());
    assert_eq!(store.all_file_paths().unwrap(), vec!["a.py", "b.py"]);
}
