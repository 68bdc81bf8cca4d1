use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::RlmError;

/// Suffix of the synthetic per-file source id used for top-level references.
pub const MODULE_SYMBOL: &str = "__module__";

/// Build a symbol id: `"{file_path}::{qualified_name}"`.
pub fn symbol_id(file_path: &str, qualified_name: &str) -> String {
    format!("{file_path}::{qualified_name}")
}

/// Synthetic source id for references made outside any callable in `file_path`.
pub fn module_id(file_path: &str) -> String {
    symbol_id(file_path, MODULE_SYMBOL)
}

/// File path component of a symbol id (everything before the first `::`).
pub fn file_of_id(id: &str) -> &str {
    id.split_once("::").map(|(file, _)| file).unwrap_or(id)
}

// ── Languages ───────────────────────────────────────────────────────────────

/// Source languages with an extractor front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    TypeScript,
    /// TypeScript with JSX; shares the TypeScript extractor.
    Tsx,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::Java,
        Language::TypeScript,
        Language::Tsx,
    ];

    /// Map a file extension (without the dot, case-insensitive) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Map a file path to a language by its extension.
    pub fn from_path(path: &str) -> Option<Self> {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = RlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "java" => Ok(Self::Java),
            "typescript" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            _ => Err(RlmError::InvalidLanguage(s.to_string())),
        }
    }
}

// ── Symbols ─────────────────────────────────────────────────────────────────

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
            Self::Class => write!(f, "class"),
        }
    }
}

impl std::str::FromStr for SymbolKind {
    type Err = RlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" => Ok(Self::Function),
            "method" => Ok(Self::Method),
            "class" => Ok(Self::Class),
            _ => Err(RlmError::InvalidSymbolKind(s.to_string())),
        }
    }
}

/// A declared entity extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// `"{file_path}::{qualified_name}"`.
    pub id: String,
    /// Project-relative, forward-slash path.
    pub file_path: String,
    /// Simple name (e.g. `normalize`).
    pub name: String,
    /// Dotted lexical path (e.g. `Parser.normalize`).
    pub qualified_name: String,
    pub kind: SymbolKind,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub signature: String,
}

// ── References & Edges ──────────────────────────────────────────────────────

/// Relationship carried by a reference or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Calls,
    Imports,
    Inherits,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calls => write!(f, "calls"),
            Self::Imports => write!(f, "imports"),
            Self::Inherits => write!(f, "inherits"),
        }
    }
}

impl std::str::FromStr for EdgeKind {
    type Err = RlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calls" => Ok(Self::Calls),
            "imports" => Ok(Self::Imports),
            "inherits" => Ok(Self::Inherits),
            _ => Err(RlmError::InvalidEdgeKind(s.to_string())),
        }
    }
}

/// An unresolved textual reference, pending resolution. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRef {
    /// Owning symbol id, or the file's module id.
    pub source_id: String,
    /// Call target name, raw import text, or base-class text.
    pub ref_text: String,
    pub kind: EdgeKind,
}

/// A directed relationship between a symbol and a symbol id (or unresolved text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    /// Resolved symbol id, or the unresolved reference text.
    pub target_id: String,
    pub kind: EdgeKind,
    pub resolved: bool,
}

impl Edge {
    pub fn resolved(source_id: &str, target_id: &str, kind: EdgeKind) -> Self {
        Self {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            kind,
            resolved: true,
        }
    }

    pub fn unresolved(source_id: &str, text: &str, kind: EdgeKind) -> Self {
        Self {
            source_id: source_id.to_string(),
            target_id: text.to_string(),
            kind,
            resolved: false,
        }
    }

    /// Deduplication key; no two persisted edges share it.
    pub fn key(&self) -> (&str, &str, EdgeKind) {
        (&self.source_id, &self.target_id, self.kind)
    }
}

// ── Files ───────────────────────────────────────────────────────────────────

/// One indexed source file. Replaced wholesale on re-index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub language: Language,
    /// SHA-256 hex digest of the file bytes.
    pub content_hash: String,
    pub line_count: usize,
    pub last_indexed: DateTime<Utc>,
}

// ── Derived Analytics ───────────────────────────────────────────────────────

/// Per-symbol graph metrics, recomputed from scratch on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetrics {
    pub symbol_id: String,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Normalized, in `[0, 1]`.
    pub betweenness: f64,
    pub pagerank: f64,
}

/// Architectural smells found in the symbol graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    /// Symbol ids sorted by descending total degree.
    pub god_objects: Vec<String>,
    /// Symbol ids with no incident edges.
    pub orphans: Vec<String>,
    /// Each entry is a sorted strongly connected component of size > 1.
    pub cycles: Vec<Vec<String>>,
    /// File paths ranked by incident edge count.
    pub hub_files: Vec<String>,
}

// ── Freshness ───────────────────────────────────────────────────────────────

/// Files needing work since the last indexed commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
    pub added: Vec<String>,
    pub is_full_reindex: bool,
}

impl ChangeSet {
    pub fn full() -> Self {
        Self {
            is_full_reindex: true,
            ..Self::default()
        }
    }
}

/// Status letter of one `git diff --name-status` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
}

/// One file-level change between two commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub status: DiffStatus,
    pub path: String,
    /// Destination path for renames and copies.
    pub new_path: Option<String>,
}

// ── Summaries ───────────────────────────────────────────────────────────────

/// What a cached summary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    Symbol,
    File,
    Directory,
}

impl std::fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol => write!(f, "symbol"),
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

impl std::str::FromStr for SummaryKind {
    type Err = RlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "symbol" => Ok(Self::Symbol),
            "file" => Ok(Self::File),
            "directory" => Ok(Self::Directory),
            _ => Err(RlmError::Config(format!("unknown summary kind: {s}"))),
        }
    }
}

/// A cached natural-language summary produced by an external summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Symbol id, file path, or directory path.
    pub target_id: String,
    pub target_kind: SummaryKind,
    pub summary_text: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub is_stale: bool,
}

// ── Stats ───────────────────────────────────────────────────────────────────

/// Row counts of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub files: usize,
    pub symbols: usize,
    pub edges: usize,
    pub resolved_edges: usize,
    pub metrics: usize,
    pub summaries: usize,
    pub by_language: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_joins_path_and_qualified_name() {
        assert_eq!(symbol_id("pkg/a.py", "Cls.run"), "pkg/a.py::Cls.run");
        assert_eq!(module_id("pkg/a.py"), "pkg/a.py::__module__");
    }

    #[test]
    fn file_of_id_splits_at_first_separator() {
        assert_eq!(file_of_id("src/a.ts::Foo.bar"), "src/a.ts");
        assert_eq!(file_of_id("plain"), "plain");
    }

    #[test]
    fn language_from_path() {
        assert_eq!(Language::from_path("a/b.py"), Some(Language::Python));
        assert_eq!(Language::from_path("A.JAVA"), Some(Language::Java));
        assert_eq!(Language::from_path("x.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("x.tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_path("x.rs"), None);
        assert_eq!(Language::from_path("Makefile"), None);
    }

    #[test]
    fn enums_roundtrip_through_strings() {
        for lang in Language::ALL {
            assert_eq!(lang.to_string().parse::<Language>().unwrap(), lang);
        }
        for kind in [SymbolKind::Function, SymbolKind::Method, SymbolKind::Class] {
            assert_eq!(kind.to_string().parse::<SymbolKind>().unwrap(), kind);
        }
        for kind in [EdgeKind::Calls, EdgeKind::Imports, EdgeKind::Inherits] {
            assert_eq!(kind.to_string().parse::<EdgeKind>().unwrap(), kind);
        }
        assert!("struct".parse::<SymbolKind>().is_err());
    }

    #[test]
    fn full_changeset_is_empty_but_flagged() {
        let cs = ChangeSet::full();
        assert!(cs.is_full_reindex);
        assert!(cs.changed.is_empty() && cs.deleted.is_empty() && cs.added.is_empty());
    }
}
