//! rlmcode-index: Tree-sitter based code indexing for rlm-code.
//!
//! Turns a project tree into symbols and reference edges, incrementally.
//!
//! # Architecture
//!
//! - **discover** — Walks the project, applying exclusions, `.gitignore` and the language allowlist
//! - **parser** — Per-language tree-sitter parsers, reused for the whole run
//! - **tree** — Arena copy of a syntax tree with parent links and a restartable walk
//! - **extractor** — Three-pass scope-aware symbol/reference extraction
//! - **languages** — Python, Java and TypeScript/TSX recognition hooks
//! - **resolver** — Name-based resolution of raw references into edges
//! - **git** — `git` command-line backend with call deadlines
//! - **freshness** — Commit diff to changeset
//! - **indexer** — Main pipeline: full or incremental runs against a `CodeStore`

pub mod discover;
pub mod extractor;
pub mod freshness;
pub mod git;
pub mod indexer;
pub mod languages;
pub mod parser;
pub mod resolver;
pub mod tree;

pub use discover::{discover, DiscoveredFile};
pub use extractor::{extract, Callable, Container, Extraction, LanguageExtractor};
pub use freshness::{compute_changeset, LAST_INDEXED_COMMIT};
pub use git::GitCli;
pub use indexer::{IndexStats, Indexer};
pub use parser::{ParsedFile, ParserRegistry};
pub use resolver::{import_candidates, resolve_all, Resolver};
pub use tree::{NodeId, SyntaxNode, SyntaxTree};
