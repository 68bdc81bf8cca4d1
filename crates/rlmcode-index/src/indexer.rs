//! Main indexing pipeline orchestrator.
//!
//! Sequences discovery, freshness, parsing, extraction, resolution and graph
//! metrics into one run. Per-file stages only touch the selected files;
//! resolution and metrics always see the whole project.

use crate::discover::{discover, DiscoveredFile};
use crate::extractor::{extract, Extraction};
use crate::freshness::{compute_changeset, LAST_INDEXED_COMMIT};
use crate::parser::ParserRegistry;
use crate::resolver::resolve_all;
use chrono::Utc;
use rlmcode_core::{
    CodeStore, FileRecord, IndexConfig, Language, RawRef, RlmError, VersionControl,
};
use rlmcode_graph::GraphEngine;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Outcome of one indexing run. Totals describe the store after the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_deleted: usize,
    /// Files that could not be read, parsed or extracted.
    pub errors: usize,
    pub files: usize,
    pub symbols: usize,
    pub edges: usize,
    pub resolved_edges: usize,
    pub full_reindex: bool,
    /// Nothing changed; no work was done.
    pub up_to_date: bool,
    pub head: Option<String>,
}

/// The indexing pipeline for one project.
pub struct Indexer<'a> {
    root: PathBuf,
    config: IndexConfig,
    store: &'a dyn CodeStore,
    vcs: &'a dyn VersionControl,
    parsers: ParserRegistry,
}

impl<'a> Indexer<'a> {
    pub fn new(
        root: &Path,
        config: &IndexConfig,
        store: &'a dyn CodeStore,
        vcs: &'a dyn VersionControl,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            config: config.clone(),
            store,
            vcs,
            parsers: ParserRegistry::new(),
        }
    }

    /// Bring the index up to date, or rebuild it from scratch when `force`.
    ///
    /// Only store failures abort the run. The commit marker moves to the
    /// current head once everything else has been written.
    pub fn run(&mut self, force: bool) -> Result<IndexStats, RlmError> {
        let head = self.vcs.current_head();
        let last = self.store.get_meta(LAST_INDEXED_COMMIT)?;
        let discovered = discover(
            &self.root,
            &self.config.exclude_dirs,
            &self.config.languages,
        );
        let indexed = self.store.all_file_paths()?;
        let changes = compute_changeset(
            self.vcs,
            last.as_deref(),
            head.as_deref(),
            &indexed,
            &discovered,
            force,
        );

        let mut stats = IndexStats {
            files_discovered: discovered.len(),
            full_reindex: changes.is_full_reindex,
            head: head.clone(),
            ..IndexStats::default()
        };

        let to_process: Vec<&DiscoveredFile> = if changes.is_full_reindex {
            let on_disk: HashSet<&str> = discovered.iter().map(|f| f.path.as_str()).collect();
            for path in &indexed {
                self.store.delete_file(path)?;
                if !on_disk.contains(path.as_str()) {
                    stats.files_deleted += 1;
                }
            }
            discovered.iter().collect()
        } else {
            let known: HashSet<&str> = indexed.iter().map(String::as_str).collect();
            for path in &changes.deleted {
                if known.contains(path.as_str()) {
                    self.store.delete_file(path)?;
                    stats.files_deleted += 1;
                }
            }
            let selected: HashSet<&str> = changes
                .changed
                .iter()
                .chain(&changes.added)
                .map(String::as_str)
                .collect();
            discovered
                .iter()
                .filter(|f| selected.contains(f.path.as_str()))
                .collect()
        };

        if to_process.is_empty() && stats.files_deleted == 0 {
            self.record_head(head.as_deref())?;
            self.fill_totals(&mut stats)?;
            stats.up_to_date = true;
            tracing::info!("Index is up to date ({} files)", stats.files);
            return Ok(stats);
        }

        let mut refs: Vec<RawRef> = Vec::new();
        for file in to_process {
            match self.index_file(file)? {
                Some(extraction) => {
                    stats.files_processed += 1;
                    if extraction.failed {
                        stats.errors += 1;
                    }
                    refs.extend(extraction.refs);
                }
                None => stats.errors += 1,
            }
        }

        // Resolve against every stored symbol, not just this run's.
        let symbols = self.store.all_symbols()?;
        let languages: HashMap<String, Language> = self
            .store
            .all_files()?
            .into_iter()
            .map(|f| (f.path, f.language))
            .collect();
        let edges = resolve_all(&symbols, &refs, &languages);
        let inserted = self.store.insert_edges(&edges)?;
        tracing::debug!("Inserted {inserted} new edges");

        let graph = GraphEngine::from_store(self.store)?;
        let metrics = graph.compute_metrics();
        self.store.replace_metrics(&metrics)?;

        self.record_head(head.as_deref())?;
        self.fill_totals(&mut stats)?;
        tracing::info!(
            "Indexed {} files ({} errors, {} deleted): {} symbols, {} edges ({} resolved)",
            stats.files_processed,
            stats.errors,
            stats.files_deleted,
            stats.symbols,
            stats.edges,
            stats.resolved_edges,
        );
        Ok(stats)
    }

    /// Replace everything stored for one file.
    ///
    /// `Ok(None)` when the file cannot be read or parsed; its previous index
    /// data is left untouched in that case.
    fn index_file(&mut self, file: &DiscoveredFile) -> Result<Option<Extraction>, RlmError> {
        let parsed = match self.parsers.parse_file(&self.root, &file.path, file.language) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.path, e);
                return Ok(None);
            }
        };

        self.store.delete_edges_for_file(&file.path)?;
        self.store.delete_symbols_for_file(&file.path)?;
        self.store.upsert_file(&FileRecord {
            path: file.path.clone(),
            language: file.language,
            content_hash: content_hash(&parsed.source),
            line_count: line_count(&parsed.source),
            last_indexed: Utc::now(),
        })?;

        let extraction = extract(&file.path, file.language, &parsed.tree, &parsed.source);
        self.store.upsert_symbols_batch(&extraction.symbols)?;
        self.store.mark_summary_stale(&file.path)?;

        tracing::debug!(
            "{}: {} symbols, {} references",
            file.path,
            extraction.symbols.len(),
            extraction.refs.len()
        );
        Ok(Some(extraction))
    }

    fn record_head(&self, head: Option<&str>) -> Result<(), RlmError> {
        if let Some(head) = head {
            self.store.set_meta(LAST_INDEXED_COMMIT, head)?;
        }
        Ok(())
    }

    fn fill_totals(&self, stats: &mut IndexStats) -> Result<(), RlmError> {
        let totals = self.store.stats()?;
        stats.files = totals.files;
        stats.symbols = totals.symbols;
        stats.edges = totals.edges;
        stats.resolved_edges = totals.resolved_edges;
        Ok(())
    }
}

/// Hex SHA-256 of file contents.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Newline count plus one.
fn line_count(content: &[u8]) -> usize {
    content.iter().filter(|&&b| b == b'\n').count() + 1
}
