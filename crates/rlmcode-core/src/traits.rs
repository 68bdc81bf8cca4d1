use crate::{
    DiffEntry, Edge, FileRecord, RlmError, StoreStats, Summary, Symbol, SymbolMetrics,
};

// ── Store Trait ─────────────────────────────────────────────────────────────

/// Persistence contract for files, symbols, edges, metrics, metadata and summaries.
///
/// Every call is atomic with respect to other calls on the same store. The
/// SQLite implementation lives in `rlmcode-storage`; tests can swap in an
/// in-memory database through the same trait.
pub trait CodeStore: Send + Sync {
    // ── Files ───────────────────────────────────────────────────────

    /// Insert or replace a file record keyed by path.
    fn upsert_file(&self, file: &FileRecord) -> Result<(), RlmError>;

    /// Delete a file together with its symbols, their metrics, and every edge
    /// whose source lives in the file (including module-level edges).
    fn delete_file(&self, path: &str) -> Result<(), RlmError>;

    fn get_file(&self, path: &str) -> Result<Option<FileRecord>, RlmError>;

    /// All indexed file paths, sorted.
    fn all_file_paths(&self) -> Result<Vec<String>, RlmError>;

    fn all_files(&self) -> Result<Vec<FileRecord>, RlmError>;

    // ── Symbols ─────────────────────────────────────────────────────

    /// Insert or replace a symbol keyed by id.
    fn upsert_symbol(&self, symbol: &Symbol) -> Result<(), RlmError>;

    /// Upsert many symbols in one transaction. Default impl loops.
    fn upsert_symbols_batch(&self, symbols: &[Symbol]) -> Result<(), RlmError> {
        for symbol in symbols {
            self.upsert_symbol(symbol)?;
        }
        Ok(())
    }

    fn get_symbol(&self, id: &str) -> Result<Option<Symbol>, RlmError>;

    /// Symbols of one file, ordered by start line.
    fn symbols_for_file(&self, path: &str) -> Result<Vec<Symbol>, RlmError>;

    /// Symbols whose simple name equals `name`.
    fn symbols_by_name(&self, name: &str) -> Result<Vec<Symbol>, RlmError>;

    fn all_symbols(&self) -> Result<Vec<Symbol>, RlmError>;

    /// Case-insensitive substring match on simple or qualified name.
    fn search_symbols(&self, query: &str, limit: usize) -> Result<Vec<Symbol>, RlmError>;

    /// Delete every symbol of a file. Returns the number deleted.
    fn delete_symbols_for_file(&self, path: &str) -> Result<usize, RlmError>;

    // ── Edges ───────────────────────────────────────────────────────

    /// Insert edges; rows that collide on `(source_id, target_id, kind)` are ignored.
    fn insert_edges(&self, edges: &[Edge]) -> Result<usize, RlmError>;

    /// Delete every edge whose source id belongs to `path`. Returns the number deleted.
    fn delete_edges_for_file(&self, path: &str) -> Result<usize, RlmError>;

    fn all_edges(&self) -> Result<Vec<Edge>, RlmError>;

    /// Resolved `calls` edges pointing at `symbol_id`.
    fn callers(&self, symbol_id: &str) -> Result<Vec<Edge>, RlmError>;

    /// Resolved `calls` edges leaving `symbol_id`.
    fn callees(&self, symbol_id: &str) -> Result<Vec<Edge>, RlmError>;

    // ── Metrics ─────────────────────────────────────────────────────

    fn upsert_metrics(&self, metrics: &SymbolMetrics) -> Result<(), RlmError>;

    /// Upsert many metric rows in one transaction. Default impl loops.
    fn upsert_metrics_batch(&self, metrics: &[SymbolMetrics]) -> Result<(), RlmError> {
        for m in metrics {
            self.upsert_metrics(m)?;
        }
        Ok(())
    }

    /// Replace the whole metrics table with `metrics`.
    fn replace_metrics(&self, metrics: &[SymbolMetrics]) -> Result<(), RlmError>;

    fn get_metrics(&self, symbol_id: &str) -> Result<Option<SymbolMetrics>, RlmError>;

    fn all_metrics(&self) -> Result<Vec<SymbolMetrics>, RlmError>;

    /// Highest-pagerank symbols, descending.
    fn top_by_pagerank(&self, limit: usize) -> Result<Vec<(Symbol, SymbolMetrics)>, RlmError>;

    // ── Metadata ────────────────────────────────────────────────────

    fn get_meta(&self, key: &str) -> Result<Option<String>, RlmError>;

    fn set_meta(&self, key: &str, value: &str) -> Result<(), RlmError>;

    // ── Summaries ───────────────────────────────────────────────────

    fn upsert_summary(&self, summary: &Summary) -> Result<(), RlmError>;

    fn get_summary(&self, target_id: &str) -> Result<Option<Summary>, RlmError>;

    /// Flag the summary of `target_id` as stale. Missing summaries are a no-op.
    fn mark_summary_stale(&self, target_id: &str) -> Result<(), RlmError>;

    // ── Stats ───────────────────────────────────────────────────────

    fn stats(&self) -> Result<StoreStats, RlmError>;
}

// ── Version Control ─────────────────────────────────────────────────────────

/// Read-only view of the project's version control state.
///
/// Both calls swallow failures: `None` means "no usable VCS", which callers
/// treat as a reason to fully reindex.
pub trait VersionControl: Send + Sync {
    /// Commit id of the current HEAD.
    fn current_head(&self) -> Option<String>;

    /// File-level changes between two commits.
    fn diff(&self, since: &str, head: &str) -> Option<Vec<DiffEntry>>;
}
