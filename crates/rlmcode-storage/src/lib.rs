//! rlmcode-storage: SQLite persistence layer for rlm-code.
//!
//! Uses rusqlite with bundled SQLite, WAL mode, and a versioned embedded schema.

use chrono::{DateTime, Utc};
use rlmcode_core::{
    Edge, EdgeKind, FileRecord, Language, RlmError, Summary, SummaryKind, Symbol, SymbolKind,
    SymbolMetrics,
};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

mod backend;
mod files;
mod graph_persistence;
mod migrations;
mod queries;

/// Default SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store for files, symbols, edges, metrics and summaries.
///
/// Wraps `rusqlite::Connection` in a `Mutex` to satisfy the `Send + Sync`
/// bounds of `CodeStore`; the lock is held for the whole of each operation.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Get a lock on the underlying connection.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, RlmError> {
        self.conn
            .lock()
            .map_err(|e| RlmError::LockPoisoned(e.to_string()))
    }

    /// Open (or create) a store at the given path with the default busy timeout.
    pub fn open(path: &Path) -> Result<Self, RlmError> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open (or create) a store at the given path.
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, RlmError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|e| RlmError::Storage(e.to_string()))?;

        // WAL mode for concurrent readers
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        conn.pragma_update(None, "temp_store", "MEMORY")
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        conn.busy_timeout(busy_timeout)
            .map_err(|e| RlmError::Storage(e.to_string()))?;

        migrations::run_migrations(&conn)?;
        tracing::debug!("Opened store at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, RlmError> {
        let conn = Connection::open_in_memory().map_err(|e| RlmError::Storage(e.to_string()))?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

// ── Row Structs ─────────────────────────────────────────────────────────────

pub(crate) const SYMBOL_COLUMNS: &str =
    "id, file_path, name, qualified_name, kind, start_line, end_line, signature";

/// Internal row struct for symbol deserialization.
pub(crate) struct SymbolRow {
    id: String,
    file_path: String,
    name: String,
    qualified_name: String,
    kind: String,
    start_line: i64,
    end_line: i64,
    signature: Option<String>,
}

impl SymbolRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            file_path: row.get(1)?,
            name: row.get(2)?,
            qualified_name: row.get(3)?,
            kind: row.get(4)?,
            start_line: row.get(5)?,
            end_line: row.get(6)?,
            signature: row.get(7)?,
        })
    }

    pub(crate) fn into_symbol(self) -> Result<Symbol, RlmError> {
        let kind: SymbolKind = self.kind.parse()?;
        Ok(Symbol {
            id: self.id,
            file_path: self.file_path,
            name: self.name,
            qualified_name: self.qualified_name,
            kind,
            start_line: self.start_line as usize,
            end_line: self.end_line as usize,
            signature: self.signature.unwrap_or_default(),
        })
    }
}

pub(crate) const FILE_COLUMNS: &str = "path, language, content_hash, line_count, last_indexed";

/// Internal row struct for file record deserialization.
pub(crate) struct FileRow {
    path: String,
    language: String,
    content_hash: String,
    line_count: i64,
    last_indexed: i64,
}

impl FileRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            language: row.get(1)?,
            content_hash: row.get(2)?,
            line_count: row.get(3)?,
            last_indexed: row.get(4)?,
        })
    }

    pub(crate) fn into_file_record(self) -> Result<FileRecord, RlmError> {
        let language: Language = self.language.parse()?;
        Ok(FileRecord {
            path: self.path,
            language,
            content_hash: self.content_hash,
            line_count: self.line_count as usize,
            last_indexed: timestamp_to_datetime(self.last_indexed),
        })
    }
}

pub(crate) const EDGE_COLUMNS: &str = "source_id, target_id, kind, resolved";

/// Internal row struct for edge deserialization.
pub(crate) struct EdgeRow {
    source_id: String,
    target_id: String,
    kind: String,
    resolved: bool,
}

impl EdgeRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            source_id: row.get(0)?,
            target_id: row.get(1)?,
            kind: row.get(2)?,
            resolved: row.get(3)?,
        })
    }

    pub(crate) fn into_edge(self) -> Result<Edge, RlmError> {
        let kind: EdgeKind = self.kind.parse()?;
        Ok(Edge {
            source_id: self.source_id,
            target_id: self.target_id,
            kind,
            resolved: self.resolved,
        })
    }
}

pub(crate) const METRICS_COLUMNS: &str =
    "symbol_id, in_degree, out_degree, betweenness, pagerank";

pub(crate) fn metrics_from_row(row: &Row<'_>) -> rusqlite::Result<SymbolMetrics> {
    let in_degree: i64 = row.get(1)?;
    let out_degree: i64 = row.get(2)?;
    Ok(SymbolMetrics {
        symbol_id: row.get(0)?,
        in_degree: in_degree as usize,
        out_degree: out_degree as usize,
        betweenness: row.get(3)?,
        pagerank: row.get(4)?,
    })
}

/// Internal row struct for summary deserialization.
pub(crate) struct SummaryRow {
    target_id: String,
    target_kind: String,
    summary_text: Option<String>,
    model: Option<String>,
    generated_at: Option<i64>,
    is_stale: bool,
}

impl SummaryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            target_id: row.get(0)?,
            target_kind: row.get(1)?,
            summary_text: row.get(2)?,
            model: row.get(3)?,
            generated_at: row.get(4)?,
            is_stale: row.get(5)?,
        })
    }

    pub(crate) fn into_summary(self) -> Result<Summary, RlmError> {
        let target_kind: SummaryKind = self.target_kind.parse()?;
        Ok(Summary {
            target_id: self.target_id,
            target_kind,
            summary_text: self.summary_text.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            generated_at: timestamp_to_datetime(self.generated_at.unwrap_or(0)),
            is_stale: self.is_stale,
        })
    }
}

/// Run a symbol query and convert every row.
pub(crate) fn query_symbols<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Symbol>, RlmError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| RlmError::Storage(e.to_string()))?;
    let rows = stmt
        .query_map(params, SymbolRow::from_row)
        .map_err(|e| RlmError::Storage(e.to_string()))?;

    let mut symbols = Vec::new();
    for row in rows {
        let row = row.map_err(|e| RlmError::Storage(e.to_string()))?;
        symbols.push(row.into_symbol()?);
    }
    Ok(symbols)
}

/// Run an edge query and convert every row.
pub(crate) fn query_edges<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Edge>, RlmError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| RlmError::Storage(e.to_string()))?;
    let rows = stmt
        .query_map(params, EdgeRow::from_row)
        .map_err(|e| RlmError::Storage(e.to_string()))?;

    let mut edges = Vec::new();
    for row in rows {
        let row = row.map_err(|e| RlmError::Storage(e.to_string()))?;
        edges.push(row.into_edge()?);
    }
    Ok(edges)
}
