//! Edge and metrics persistence.

use crate::{metrics_from_row, query_edges, Storage, SymbolRow, EDGE_COLUMNS, METRICS_COLUMNS};
use rlmcode_core::{Edge, RlmError, Symbol, SymbolMetrics};
use rusqlite::{params, Connection, OptionalExtension};

impl Storage {
    // ── Edges ───────────────────────────────────────────────────────

    /// Insert edges, ignoring rows whose `(source_id, target_id, kind)` already exists.
    /// Returns the number of rows actually inserted.
    pub fn insert_edges(&self, edges: &[Edge]) -> Result<usize, RlmError> {
        if edges.is_empty() {
            return Ok(0);
        }
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RlmError::Storage(e.to_string()))?;

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO edges (source_id, target_id, kind, resolved)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| RlmError::Storage(e.to_string()))?;
            for edge in edges {
                inserted += stmt
                    .execute(params![
                        edge.source_id,
                        edge.target_id,
                        edge.kind.to_string(),
                        edge.resolved,
                    ])
                    .map_err(|e| RlmError::Storage(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(inserted)
    }

    pub fn delete_edges_for_file(&self, path: &str) -> Result<usize, RlmError> {
        let conn = self.conn()?;
        delete_edges_for_file_in(&conn, path)
    }

    pub fn all_edges(&self) -> Result<Vec<Edge>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {EDGE_COLUMNS} FROM edges ORDER BY rowid");
        query_edges(&conn, &sql, [])
    }

    pub fn callers(&self, symbol_id: &str) -> Result<Vec<Edge>, RlmError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edges
             WHERE target_id = ?1 AND kind = 'calls' AND resolved = 1
             ORDER BY source_id"
        );
        query_edges(&conn, &sql, [symbol_id])
    }

    pub fn callees(&self, symbol_id: &str) -> Result<Vec<Edge>, RlmError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edges
             WHERE source_id = ?1 AND kind = 'calls' AND resolved = 1
             ORDER BY target_id"
        );
        query_edges(&conn, &sql, [symbol_id])
    }

    // ── Metrics ─────────────────────────────────────────────────────

    pub fn upsert_metrics(&self, metrics: &SymbolMetrics) -> Result<(), RlmError> {
        let conn = self.conn()?;
        upsert_metrics_in(&conn, metrics)
    }

    pub fn upsert_metrics_batch(&self, metrics: &[SymbolMetrics]) -> Result<(), RlmError> {
        if metrics.is_empty() {
            return Ok(());
        }
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        for m in metrics {
            upsert_metrics_in(&tx, m)?;
        }
        tx.commit().map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Drop every metric row and write `metrics` in its place, atomically.
    pub fn replace_metrics(&self, metrics: &[SymbolMetrics]) -> Result<(), RlmError> {
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        tx.execute("DELETE FROM metrics", [])
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        for m in metrics {
            upsert_metrics_in(&tx, m)?;
        }
        tx.commit().map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_metrics(&self, symbol_id: &str) -> Result<Option<SymbolMetrics>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {METRICS_COLUMNS} FROM metrics WHERE symbol_id = ?1");
        conn.query_row(&sql, [symbol_id], metrics_from_row)
            .optional()
            .map_err(|e| RlmError::Storage(e.to_string()))
    }

    pub fn all_metrics(&self) -> Result<Vec<SymbolMetrics>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {METRICS_COLUMNS} FROM metrics ORDER BY symbol_id");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        let metrics = stmt
            .query_map([], metrics_from_row)
            .map_err(|e| RlmError::Storage(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(metrics)
    }

    /// Highest-pagerank symbols joined with their metrics. Ties break by id.
    pub fn top_by_pagerank(&self, limit: usize) -> Result<Vec<(Symbol, SymbolMetrics)>, RlmError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT s.id, s.file_path, s.name, s.qualified_name, s.kind, s.start_line,
                        s.end_line, s.signature,
                        m.in_degree, m.out_degree, m.betweenness, m.pagerank
                 FROM metrics m JOIN symbols s ON s.id = m.symbol_id
                 ORDER BY m.pagerank DESC, s.id ASC
                 LIMIT ?1",
            )
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                let symbol = SymbolRow::from_row(row)?;
                let in_degree: i64 = row.get(8)?;
                let out_degree: i64 = row.get(9)?;
                let betweenness: f64 = row.get(10)?;
                let pagerank: f64 = row.get(11)?;
                Ok((symbol, in_degree, out_degree, betweenness, pagerank))
            })
            .map_err(|e| RlmError::Storage(e.to_string()))?;

        let mut top = Vec::new();
        for row in rows {
            let (symbol, in_degree, out_degree, betweenness, pagerank) =
                row.map_err(|e| RlmError::Storage(e.to_string()))?;
            let symbol = symbol.into_symbol()?;
            let metrics = SymbolMetrics {
                symbol_id: symbol.id.clone(),
                in_degree: in_degree as usize,
                out_degree: out_degree as usize,
                betweenness,
                pagerank,
            };
            top.push((symbol, metrics));
        }
        Ok(top)
    }
}

/// Every edge whose source id starts with `"{path}::"`, written as a range
/// (`';'` follows `':'`) so it can search `idx_edges_source`.
pub(crate) const DELETE_EDGES_FOR_FILE: &str =
    "DELETE FROM edges WHERE source_id >= ?1 || '::' AND source_id < ?1 || ':;'";

/// Delete the edges of a file's symbols and of its module-level source id.
pub(crate) fn delete_edges_for_file_in(conn: &Connection, path: &str) -> Result<usize, RlmError> {
    conn.execute(DELETE_EDGES_FOR_FILE, [path])
        .map_err(|e| RlmError::Storage(e.to_string()))
}

fn upsert_metrics_in(conn: &Connection, m: &SymbolMetrics) -> Result<(), RlmError> {
    conn.execute(
        "INSERT OR REPLACE INTO metrics (symbol_id, in_degree, out_degree, betweenness, pagerank)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            m.symbol_id,
            m.in_degree as i64,
            m.out_degree as i64,
            m.betweenness,
            m.pagerank,
        ],
    )
    .map_err(|e| RlmError::Storage(e.to_string()))?;
    Ok(())
}
