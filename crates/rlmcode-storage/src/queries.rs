//! Metadata, summary cache, search and statistics queries.

use crate::{query_symbols, Storage, SummaryRow, SYMBOL_COLUMNS};
use rlmcode_core::{RlmError, StoreStats, Summary, Symbol};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

impl Storage {
    // ── Metadata ────────────────────────────────────────────────────

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, RlmError> {
        let conn = self.conn()?;
        conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| RlmError::Storage(e.to_string()))
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), RlmError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Summaries ───────────────────────────────────────────────────

    pub fn upsert_summary(&self, summary: &Summary) -> Result<(), RlmError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO summaries
                (target_id, target_kind, summary_text, model, generated_at, is_stale)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                summary.target_id,
                summary.target_kind.to_string(),
                summary.summary_text,
                summary.model,
                summary.generated_at.timestamp(),
                summary.is_stale,
            ],
        )
        .map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_summary(&self, target_id: &str) -> Result<Option<Summary>, RlmError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT target_id, target_kind, summary_text, model, generated_at, is_stale
                 FROM summaries WHERE target_id = ?1",
                [target_id],
                SummaryRow::from_row,
            )
            .optional()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        row.map(SummaryRow::into_summary).transpose()
    }

    pub fn mark_summary_stale(&self, target_id: &str) -> Result<(), RlmError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE summaries SET is_stale = 1 WHERE target_id = ?1",
            [target_id],
        )
        .map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Search ──────────────────────────────────────────────────────

    pub fn search_symbols(&self, query: &str, limit: usize) -> Result<Vec<Symbol>, RlmError> {
        let conn = self.conn()?;
        let pattern = format!("%{}%", query.to_lowercase());
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbols
             WHERE lower(name) LIKE ?1 OR lower(qualified_name) LIKE ?1
             ORDER BY length(name), id
             LIMIT ?2"
        );
        query_symbols(&conn, &sql, params![pattern, limit as i64])
    }

    // ── Stats ───────────────────────────────────────────────────────

    pub fn stats(&self) -> Result<StoreStats, RlmError> {
        let conn = self.conn()?;
        let count = |sql: &str| -> Result<usize, RlmError> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
                .map_err(|e| RlmError::Storage(e.to_string()))
        };
        let group = |sql: &str| -> Result<BTreeMap<String, usize>, RlmError> {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| RlmError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
                })
                .map_err(|e| RlmError::Storage(e.to_string()))?;
            rows.collect::<Result<BTreeMap<_, _>, _>>()
                .map_err(|e| RlmError::Storage(e.to_string()))
        };

        Ok(StoreStats {
            files: count("SELECT COUNT(*) FROM files")?,
            symbols: count("SELECT COUNT(*) FROM symbols")?,
            edges: count("SELECT COUNT(*) FROM edges")?,
            resolved_edges: count("SELECT COUNT(*) FROM edges WHERE resolved = 1")?,
            metrics: count("SELECT COUNT(*) FROM metrics")?,
            summaries: count("SELECT COUNT(*) FROM summaries")?,
            by_language: group("SELECT language, COUNT(*) FROM files GROUP BY language")?,
            by_kind: group("SELECT kind, COUNT(*) FROM symbols GROUP BY kind")?,
        })
    }
}
