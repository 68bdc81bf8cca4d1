//! File record and symbol persistence.

use crate::graph_persistence::delete_edges_for_file_in;
use crate::{query_symbols, FileRow, Storage, FILE_COLUMNS, SYMBOL_COLUMNS};
use rlmcode_core::{FileRecord, RlmError, Symbol};
use rusqlite::{params, Connection, OptionalExtension};

impl Storage {
    // ── Files ───────────────────────────────────────────────────────

    pub fn upsert_file(&self, file: &FileRecord) -> Result<(), RlmError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO files (path, language, content_hash, line_count, last_indexed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                file.path,
                file.language.as_str(),
                file.content_hash,
                file.line_count as i64,
                file.last_indexed.timestamp(),
            ],
        )
        .map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Remove a file and everything extracted from it, in one transaction.
    pub fn delete_file(&self, path: &str) -> Result<(), RlmError> {
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RlmError::Storage(e.to_string()))?;

        delete_edges_for_file_in(&tx, path)?;
        tx.execute(
            "DELETE FROM metrics WHERE symbol_id IN (SELECT id FROM symbols WHERE file_path = ?1)",
            [path],
        )
        .map_err(|e| RlmError::Storage(e.to_string()))?;
        delete_symbols_for_file_in(&tx, path)?;
        tx.execute("DELETE FROM files WHERE path = ?1", [path])
            .map_err(|e| RlmError::Storage(e.to_string()))?;

        tx.commit().map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_file(&self, path: &str) -> Result<Option<FileRecord>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE path = ?1");
        let row = conn
            .query_row(&sql, [path], FileRow::from_row)
            .optional()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        row.map(FileRow::into_file_record).transpose()
    }

    pub fn all_file_paths(&self) -> Result<Vec<String>, RlmError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT path FROM files ORDER BY path")
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        let paths = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| RlmError::Storage(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(paths)
    }

    pub fn all_files(&self) -> Result<Vec<FileRecord>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {FILE_COLUMNS} FROM files ORDER BY path");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], FileRow::from_row)
            .map_err(|e| RlmError::Storage(e.to_string()))?;

        let mut files = Vec::new();
        for row in rows {
            let row = row.map_err(|e| RlmError::Storage(e.to_string()))?;
            files.push(row.into_file_record()?);
        }
        Ok(files)
    }

    // ── Symbols ─────────────────────────────────────────────────────

    pub fn upsert_symbol(&self, symbol: &Symbol) -> Result<(), RlmError> {
        let conn = self.conn()?;
        upsert_symbol_in(&conn, symbol)
    }

    pub fn upsert_symbols_batch(&self, symbols: &[Symbol]) -> Result<(), RlmError> {
        if symbols.is_empty() {
            return Ok(());
        }
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        for symbol in symbols {
            upsert_symbol_in(&tx, symbol)?;
        }
        tx.commit().map_err(|e| RlmError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_symbol(&self, id: &str) -> Result<Option<Symbol>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {SYMBOL_COLUMNS} FROM symbols WHERE id = ?1");
        Ok(query_symbols(&conn, &sql, [id])?.into_iter().next())
    }

    pub fn symbols_for_file(&self, path: &str) -> Result<Vec<Symbol>, RlmError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbols WHERE file_path = ?1 ORDER BY start_line, id"
        );
        query_symbols(&conn, &sql, [path])
    }

    pub fn symbols_by_name(&self, name: &str) -> Result<Vec<Symbol>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {SYMBOL_COLUMNS} FROM symbols WHERE name = ?1 ORDER BY id");
        query_symbols(&conn, &sql, [name])
    }

    pub fn all_symbols(&self) -> Result<Vec<Symbol>, RlmError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {SYMBOL_COLUMNS} FROM symbols ORDER BY id");
        query_symbols(&conn, &sql, [])
    }

    pub fn delete_symbols_for_file(&self, path: &str) -> Result<usize, RlmError> {
        let conn = self.conn()?;
        delete_symbols_for_file_in(&conn, path)
    }
}

fn upsert_symbol_in(conn: &Connection, symbol: &Symbol) -> Result<(), RlmError> {
    conn.execute(
        "INSERT OR REPLACE INTO symbols
            (id, file_path, name, qualified_name, kind, start_line, end_line, signature)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            symbol.id,
            symbol.file_path,
            symbol.name,
            symbol.qualified_name,
            symbol.kind.to_string(),
            symbol.start_line as i64,
            symbol.end_line as i64,
            symbol.signature,
        ],
    )
    .map_err(|e| RlmError::Storage(e.to_string()))?;
    Ok(())
}

fn delete_symbols_for_file_in(conn: &Connection, path: &str) -> Result<usize, RlmError> {
    conn.execute("DELETE FROM symbols WHERE file_path = ?1", [path])
        .map_err(|e| RlmError::Storage(e.to_string()))
}
