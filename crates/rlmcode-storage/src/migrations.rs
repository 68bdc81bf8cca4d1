use rlmcode_core::RlmError;
use rusqlite::Connection;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const INITIAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key     TEXT PRIMARY KEY,
    value   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    path            TEXT PRIMARY KEY,
    language        TEXT NOT NULL,
    content_hash    TEXT NOT NULL,
    line_count      INTEGER NOT NULL DEFAULT 0,
    last_indexed    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS symbols (
    id              TEXT PRIMARY KEY,
    file_path       TEXT NOT NULL,
    name            TEXT NOT NULL,
    qualified_name  TEXT NOT NULL,
    kind            TEXT NOT NULL,
    start_line      INTEGER NOT NULL,
    end_line        INTEGER NOT NULL,
    signature       TEXT
);

CREATE TABLE IF NOT EXISTS edges (
    source_id   TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    kind        TEXT NOT NULL,
    resolved    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (source_id, target_id, kind)
);

CREATE TABLE IF NOT EXISTS metrics (
    symbol_id   TEXT PRIMARY KEY,
    in_degree   INTEGER NOT NULL DEFAULT 0,
    out_degree  INTEGER NOT NULL DEFAULT 0,
    betweenness REAL NOT NULL DEFAULT 0.0,
    pagerank    REAL NOT NULL DEFAULT 0.0
);
";

const LOOKUP_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_path);
CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);
CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(kind);
CREATE INDEX IF NOT EXISTS idx_metrics_pagerank ON metrics(pagerank DESC);
";

const SUMMARIES: &str = "
CREATE TABLE IF NOT EXISTS summaries (
    target_id       TEXT PRIMARY KEY,
    target_kind     TEXT NOT NULL,
    summary_text    TEXT,
    model           TEXT,
    generated_at    INTEGER,
    is_stale        INTEGER NOT NULL DEFAULT 1
);
";

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: INITIAL_SCHEMA,
    },
    Migration {
        version: 2,
        description: "Lookup indexes",
        sql: LOOKUP_INDEXES,
    },
    Migration {
        version: 3,
        description: "Summary cache",
        sql: SUMMARIES,
    },
];

/// Run all pending migrations on the given connection.
pub(crate) fn run_migrations(conn: &Connection) -> Result<(), RlmError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        );",
    )
    .map_err(|e| RlmError::Storage(e.to_string()))?;

    let current_version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| RlmError::Storage(e.to_string()))?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.sql).map_err(|e| {
                RlmError::Storage(format!(
                    "Migration {} ({}) failed: {}",
                    migration.version, migration.description, e
                ))
            })?;
            conn.execute(
                "INSERT INTO schema_version (version, description, applied_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    migration.version,
                    migration.description,
                    chrono::Utc::now().timestamp()
                ],
            )
            .map_err(|e| RlmError::Storage(e.to_string()))?;
        }
    }

    Ok(())
}
