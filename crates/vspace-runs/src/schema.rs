use rusqlite::{params, Connection, OptionalExtension};
use vspace_core::{EngineError, ErrorInfo};

pub const SCHEMA_VERSION: i64 = 1;

/// Creates the run table and stamps the schema version.
pub fn init_schema(conn: &Connection) -> Result<(), EngineError> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS meta(version INTEGER NOT NULL);
        CREATE TABLE IF NOT EXISTS runs(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_type TEXT NOT NULL CHECK (run_type IN ('doe', 'optimize')),
            title TEXT NOT NULL,
            request_json TEXT NOT NULL,
            response_json TEXT NOT NULL,
            request_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS runs_request_hash ON runs(request_hash);
        CREATE INDEX IF NOT EXISTS runs_created_at ON runs(created_at DESC, id DESC);
        COMMIT;",
    )
    .map_err(|err| EngineError::persistence("runs.schema", err))?;
    set_version(conn, SCHEMA_VERSION)
}

fn set_version(conn: &Connection, version: i64) -> Result<(), EngineError> {
    let existing: Option<i64> = conn
        .query_row("SELECT version FROM meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| EngineError::persistence("runs.schema", err))?;
    match existing {
        Some(current) if current == version => Ok(()),
        Some(current) => Err(EngineError::Persistence(
            ErrorInfo::new(
                "runs.schema_version",
                format!("run store schema {current} incompatible with expected {version}"),
            )
            .with_hint("point the service at a fresh database file"),
        )),
        None => {
            conn.execute("INSERT INTO meta(version) VALUES (?)", params![version])
                .map_err(|err| EngineError::persistence("runs.schema", err))?;
            Ok(())
        }
    }
}
