use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use tracing::debug;
use vspace_core::{EngineError, ErrorInfo};

use crate::model::{not_found, NewRun, Run, RunId, RunPage, RunQuery, RunSummary, RunType};
use crate::schema::init_schema;
use crate::store::{timestamp, RunStore};

/// SQLite-backed [`RunStore`]; one row per run, payloads as JSON text.
pub struct SqliteRunStore {
    conn: Mutex<Connection>,
}

impl SqliteRunStore {
    /// Opens (or creates) the database file and initialises the schema.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let conn = Connection::open(path).map_err(|err| {
            EngineError::Persistence(
                ErrorInfo::new("runs.open", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        debug!(path = %path.display(), "opened run store");
        Self::from_connection(conn)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        let conn =
            Connection::open_in_memory().map_err(|err| EngineError::persistence("runs.open", err))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, EngineError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        self.conn
            .lock()
            .map_err(|_| EngineError::persistence("runs.lock", "run store lock poisoned"))
    }
}

fn encode(value: &Value) -> Result<String, EngineError> {
    serde_json::to_string(value).map_err(|err| EngineError::persistence("runs.encode", err))
}

fn decode(text: &str) -> Result<Value, EngineError> {
    serde_json::from_str(text).map_err(|err| EngineError::persistence("runs.decode", err))
}

fn run_type(text: &str) -> Result<RunType, EngineError> {
    text.parse()
        .map_err(|_| EngineError::persistence("runs.decode", format!("unknown run_type {text}")))
}

struct RawRun {
    id: i64,
    run_type: String,
    title: String,
    request_json: String,
    response_json: String,
    request_hash: String,
    created_at: String,
}

impl RawRun {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            run_type: row.get(1)?,
            title: row.get(2)?,
            request_json: row.get(3)?,
            response_json: row.get(4)?,
            request_hash: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_run(self) -> Result<Run, EngineError> {
        Ok(Run {
            id: RunId::from_raw(self.id),
            run_type: run_type(&self.run_type)?,
            title: self.title,
            request_json: decode(&self.request_json)?,
            response_json: decode(&self.response_json)?,
            request_hash: self.request_hash,
            created_at: self.created_at,
        })
    }
}

impl RunStore for SqliteRunStore {
    fn create(&self, run: NewRun) -> Result<Run, EngineError> {
        let title = run.resolved_title();
        let request = encode(&run.request_json)?;
        let response = encode(&run.response_json)?;
        let request_hash = run.request_hash()?;
        let conn = self.lock()?;
        let created_at = timestamp();
        conn.execute(
            "INSERT INTO runs(run_type, title, request_json, response_json, request_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![run.run_type.as_str(), title, request, response, request_hash, created_at],
        )
        .map_err(|err| EngineError::persistence("runs.insert", err))?;
        let id = RunId::from_raw(conn.last_insert_rowid());
        debug!(%id, run_type = %run.run_type, "run stored");
        Ok(Run {
            id,
            run_type: run.run_type,
            title,
            request_json: run.request_json,
            response_json: run.response_json,
            request_hash,
            created_at,
        })
    }

    fn list(&self, query: &RunQuery) -> Result<RunPage, EngineError> {
        query.validate()?;
        let filter = query.run_type.map(|t| t.as_str());
        let conn = self.lock()?;
        let total: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM runs WHERE (?1 IS NULL OR run_type = ?1)",
                params![filter],
                |row| row.get(0),
            )
            .map_err(|err| EngineError::persistence("runs.query", err))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, run_type, title, request_hash, created_at FROM runs
                 WHERE (?1 IS NULL OR run_type = ?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .map_err(|err| EngineError::persistence("runs.query", err))?;
        let rows = stmt
            .query_map(
                params![filter, query.limit as i64, query.skip as i64],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .map_err(|err| EngineError::persistence("runs.query", err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| EngineError::persistence("runs.query", err))?;
        let items = rows
            .into_iter()
            .map(|(id, kind, title, request_hash, created_at)| {
                Ok(RunSummary {
                    id: RunId::from_raw(id),
                    run_type: run_type(&kind)?,
                    title,
                    request_hash,
                    created_at,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(RunPage {
            items,
            total: total as usize,
            skip: query.skip,
            limit: query.limit,
        })
    }

    fn get(&self, id: RunId) -> Result<Run, EngineError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT id, run_type, title, request_json, response_json, request_hash, created_at
                 FROM runs WHERE id = ?",
                params![id.as_raw()],
                RawRun::from_row,
            )
            .optional()
            .map_err(|err| EngineError::persistence("runs.query", err))?;
        raw.ok_or_else(|| not_found(id))?.into_run()
    }

    fn delete(&self, id: RunId) -> Result<(), EngineError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM runs WHERE id = ?", params![id.as_raw()])
            .map_err(|err| EngineError::persistence("runs.delete", err))?;
        if removed == 0 {
            return Err(not_found(id));
        }
        debug!(%id, "run deleted");
        Ok(())
    }
}
