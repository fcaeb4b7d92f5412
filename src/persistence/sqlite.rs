use super::{PersistenceAdapter, SNAPSHOT_VERSION};
use crate::errors::{AppError, AppResult};
use crate::models::{ScopeId, ScopeSnapshot};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS scope_snapshots (
  scope TEXT PRIMARY KEY,
  version TEXT NOT NULL,
  payload_json TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl PersistenceAdapter for SqliteStore {
    fn load(&self, scope: &ScopeId) -> AppResult<ScopeSnapshot> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM scope_snapshots WHERE scope = ?1",
                [scope.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => serde_json::from_str(&payload).map_err(|error| {
                AppError::Persistence(format!("corrupt snapshot for scope {}: {}", scope, error))
            }),
            None => Ok(ScopeSnapshot::default()),
        }
    }

    fn save(&self, scope: &ScopeId, snapshot: &ScopeSnapshot) -> AppResult<()> {
        let payload = serde_json::to_string(snapshot)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO scope_snapshots (scope, version, payload_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope) DO UPDATE SET
               version = excluded.version,
               payload_json = excluded.payload_json,
               updated_at = excluded.updated_at",
            params![scope.as_str(), SNAPSHOT_VERSION, payload, now],
        )?;
        Ok(())
    }

    fn scopes(&self) -> AppResult<Vec<ScopeId>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare("SELECT scope FROM scope_snapshots ORDER BY scope")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut scopes = Vec::new();
        for row in rows {
            scopes.push(ScopeId::new(row?));
        }
        Ok(scopes)
    }
}
