use super::{PersistenceAdapter, SNAPSHOT_VERSION};
use crate::errors::{AppError, AppResult};
use crate::models::{EntryId, FolderId, FolderRecord, ScopeId, ScopeSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// On-disk shape: every scope's folders and associations in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub folders: BTreeMap<ScopeId, BTreeMap<FolderId, FolderRecord>>,
    #[serde(default)]
    pub associations: BTreeMap<ScopeId, BTreeMap<EntryId, FolderId>>,
}

impl PersistedDocument {
    pub fn scope(&self, scope: &ScopeId) -> ScopeSnapshot {
        ScopeSnapshot {
            folders: self.folders.get(scope).cloned().unwrap_or_default(),
            associations: self.associations.get(scope).cloned().unwrap_or_default(),
        }
    }

    pub fn set_scope(&mut self, scope: &ScopeId, snapshot: &ScopeSnapshot) {
        if snapshot.folders.is_empty() {
            self.folders.remove(scope);
        } else {
            self.folders.insert(scope.clone(), snapshot.folders.clone());
        }
        if snapshot.associations.is_empty() {
            self.associations.remove(scope);
        } else {
            self.associations.insert(scope.clone(), snapshot.associations.clone());
        }
    }
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_document(&self) -> AppResult<PersistedDocument> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(PersistedDocument::default()),
            Err(error) => return Err(AppError::Io(error.to_string())),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(PersistedDocument::default());
        }
        serde_json::from_slice(&bytes).map_err(|error| {
            AppError::Persistence(format!(
                "corrupt folder document {}: {}",
                self.path.to_string_lossy(),
                error
            ))
        })
    }

    fn write_document(&self, document: &PersistedDocument) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| AppError::Io(error.to_string()))?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, bytes).map_err(|error| AppError::Io(error.to_string()))?;
        fs::rename(&temp, &self.path).map_err(|error| AppError::Io(error.to_string()))
    }

    fn quarantine_corrupt(&self) {
        let target = self.path.with_extension("json.corrupt");
        match fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!(
                path = %target.to_string_lossy(),
                "moved unreadable folder document aside"
            ),
            Err(error) => tracing::warn!(error = %error, "could not move unreadable folder document aside"),
        }
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn load(&self, scope: &ScopeId) -> AppResult<ScopeSnapshot> {
        Ok(self.read_document()?.scope(scope))
    }

    fn save(&self, scope: &ScopeId, snapshot: &ScopeSnapshot) -> AppResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Internal("json store mutex poisoned".to_string()))?;

        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(AppError::Persistence(message)) => {
                tracing::warn!(error = %message, "rewriting corrupt folder document");
                self.quarantine_corrupt();
                PersistedDocument::default()
            }
            Err(error) => return Err(error),
        };
        document.version = Some(SNAPSHOT_VERSION.to_string());
        document.set_scope(scope, snapshot);
        self.write_document(&document)
    }

    fn scopes(&self) -> AppResult<Vec<ScopeId>> {
        let document = self.read_document()?;
        let scopes = document
            .folders
            .keys()
            .chain(document.associations.keys())
            .cloned()
            .collect::<BTreeSet<_>>();
        Ok(scopes.into_iter().collect())
    }
}
