use super::PersistenceAdapter;
use crate::errors::{AppError, AppResult};
use crate::models::{ScopeId, ScopeSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    scopes: Mutex<HashMap<ScopeId, ScopeSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&self, scope: &ScopeId) -> AppResult<ScopeSnapshot> {
        let scopes = self
            .scopes
            .lock()
            .map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        Ok(scopes.get(scope).cloned().unwrap_or_default())
    }

    fn save(&self, scope: &ScopeId, snapshot: &ScopeSnapshot) -> AppResult<()> {
        let mut scopes = self
            .scopes
            .lock()
            .map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        scopes.insert(scope.clone(), snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn scopes(&self) -> AppResult<Vec<ScopeId>> {
        let scopes = self
            .scopes
            .lock()
            .map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let mut names = scopes.keys().cloned().collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }
}
