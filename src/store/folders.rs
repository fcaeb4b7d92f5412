use crate::errors::{AppError, AppResult};
use crate::models::{Folder, FolderId, FolderRecord, ScopeId};
use chrono::Utc;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_ID_ATTEMPTS: usize = 16;

/// Folder definitions per scope. Membership is never stored here; see
/// [`super::AssociationIndex`].
#[derive(Debug, Default, Clone)]
pub struct FolderStore {
    scopes: HashMap<ScopeId, Vec<Folder>>,
}

impl FolderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a folder named `name` (trimmed). Blank names are declined with `None`.
    pub fn create_folder(&mut self, scope: &ScopeId, name: &str) -> Option<Folder> {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!(scope = %scope, "declined folder creation with blank name");
            return None;
        }

        let id = match self.unused_folder_id(scope) {
            Ok(id) => id,
            Err(error) => {
                tracing::error!(scope = %scope, error = %error, "folder creation aborted");
                return None;
            }
        };
        let folders = self.scopes.entry(scope.clone()).or_default();
        let order = next_order(folders);
        if order.is_none() && !folders.is_empty() {
            tracing::debug!(scope = %scope, "new folder falls back to insertion order");
        }
        let folder = Folder {
            id,
            name: name.to_string(),
            collapsed: false,
            order,
        };
        folders.push(folder.clone());
        tracing::info!(scope = %scope, folder_id = %folder.id, name = %folder.name, "folder created");
        Some(folder)
    }

    /// Returns `true` when the stored name actually changed.
    pub fn rename_folder(&mut self, scope: &ScopeId, id: &FolderId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(folder) = self.get_mut(scope, id) else {
            tracing::debug!(scope = %scope, folder_id = %id, "rename of unknown folder ignored");
            return false;
        };
        if folder.name == name {
            return false;
        }
        folder.name = name.to_string();
        true
    }

    /// Removes the folder definition only. Callers wanting the cascade use
    /// [`super::ScopeStore::delete_folder`].
    pub(crate) fn remove_folder(&mut self, scope: &ScopeId, id: &FolderId) -> Option<Folder> {
        let folders = self.scopes.get_mut(scope)?;
        let index = folders.iter().position(|folder| &folder.id == id)?;
        Some(folders.remove(index))
    }

    /// Folders of `scope` in display order: explicit `order` first, then insertion order.
    pub fn folders(&self, scope: &ScopeId) -> Vec<Folder> {
        let mut folders = self.scopes.get(scope).cloned().unwrap_or_default();
        folders.sort_by_key(|folder| (folder.order.is_none(), folder.order.unwrap_or_default()));
        folders
    }

    pub fn get(&self, scope: &ScopeId, id: &FolderId) -> Option<&Folder> {
        self.scopes.get(scope)?.iter().find(|folder| &folder.id == id)
    }

    pub fn contains(&self, scope: &ScopeId, id: &FolderId) -> bool {
        self.get(scope, id).is_some()
    }

    pub fn set_collapsed(&mut self, scope: &ScopeId, id: &FolderId, collapsed: bool) -> bool {
        match self.get_mut(scope, id) {
            Some(folder) => {
                folder.collapsed = collapsed;
                true
            }
            None => false,
        }
    }

    pub fn toggle_collapsed(&mut self, scope: &ScopeId, id: &FolderId) -> Option<bool> {
        let folder = self.get_mut(scope, id)?;
        folder.collapsed = !folder.collapsed;
        Some(folder.collapsed)
    }

    pub fn set_order(&mut self, scope: &ScopeId, id: &FolderId, order: Option<i64>) -> bool {
        match self.get_mut(scope, id) {
            Some(folder) => {
                folder.order = order;
                true
            }
            None => false,
        }
    }

    pub fn records(&self, scope: &ScopeId) -> BTreeMap<FolderId, FolderRecord> {
        self.scopes
            .get(scope)
            .map(|folders| {
                folders
                    .iter()
                    .map(|folder| (folder.id.clone(), folder.record()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn replace_scope(&mut self, scope: &ScopeId, records: BTreeMap<FolderId, FolderRecord>) {
        let folders = records
            .into_iter()
            .filter_map(|(id, record)| {
                let name = record.name.trim().to_string();
                if name.is_empty() {
                    tracing::warn!(scope = %scope, folder_id = %id, "dropping persisted folder with blank name");
                    return None;
                }
                Some(Folder {
                    id,
                    name,
                    collapsed: record.collapsed,
                    order: record.order,
                })
            })
            .collect();
        self.scopes.insert(scope.clone(), folders);
    }

    fn get_mut(&mut self, scope: &ScopeId, id: &FolderId) -> Option<&mut Folder> {
        self.scopes.get_mut(scope)?.iter_mut().find(|folder| &folder.id == id)
    }

    fn unused_folder_id(&self, scope: &ScopeId) -> AppResult<FolderId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = generate_folder_id();
            if !self.contains(scope, &candidate) {
                return Ok(candidate);
            }
            tracing::error!(scope = %scope, folder_id = %candidate, "folder id collision; regenerating");
        }
        Err(AppError::Invariant(format!(
            "no unused folder id for scope {scope} after {MAX_ID_ATTEMPTS} attempts"
        )))
    }
}

/// Rank for a folder appended to `folders`. Unranked folders sort after ranked
/// ones, so once any folder is unranked (or the rank space is exhausted) the new
/// folder goes unranked too and lands last by insertion order.
fn next_order(folders: &[Folder]) -> Option<i64> {
    if folders.iter().any(|folder| folder.order.is_none()) {
        return None;
    }
    match folders.iter().filter_map(|folder| folder.order).max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

pub fn generate_folder_id() -> FolderId {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix = (0..9)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect::<String>();
    FolderId::new(format!("folder_{millis}_{suffix}"))
}
