mod associations;
mod folders;

pub use associations::AssociationIndex;
pub use folders::{generate_folder_id, FolderStore};

use crate::models::{DeletedFolder, EntryId, Folder, FolderId, ScopeId, ScopeSnapshot};
use std::collections::HashSet;

/// Owns the folder and association data of every scope touched this session.
///
/// All cross-structure invariants live here: deleting a folder clears its
/// associations in the same call, and lookups never report a folder that does
/// not exist.
#[derive(Debug, Default)]
pub struct ScopeStore {
    folders: FolderStore,
    associations: AssociationIndex,
    loaded: HashSet<ScopeId>,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folders(&self) -> &FolderStore {
        &self.folders
    }

    pub fn folders_mut(&mut self) -> &mut FolderStore {
        &mut self.folders
    }

    pub fn associations(&self) -> &AssociationIndex {
        &self.associations
    }

    pub fn is_loaded(&self, scope: &ScopeId) -> bool {
        self.loaded.contains(scope)
    }

    pub fn delete_folder(&mut self, scope: &ScopeId, id: &FolderId) -> Option<DeletedFolder> {
        let folder = self.folders.remove_folder(scope, id)?;
        let unfiled = self.associations.cascade_clear(scope, id);
        tracing::info!(
            scope = %scope,
            folder_id = %id,
            unfiled = unfiled.len(),
            "folder deleted"
        );
        Some(DeletedFolder { folder, unfiled })
    }

    /// Assigns `entry` to an existing folder. Unknown folders are a no-op.
    pub fn assign(&mut self, scope: &ScopeId, entry: &EntryId, folder: &FolderId) -> bool {
        if !self.folders.contains(scope, folder) {
            tracing::debug!(scope = %scope, folder_id = %folder, entry_id = %entry, "assign to unknown folder ignored");
            return false;
        }
        self.associations.assign(scope, entry, folder)
    }

    pub fn unassign(&mut self, scope: &ScopeId, entry: &EntryId) -> bool {
        self.associations.unassign(scope, entry)
    }

    /// Folder of `entry`, treating associations to missing folders as unfiled.
    pub fn folder_for(&self, scope: &ScopeId, entry: &EntryId) -> Option<&FolderId> {
        self.associations
            .folder_for(scope, entry)
            .filter(|folder| self.folders.contains(scope, folder))
    }

    pub fn members(&self, scope: &ScopeId, folder: &FolderId) -> Vec<EntryId> {
        if !self.folders.contains(scope, folder) {
            return Vec::new();
        }
        self.associations.members(scope, folder)
    }

    pub fn folder_list(&self, scope: &ScopeId) -> Vec<Folder> {
        self.folders.folders(scope)
    }

    /// Associations whose folder is gone. Kept in storage; rendered as unfiled.
    pub fn stale_associations(&self, scope: &ScopeId) -> Vec<(EntryId, FolderId)> {
        self.associations
            .scope_entries(scope)
            .into_iter()
            .filter(|(_, folder)| !self.folders.contains(scope, folder))
            .collect()
    }

    pub fn snapshot(&self, scope: &ScopeId) -> ScopeSnapshot {
        ScopeSnapshot {
            folders: self.folders.records(scope),
            associations: self.associations.scope_entries(scope),
        }
    }

    pub fn restore(&mut self, scope: &ScopeId, snapshot: ScopeSnapshot) {
        self.folders.replace_scope(scope, snapshot.folders);
        self.associations.replace_scope(scope, snapshot.associations);
        self.loaded.insert(scope.clone());
    }
}
