use crate::models::{EntryId, FolderId, ScopeId};
use std::collections::{BTreeMap, HashMap};

/// `entry -> folder` per scope. An entry maps to at most one folder; absence means unfiled.
#[derive(Debug, Default, Clone)]
pub struct AssociationIndex {
    scopes: HashMap<ScopeId, BTreeMap<EntryId, FolderId>>,
}

impl AssociationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any previous association of `entry`. Returns `true` when something changed.
    pub fn assign(&mut self, scope: &ScopeId, entry: &EntryId, folder: &FolderId) -> bool {
        let previous = self
            .scopes
            .entry(scope.clone())
            .or_default()
            .insert(entry.clone(), folder.clone());
        previous.as_ref() != Some(folder)
    }

    pub fn unassign(&mut self, scope: &ScopeId, entry: &EntryId) -> bool {
        self.scopes
            .get_mut(scope)
            .and_then(|entries| entries.remove(entry))
            .is_some()
    }

    /// Raw lookup. The folder may no longer exist; see [`super::ScopeStore::folder_for`].
    pub fn folder_for(&self, scope: &ScopeId, entry: &EntryId) -> Option<&FolderId> {
        self.scopes.get(scope)?.get(entry)
    }

    /// Removes every association pointing at `folder` and returns the entries now unfiled.
    pub fn cascade_clear(&mut self, scope: &ScopeId, folder: &FolderId) -> Vec<EntryId> {
        let Some(entries) = self.scopes.get_mut(scope) else {
            return Vec::new();
        };
        let affected = entries
            .iter()
            .filter(|(_, target)| *target == folder)
            .map(|(entry, _)| entry.clone())
            .collect::<Vec<_>>();
        for entry in &affected {
            entries.remove(entry);
        }
        affected
    }

    pub fn members(&self, scope: &ScopeId, folder: &FolderId) -> Vec<EntryId> {
        self.scopes
            .get(scope)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, target)| *target == folder)
                    .map(|(entry, _)| entry.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn scope_entries(&self, scope: &ScopeId) -> BTreeMap<EntryId, FolderId> {
        self.scopes.get(scope).cloned().unwrap_or_default()
    }

    pub fn replace_scope(&mut self, scope: &ScopeId, entries: BTreeMap<EntryId, FolderId>) {
        self.scopes.insert(scope.clone(), entries);
    }
}
