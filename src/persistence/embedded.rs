//! Alternative persistence that stores a scope's folder data inside a reserved,
//! disabled host entry (see [`crate::identity::METADATA_ENTRY_KEY`]).

use super::{PersistenceAdapter, SNAPSHOT_VERSION};
use crate::errors::{AppError, AppResult};
use crate::models::{EntryId, FolderId, FolderRecord, ScopeId, ScopeSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host-side storage of the reserved entry's content for a scope.
pub trait MetadataSlot: Send + Sync {
    fn read(&self, scope: &ScopeId) -> AppResult<Option<String>>;
    /// Creates the reserved entry on first write.
    fn write(&self, scope: &ScopeId, content: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedPayload {
    #[serde(default)]
    folders: BTreeMap<FolderId, FolderRecord>,
    #[serde(default)]
    entry_folders: BTreeMap<EntryId, FolderId>,
    #[serde(default)]
    version: Option<String>,
}

pub struct EmbeddedMetadataStore<S> {
    slot: S,
}

impl<S: MetadataSlot> EmbeddedMetadataStore<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }
}

impl<S: MetadataSlot> PersistenceAdapter for EmbeddedMetadataStore<S> {
    fn load(&self, scope: &ScopeId) -> AppResult<ScopeSnapshot> {
        let Some(content) = self.slot.read(scope)? else {
            return Ok(ScopeSnapshot::default());
        };
        if content.trim().is_empty() {
            return Ok(ScopeSnapshot::default());
        }
        let payload: EmbeddedPayload = serde_json::from_str(&content).map_err(|error| {
            AppError::Persistence(format!("unreadable metadata entry for scope {}: {}", scope, error))
        })?;
        if let Some(version) = payload.version.as_deref() {
            if version != SNAPSHOT_VERSION {
                tracing::warn!(scope = %scope, version, "metadata entry written by a different format version");
            }
        }
        Ok(ScopeSnapshot {
            folders: payload.folders,
            associations: payload.entry_folders,
        })
    }

    fn save(&self, scope: &ScopeId, snapshot: &ScopeSnapshot) -> AppResult<()> {
        let payload = EmbeddedPayload {
            folders: snapshot.folders.clone(),
            entry_folders: snapshot.associations.clone(),
            version: Some(SNAPSHOT_VERSION.to_string()),
        };
        let content = serde_json::to_string(&payload)?;
        self.slot.write(scope, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::{EmbeddedMetadataStore, MetadataSlot};
    use crate::errors::AppResult;
    use crate::models::{EntryId, FolderId, FolderRecord, ScopeId, ScopeSnapshot};
    use crate::persistence::PersistenceAdapter;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct SlotMap(Mutex<HashMap<ScopeId, String>>);

    impl MetadataSlot for SlotMap {
        fn read(&self, scope: &ScopeId) -> AppResult<Option<String>> {
            Ok(self.0.lock().expect("lock").get(scope).cloned())
        }

        fn write(&self, scope: &ScopeId, content: &str) -> AppResult<()> {
            self.0.lock().expect("lock").insert(scope.clone(), content.to_string());
            Ok(())
        }
    }

    #[test]
    fn writes_entry_folders_payload() {
        let store = EmbeddedMetadataStore::new(SlotMap::default());
        let scope = ScopeId::from("world");
        let mut snapshot = ScopeSnapshot::default();
        snapshot.folders.insert(
            FolderId::from("f1"),
            FolderRecord { name: "Lore".into(), collapsed: false, order: None },
        );
        snapshot.associations.insert(EntryId::from("3"), FolderId::from("f1"));
        store.save(&scope, &snapshot).expect("save");

        let raw = store.slot().read(&scope).expect("read").expect("content");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["entryFolders"]["3"], "f1");
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(store.load(&scope).expect("load"), snapshot);
    }

    #[test]
    fn reads_legacy_folder_objects() {
        let store = EmbeddedMetadataStore::new(SlotMap::default());
        let scope = ScopeId::from("world");
        store
            .slot()
            .write(
                &scope,
                r#"{"folders":{"f1":{"id":"f1","name":"Old","collapsed":true,"entries":[]}},"entryFolders":{"7":"f1"},"version":"1.0.0"}"#,
            )
            .expect("write");

        let snapshot = store.load(&scope).expect("load");
        assert_eq!(snapshot.folders[&FolderId::from("f1")].name, "Old");
        assert!(snapshot.folders[&FolderId::from("f1")].collapsed);
        assert_eq!(snapshot.associations[&EntryId::from("7")], FolderId::from("f1"));
    }

    #[test]
    fn missing_slot_is_empty() {
        let store = EmbeddedMetadataStore::new(SlotMap::default());
        assert!(store.load(&ScopeId::from("none")).expect("load").is_empty());
    }
}
