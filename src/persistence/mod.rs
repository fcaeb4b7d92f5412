mod embedded;
mod json_file;
mod memory;
mod sqlite;

pub use embedded::{EmbeddedMetadataStore, MetadataSlot};
pub use json_file::{JsonFileStore, PersistedDocument};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::AppResult;
use crate::models::{ScopeId, ScopeSnapshot};

pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Durable load/save of one scope's folders and associations.
pub trait PersistenceAdapter: Send + Sync {
    /// A scope that was never saved loads as an empty snapshot.
    fn load(&self, scope: &ScopeId) -> AppResult<ScopeSnapshot>;
    fn save(&self, scope: &ScopeId, snapshot: &ScopeSnapshot) -> AppResult<()>;

    /// Scopes with saved data. Adapters that cannot enumerate report none.
    fn scopes(&self) -> AppResult<Vec<ScopeId>> {
        Ok(Vec::new())
    }
}

/// Core-boundary load: adapter failures and corrupt payloads degrade to an empty scope.
pub fn load_or_empty(adapter: &dyn PersistenceAdapter, scope: &ScopeId) -> ScopeSnapshot {
    match adapter.load(scope) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::warn!(scope = %scope, error = %error, "failed to load folder data; starting empty");
            ScopeSnapshot::default()
        }
    }
}
