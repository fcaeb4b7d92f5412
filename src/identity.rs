//! Resolution of a stable [`EntryId`] for each host entry handle.
//!
//! Priority order: the entry's intrinsic uid, then a secondary stable attribute,
//! then its position in the host list. Positional ids are not stable when the
//! host reorders entries out-of-band; associations keyed that way can end up
//! pointing at a different entry and nothing here detects or repairs that.

use crate::models::{EntryId, HandleKey};
use serde::{Deserialize, Serialize};

/// Key of the reserved host entry used by the embedded metadata persistence strategy.
pub const METADATA_ENTRY_KEY: &str = "__FOLDER_METADATA__";

/// One externally owned entry as reported by the host collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryHandle {
    pub key: HandleKey,
    pub uid: Option<String>,
    pub secondary: Option<String>,
    /// Host-side label, used only to recognise the reserved metadata entry.
    pub label: Option<String>,
}

impl EntryHandle {
    pub fn new(key: u64) -> Self {
        Self {
            key: HandleKey(key),
            ..Self::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_reserved(&self) -> bool {
        self.label.as_deref() == Some(METADATA_ENTRY_KEY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentitySource {
    Intrinsic,
    Secondary,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub key: HandleKey,
    pub id: EntryId,
    pub source: IdentitySource,
    pub reserved: bool,
}

pub fn resolve_entry_id(handle: &EntryHandle, position: usize) -> (EntryId, IdentitySource) {
    if let Some(uid) = non_blank(handle.uid.as_deref()) {
        return (EntryId::new(uid), IdentitySource::Intrinsic);
    }
    if let Some(secondary) = non_blank(handle.secondary.as_deref()) {
        return (EntryId::new(secondary), IdentitySource::Secondary);
    }
    (EntryId::new(format!("entry_{position}")), IdentitySource::Positional)
}

/// Resolves every handle of an ordered host snapshot, keeping host order.
pub fn resolve_all(handles: &[EntryHandle]) -> Vec<ResolvedEntry> {
    let resolved = handles
        .iter()
        .enumerate()
        .map(|(position, handle)| {
            let (id, source) = resolve_entry_id(handle, position);
            ResolvedEntry {
                key: handle.key,
                id,
                source,
                reserved: handle.is_reserved(),
            }
        })
        .collect::<Vec<_>>();

    let positional = resolved
        .iter()
        .filter(|entry| entry.source == IdentitySource::Positional)
        .count();
    if positional > 0 {
        tracing::warn!(
            count = positional,
            "entries without stable identity; positional ids drift if the host reorders"
        );
    }

    resolved
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
