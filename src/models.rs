use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Named partition (e.g. the selected collection) owning its own folders and associations.
    ScopeId
);
string_id!(FolderId);
string_id!(
    /// Stable identity of a host entry as resolved by [`crate::identity::resolve_entry_id`].
    EntryId
);

/// Opaque key of a host-owned entry handle. The core only ever moves handles by key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleKey(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub collapsed: bool,
    pub order: Option<i64>,
}

impl Folder {
    pub fn record(&self) -> FolderRecord {
        FolderRecord {
            name: self.name.clone(),
            collapsed: self.collapsed,
            order: self.order,
        }
    }
}

/// Persisted form of a folder; the id is the key of the enclosing map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub name: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub order: Option<i64>,
}

/// Everything persisted for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSnapshot {
    #[serde(default)]
    pub folders: BTreeMap<FolderId, FolderRecord>,
    #[serde(default)]
    pub associations: BTreeMap<EntryId, FolderId>,
}

impl ScopeSnapshot {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.associations.is_empty()
    }
}

/// A visual container the engine places handles into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "folderId")]
pub enum Region {
    Unfiled,
    Folder(FolderId),
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unfiled => f.write_str("unfiled"),
            Self::Folder(id) => write!(f, "folder:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionPlacement {
    pub region: Region,
    pub collapsed: bool,
    pub handles: Vec<HandleKey>,
}

/// Result of a reconciliation pass: the unfiled region first, then one region per folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub regions: Vec<RegionPlacement>,
}

impl Placement {
    pub fn handles_in(&self, region: &Region) -> &[HandleKey] {
        self.regions
            .iter()
            .find(|placement| &placement.region == region)
            .map(|placement| placement.handles.as_slice())
            .unwrap_or(&[])
    }

    pub fn region_of(&self, handle: HandleKey) -> Option<&Region> {
        self.regions
            .iter()
            .find(|placement| placement.handles.contains(&handle))
            .map(|placement| &placement.region)
    }

    pub fn handle_count(&self) -> usize {
        self.regions.iter().map(|placement| placement.handles.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedFolder {
    pub folder: Folder,
    pub unfiled: Vec<EntryId>,
}
