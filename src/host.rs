//! Contracts the core consumes from the host application.

use crate::identity::EntryHandle;
use crate::models::{Folder, FolderId, HandleKey, Region, ScopeId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Coarse "something in the entry list changed" signal (add, remove or reorder).
    StructuralChange,
    ScopeChanged(Option<ScopeId>),
}

pub type HostListener = Arc<dyn Fn(HostEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The authoritative, externally owned entry list.
pub trait EntryCollection: Send + Sync {
    /// Current handles in host order.
    fn entries(&self) -> Vec<EntryHandle>;
    fn active_scope(&self) -> Option<ScopeId>;
    fn subscribe(&self, listener: HostListener) -> SubscriptionId;
    fn unsubscribe(&self, subscription: &SubscriptionId);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRegionView {
    pub id: FolderId,
    pub label: String,
    pub collapsed: bool,
}

/// The host's visual structure. Every method must move or annotate existing
/// objects; none may destroy or recreate an entry handle.
pub trait LayoutSurface: Send + Sync {
    /// Materialised folder regions in display order.
    fn folder_regions(&self) -> Vec<FolderRegionView>;
    fn create_folder_region(&self, folder: &Folder, position: usize);
    fn move_folder_region(&self, folder: &FolderId, position: usize);
    /// Reflects name and collapsed flag. Collapsing hides the region, membership is untouched.
    fn update_folder_region(&self, folder: &Folder);
    /// Only called for empty regions.
    fn remove_folder_region(&self, folder: &FolderId);
    fn region_contents(&self, region: &Region) -> Vec<HandleKey>;
    /// Relocates an existing handle to `index` within `region`.
    ///
    /// The handle is detached from wherever it currently sits first; `index`
    /// counts positions in `region` after that removal and is clamped to the
    /// region's length. Passes stay idempotent only if hosts follow this rule.
    fn move_handle(&self, handle: HandleKey, region: &Region, index: usize);
}

pub type DialogFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub trait Dialogs: Send + Sync {
    fn prompt_text(&self, message: &str, initial: Option<&str>) -> DialogFuture<Option<String>>;
    fn confirm(&self, message: &str) -> DialogFuture<bool>;
}

/// Advisory user-facing messages. Nothing the core does depends on delivery.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(message, "notification");
    }

    fn error(&self, message: &str) {
        tracing::warn!(message, "notification");
    }
}
