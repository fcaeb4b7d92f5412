use crate::config::OrganizerConfig;
use crate::drag::DropSink;
use crate::host::{EntryCollection, HostEvent, HostListener, LayoutSurface, Notifier, SubscriptionId};
use crate::models::{DeletedFolder, EntryId, Folder, FolderId, Placement, ScopeId};
use crate::persistence::{load_or_empty, PersistenceAdapter};
use crate::reconcile::{PassReport, ReconciliationEngine};
use crate::scheduler::ReconcileScheduler;
use crate::store::ScopeStore;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Host collaborators the organizer is wired to.
#[derive(Clone)]
pub struct HostBindings {
    pub collection: Arc<dyn EntryCollection>,
    pub surface: Arc<dyn LayoutSurface>,
    pub notifier: Arc<dyn Notifier>,
}

/// Core facade: owns per-scope folder state, persists every mutation and keeps
/// the host surface reconciled with it.
///
/// Mutators persist immediately and then schedule a debounced pass on the
/// current tokio runtime. Called outside a runtime, the state change and save
/// still happen but no pass is scheduled (a warning is logged); synchronous
/// hosts must follow up with [`Organizer::reconcile_now`].
pub struct Organizer {
    store: Mutex<ScopeStore>,
    placements: Mutex<HashMap<ScopeId, Placement>>,
    engine: ReconciliationEngine,
    scheduler: ReconcileScheduler,
    host: HostBindings,
    persistence: Arc<dyn PersistenceAdapter>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl Organizer {
    pub fn new(host: HostBindings, persistence: Arc<dyn PersistenceAdapter>, config: &OrganizerConfig) -> Arc<Self> {
        let scheduler = ReconcileScheduler::new(config.debounce());
        let this = Arc::new(Self {
            store: Mutex::new(ScopeStore::new()),
            placements: Mutex::new(HashMap::new()),
            engine: ReconciliationEngine::new(),
            scheduler: scheduler.clone(),
            host,
            persistence,
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&this);
        scheduler.set_executor(Arc::new(move || {
            if let Some(strong) = weak.upgrade() {
                strong.reconcile_now();
            }
        }));

        this
    }

    /// Waits for the host to signal readiness, then subscribes once and
    /// schedules the first pass.
    pub async fn attach<F>(self: &Arc<Self>, ready: F)
    where
        F: Future<Output = ()>,
    {
        ready.await;

        let weak = Arc::downgrade(self);
        let listener: HostListener = Arc::new(move |event| {
            if let Some(strong) = weak.upgrade() {
                strong.on_host_event(event);
            }
        });
        let subscription = self.host.collection.subscribe(listener);
        let previous = lock(&self.subscription).replace(subscription);
        if let Some(previous) = previous {
            self.host.collection.unsubscribe(&previous);
        }

        if let Some(scope) = self.active_scope() {
            self.ensure_loaded(&scope);
        }
        tracing::info!("organizer attached to host");
        self.scheduler.request();
    }

    pub fn detach(&self) {
        self.scheduler.cancel();
        if let Some(subscription) = lock(&self.subscription).take() {
            self.host.collection.unsubscribe(&subscription);
        }
    }

    pub fn on_host_event(&self, event: HostEvent) {
        match event {
            HostEvent::StructuralChange => {
                if self.engine.is_busy() {
                    tracing::trace!("ignoring structural change caused by an in-flight pass");
                    return;
                }
                self.scheduler.request();
            }
            HostEvent::ScopeChanged(scope) => {
                tracing::info!(scope = ?scope.as_ref().map(ScopeId::as_str), "active scope changed");
                if let Some(scope) = scope {
                    self.ensure_loaded(&scope);
                }
                self.scheduler.request();
            }
        }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.host.notifier.as_ref()
    }

    pub fn active_scope(&self) -> Option<ScopeId> {
        self.host.collection.active_scope()
    }

    pub fn passes(&self) -> u64 {
        self.engine.passes()
    }

    /// Schedules a pass only when called inside a tokio runtime.
    pub fn create_folder(&self, scope: &ScopeId, name: &str) -> Option<Folder> {
        let folder = self.mutate(scope, |store| store.folders_mut().create_folder(scope, name))?;
        self.scheduler.request();
        Some(folder)
    }

    /// Schedules a pass only when called inside a tokio runtime.
    pub fn rename_folder(&self, scope: &ScopeId, id: &FolderId, name: &str) -> bool {
        let renamed = self.mutate(scope, |store| store.folders_mut().rename_folder(scope, id, name).then_some(()));
        if renamed.is_some() {
            self.scheduler.request();
        }
        renamed.is_some()
    }

    /// Cascades the folder's associations. Schedules a pass only inside a tokio runtime.
    pub fn delete_folder(&self, scope: &ScopeId, id: &FolderId) -> Option<DeletedFolder> {
        let deleted = self.mutate(scope, |store| store.delete_folder(scope, id))?;
        self.scheduler.request();
        Some(deleted)
    }

    /// Schedules a pass only when called inside a tokio runtime.
    pub fn set_collapsed(&self, scope: &ScopeId, id: &FolderId, collapsed: bool) -> bool {
        let applied = self
            .mutate(scope, |store| store.folders_mut().set_collapsed(scope, id, collapsed).then_some(()))
            .is_some();
        if applied {
            self.scheduler.request();
        }
        applied
    }

    /// Schedules a pass only when called inside a tokio runtime.
    pub fn toggle_collapsed(&self, scope: &ScopeId, id: &FolderId) -> Option<bool> {
        let collapsed = self.mutate(scope, |store| store.folders_mut().toggle_collapsed(scope, id))?;
        self.scheduler.request();
        Some(collapsed)
    }

    /// Schedules a pass only when called inside a tokio runtime.
    pub fn set_order(&self, scope: &ScopeId, id: &FolderId, order: Option<i64>) -> bool {
        let applied = self
            .mutate(scope, |store| store.folders_mut().set_order(scope, id, order).then_some(()))
            .is_some();
        if applied {
            self.scheduler.request();
        }
        applied
    }

    /// Returns `false` for an unknown folder. Schedules a pass only inside a tokio runtime.
    pub fn assign(&self, scope: &ScopeId, entry: &EntryId, folder: &FolderId) -> bool {
        let known = self.read(scope, |store| store.folders().contains(scope, folder));
        if !known {
            tracing::debug!(scope = %scope, folder_id = %folder, "assign to unknown folder ignored");
            return false;
        }
        if self.mutate(scope, |store| store.assign(scope, entry, folder).then_some(())).is_some() {
            self.scheduler.request();
        }
        true
    }

    /// Schedules a pass only when called inside a tokio runtime.
    pub fn unassign(&self, scope: &ScopeId, entry: &EntryId) -> bool {
        let removed = self.mutate(scope, |store| store.unassign(scope, entry).then_some(())).is_some();
        if removed {
            self.scheduler.request();
        }
        removed
    }

    pub fn folders(&self, scope: &ScopeId) -> Vec<Folder> {
        self.read(scope, |store| store.folder_list(scope))
    }

    pub fn folder(&self, scope: &ScopeId, id: &FolderId) -> Option<Folder> {
        self.read(scope, |store| store.folders().get(scope, id).cloned())
    }

    pub fn folder_for(&self, scope: &ScopeId, entry: &EntryId) -> Option<FolderId> {
        self.read(scope, |store| store.folder_for(scope, entry).cloned())
    }

    /// Derived member list of a folder.
    pub fn members(&self, scope: &ScopeId, folder: &FolderId) -> Vec<EntryId> {
        self.read(scope, |store| store.members(scope, folder))
    }

    /// Placement computed by the last pass over `scope`.
    pub fn placement(&self, scope: &ScopeId) -> Option<Placement> {
        lock(&self.placements).get(scope).cloned()
    }

    /// Debounced pass request. Dropped with a warning outside a tokio runtime;
    /// use [`Organizer::reconcile_now`] there.
    pub fn request_reconcile(&self) {
        self.scheduler.request();
    }

    /// Runs a pass for the active scope immediately. Returns `None` when no scope
    /// is active or a pass is already running.
    pub fn reconcile_now(&self) -> Option<PassReport> {
        let scope = self.active_scope()?;
        let (folders, associations) = self.read(&scope, |store| {
            (store.folder_list(&scope), store.associations().scope_entries(&scope))
        });

        let entries = self.host.collection.entries();
        let report = self
            .engine
            .run_pass(&folders, &associations, &entries, self.host.surface.as_ref())?;
        if report.stale_associations > 0 {
            tracing::debug!(scope = %scope, stale = report.stale_associations, "stale associations rendered as unfiled");
        }
        lock(&self.placements).insert(scope, report.placement.clone());
        Some(report)
    }

    fn ensure_loaded(&self, scope: &ScopeId) {
        let mut store = lock(&self.store);
        self.load_into(&mut store, scope);
    }

    fn load_into(&self, store: &mut ScopeStore, scope: &ScopeId) {
        if store.is_loaded(scope) {
            return;
        }
        let snapshot = load_or_empty(self.persistence.as_ref(), scope);
        tracing::debug!(
            scope = %scope,
            folders = snapshot.folders.len(),
            associations = snapshot.associations.len(),
            "scope loaded"
        );
        store.restore(scope, snapshot);
    }

    fn read<T>(&self, scope: &ScopeId, f: impl FnOnce(&ScopeStore) -> T) -> T {
        let mut store = lock(&self.store);
        self.load_into(&mut store, scope);
        f(&store)
    }

    /// Applies a mutation and persists the scope when it reports a change.
    /// The store lock is held across the save so snapshots are written in order.
    fn mutate<T>(&self, scope: &ScopeId, f: impl FnOnce(&mut ScopeStore) -> Option<T>) -> Option<T> {
        let mut store = lock(&self.store);
        self.load_into(&mut store, scope);
        let result = f(&mut store)?;
        let snapshot = store.snapshot(scope);
        if let Err(error) = self.persistence.save(scope, &snapshot) {
            tracing::warn!(scope = %scope, error = %error, "failed to save folder data");
            self.host.notifier.error("Failed to save folder data");
        }
        Some(result)
    }
}

impl DropSink for Organizer {
    fn file_entry(&self, scope: &ScopeId, entry: &EntryId, folder: Option<&FolderId>) -> bool {
        let applied = match folder {
            Some(folder) => self.assign(scope, entry, folder),
            None => {
                self.unassign(scope, entry);
                true
            }
        };
        if applied {
            self.scheduler.cancel();
            if self.reconcile_now().is_none() {
                self.scheduler.request();
            }
        }
        applied
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
