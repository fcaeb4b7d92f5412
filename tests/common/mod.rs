#![allow(dead_code)]

use entry_folders::host::{
    DialogFuture, Dialogs, EntryCollection, FolderRegionView, HostEvent, HostListener, LayoutSurface, Notifier,
    SubscriptionId,
};
use entry_folders::identity::EntryHandle;
use entry_folders::models::{Folder, FolderId, HandleKey, Region, ScopeId};
use entry_folders::persistence::PersistenceAdapter;
use entry_folders::{HostBindings, Organizer, OrganizerConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEBOUNCE: Duration = Duration::from_millis(100);
pub const SETTLE: Duration = Duration::from_millis(250);

struct FakeRegion {
    id: FolderId,
    label: String,
    collapsed: bool,
    handles: Vec<HandleKey>,
}

#[derive(Default)]
struct HostState {
    scope: Option<ScopeId>,
    entries: Vec<EntryHandle>,
    unfiled: Vec<HandleKey>,
    regions: Vec<FakeRegion>,
}

impl HostState {
    fn detach_handle(&mut self, handle: HandleKey) {
        self.unfiled.retain(|existing| *existing != handle);
        for region in &mut self.regions {
            region.handles.retain(|existing| *existing != handle);
        }
    }

    fn list_mut(&mut self, region: &Region) -> Option<&mut Vec<HandleKey>> {
        match region {
            Region::Unfiled => Some(&mut self.unfiled),
            Region::Folder(id) => self
                .regions
                .iter_mut()
                .find(|candidate| &candidate.id == id)
                .map(|candidate| &mut candidate.handles),
        }
    }
}

/// In-memory stand-in for the host list: an ordered entry collection plus a
/// visual structure of one unfiled list and folder regions.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
    listeners: Mutex<Vec<(SubscriptionId, HostListener)>>,
    notify_on_move: AtomicBool,
    handle_moves: AtomicUsize,
}

impl FakeHost {
    pub fn new(scope: Option<&str>, entries: Vec<EntryHandle>) -> Arc<Self> {
        let host = Self::default();
        {
            let mut state = host.state.lock().expect("host lock");
            state.scope = scope.map(ScopeId::from);
            state.unfiled = entries.iter().map(|entry| entry.key).collect();
            state.entries = entries;
        }
        Arc::new(host)
    }

    pub fn with_uids(scope: &str, count: u64) -> Arc<Self> {
        Self::new(Some(scope), uid_entries(0, count))
    }

    pub fn bindings(self: &Arc<Self>, notifier: Arc<dyn Notifier>) -> HostBindings {
        HostBindings {
            collection: self.clone(),
            surface: self.clone(),
            notifier,
        }
    }

    pub fn set_notify_on_move(&self, enabled: bool) {
        self.notify_on_move.store(enabled, Ordering::SeqCst);
    }

    pub fn handle_moves(&self) -> usize {
        self.handle_moves.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("listeners lock").len()
    }

    pub fn add_entry(&self, entry: EntryHandle) {
        {
            let mut state = self.state.lock().expect("host lock");
            state.unfiled.push(entry.key);
            state.entries.push(entry);
        }
        self.emit(HostEvent::StructuralChange);
    }

    pub fn remove_entry(&self, key: u64) {
        {
            let mut state = self.state.lock().expect("host lock");
            state.entries.retain(|entry| entry.key != HandleKey(key));
            state.detach_handle(HandleKey(key));
        }
        self.emit(HostEvent::StructuralChange);
    }

    /// Host switches collection: entries are replaced, our folder regions stay behind empty.
    pub fn switch_scope(&self, scope: Option<&str>, entries: Vec<EntryHandle>) {
        {
            let mut state = self.state.lock().expect("host lock");
            state.scope = scope.map(ScopeId::from);
            state.unfiled = entries.iter().map(|entry| entry.key).collect();
            for region in &mut state.regions {
                region.handles.clear();
            }
            state.entries = entries;
        }
        self.emit(HostEvent::ScopeChanged(scope.map(ScopeId::from)));
    }

    /// Inserts a handle the collection does not know about into a region.
    pub fn inject_foreign_handle(&self, region: &Region, key: u64) {
        let mut state = self.state.lock().expect("host lock");
        if let Some(list) = state.list_mut(region) {
            list.push(HandleKey(key));
        }
    }

    pub fn fire_structural_change(&self) {
        self.emit(HostEvent::StructuralChange);
    }

    pub fn handles_in(&self, region: &Region) -> Vec<HandleKey> {
        self.region_contents(region)
    }

    pub fn region_ids(&self) -> Vec<FolderId> {
        self.folder_regions().into_iter().map(|view| view.id).collect()
    }

    pub fn region_view(&self, id: &FolderId) -> Option<FolderRegionView> {
        self.folder_regions().into_iter().find(|view| &view.id == id)
    }

    /// Every handle currently rendered anywhere, in visual order.
    pub fn visual_handles(&self) -> Vec<HandleKey> {
        let state = self.state.lock().expect("host lock");
        let mut all = state.unfiled.clone();
        for region in &state.regions {
            all.extend(region.handles.iter().copied());
        }
        all
    }

    fn emit(&self, event: HostEvent) {
        let listeners = self
            .listeners
            .lock()
            .expect("listeners lock")
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(event.clone());
        }
    }
}

impl EntryCollection for FakeHost {
    fn entries(&self) -> Vec<EntryHandle> {
        self.state.lock().expect("host lock").entries.clone()
    }

    fn active_scope(&self) -> Option<ScopeId> {
        self.state.lock().expect("host lock").scope.clone()
    }

    fn subscribe(&self, listener: HostListener) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.listeners
            .lock()
            .expect("listeners lock")
            .push((id.clone(), listener));
        id
    }

    fn unsubscribe(&self, subscription: &SubscriptionId) {
        self.listeners
            .lock()
            .expect("listeners lock")
            .retain(|(id, _)| id != subscription);
    }
}

impl LayoutSurface for FakeHost {
    fn folder_regions(&self) -> Vec<FolderRegionView> {
        self.state
            .lock()
            .expect("host lock")
            .regions
            .iter()
            .map(|region| FolderRegionView {
                id: region.id.clone(),
                label: region.label.clone(),
                collapsed: region.collapsed,
            })
            .collect()
    }

    fn create_folder_region(&self, folder: &Folder, position: usize) {
        let mut state = self.state.lock().expect("host lock");
        let at = position.min(state.regions.len());
        state.regions.insert(
            at,
            FakeRegion {
                id: folder.id.clone(),
                label: folder.name.clone(),
                collapsed: folder.collapsed,
                handles: Vec::new(),
            },
        );
    }

    fn move_folder_region(&self, folder: &FolderId, position: usize) {
        let mut state = self.state.lock().expect("host lock");
        if let Some(current) = state.regions.iter().position(|region| &region.id == folder) {
            let region = state.regions.remove(current);
            let at = position.min(state.regions.len());
            state.regions.insert(at, region);
        }
    }

    fn update_folder_region(&self, folder: &Folder) {
        let mut state = self.state.lock().expect("host lock");
        if let Some(region) = state.regions.iter_mut().find(|region| region.id == folder.id) {
            region.label = folder.name.clone();
            region.collapsed = folder.collapsed;
        }
    }

    fn remove_folder_region(&self, folder: &FolderId) {
        let mut state = self.state.lock().expect("host lock");
        assert!(
            state
                .regions
                .iter()
                .filter(|region| &region.id == folder)
                .all(|region| region.handles.is_empty()),
            "engine removed a non-empty region"
        );
        state.regions.retain(|region| &region.id != folder);
    }

    fn region_contents(&self, region: &Region) -> Vec<HandleKey> {
        let mut state = self.state.lock().expect("host lock");
        state.list_mut(region).map(|list| list.clone()).unwrap_or_default()
    }

    fn move_handle(&self, handle: HandleKey, region: &Region, index: usize) {
        {
            let mut state = self.state.lock().expect("host lock");
            state.detach_handle(handle);
            let list = state.list_mut(region).expect("move into a materialised region");
            let at = index.min(list.len());
            list.insert(at, handle);
        }
        self.handle_moves.fetch_add(1, Ordering::SeqCst);
        if self.notify_on_move.load(Ordering::SeqCst) {
            self.emit(HostEvent::StructuralChange);
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(bool, String)>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.filtered(true)
    }

    pub fn errors(&self) -> Vec<String> {
        self.filtered(false)
    }

    fn filtered(&self, success: bool) -> Vec<String> {
        self.messages
            .lock()
            .expect("notifier lock")
            .iter()
            .filter(|(ok, _)| *ok == success)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.messages.lock().expect("notifier lock").push((true, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.messages.lock().expect("notifier lock").push((false, message.to_string()));
    }
}

/// Dialog answers queued up front; an empty queue answers "dismissed".
#[derive(Default)]
pub struct ScriptedDialogs {
    prompts: Mutex<VecDeque<Option<String>>>,
    confirms: Mutex<VecDeque<bool>>,
    pub seen: Mutex<Vec<String>>,
}

impl ScriptedDialogs {
    pub fn answer_prompt(&self, answer: Option<&str>) {
        self.prompts
            .lock()
            .expect("dialog lock")
            .push_back(answer.map(ToString::to_string));
    }

    pub fn answer_confirm(&self, answer: bool) {
        self.confirms.lock().expect("dialog lock").push_back(answer);
    }
}

impl Dialogs for ScriptedDialogs {
    fn prompt_text(&self, message: &str, _initial: Option<&str>) -> DialogFuture<Option<String>> {
        self.seen.lock().expect("dialog lock").push(message.to_string());
        let answer = self.prompts.lock().expect("dialog lock").pop_front().flatten();
        Box::pin(async move { answer })
    }

    fn confirm(&self, message: &str) -> DialogFuture<bool> {
        self.seen.lock().expect("dialog lock").push(message.to_string());
        let answer = self.confirms.lock().expect("dialog lock").pop_front().unwrap_or(false);
        Box::pin(async move { answer })
    }
}

pub fn uid_entries(start: u64, count: u64) -> Vec<EntryHandle> {
    (start..start + count)
        .map(|key| EntryHandle::new(key).with_uid(format!("e{key}")))
        .collect()
}

pub fn config() -> OrganizerConfig {
    OrganizerConfig {
        debounce_ms: DEBOUNCE.as_millis() as u64,
        ..OrganizerConfig::default()
    }
}

pub fn organizer(
    host: &Arc<FakeHost>,
    notifier: Arc<RecordingNotifier>,
    persistence: Arc<dyn PersistenceAdapter>,
) -> Arc<Organizer> {
    Organizer::new(host.bindings(notifier), persistence, &config())
}

pub fn assert_no_duplicates(handles: &[HandleKey]) {
    let mut sorted = handles.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), handles.len(), "duplicate handles in {handles:?}");
}
