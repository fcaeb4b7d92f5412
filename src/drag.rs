//! Drag gesture state machine.
//!
//! `Idle -> Dragging -> {OverFolder | OverUnfiled} -> {dropped | cancelled} -> Idle`.
//! Hover state doubles as highlight feedback and is never persisted.

use crate::models::{EntryId, FolderId, ScopeId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        scope: ScopeId,
        source: EntryId,
    },
    OverFolder {
        scope: ScopeId,
        source: EntryId,
        target: FolderId,
    },
    OverUnfiled {
        scope: ScopeId,
        source: EntryId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Folder(FolderId),
    Unfiled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Assigned { entry: EntryId, folder: FolderId },
    Unfiled { entry: EntryId },
    Cancelled,
}

/// Receiver of completed drops. Implementations update the association index
/// and trigger reconciliation.
pub trait DropSink {
    /// Files `entry` into `folder`, or unfiles it when `folder` is `None`.
    /// Returns `false` when the drop could not be applied (e.g. the folder vanished).
    fn file_entry(&self, scope: &ScopeId, entry: &EntryId, folder: Option<&FolderId>) -> bool;
}

#[derive(Debug, Default)]
pub struct DragDropController {
    state: DragState,
}

impl DragDropController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn begin(&mut self, scope: ScopeId, source: EntryId) {
        if self.is_dragging() {
            tracing::debug!("new drag started before the previous one finished; discarding it");
        }
        self.state = DragState::Dragging { scope, source };
    }

    pub fn hover(&mut self, target: DropTarget) {
        let (scope, source) = match std::mem::take(&mut self.state) {
            DragState::Idle => return,
            DragState::Dragging { scope, source }
            | DragState::OverFolder { scope, source, .. }
            | DragState::OverUnfiled { scope, source } => (scope, source),
        };
        self.state = match target {
            DropTarget::Folder(target) => DragState::OverFolder { scope, source, target },
            DropTarget::Unfiled => DragState::OverUnfiled { scope, source },
        };
    }

    /// Pointer left every drop target.
    pub fn leave(&mut self) {
        let (scope, source) = match std::mem::take(&mut self.state) {
            DragState::Idle => return,
            DragState::Dragging { scope, source }
            | DragState::OverFolder { scope, source, .. }
            | DragState::OverUnfiled { scope, source } => (scope, source),
        };
        self.state = DragState::Dragging { scope, source };
    }

    /// Folder currently under the pointer, for highlight rendering.
    pub fn highlighted_folder(&self) -> Option<&FolderId> {
        match &self.state {
            DragState::OverFolder { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> DropOutcome {
        self.state = DragState::Idle;
        DropOutcome::Cancelled
    }

    pub fn drop_on(&mut self, sink: &dyn DropSink) -> DropOutcome {
        match std::mem::take(&mut self.state) {
            DragState::OverFolder { scope, source, target } => {
                if sink.file_entry(&scope, &source, Some(&target)) {
                    DropOutcome::Assigned {
                        entry: source,
                        folder: target,
                    }
                } else {
                    tracing::debug!(entry_id = %source, folder_id = %target, "drop rejected by sink");
                    DropOutcome::Cancelled
                }
            }
            DragState::OverUnfiled { scope, source } => {
                if sink.file_entry(&scope, &source, None) {
                    DropOutcome::Unfiled { entry: source }
                } else {
                    DropOutcome::Cancelled
                }
            }
            DragState::Dragging { .. } | DragState::Idle => DropOutcome::Cancelled,
        }
    }
}
