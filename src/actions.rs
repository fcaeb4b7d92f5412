//! User-facing folder actions that go through the dialog and notification collaborators.

use crate::host::Dialogs;
use crate::models::{DeletedFolder, Folder, FolderId, ScopeId};
use crate::organizer::Organizer;
use std::sync::Arc;

pub struct FolderActions {
    organizer: Arc<Organizer>,
    dialogs: Arc<dyn Dialogs>,
}

impl FolderActions {
    pub fn new(organizer: Arc<Organizer>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { organizer, dialogs }
    }

    pub async fn create_folder(&self) -> Option<Folder> {
        let scope = self.require_scope()?;
        let name = self.dialogs.prompt_text("Enter folder name:", None).await?;
        let folder = self.organizer.create_folder(&scope, &name)?;
        self.organizer
            .notifier()
            .success(&format!("Folder \"{}\" created", folder.name));
        Some(folder)
    }

    pub async fn rename_folder(&self, id: &FolderId) -> bool {
        let Some(scope) = self.require_scope() else {
            return false;
        };
        let Some(folder) = self.organizer.folder(&scope, id) else {
            return false;
        };
        let Some(name) = self
            .dialogs
            .prompt_text("Enter new folder name:", Some(folder.name.as_str()))
            .await
        else {
            return false;
        };
        if !self.organizer.rename_folder(&scope, id, &name) {
            return false;
        }
        self.organizer
            .notifier()
            .success(&format!("Folder renamed to \"{}\"", name.trim()));
        true
    }

    pub async fn delete_folder(&self, id: &FolderId) -> Option<DeletedFolder> {
        let scope = self.require_scope()?;
        let folder = self.organizer.folder(&scope, id)?;
        let confirmed = self
            .dialogs
            .confirm(&format!(
                "Delete folder \"{}\"? Entries will be moved back to the main list.",
                folder.name
            ))
            .await;
        if !confirmed {
            return None;
        }
        let deleted = self.organizer.delete_folder(&scope, id)?;
        self.organizer.notifier().success("Folder deleted");
        Some(deleted)
    }

    pub fn toggle_folder(&self, id: &FolderId) -> Option<bool> {
        let scope = self.require_scope()?;
        self.organizer.toggle_collapsed(&scope, id)
    }

    fn require_scope(&self) -> Option<ScopeId> {
        let scope = self.organizer.active_scope();
        if scope.is_none() {
            self.organizer.notifier().error("No scope selected");
        }
        scope
    }
}
