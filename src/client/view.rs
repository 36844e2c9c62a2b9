//! View state for the workspace and task screens.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{ImageInput, PopulatedTask, TaskStatus, Workspace};
use crate::services::invite::invite_link;
use crate::storage::FileUpload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
    Confirmed,
    Cancelled,
}

/// Confirmation prompt in front of a destructive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    state: DialogState,
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into(), state: DialogState::Closed }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == DialogState::Open
    }

    /// Opens the dialog; a settled dialog can be opened again
    pub fn open(&mut self) {
        self.state = DialogState::Open;
    }

    pub fn confirm(&mut self) {
        if self.state == DialogState::Open {
            self.state = DialogState::Confirmed;
        }
    }

    pub fn cancel(&mut self) {
        if self.state == DialogState::Open {
            self.state = DialogState::Cancelled;
        }
    }

    /// `Some(true)` once confirmed, `Some(false)` once cancelled
    pub fn outcome(&self) -> Option<bool> {
        match self.state {
            DialogState::Confirmed => Some(true),
            DialogState::Cancelled => Some(false),
            _ => None,
        }
    }
}

/// Image picker of a workspace or project form
#[derive(Debug, Clone)]
pub enum ImageField {
    Empty,
    Existing(String),
    Selected(FileUpload),
}

impl ImageField {
    pub fn from_url(url: Option<&str>) -> Self {
        match url {
            Some(url) if !url.is_empty() => ImageField::Existing(url.to_string()),
            _ => ImageField::Empty,
        }
    }

    pub fn select(&mut self, upload: FileUpload) {
        *self = ImageField::Selected(upload);
    }

    pub fn remove(&mut self) {
        *self = ImageField::Empty;
    }

    /// Image value to submit: a new file is uploaded, an existing image is
    /// left alone, an empty field clears it
    pub fn to_input(&self) -> Option<ImageInput> {
        match self {
            ImageField::Empty => Some(ImageInput::Clear),
            ImageField::Existing(_) => None,
            ImageField::Selected(upload) => Some(ImageInput::Upload(upload.clone())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskView {
    #[default]
    Table,
    Kanban,
    Calendar,
}

impl TaskView {
    /// Parses the `task-view` query value; unknown or missing values fall back to `Table`
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskView::Table => "table",
            TaskView::Kanban => "kanban",
            TaskView::Calendar => "calendar",
        }
    }
}

impl FromStr for TaskView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(TaskView::Table),
            "kanban" => Ok(TaskView::Kanban),
            "calendar" => Ok(TaskView::Calendar),
            other => Err(format!("unknown task view: {}", other)),
        }
    }
}

impl fmt::Display for TaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kanban columns: one per status, in status order, each sorted by position
pub fn kanban_columns(tasks: &[PopulatedTask]) -> BTreeMap<TaskStatus, Vec<PopulatedTask>> {
    let mut columns: BTreeMap<TaskStatus, Vec<PopulatedTask>> =
        TaskStatus::ALL.into_iter().map(|status| (status, Vec::new())).collect();

    for task in tasks {
        columns.entry(task.task.status).or_default().push(task.clone());
    }
    for column in columns.values_mut() {
        column.sort_by_key(|t| t.task.position);
    }
    columns
}

/// Settings form of one workspace
#[derive(Debug, Clone)]
pub struct EditWorkspaceForm {
    pub workspace: Workspace,
    pub name: String,
    pub image: ImageField,
    pub delete_dialog: ConfirmDialog,
    pub reset_dialog: ConfirmDialog,
}

impl EditWorkspaceForm {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            name: workspace.name.clone(),
            image: ImageField::from_url(workspace.image_url.as_deref()),
            delete_dialog: ConfirmDialog::new(
                "Delete Workspace",
                "Are you sure you want to delete this workspace? This action is irreversible.",
            ),
            reset_dialog: ConfirmDialog::new("Reset Invite Link", "This will invalidate the current invite code."),
            workspace,
        }
    }

    pub fn invite_link(&self, origin: &str) -> String {
        invite_link(origin, &self.workspace.id, &self.workspace.invite_code)
    }

    /// Name to submit, only when it changed
    pub fn changed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (name != self.workspace.name).then_some(name)
    }

    /// Picks up the workspace returned by an update or invite reset
    pub fn refresh(&mut self, workspace: Workspace) {
        *self = EditWorkspaceForm::new(workspace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use chrono::Utc;

    fn workspace() -> Workspace {
        Workspace {
            id: "w1".into(),
            name: "Acme".into(),
            image_url: Some("/files/images/abc".into()),
            invite_code: "Xy12Ab".into(),
            user_id: "u1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(id: &str, status: TaskStatus, position: i64) -> PopulatedTask {
        PopulatedTask {
            task: Task {
                id: id.into(),
                name: id.into(),
                description: None,
                workspace_id: "w1".into(),
                project_id: None,
                assignee_id: None,
                status,
                due_date: "2026-01-01".into(),
                position,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            project: None,
            assignee: None,
        }
    }

    #[test]
    fn dialog_transitions() {
        let mut dialog = ConfirmDialog::new("Delete", "Sure?");
        dialog.confirm();
        assert_eq!(dialog.state(), DialogState::Closed);

        dialog.open();
        dialog.cancel();
        assert_eq!(dialog.outcome(), Some(false));

        dialog.open();
        assert!(dialog.is_open());
        dialog.confirm();
        assert_eq!(dialog.outcome(), Some(true));
    }

    #[test]
    fn image_field_maps_to_form_value() {
        let mut field = ImageField::from_url(Some("/files/images/abc"));
        assert!(field.to_input().is_none());

        field.remove();
        assert!(matches!(field.to_input(), Some(ImageInput::Clear)));

        field.select(FileUpload { filename: "a.png".into(), content_type: "image/png".into(), bytes: vec![1] });
        assert!(field.to_input().map(|i| i.is_upload()).unwrap_or(false));
    }

    #[test]
    fn task_view_defaults_to_table() {
        assert_eq!(TaskView::from_query(None), TaskView::Table);
        assert_eq!(TaskView::from_query(Some("kanban")), TaskView::Kanban);
        assert_eq!(TaskView::from_query(Some("gantt")), TaskView::Table);
    }

    #[test]
    fn kanban_groups_by_status_and_position() {
        let tasks = vec![
            task("b", TaskStatus::Todo, 2000),
            task("a", TaskStatus::Todo, 1000),
            task("c", TaskStatus::Done, 1000),
        ];
        let columns = kanban_columns(&tasks);
        assert_eq!(columns.len(), 5);
        let todo: Vec<_> = columns[&TaskStatus::Todo].iter().map(|t| t.task.id.as_str()).collect();
        assert_eq!(todo, vec!["a", "b"]);
        assert!(columns[&TaskStatus::Backlog].is_empty());
    }

    #[test]
    fn edit_form_builds_invite_link() {
        let mut form = EditWorkspaceForm::new(workspace());
        assert_eq!(form.invite_link("https://plan.example"), "https://plan.example/workspaces/w1/join/Xy12Ab");
        assert!(form.changed_name().is_none());

        form.name = "Acme Labs".into();
        assert_eq!(form.changed_name(), Some("Acme Labs"));
        assert!(form.image.to_input().is_none());
    }
}
