use clap::Subcommand;
use serde_json::json;

use crate::cli::config::load_cli_config;
use crate::cli::utils::{column, output_rows, output_success};
use crate::cli::OutputFormat;
use crate::models::{TaskListQuery, TaskStatus};

#[derive(Subcommand)]
pub enum TaskCommands {
    #[command(about = "List tasks of a workspace")]
    List {
        #[arg(help = "Workspace id")]
        workspace_id: String,
        #[arg(long, help = "Only tasks with this status (e.g. todo, in-progress)")]
        status: Option<TaskStatus>,
        #[arg(long, help = "Only tasks of this project")]
        project: Option<String>,
        #[arg(long, help = "Case-insensitive name search")]
        search: Option<String>,
    },

    #[command(about = "Delete a task")]
    Delete {
        #[arg(help = "Task id")]
        task_id: String,
    },
}

pub async fn handle(cmd: TaskCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_cli_config()?.client()?;

    match cmd {
        TaskCommands::List { workspace_id, status, project, search } => {
            let query = TaskListQuery {
                workspace_id: Some(workspace_id),
                project_id: project,
                status,
                search,
                ..Default::default()
            };
            let tasks = client.list_tasks(&query).await?;
            output_rows(&output_format, &tasks.documents, "No tasks", |t| {
                let project = t.project.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
                let assignee = t.assignee.as_ref().map(|m| m.name.as_str()).unwrap_or("-");
                format!(
                    "{}  {}  {}  {}  {}  due {}",
                    column(&t.task.id, 32),
                    column(t.task.status.as_str(), 11),
                    column(&t.task.name, 28),
                    column(project, 16),
                    column(assignee, 16),
                    t.task.due_date
                )
            })
        }
        TaskCommands::Delete { task_id } => {
            let deleted = client.delete_task(&task_id).await?;
            output_success(
                &output_format,
                &format!("Task {} deleted", deleted.id),
                Some(json!({ "id": deleted.id })),
            )
        }
    }
}
