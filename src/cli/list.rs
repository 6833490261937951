//! tasks list command implementation

use crate::error::Result;
use crate::output::{emit_success, format_relative, format_table, HumanOutput, OutputOptions};
use crate::record::Task;
use crate::store::{local_now, TaskStore};

/// Options for `tasks list`
pub struct ListOptions {
    pub store: TaskStore,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<Task>,
}

pub fn run(options: ListOptions) -> Result<()> {
    let tasks = options.store.list()?;

    let human = if tasks.is_empty() {
        HumanOutput::new("No tasks in list yet")
    } else {
        let now = local_now();
        let rows: Vec<Vec<String>> = tasks
            .iter()
            .map(|task| {
                vec![
                    task.id.to_string(),
                    task.title.clone(),
                    format_relative(task.created_at, now),
                    task.completed_at
                        .map(|at| format_relative(at, now))
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();

        let mut human = HumanOutput::new("Tasks");
        human.set_body(format_table(&["ID", "Title", "Created", "Completed"], &rows));
        human
    };

    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    emit_success(options.output, "list", &output, Some(&human))
}
