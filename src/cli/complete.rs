//! tasks complete command implementation
//!
//! Completing an already completed task refreshes its timestamp.

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::record::{self, Task};
use crate::store::TaskStore;

/// Options for `tasks complete`
pub struct CompleteOptions {
    pub id: String,
    pub store: TaskStore,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct CompleteReport {
    id: u64,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
}

pub fn run(options: CompleteOptions) -> Result<()> {
    let id = record::parse_task_id(&options.id)?;

    let (report, human) = match options.store.complete(id) {
        Ok(task) => {
            let mut human = HumanOutput::new(format!("✅ Set task: {id} as completed"));
            human.push_summary("Title", task.title.clone());
            (
                CompleteReport {
                    id,
                    found: true,
                    task: Some(task),
                },
                human,
            )
        }
        Err(Error::TaskNotFound(_)) => {
            let mut human = HumanOutput::new(format!("Task {id} not found"));
            human.push_next_step("tasks list");
            (
                CompleteReport {
                    id,
                    found: false,
                    task: None,
                },
                human,
            )
        }
        Err(err) => return Err(err),
    };

    emit_success(options.output, "complete", &report, Some(&human))
}
