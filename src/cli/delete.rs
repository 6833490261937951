//! tasks delete command implementation

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::record;
use crate::store::TaskStore;

/// Options for `tasks delete`
pub struct DeleteOptions {
    pub id: String,
    pub store: TaskStore,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct TaskDeleteOutput {
    id: u64,
    found: bool,
}

pub fn run(options: DeleteOptions) -> Result<()> {
    let id = record::parse_task_id(&options.id)?;

    let found = match options.store.delete(id) {
        Ok(_) => true,
        Err(Error::TaskNotFound(_)) => false,
        Err(err) => return Err(err),
    };

    let human = if found {
        HumanOutput::new(format!("✅ Deleted task {id}"))
    } else {
        let mut human = HumanOutput::new(format!("Task {id} not found"));
        human.push_next_step("tasks list");
        human
    };

    emit_success(
        options.output,
        "delete",
        &TaskDeleteOutput { id, found },
        Some(&human),
    )
}
