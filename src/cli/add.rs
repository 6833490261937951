//! tasks add command implementation

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::record::Task;
use crate::store::TaskStore;

/// Options for `tasks add`
pub struct AddOptions {
    pub title: String,
    pub store: TaskStore,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct AddReport {
    task: Task,
}

pub fn run(options: AddOptions) -> Result<()> {
    let task = options.store.add(&options.title)?;

    let mut human = HumanOutput::new(format!("✅ Added: {}", task.title));
    human.push_summary("ID", task.id.to_string());

    emit_success(options.output, "add", &AddReport { task }, Some(&human))
}
