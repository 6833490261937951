//! tasks init command implementation
//!
//! Creates the store file with its header row. Safe to run repeatedly.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;

/// Options for `tasks init`
pub struct InitOptions {
    pub store: TaskStore,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct InitReport {
    path: PathBuf,
    created: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let created = options.store.initialize()?;
    let path = options.store.path().to_path_buf();

    let header = if created {
        "tasks init: initialized"
    } else {
        "tasks init: already initialized"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("store", path.display().to_string());
    human.push_next_step("tasks add <task title>");

    emit_success(
        options.output,
        "init",
        &InitReport { path, created },
        Some(&human),
    )
}
