//! Command-line interface for tasks
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use crate::config::{Config, StoreConfig, CONFIG_FILE};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::rewrite::RewriteStrategy;
use crate::store::TaskStore;

mod add;
mod complete;
mod delete;
mod init;
mod list;

/// tasks - a CSV-backed task tracker
///
/// Tasks live as rows in a CSV file that is locked exclusively for the
/// duration of every command.
#[derive(Parser, Debug)]
#[command(name = "tasks")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the task store (defaults to ./tasks.csv)
    #[arg(long, global = true, env = "TASKS_FILE")]
    pub file: Option<PathBuf>,

    /// Path to the config file (defaults to ./.tasks.toml when present)
    #[arg(long, global = true, env = "TASKS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Rewrite strategy: atomic-rename, recreate, truncate
    #[arg(long, global = true)]
    pub rewrite: Option<RewriteStrategy>,

    /// Give up waiting for the store lock after this many milliseconds
    #[arg(long, global = true)]
    pub lock_timeout_ms: Option<u64>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    #[command(after_help = "Example: tasks add 'Have fun'")]
    Add {
        /// Task title (multiple words are joined with spaces)
        title: Vec<String>,
    },

    /// View the list of tasks
    List,

    /// Set a task as completed
    #[command(after_help = "Example: tasks complete 1")]
    Complete {
        /// Task ID
        id: Option<String>,
    },

    /// Delete a task
    #[command(after_help = "Example: tasks delete 1")]
    Delete {
        /// Task ID
        id: Option<String>,
    },

    /// Create the store file with its header row
    Init,
}

impl Cli {
    pub fn run(mut self) -> Result<()> {
        // No command: usage only, before any config or store lookup
        let Some(command) = self.command.take() else {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        };
        let store = TaskStore::from_config(&self.store_config()?);
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        tracing::debug!(
            path = %store.path().display(),
            strategy = store.strategy().as_str(),
            "resolved store"
        );

        match command {
            Commands::Add { title } => add::run(add::AddOptions {
                title: title.join(" "),
                store,
                output,
            }),
            Commands::List => list::run(list::ListOptions { store, output }),
            Commands::Complete { id } => complete::run(complete::CompleteOptions {
                id: id.unwrap_or_default(),
                store,
                output,
            }),
            Commands::Delete { id } => delete::run(delete::DeleteOptions {
                id: id.unwrap_or_default(),
                store,
                output,
            }),
            Commands::Init => init::run(init::InitOptions { store, output }),
        }
    }

    /// Config file, then flags and environment on top
    fn store_config(&self) -> Result<StoreConfig> {
        let config = match self.config.as_ref() {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(&PathBuf::from(CONFIG_FILE))?,
        };

        let mut store = config.store;
        if let Some(file) = self.file.clone() {
            store.path = file;
        }
        if let Some(rewrite) = self.rewrite {
            store.rewrite = rewrite;
        }
        if let Some(timeout) = self.lock_timeout_ms {
            store.lock_timeout_ms = Some(timeout);
        }
        Ok(store)
    }
}
