//! tasks - CSV-backed task tracker library
//!
//! This library provides the core of the `tasks` CLI: a flat CSV file of
//! tasks, read and rewritten under an exclusive file lock so that concurrent
//! invocations never interleave.
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.tasks.toml`
//! - `error`: Error types and result aliases
//! - `lock`: Exclusive advisory locking of the store file
//! - `output`: Human and JSON output for commands
//! - `record`: CSV row codec for tasks
//! - `rewrite`: Strategies for replacing the store file
//! - `store`: Add, list, complete and delete over the locked file

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod record;
pub mod rewrite;
pub mod store;

pub use error::{Error, Result};
pub use record::Task;
pub use store::TaskStore;
