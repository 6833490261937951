//! Rewrite strategies for replacing the store file
//!
//! Every strategy writes the full header row first, then every task in
//! order. All of them run while the caller holds the store's [`FileLock`].

use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::record::{self, Row, Task};

/// Policy for replacing the contents of the store file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteStrategy {
    /// Write a temp file in the same directory, then rename it over the store.
    /// The existing file survives any failure before the rename.
    #[default]
    AtomicRename,
    /// Remove the store and create it again under the same name.
    /// A crash between removal and write loses the store.
    Recreate,
    /// Truncate the locked handle and write in place.
    /// A crash mid-write leaves a partial file.
    Truncate,
}

impl RewriteStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteStrategy::AtomicRename => "atomic-rename",
            RewriteStrategy::Recreate => "recreate",
            RewriteStrategy::Truncate => "truncate",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "atomic-rename" | "rename" => Ok(RewriteStrategy::AtomicRename),
            "recreate" => Ok(RewriteStrategy::Recreate),
            "truncate" => Ok(RewriteStrategy::Truncate),
            other => Err(Error::InvalidConfig(format!(
                "unknown rewrite strategy '{other}' (expected atomic-rename, recreate or truncate)"
            ))),
        }
    }

    /// Replace the store contents with `header` followed by `tasks`.
    ///
    /// `Recreate` swaps the guard inside `lock` for one on the new file.
    /// Another process may have created and filled that file in between,
    /// so it is truncated like any other in-place write.
    pub fn rewrite(&self, lock: &mut FileLock, header: &[String], tasks: &[Task]) -> Result<()> {
        let rows = record::encode(header, tasks);
        tracing::debug!(
            path = %lock.path().display(),
            strategy = self.as_str(),
            tasks = tasks.len(),
            "rewriting store"
        );
        match self {
            RewriteStrategy::AtomicRename => rename_over(lock.path(), &rows),
            RewriteStrategy::Recreate => {
                let path = lock.path().to_path_buf();
                fs::remove_file(&path)?;
                *lock = FileLock::acquire_blocking(&path)?;
                write_locked(lock, &rows)
            }
            RewriteStrategy::Truncate => write_locked(lock, &rows),
        }
    }
}

impl std::fmt::Display for RewriteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RewriteStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn write_locked(lock: &mut FileLock, rows: &[Row]) -> Result<()> {
    let file = lock.file_mut();
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    record::write_rows(&mut *file, rows)?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

fn rename_over(path: &Path, rows: &[Row]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Temp file in the same directory so the rename stays on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    record::write_rows(temp.as_file_mut(), rows)?;
    temp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    temp.persist(path)?;
    Ok(())
}
