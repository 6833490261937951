//! Exclusive file locking for the task store
//!
//! A [`FileLock`] holds an advisory whole-file lock (fs2/flock) on the store
//! file itself. The lock is released when the guard is dropped, so every exit
//! path of an operation (including `?` returns) unlocks and closes the file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Retry interval when waiting for a lock with a timeout
const LOCK_RETRY_INTERVAL_MS: u64 = 50;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // On Windows, fs2/libc can surface lock/sharing violations as "Other".
    // Treat them as contention so callers get Err(LockFailed) after timeout.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// How long `acquire` may wait for a contended lock
#[derive(Debug, Clone, Copy)]
enum Wait {
    Forever,
    Until(Instant),
    Never,
}

/// A file lock guard that releases the lock when dropped
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire an exclusive lock, blocking until it is available
    ///
    /// If the file doesn't exist, it is created empty with owner read/write
    /// permissions.
    pub fn acquire_blocking(path: impl AsRef<Path>) -> Result<Self> {
        match Self::acquire_with(path.as_ref(), Wait::Forever)? {
            Some(lock) => Ok(lock),
            None => Err(Error::LockFailed(path.as_ref().to_path_buf())),
        }
    }

    /// Acquire an exclusive lock, waiting at most `timeout`
    pub fn acquire(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        match Self::acquire_with(path, Wait::Until(Instant::now() + timeout))? {
            Some(lock) => Ok(lock),
            None => Err(Error::LockFailed(path.to_path_buf())),
        }
    }

    /// Try to acquire a lock without waiting
    ///
    /// Returns `Ok(Some(lock))` if acquired, `Ok(None)` if would block,
    /// or `Err` for other errors.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        Self::acquire_with(path.as_ref(), Wait::Never)
    }

    fn acquire_with(path: &Path, wait: Wait) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        loop {
            let file = open_store_file(path)?;
            if !lock_file(&file, wait)? {
                tracing::debug!(path = %path.display(), "lock contended");
                return Ok(None);
            }

            // A previous holder may have replaced the file while we waited;
            // the lock we got is then on an unlinked inode.
            if still_names(&file, path)? {
                tracing::trace!(path = %path.display(), "lock acquired");
                return Ok(Some(FileLock {
                    file,
                    path: path.to_path_buf(),
                }));
            }
            tracing::trace!(path = %path.display(), "store replaced while waiting, retrying");
            let _ = FileExt::unlock(&file);
        }
    }

    /// Get a reference to the underlying file
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Get a mutable reference to the underlying file
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Get the path to the locked file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock the file - ignore errors during drop
        let _ = FileExt::unlock(&self.file);
        tracing::trace!(path = %self.path.display(), "lock released");
    }
}

fn open_store_file(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

/// Returns `Ok(false)` when the lock is contended and `wait` has run out.
fn lock_file(file: &File, wait: Wait) -> Result<bool> {
    if let Wait::Forever = wait {
        file.lock_exclusive()?;
        return Ok(true);
    }

    let retry_interval = Duration::from_millis(LOCK_RETRY_INTERVAL_MS);
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(true),
            Err(e) if is_lock_contended(&e) => match wait {
                Wait::Until(deadline) if Instant::now() < deadline => {
                    std::thread::sleep(retry_interval);
                }
                _ => return Ok(false),
            },
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

#[cfg(unix)]
fn still_names(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(current) => Ok(held.dev() == current.dev() && held.ino() == current.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(not(unix))]
fn still_names(_file: &File, path: &Path) -> Result<bool> {
    Ok(path.exists())
}
