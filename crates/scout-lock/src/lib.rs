//! Single-writer guard for the memory file, using `flock(2)` directly.
//!
//! A cycle holds the lock from memory load until the last persist so two
//! overlapping scheduled runs cannot interleave read-modify-write of the
//! whole record. `Drop` calls `flock(fd, LOCK_UN)` to release.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scout_core::AppError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Diagnostic information written to lock files
#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
    reason: String,
    acquired_at: DateTime<Utc>,
}

/// Exclusive advisory lock held for the duration of a cycle.
pub struct MemoryLock {
    /// The open lock file. Closing it also releases flock, but we call
    /// `LOCK_UN` explicitly in `Drop` for deterministic release timing.
    file: File,
    lock_path: PathBuf,
}

impl std::fmt::Debug for MemoryLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for MemoryLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is a valid file descriptor owned by `self.file`.
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
    }
}

impl MemoryLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

/// Acquire a non-blocking exclusive lock named `name` under `state_dir`.
///
/// Lock path: `{state_dir}/locks/{name}.lock`
///
/// When another process holds the lock, the returned error wraps
/// [`AppError::MemoryLocked`] with the holder's PID and reason when the
/// diagnostic can be read.
pub fn acquire_lock(state_dir: &Path, name: &str, reason: &str) -> Result<MemoryLock> {
    let locks_dir = state_dir.join("locks");
    fs::create_dir_all(&locks_dir)
        .with_context(|| format!("Failed to create locks directory: {}", locks_dir.display()))?;

    let lock_path = locks_dir.join(format!("{name}.lock"));

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

    let fd = file.as_raw_fd();

    // SAFETY: `fd` is a valid file descriptor from the `File` we just opened.
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

    if ret != 0 {
        return Err(held_lock_error(&lock_path));
    }

    let mut lock = MemoryLock { file, lock_path };
    let diagnostic = LockDiagnostic {
        pid: std::process::id(),
        reason: reason.to_string(),
        acquired_at: Utc::now(),
    };
    let json = serde_json::to_string(&diagnostic).context("Failed to serialize lock diagnostic")?;

    lock.file
        .set_len(0)
        .context("Failed to truncate lock file")?;
    lock.file
        .write_all(json.as_bytes())
        .context("Failed to write lock diagnostic")?;
    lock.file.flush().context("Failed to flush lock file")?;

    Ok(lock)
}

fn held_lock_error(lock_path: &Path) -> anyhow::Error {
    let mut contents = String::new();
    let diagnostic = File::open(lock_path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .ok()
        .and_then(|_| serde_json::from_str::<LockDiagnostic>(&contents).ok());

    match diagnostic {
        Some(diagnostic) => AppError::MemoryLocked {
            pid: diagnostic.pid,
            reason: format!("{}, acquired {}", diagnostic.reason, diagnostic.acquired_at),
        }
        .into(),
        None => anyhow::anyhow!(
            "Memory is locked (unable to read diagnostic info from {})",
            lock_path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_acquire_lock_succeeds() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let lock = acquire_lock(temp_dir.path(), "memory", "cycle").expect("lock");
        assert!(lock.lock_path().exists());
    }

    #[test]
    fn test_lock_path_follows_convention() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let lock = acquire_lock(temp_dir.path(), "memory", "cycle").expect("lock");
        assert_eq!(
            lock.lock_path(),
            temp_dir.path().join("locks").join("memory.lock")
        );
    }

    #[test]
    fn test_lock_diagnostic_written() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let _lock = acquire_lock(temp_dir.path(), "memory", "scheduled cycle").expect("lock");

        let contents =
            fs::read_to_string(temp_dir.path().join("locks/memory.lock")).expect("read lock");
        let diagnostic: LockDiagnostic = serde_json::from_str(&contents).expect("parse");
        assert_eq!(diagnostic.pid, std::process::id());
        assert_eq!(diagnostic.reason, "scheduled cycle");
    }

    #[test]
    fn test_second_lock_fails_with_holder_info() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let _first = acquire_lock(temp_dir.path(), "memory", "first run").expect("first lock");

        let err = acquire_lock(temp_dir.path(), "memory", "second run").unwrap_err();
        let app_err = err.downcast_ref::<AppError>().expect("typed error");
        match app_err {
            AppError::MemoryLocked { pid, reason } => {
                assert_eq!(*pid, std::process::id());
                assert!(reason.contains("first run"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_different_names_do_not_conflict() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let a = acquire_lock(temp_dir.path(), "memory-a", "a").expect("lock a");
        let b = acquire_lock(temp_dir.path(), "memory-b", "b").expect("lock b");
        assert_ne!(a.lock_path(), b.lock_path());
    }

    #[test]
    fn test_acquire_lock_creates_nested_dirs() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let state_dir = temp_dir.path().join("deep").join("state");
        assert!(acquire_lock(&state_dir, "memory", "cycle").is_ok());
        assert!(state_dir.join("locks").is_dir());
    }

    #[test]
    fn test_acquire_lock_invalid_path() {
        let result = acquire_lock(Path::new("/dev/null"), "memory", "cycle");
        assert!(result.is_err());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let temp_dir = tempdir().expect("Failed to create temp dir");

        {
            let _lock = acquire_lock(temp_dir.path(), "memory", "first cycle")
                .expect("First lock should succeed");
            assert!(acquire_lock(temp_dir.path(), "memory", "overlapping cycle").is_err());
        }

        let again = acquire_lock(temp_dir.path(), "memory", "next cycle")
            .expect("lock should be free after drop");
        let contents = fs::read_to_string(again.lock_path()).expect("read lock");
        assert!(contents.contains("next cycle"));
    }

    #[test]
    fn test_lock_debug_format() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let lock = acquire_lock(temp_dir.path(), "memory", "cycle").expect("lock");
        let debug = format!("{lock:?}");
        assert!(debug.contains("MemoryLock"));
        assert!(debug.contains("lock_path"));
    }
}
