use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing::{debug, warn};

use crate::record::MemoryRecord;

/// Durable home of the [`MemoryRecord`].
pub trait StateBackend: Send {
    /// `Ok(None)` means "no usable prior state"; the store starts empty.
    fn load(&self) -> Result<Option<MemoryRecord>>;
    /// Replace the persisted record with `record`.
    fn save(&self, record: &MemoryRecord) -> Result<()>;
}

/// Single pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    file_path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Directory holding the memory file (and its lock directory).
    pub fn state_dir(&self) -> PathBuf {
        self.file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }

    fn ensure_storage_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if dir.exists() {
            return Ok(());
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create memory dir: {}", dir.display()))?;
        set_dir_mode_700(&dir)
    }

    /// Move an unreadable memory file aside so the next save does not
    /// destroy it.
    fn quarantine(&self) {
        let mut name = self
            .file_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        let target = self.file_path.with_file_name(name);

        match fs::rename(&self.file_path, &target) {
            Ok(()) => warn!(
                path = %target.display(),
                "moved corrupt memory file aside"
            ),
            Err(error) => warn!(
                path = %self.file_path.display(),
                %error,
                "failed to move corrupt memory file aside"
            ),
        }
    }
}

impl StateBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<MemoryRecord>> {
        let bytes = match fs::read(&self.file_path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %self.file_path.display(), "no memory file yet");
                return Ok(None);
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("failed to read memory file: {}", self.file_path.display())
                });
            }
        };

        // Invalid UTF-8 is reported here as a parse error.
        match serde_json::from_slice::<MemoryRecord>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(error) => {
                warn!(
                    path = %self.file_path.display(),
                    %error,
                    "memory file is corrupt, starting from empty memory"
                );
                self.quarantine();
                Ok(None)
            }
        }
    }

    fn save(&self, record: &MemoryRecord) -> Result<()> {
        self.ensure_storage_dir()?;

        let tmp_path = self.tmp_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .with_context(|| format!("failed to open temp memory file: {}", tmp_path.display()))?;
        set_file_mode_600(&tmp_path)?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)
            .context("failed to serialize memory record")?;
        writer
            .write_all(b"\n")
            .context("failed to write memory record")?;
        writer.flush().context("failed to flush memory file")?;
        writer
            .get_ref()
            .sync_all()
            .context("failed to sync memory file")?;

        fs::rename(&tmp_path, &self.file_path).with_context(|| {
            format!(
                "failed to atomically replace memory file {}",
                self.file_path.display()
            )
        })?;
        Ok(())
    }
}

/// Process-local backend that counts saves.
///
/// Clones share the same slot, so a caller can keep one handle to inspect
/// what a consumed [`MemoryStore`](crate::MemoryStore) persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<InMemorySlot>>,
}

#[derive(Debug, Default)]
struct InMemorySlot {
    record: Option<MemoryRecord>,
    saves: usize,
}

impl InMemoryBackend {
    pub fn with_record(record: MemoryRecord) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemorySlot {
                record: Some(record),
                saves: 0,
            })),
        }
    }

    pub fn saves(&self) -> usize {
        self.inner.lock().map(|slot| slot.saves).unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<MemoryRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|slot| slot.record.clone())
    }
}

impl StateBackend for InMemoryBackend {
    fn load(&self) -> Result<Option<MemoryRecord>> {
        let slot = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory slot poisoned"))?;
        Ok(slot.record.clone())
    }

    fn save(&self, record: &MemoryRecord) -> Result<()> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory slot poisoned"))?;
        slot.record = Some(record.clone());
        slot.saves += 1;
        Ok(())
    }
}

#[cfg(unix)]
fn set_dir_mode_700(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
        .with_context(|| format!("failed to chmod 700: {}", path.display()))
}

#[cfg(not(unix))]
fn set_dir_mode_700(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_mode_600(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to chmod 600: {}", path.display()))
}

#[cfg(not(unix))]
fn set_file_mode_600(_path: &Path) -> Result<()> {
    Ok(())
}
