//! Slashing protection history storage
//!
//! Implements the `HistoryStore` port in memory and on disk.

use crate::domain::{EpochHistory, ValidatorPubkey};
use crate::error::{AttesterError, AttesterResult};
use crate::ports::outbound::HistoryStore;
use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// History kept in process memory. Lost on restart.
pub struct InMemoryHistoryStore {
    period: u64,
    histories: RwLock<HashMap<ValidatorPubkey, EpochHistory>>,
}

impl InMemoryHistoryStore {
    /// Fails with `Config` if `period` is zero.
    pub fn new(period: u64) -> AttesterResult<Self> {
        require_period(period)?;
        Ok(Self {
            period,
            histories: RwLock::new(HashMap::new()),
        })
    }

    /// Number of keys with a saved history.
    pub fn len(&self) -> usize {
        self.histories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.read().is_empty()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self, pubkey: &ValidatorPubkey) -> AttesterResult<EpochHistory> {
        Ok(self
            .histories
            .read()
            .get(pubkey)
            .cloned()
            .unwrap_or_else(|| EpochHistory::new(self.period)))
    }

    async fn save(&self, pubkey: &ValidatorPubkey, history: &EpochHistory) -> AttesterResult<()> {
        check_period(history, self.period)?;
        self.histories.write().insert(*pubkey, history.clone());
        Ok(())
    }
}

/// One bincode file per key inside a directory owned by this process.
///
/// The directory is locked with an exclusive `flock` for the lifetime of the
/// store, so two clients can never commit history for the same keys. File
/// I/O runs on the blocking pool.
pub struct FileHistoryStore {
    dir: PathBuf,
    period: u64,
    lock_file: File,
}

impl FileHistoryStore {
    const LOCK_FILE: &'static str = "LOCK";
    const EXTENSION: &'static str = "history";

    /// Open (creating if needed) and lock `dir`.
    pub fn open<P: AsRef<Path>>(dir: P, period: u64) -> AttesterResult<Self> {
        require_period(period)?;
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(storage_err)?;

        let lock_path = dir.join(Self::LOCK_FILE);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(storage_err)?;
        lock_file.try_lock_exclusive().map_err(|_| {
            AttesterError::Storage(format!(
                "protection history already in use ({})",
                lock_path.display()
            ))
        })?;

        info!(
            "[qc-18] 💾 Opened protection history at {} (period: {})",
            dir.display(),
            period
        );

        Ok(Self {
            dir,
            period,
            lock_file,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, pubkey: &ValidatorPubkey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", pubkey.to_hex(), Self::EXTENSION))
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self, pubkey: &ValidatorPubkey) -> AttesterResult<EpochHistory> {
        let path = self.path_for(pubkey);
        let period = self.period;

        let history = blocking(move || read_history(&path, period)).await?;
        match history {
            Some(history) => Ok(history),
            None => {
                debug!("[qc-18] No history for {}, starting empty", pubkey);
                Ok(EpochHistory::new(period))
            }
        }
    }

    async fn save(&self, pubkey: &ValidatorPubkey, history: &EpochHistory) -> AttesterResult<()> {
        check_period(history, self.period)?;
        let bytes =
            bincode::serialize(history).map_err(|e| AttesterError::Storage(e.to_string()))?;

        let path = self.path_for(pubkey);
        blocking(move || write_atomic(&path, &bytes)).await?;

        debug!(
            "[qc-18] Saved history for {} (latest epoch: {})",
            pubkey,
            history.latest_epoch_written()
        );
        Ok(())
    }
}

impl Drop for FileHistoryStore {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            warn!("[qc-18] Failed to release history lock: {}", e);
        }
    }
}

/// Run file I/O on the blocking pool.
async fn blocking<T, F>(f: F) -> AttesterResult<T>
where
    F: FnOnce() -> AttesterResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AttesterError::Storage(format!("history I/O task failed: {}", e)))?
}

/// `None` when no record exists yet.
fn read_history(path: &Path, period: u64) -> AttesterResult<Option<EpochHistory>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(storage_err(e)),
    };

    let history: EpochHistory = bincode::deserialize(&bytes).map_err(|e| {
        AttesterError::Storage(format!("corrupt history {}: {}", path.display(), e))
    })?;
    check_period(&history, period)?;
    Ok(Some(history))
}

// Write atomically via temp file
fn write_atomic(path: &Path, bytes: &[u8]) -> AttesterResult<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(storage_err)?;
    file.write_all(bytes).map_err(storage_err)?;
    file.sync_all().map_err(storage_err)?;
    fs::rename(&temp_path, path).map_err(storage_err)
}

fn require_period(period: u64) -> AttesterResult<()> {
    if period == 0 {
        return Err(AttesterError::Config(
            "weak_subjectivity_period must be non-zero".to_string(),
        ));
    }
    Ok(())
}

fn check_period(history: &EpochHistory, period: u64) -> AttesterResult<()> {
    if history.period() != period {
        return Err(AttesterError::Storage(format!(
            "history period {} does not match configured period {}",
            history.period(),
            period
        )));
    }
    Ok(())
}

fn storage_err(e: std::io::Error) -> AttesterError {
    AttesterError::Storage(e.to_string())
}
