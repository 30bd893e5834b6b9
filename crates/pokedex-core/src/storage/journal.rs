//! Journaled disk backend
//!
//! Reads are served from an in-memory [`MemoryBackend`]. Every mutation is
//! first appended to a JSON-lines journal and only then applied in memory, all
//! under one writer lock, so the journal order is the commit order.
//!
//! ## File Format
//! ```text
//! {"op":"set","key":["counter","pokemon"],"value":3}
//! {"op":"set","key":["pokemons",3],"value":{"name":"Pikachu","id":3,...}}
//! {"op":"delete","key":["pokemons",1]}
//! ```
//!
//! On open the journal is replayed, a torn final line is dropped, and the file
//! is compacted to one `set` line per live key.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::constants::JOURNAL_FILENAME;
use crate::storage::{KvBackend, MemoryBackend, StoreResult};
use crate::types::{KvKey, StoreError};

/// One journal line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum JournalEntry {
    Set { key: KvKey, value: Value },
    Delete { key: KvKey },
}

/// Outcome of replaying a journal on open
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryReport {
    /// Complete lines applied
    pub entries_replayed: usize,
    /// Whether an incomplete trailing line was discarded
    pub torn_tail_discarded: bool,
    /// Live keys after replay
    pub live_keys: usize,
}

/// Append handle on the journal file
///
/// `committed_len` is the file length after the last complete append. Bytes
/// past it are the remains of a failed write and are cut off before the next
/// append, so a failed write never glues onto the following line.
struct JournalWriter {
    file: File,
    sync_writes: bool,
    committed_len: u64,
    poisoned: bool,
}

impl JournalWriter {
    fn open(path: &Path, sync_writes: bool) -> StoreResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let committed_len = file.metadata()?.len();
        Ok(Self {
            file,
            sync_writes,
            committed_len,
            poisoned: false,
        })
    }

    fn append(&mut self, entry: &JournalEntry) -> StoreResult<()> {
        if self.poisoned {
            return Err(StoreError::Io(io::Error::other(
                "journal holds unrecoverable partial bytes; reopen the store",
            )));
        }

        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        if let Err(e) = self.write_line(&line) {
            self.roll_back();
            return Err(e);
        }
        self.committed_len += line.len() as u64;
        Ok(())
    }

    fn write_line(&mut self, line: &[u8]) -> StoreResult<()> {
        let on_disk = self.file.metadata()?.len();
        if on_disk != self.committed_len {
            warn!(
                on_disk,
                committed = self.committed_len,
                "truncating partial journal bytes before append"
            );
            self.file.set_len(self.committed_len)?;
        }
        // Append mode: the write lands at the (possibly truncated) end.
        self.file.write_all(line)?;
        if self.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the file back to the last complete append
    fn roll_back(&mut self) {
        if let Err(e) = self.file.set_len(self.committed_len) {
            error!(error = %e, committed = self.committed_len, "journal rollback failed, refusing further writes");
            self.poisoned = true;
        }
    }
}

/// Key-value backend persisted to a journal in a data directory
pub struct DiskBackend {
    /// Current state, rebuilt from the journal on open
    memory: MemoryBackend,

    /// Serializes every mutation (journal append + memory apply)
    writer: Mutex<JournalWriter>,

    /// Journal location
    path: PathBuf,

    /// fsync after every append
    sync_writes: bool,
}

impl DiskBackend {
    /// Open or create the journal inside `data_dir`
    pub fn open(data_dir: impl AsRef<Path>, sync_writes: bool) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(JOURNAL_FILENAME);

        let memory = MemoryBackend::new();
        let report = if path.exists() {
            replay(&path, &memory)?
        } else {
            RecoveryReport::default()
        };
        info!(
            path = %path.display(),
            entries_replayed = report.entries_replayed,
            torn_tail_discarded = report.torn_tail_discarded,
            live_keys = report.live_keys,
            "journal opened"
        );

        write_snapshot(&path, &memory)?;
        let writer = JournalWriter::open(&path, sync_writes)?;

        Ok(Self {
            memory,
            writer: Mutex::new(writer),
            path,
            sync_writes,
        })
    }

    /// Journal file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the journal as one `set` line per live key
    pub fn compact(&self) -> StoreResult<()> {
        let mut writer = self.writer.lock();
        write_snapshot(&self.path, &self.memory)?;
        *writer = JournalWriter::open(&self.path, self.sync_writes)?;
        Ok(())
    }

    /// Flush the journal to stable storage
    pub fn sync(&self) -> StoreResult<()> {
        self.writer.lock().file.sync_all()?;
        Ok(())
    }
}

/// Apply every complete journal line to `memory`
fn replay(path: &Path, memory: &MemoryBackend) -> StoreResult<RecoveryReport> {
    let bytes = fs::read(path)?;
    let mut report = RecoveryReport::default();

    let mut lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    // split yields a trailing segment after the last newline; non-empty means torn
    if let Some(tail) = lines.pop() {
        if !tail.is_empty() {
            warn!(path = %path.display(), bytes = tail.len(), "discarding torn journal tail");
            report.torn_tail_discarded = true;
        }
    }

    for (index, line) in lines.iter().enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let entry: JournalEntry = serde_json::from_slice(line).map_err(|e| StoreError::Corruption {
            line: index + 1,
            reason: e.to_string(),
        })?;
        match entry {
            JournalEntry::Set { key, value } => memory.set(&key, value)?,
            JournalEntry::Delete { key } => {
                memory.delete(&key)?;
            }
        }
        report.entries_replayed += 1;
    }

    report.live_keys = memory.len();
    Ok(report)
}

/// Atomically replace the journal with the current state
fn write_snapshot(path: &Path, memory: &MemoryBackend) -> StoreResult<()> {
    let tmp_path = path.with_extension("journal.tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        for (key, value) in memory.snapshot() {
            let mut line = serde_json::to_vec(&JournalEntry::Set { key, value })?;
            line.push(b'\n');
            tmp.write_all(&line)?;
        }
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    debug!(path = %path.display(), live_keys = memory.len(), "journal compacted");
    Ok(())
}

impl KvBackend for DiskBackend {
    fn get(&self, key: &KvKey) -> StoreResult<Option<Value>> {
        self.memory.get(key)
    }

    fn list(&self, prefix: &KvKey) -> StoreResult<Vec<(KvKey, Value)>> {
        self.memory.list(prefix)
    }

    fn set(&self, key: &KvKey, value: Value) -> StoreResult<()> {
        let mut writer = self.writer.lock();
        writer.append(&JournalEntry::Set {
            key: key.clone(),
            value: value.clone(),
        })?;
        self.memory.set(key, value)
    }

    fn delete(&self, key: &KvKey) -> StoreResult<bool> {
        let mut writer = self.writer.lock();
        if self.memory.get(key)?.is_none() {
            return Ok(false);
        }
        writer.append(&JournalEntry::Delete { key: key.clone() })?;
        self.memory.delete(key)
    }

    fn atomic_add(&self, key: &KvKey, delta: u64) -> StoreResult<u64> {
        // Holding the writer lock makes peek + set one step for all mutators.
        let mut writer = self.writer.lock();
        let next = self.memory.peek_add(key, delta)?;
        writer.append(&JournalEntry::Set {
            key: key.clone(),
            value: Value::from(next),
        })?;
        self.memory.set(key, Value::from(next))?;
        Ok(next)
    }
}
