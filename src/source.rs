//! Data sources
//!
//! A `DataSource` hands the load pipeline raw text for the metadata table and
//! for each (participant, condition, kind) slot. Any fetch failure is reported
//! as `SourceUnavailable`; the pipeline decides whether that is fatal.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::config::LoaderConfig;
use crate::error::GazeError;
use crate::types::{ParticipantId, RecordKind, VisualizationCondition};

/// Address of one participant/condition/kind slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SlotKey {
    pub participant: ParticipantId,
    pub condition: VisualizationCondition,
    pub kind: RecordKind,
}

impl SlotKey {
    pub fn new(
        participant: ParticipantId,
        condition: VisualizationCondition,
        kind: RecordKind,
    ) -> Self {
        Self {
            participant,
            condition,
            kind,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.participant, self.condition, self.kind)
    }
}

/// Which file family a slot text comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrigin {
    Raw,
    Generated,
}

/// Trait for corpus text providers
pub trait DataSource {
    /// Text of the shared participant metadata table
    fn metadata_table(&self) -> Result<String, GazeError>;

    /// Raw record text of a slot
    fn raw_text(&self, slot: &SlotKey) -> Result<String, GazeError>;

    /// Generated stats text of a slot
    fn generated_text(&self, slot: &SlotKey) -> Result<String, GazeError>;
}

/// Filesystem source laid out by the configured path templates.
///
/// Each read runs on a worker thread and is abandoned once the fetch timeout
/// elapses. Only regular files are read, and never past the size limit.
#[derive(Debug, Clone)]
pub struct FsSource {
    config: LoaderConfig,
}

impl FsSource {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn read(&self, path: PathBuf) -> Result<String, GazeError> {
        read_bounded(
            path,
            self.config.max_file_bytes,
            self.config.fetch_timeout(),
        )
    }
}

impl DataSource for FsSource {
    fn metadata_table(&self) -> Result<String, GazeError> {
        self.read(self.config.metadata_path())
    }

    fn raw_text(&self, slot: &SlotKey) -> Result<String, GazeError> {
        self.read(
            self.config
                .raw_path(&slot.participant, slot.condition, slot.kind),
        )
    }

    fn generated_text(&self, slot: &SlotKey) -> Result<String, GazeError> {
        self.read(
            self.config
                .generated_path(&slot.participant, slot.condition, slot.kind),
        )
    }
}

fn read_bounded(path: PathBuf, max_bytes: u64, timeout: Duration) -> Result<String, GazeError> {
    let (tx, rx) = mpsc::channel();
    let worker_path = path.clone();
    thread::spawn(move || {
        // The receiver may have given up already
        let _ = tx.send(read_limited(&worker_path, max_bytes));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(GazeError::SourceUnavailable(format!(
            "{}: timed out after {} ms",
            path.display(),
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(GazeError::SourceUnavailable(format!(
            "{}: reader exited without a result",
            path.display()
        ))),
    }
}

fn read_limited(path: &Path, max_bytes: u64) -> Result<String, GazeError> {
    let unavailable = |e: io::Error| {
        GazeError::SourceUnavailable(format!("{}: {}", path.display(), e))
    };
    let too_large = || {
        GazeError::SourceUnavailable(format!(
            "{}: exceeds limit of {} bytes",
            path.display(),
            max_bytes
        ))
    };

    let file = File::open(path).map_err(unavailable)?;
    let metadata = file.metadata().map_err(unavailable)?;
    if !metadata.is_file() {
        return Err(GazeError::SourceUnavailable(format!(
            "{}: not a regular file",
            path.display()
        )));
    }
    if metadata.len() > max_bytes {
        return Err(too_large());
    }

    // The file may have grown since the size check
    let mut bytes = Vec::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(unavailable)?;
    if bytes.len() as u64 > max_bytes {
        return Err(too_large());
    }

    String::from_utf8(bytes).map_err(|e| {
        GazeError::SourceUnavailable(format!("{}: {}", path.display(), e))
    })
}

/// Create a named pipe for tests that need a read which never completes
#[cfg(all(test, unix))]
pub(crate) fn make_fifo(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let status = std::process::Command::new("mkfifo")
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success());
}

/// In-memory source, for tests and for embedding callers that fetch
/// text themselves
#[derive(Debug, Default)]
pub struct MemorySource {
    metadata: Option<String>,
    texts: HashMap<(TextOrigin, SlotKey), String>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, text: impl Into<String>) -> Self {
        self.metadata = Some(text.into());
        self
    }

    pub fn insert_raw(&mut self, slot: SlotKey, text: impl Into<String>) -> &mut Self {
        self.texts.insert((TextOrigin::Raw, slot), text.into());
        self
    }

    pub fn insert_generated(&mut self, slot: SlotKey, text: impl Into<String>) -> &mut Self {
        self.texts.insert((TextOrigin::Generated, slot), text.into());
        self
    }

    /// Number of slot fetches served or refused so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn lookup(&self, origin: TextOrigin, slot: &SlotKey) -> Result<String, GazeError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.texts
            .get(&(origin, slot.clone()))
            .cloned()
            .ok_or_else(|| {
                GazeError::SourceUnavailable(format!("no {:?} text for {}", origin, slot))
            })
    }
}

impl DataSource for MemorySource {
    fn metadata_table(&self) -> Result<String, GazeError> {
        self.metadata
            .clone()
            .ok_or_else(|| GazeError::SourceUnavailable("no metadata table".to_string()))
    }

    fn raw_text(&self, slot: &SlotKey) -> Result<String, GazeError> {
        self.lookup(TextOrigin::Raw, slot)
    }

    fn generated_text(&self, slot: &SlotKey) -> Result<String, GazeError> {
        self.lookup(TextOrigin::Generated, slot)
    }
}
