//! Durable key-value slots and the roster persistence adapter.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Client;

/// Versioned slot name. Incompatible schema changes get a new key; old data is abandoned.
pub const STORAGE_KEY: &str = "trainer_pro_data_v5";

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per slot inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // write-then-rename so a reader never sees a half-written slot
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slots.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Latest unsaved snapshot shared with the writer thread.
#[derive(Default)]
struct PendingState {
    latest: Option<String>,
    writing: bool,
    closed: bool,
}

#[derive(Default)]
struct Pending {
    state: Mutex<PendingState>,
    changed: Condvar,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, PendingState>) -> MutexGuard<'a, PendingState> {
        self.changed.wait(guard).unwrap_or_else(|e| e.into_inner())
    }
}

struct Writer {
    pending: Arc<Pending>,
    handle: Option<JoinHandle<()>>,
}

type SharedStore = Arc<Mutex<Box<dyn KeyValueStore>>>;

fn write_slot(store: &SharedStore, key: &str, json: &str) {
    let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
    match store.set(key, json) {
        Ok(()) => debug!(key, bytes = json.len(), "Saved roster"),
        Err(e) => warn!(key, "Failed to save roster: {}", e),
    }
}

fn run_writer(store: SharedStore, key: String, pending: Arc<Pending>) {
    loop {
        let json = {
            let mut state = pending.lock();
            while state.latest.is_none() && !state.closed {
                state = pending.wait(state);
            }
            match state.latest.take() {
                Some(json) => {
                    state.writing = true;
                    json
                }
                None => break,
            }
        };
        write_slot(&store, &key, &json);
        pending.lock().writing = false;
        pending.changed.notify_all();
    }
}

/// Mirrors the roster into a single slot.
///
/// Saves are written inline until [`Persistence::with_background_writer`] is
/// called; after that a writer thread stores only the newest snapshot and
/// intermediate ones are skipped.
pub struct Persistence {
    store: SharedStore,
    key: String,
    writer: Option<Writer>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: Box<dyn KeyValueStore>, key: &str) -> Self {
        Persistence {
            store: Arc::new(Mutex::new(store)),
            key: key.to_string(),
            writer: None,
        }
    }

    pub fn with_background_writer(mut self) -> Self {
        let pending = Arc::new(Pending::default());
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let shared = Arc::clone(&pending);
        match thread::Builder::new()
            .name("roster-writer".to_string())
            .spawn(move || run_writer(store, key, shared))
        {
            Ok(handle) => self.writer = Some(Writer { pending, handle: Some(handle) }),
            Err(e) => warn!("Roster writer unavailable, saving inline: {}", e),
        }
        self
    }

    fn decode(raw: &str) -> Result<Vec<Client>> {
        Ok(serde_json::from_str(raw)?)
    }

    fn encode(roster: &[Client]) -> Result<String> {
        Ok(serde_json::to_string(roster)?)
    }

    /// Missing or unreadable data is an empty roster. Queued saves land first.
    pub fn load(&self) -> Vec<Client> {
        self.flush();
        let read = {
            let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
            store.get(&self.key)
        };
        let raw = match read {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, "Failed to read roster slot: {}", e);
                return Vec::new();
            }
        };
        match Self::decode(&raw) {
            Ok(roster) => {
                debug!(key = %self.key, clients = roster.len(), "Loaded roster");
                roster
            }
            Err(e) => {
                warn!(key = %self.key, "Discarding unparsable roster: {}", e);
                Vec::new()
            }
        }
    }

    /// Writes the full roster. Failures are logged, never returned.
    pub fn save(&mut self, roster: &[Client]) {
        let json = match Self::encode(roster) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize roster: {}", e);
                return;
            }
        };
        match &self.writer {
            Some(writer) => {
                writer.pending.lock().latest = Some(json);
                writer.pending.changed.notify_all();
            }
            None => write_slot(&self.store, &self.key, &json),
        }
    }

    /// Blocks until every queued snapshot is in the store.
    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            let mut state = writer.pending.lock();
            while state.latest.is_some() || state.writing {
                state = writer.pending.wait(state);
            }
        }
    }
}

impl Drop for Persistence {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            writer.pending.lock().closed = true;
            writer.pending.changed.notify_all();
            if let Some(handle) = writer.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
