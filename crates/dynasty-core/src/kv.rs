// Key-value backing store: the pluggable persistence substrate under every
// codec, plus the change bus that lets sibling handles ("tabs") observe each
// other's writes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing `{key}` ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("no active dynasty is bound to this session")]
    NoActiveDynasty,

    #[error("failed to encode value for `{key}`: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Synchronous string-to-string storage, the shape of the browser's
/// `localStorage`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// `false` when there is no persistent storage in this environment and
    /// every write is being dropped.
    fn is_available(&self) -> bool {
        true
    }
}

/// In-process backend. An optional byte quota (keys + values) makes it
/// behave like a full browser store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        MemoryStore {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Panics if the mutex is poisoned, which only happens if another thread
    /// panicked mid-write.
    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().expect("memory store mutex poisoned")
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries();
        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

/// Backend for environments with no persistent storage (server-side
/// rendering, sandboxed frames). Reads are absent and writes vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(Vec::new())
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Change notifications
// ---------------------------------------------------------------------------

/// Capacity of the change bus. A listener that falls further behind than
/// this receives a single `key: None` event and must re-read everything.
const EVENT_BUS_CAPACITY: usize = 256;

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// A write observed on the shared store.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEvent {
    /// The key that changed; `None` when the set of changed keys is unknown.
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Handle that performed the write.
    pub origin: u64,
}

impl StorageEvent {
    fn unknown(origin: u64) -> Self {
        StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
            origin,
        }
    }

    /// True if this event may have touched `key`.
    pub fn affects(&self, key: &str) -> bool {
        self.key.as_deref().map_or(true, |k| k == key)
    }

    /// True if this event may have touched any key starting with `prefix`.
    pub fn affects_prefix(&self, prefix: &str) -> bool {
        self.key.as_deref().map_or(true, |k| k.starts_with(prefix))
    }
}

/// Subscription to writes made through *other* handles on the same store.
pub struct StorageListener {
    rx: broadcast::Receiver<StorageEvent>,
    origin: u64,
}

impl StorageListener {
    /// Drain every pending foreign event without blocking.
    pub fn drain(&mut self) -> Vec<StorageEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("storage listener lagged by {skipped} events, forcing full reload");
                    events.push(StorageEvent::unknown(0));
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Storage handle
// ---------------------------------------------------------------------------

/// Cloneable handle over a shared backend. Clones share an origin id; use
/// [`Storage::open_tab`] for an independent observer of the same store.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    bus: broadcast::Sender<StorageEvent>,
    origin: u64,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (bus, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Storage {
            backend,
            bus,
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn unavailable() -> Self {
        Self::new(Arc::new(UnavailableStore))
    }

    /// A sibling handle on the same backend and bus with its own origin, the
    /// equivalent of the same site open in a second browser tab.
    pub fn open_tab(&self) -> Storage {
        Storage {
            backend: Arc::clone(&self.backend),
            bus: self.bus.clone(),
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Read a raw value. Backend failures are logged and read as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("storage read of `{key}` failed: {e}");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = self.get(key);
        self.backend.set(key, value)?;
        if old_value.as_deref() != Some(value) {
            self.publish(StorageEvent {
                key: Some(key.to_string()),
                old_value,
                new_value: Some(value.to_string()),
                origin: self.origin,
            });
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = self.get(key);
        self.backend.remove(key)?;
        if old_value.is_some() {
            self.publish(StorageEvent {
                key: Some(key.to_string()),
                old_value,
                new_value: None,
                origin: self.origin,
            });
        }
        Ok(())
    }

    /// Every stored key. Backend failures are logged and yield no keys.
    pub fn keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("storage key scan failed: {e}");
                Vec::new()
            }
        }
    }

    pub fn subscribe(&self) -> StorageListener {
        StorageListener {
            rx: self.bus.subscribe(),
            origin: self.origin,
        }
    }

    fn publish(&self, event: StorageEvent) {
        // Err only means nobody is listening.
        if self.bus.send(event).is_err() {
            debug!("storage event dropped: no listeners");
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("origin", &self.origin)
            .field("available", &self.is_available())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
