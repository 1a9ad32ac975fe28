//! Keep an in-memory value durably in sync with a storage record.
//!
//! A [`PersistenceSync`] starts out `Hydrating`. [`PersistenceSync::hydrate`]
//! loads the stored record over caller defaults and always ends `Hydrated`;
//! only then do [`PersistenceSync::schedule`] calls turn into debounced
//! writes. Pending writes are flushed on drop.

mod index;

pub use index::BoardIndex;

use crate::debounce::Debouncer;
use crate::diff;
use crate::error::Result;
use crate::storage::Storage;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Default idle window before a scheduled write hits storage
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

/// Lifecycle of a sync handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Hydrating,
    Hydrated,
}

#[derive(Debug)]
struct SyncState {
    phase: SyncPhase,
    last_written: Option<Value>,
    pending: Option<Value>,
}

/// Debounced writer for one storage key
pub struct PersistenceSync<T> {
    key: String,
    storage: Arc<dyn Storage>,
    state: Arc<Mutex<SyncState>>,
    debouncer: Debouncer,
    _value: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for PersistenceSync<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceSync")
            .field("key", &self.key)
            .field("phase", &lock(&self.state).phase)
            .finish()
    }
}

impl<T> PersistenceSync<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(key: impl Into<String>, storage: Arc<dyn Storage>, delay: Duration) -> Self {
        Self {
            key: key.into(),
            storage,
            state: Arc::new(Mutex::new(SyncState {
                phase: SyncPhase::Hydrating,
                last_written: None,
                pending: None,
            })),
            debouncer: Debouncer::new(delay),
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> SyncPhase {
        lock(&self.state).phase
    }

    pub fn is_hydrated(&self) -> bool {
        self.phase() == SyncPhase::Hydrated
    }

    /// True while a write is waiting for the debounce window or a retry
    pub fn has_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Load the stored record merged over `defaults`.
    ///
    /// Missing records, storage failures and records that no longer fit `T`
    /// all fall back to `defaults`. The handle is `Hydrated` afterwards in
    /// every case.
    pub async fn hydrate(&self, defaults: T) -> T {
        {
            let mut state = lock(&self.state);
            state.phase = SyncPhase::Hydrating;
            state.pending = None;
        }
        self.debouncer.cancel();

        let storage = Arc::clone(&self.storage);
        let key = self.key.clone();
        let record = match tokio::task::spawn_blocking(move || storage.read(&key)).await {
            Ok(result) => result,
            Err(e) => {
                warn!(key = %self.key, error = %e, "hydration task failed");
                Ok(None)
            }
        };

        let value = match record {
            Ok(Some(stored)) => self.merge_over(defaults, &stored),
            Ok(None) => {
                debug!(key = %self.key, "no stored record, using defaults");
                defaults
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read record, using defaults");
                defaults
            }
        };

        let mut state = lock(&self.state);
        state.last_written = serde_json::to_value(&value).ok();
        state.phase = SyncPhase::Hydrated;
        info!(key = %self.key, "hydrated");
        value
    }

    fn merge_over(&self, defaults: T, stored: &Value) -> T {
        let base = match serde_json::to_value(&defaults) {
            Ok(base) => base,
            Err(e) => {
                warn!(key = %self.key, error = %e, "defaults not serializable");
                return defaults;
            }
        };
        match serde_json::from_value(diff::shallow_merge(&base, stored)) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored record does not match schema, using defaults");
                defaults
            }
        }
    }

    /// Schedule a debounced write of `value`.
    ///
    /// Ignored until hydrated. A value deep-equal to the last written one
    /// drops any pending write instead.
    pub fn schedule(&self, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.key, error = %e, "value not serializable, skipping write");
                return;
            }
        };

        {
            let mut state = lock(&self.state);
            if state.phase != SyncPhase::Hydrated {
                trace!(key = %self.key, "not hydrated yet, ignoring change");
                return;
            }
            let unchanged = state
                .last_written
                .as_ref()
                .is_some_and(|last| diff::equivalent(last, &value));
            if unchanged {
                state.pending = None;
                drop(state);
                self.debouncer.cancel();
                trace!(key = %self.key, "value matches last write");
                return;
            }
            state.pending = Some(value);
        }

        let key = self.key.clone();
        let storage = Arc::clone(&self.storage);
        let state = Arc::clone(&self.state);
        self.debouncer.schedule(async move {
            let write_key = key.clone();
            let written = tokio::task::spawn_blocking(move || {
                write_pending(&write_key, storage.as_ref(), &state)
            })
            .await;
            match written {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(key = %key, error = %e, "debounced write failed, will retry on next change")
                }
                Err(e) => warn!(key = %key, error = %e, "debounced write task failed"),
            }
        });
    }

    /// Write any pending value now and cancel the timer.
    ///
    /// Returns whether a write happened.
    pub fn flush(&self) -> Result<bool> {
        self.debouncer.cancel();
        write_pending(&self.key, self.storage.as_ref(), &self.state)
    }
}

impl<T> Drop for PersistenceSync<T> {
    fn drop(&mut self) {
        self.debouncer.cancel();
        if let Err(e) = write_pending(&self.key, self.storage.as_ref(), &self.state) {
            warn!(key = %self.key, error = %e, "failed to flush on drop");
        }
    }
}

/// Write the pending value if it differs from the last write. On failure the
/// value stays pending.
fn write_pending(key: &str, storage: &dyn Storage, state: &Mutex<SyncState>) -> Result<bool> {
    let mut state = lock(state);
    let Some(value) = state.pending.take() else {
        return Ok(false);
    };
    if state
        .last_written
        .as_ref()
        .is_some_and(|last| diff::equivalent(last, &value))
    {
        return Ok(false);
    }
    match storage.write(key, &value) {
        Ok(()) => {
            debug!(key, "record persisted");
            state.last_written = Some(value);
            Ok(true)
        }
        Err(e) => {
            state.pending = Some(value);
            Err(e)
        }
    }
}

fn lock(state: &Mutex<SyncState>) -> MutexGuard<'_, SyncState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        volume: u8,
        #[serde(default)]
        shuffle: bool,
    }

    fn defaults() -> Prefs {
        Prefs {
            theme: "dark".into(),
            volume: 5,
            shuffle: true,
        }
    }

    fn setup() -> (MemoryStorage, PersistenceSync<Prefs>) {
        let storage = MemoryStorage::new();
        let sync = PersistenceSync::new(
            "prefs",
            Arc::new(storage.clone()),
            Duration::from_millis(500),
        );
        (storage, sync)
    }

    #[tokio::test]
    async fn test_hydrate_merges_over_defaults() {
        let (storage, sync) = setup();
        // Saved before `shuffle` existed
        storage
            .write("prefs", &json!({"theme": "light", "volume": 9}))
            .unwrap();

        let value = sync.hydrate(defaults()).await;
        assert_eq!(
            value,
            Prefs {
                theme: "light".into(),
                volume: 9,
                shuffle: true
            }
        );
        assert!(sync.is_hydrated());
    }

    #[tokio::test]
    async fn test_hydrate_falls_back_on_schema_mismatch() {
        let (storage, sync) = setup();
        storage.write("prefs", &json!({"volume": "loud"})).unwrap();

        let value = sync.hydrate(defaults()).await;
        assert_eq!(value, defaults());
        assert_eq!(sync.phase(), SyncPhase::Hydrated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_ignored_before_hydration() {
        let (storage, sync) = setup();
        sync.schedule(&defaults());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(storage.write_count(), 0);
        assert!(!sync.flush().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_write_coalesces() {
        let (storage, sync) = setup();
        let mut prefs = sync.hydrate(defaults()).await;

        for volume in 6..10 {
            prefs.volume = volume;
            sync.schedule(&prefs);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(storage.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(storage.write_count(), 1);
        assert_eq!(storage.read("prefs").unwrap().unwrap()["volume"], json!(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_redundant_write_suppressed() {
        let (storage, sync) = setup();
        let prefs = sync.hydrate(defaults()).await;

        sync.schedule(&prefs);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let (storage, sync) = setup();
        let mut prefs = sync.hydrate(defaults()).await;
        prefs.theme = "solarized".into();
        sync.schedule(&prefs);

        assert!(sync.flush().unwrap());
        assert_eq!(storage.write_count(), 1);
        assert!(!sync.has_pending());

        // Timer was cancelled, nothing else lands
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_flushes_pending() {
        let (storage, sync) = setup();
        let mut prefs = sync.hydrate(defaults()).await;
        prefs.volume = 1;
        sync.schedule(&prefs);
        drop(sync);

        assert_eq!(storage.read("prefs").unwrap().unwrap()["volume"], json!(1));
    }

    #[tokio::test]
    async fn test_debug_shows_key_and_phase() {
        let (_storage, sync) = setup();
        let rendered = format!("{sync:?}");
        assert!(rendered.contains("prefs"));
        assert!(rendered.contains("Hydrating"));

        // Debug does not require T to be serializable
        struct Opaque;
        let opaque: PersistenceSync<Opaque> = PersistenceSync {
            key: "opaque".into(),
            storage: Arc::new(MemoryStorage::new()),
            state: Arc::new(Mutex::new(SyncState {
                phase: SyncPhase::Hydrated,
                last_written: None,
                pending: None,
            })),
            debouncer: Debouncer::new(Duration::from_millis(10)),
            _value: PhantomData,
        };
        assert!(format!("{opaque:?}").contains("Hydrated"));
    }

    #[tokio::test]
    async fn test_debounced_write_lands_on_file_storage() {
        let temp = tempfile::TempDir::new().unwrap();
        let storage = Arc::new(crate::storage::FileStorage::new(temp.path()));
        let sync: PersistenceSync<Prefs> =
            PersistenceSync::new("prefs", storage.clone(), Duration::from_millis(20));
        let mut prefs = sync.hydrate(defaults()).await;
        prefs.volume = 7;
        sync.schedule(&prefs);

        for _ in 0..100 {
            if !sync.has_pending() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!sync.has_pending());
        assert_eq!(storage.read("prefs").unwrap().unwrap()["volume"], json!(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_stays_pending() {
        let (storage, sync) = setup();
        let mut prefs = sync.hydrate(defaults()).await;
        storage.set_fail_writes(true);

        prefs.volume = 2;
        sync.schedule(&prefs);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(sync.has_pending());

        storage.set_fail_writes(false);
        assert!(sync.flush().unwrap());
        assert_eq!(storage.read("prefs").unwrap().unwrap()["volume"], json!(2));
    }
}
