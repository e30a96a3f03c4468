use {
    chrono::{DateTime, Duration as ChronoDuration, Utc},
    rand::RngCore,
    std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    },
    tokio::sync::oneshot,
};

/// Entries older than this are rejected on use and removed by the sweeper
/// (§3 "Nonce entry").
pub const NONCE_TTL: ChronoDuration = ChronoDuration::minutes(5);

/// Concurrent-safe map from nonce string to issuance timestamp (§5 "Nonce
/// store"). Readers and writers both take the same lock; critical sections
/// are kept short (a single map operation).
#[derive(Clone, Default)]
pub struct NonceStore {
    entries: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh random nonce and records its issuance time.
    pub fn issue(&self) -> (String, DateTime<Utc>) {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let nonce = const_hex::encode(bytes);
        let issued_at = Utc::now();
        self.entries.lock().unwrap().insert(nonce.clone(), issued_at);
        (nonce, issued_at)
    }

    /// Removes `nonce` and returns its issuance time, but only if it exists
    /// and is still within [`NONCE_TTL`]. Single-use: a second call for the
    /// same nonce always misses, satisfying the "nonce single-use" property
    /// (§8) because the entry is gone after the first successful call.
    pub fn consume(&self, nonce: &str) -> Option<DateTime<Utc>> {
        let mut entries = self.entries.lock().unwrap();
        let issued_at = entries.remove(nonce)?;
        if Utc::now() - issued_at > NONCE_TTL {
            None
        } else {
            Some(issued_at)
        }
    }

    /// Removes every entry older than [`NONCE_TTL`], regardless of whether
    /// it will ever be consumed. Run periodically by [`spawn_sweeper`].
    pub fn sweep(&self) {
        let now = Utc::now();
        self.entries
            .lock()
            .unwrap()
            .retain(|_, issued_at| now - *issued_at <= NONCE_TTL);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Handle to a running sweeper task, modeled on the teacher's
/// `ShutdownController`/`ShutdownSignal` pair: `stop` is safe to call from
/// multiple tasks and multiple times (§9 "Global sweeper lifetime").
#[derive(Clone)]
pub struct NonceSweeperHandle {
    stop: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl NonceSweeperHandle {
    pub fn stop(&self) {
        if let Some(tx) = self.stop.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns the periodic sweeper (§5 "one nonce sweeper task"). It terminates
/// cleanly and promptly once `stop` is called, even if called more than
/// once or from more than one caller.
pub fn spawn_sweeper(store: NonceStore, interval: Duration) -> NonceSweeperHandle {
    let (tx, mut rx) = oneshot::channel();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    store.sweep();
                }
                _ = &mut rx => {
                    tracing::debug!("nonce sweeper received stop signal");
                    break;
                }
            }
        }
    });
    NonceSweeperHandle {
        stop: Arc::new(Mutex::new(Some(tx))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_is_single_use() {
        let store = NonceStore::new();
        let (nonce, _) = store.issue();
        assert!(store.consume(&nonce).is_some());
        assert!(store.consume(&nonce).is_none());
    }

    #[test]
    fn consume_rejects_expired_entry() {
        let store = NonceStore::new();
        let nonce = "deadbeef".to_string();
        let stale = Utc::now() - ChronoDuration::minutes(6);
        store.entries.lock().unwrap().insert(nonce.clone(), stale);
        assert!(store.consume(&nonce).is_none());
    }

    #[test]
    fn sweep_only_removes_stale_entries() {
        let store = NonceStore::new();
        let (fresh, _) = store.issue();
        let stale = "stale".to_string();
        store
            .entries
            .lock()
            .unwrap()
            .insert(stale.clone(), Utc::now() - ChronoDuration::minutes(10));
        store.sweep();
        assert_eq!(store.len(), 1);
        assert!(store.consume(&fresh).is_some());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stop_is_idempotent_across_repeated_calls() {
        let store = NonceStore::new();
        let handle = spawn_sweeper(store, Duration::from_millis(10));
        handle.stop();
        handle.stop();
        handle.stop();
    }
}
