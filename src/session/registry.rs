use super::session::Session;
use super::stats::Stats;
use crate::error::{AsrError, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;
use uuid::Uuid;

/// Handle to a registered session
///
/// The inner lock is per session, so holding it across an engine call never
/// blocks other connections.
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Owns every live session and the aggregate counters
///
/// Cloning is cheap and yields a handle to the same registry. The map lock is
/// only held for insert, remove and lookup.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// Window size handed to each new session's assembler
    chunk_stride: usize,

    /// Active sessions (session_id → session)
    sessions: Mutex<HashMap<Uuid, SharedSession>>,

    /// Completed finalizations and file recognitions
    total_requests: AtomicU64,
}

impl SessionRegistry {
    /// # Panics
    ///
    /// Panics if `chunk_stride` is zero, since no session could buffer audio.
    pub fn new(chunk_stride: usize) -> Self {
        assert!(chunk_stride > 0, "chunk stride must be non-zero");

        Self {
            inner: Arc::new(RegistryInner {
                chunk_stride,
                sessions: Mutex::new(HashMap::new()),
                total_requests: AtomicU64::new(0),
            }),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, SharedSession>> {
        // The map is never left half-updated, so a poisoned lock is still consistent
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh, empty session and return its id
    pub fn create(&self) -> Uuid {
        let mut sessions = self.sessions();

        let id = loop {
            let candidate = Uuid::new_v4();
            if let Entry::Vacant(slot) = sessions.entry(candidate) {
                slot.insert(Arc::new(tokio::sync::Mutex::new(Session::new(
                    candidate,
                    self.inner.chunk_stride,
                ))));
                break candidate;
            }
        };

        info!("Created session {} ({} active)", id, sessions.len());
        id
    }

    /// Look up a live session
    pub fn get(&self, id: &Uuid) -> Result<SharedSession> {
        self.sessions()
            .get(id)
            .cloned()
            .ok_or(AsrError::InvalidSession(*id))
    }

    /// Remove a session; returns whether it was registered
    ///
    /// Unknown ids are ignored, so repeated cleanup is harmless.
    pub fn cleanup(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions();

        if sessions.remove(id).is_some() {
            info!("Cleaned up session {} ({} active)", id, sessions.len());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.sessions().contains_key(id)
    }

    /// Count one completed finalize or file recognition
    pub fn record_request(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total_requests: self.inner.total_requests.load(Ordering::SeqCst),
            active_sessions: self.sessions().len(),
        }
    }

    pub fn chunk_stride(&self) -> usize {
        self.inner.chunk_stride
    }
}
