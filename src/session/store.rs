//! In-memory session storage for the front controller.
//!
//! # Design Decisions
//! - Sessions idle longer than the timeout are treated as absent and purged
//! - The store never grows past its capacity: a new session first purges
//!   expired entries, then evicts the least recently seen one
//! - The front controller only saves a new session once something was
//!   written to it, so cookieless clients leave no entries behind

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::config::schema::SessionConfig;
use crate::session::SessionData;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    data: SessionData,
    last_seen: Instant,
}

/// Sessions keyed by UUID v4 id. Cheap to clone; clones share storage.
///
/// Concurrent requests on one session are last-write-wins.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, Entry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_limits(Duration::from_secs(config.idle_timeout_secs), config.max_sessions)
    }

    /// Fetch the session for `id`, or start a new one.
    ///
    /// Returns `(id, data, created)`. Unknown or expired ids are replaced by
    /// a fresh id so clients cannot choose their own.
    pub fn load(&self, id: Option<&str>) -> (String, SessionData, bool) {
        if let Some(id) = id {
            let found = self
                .sessions
                .get(id)
                .map(|entry| (entry.data.clone(), self.is_expired(&entry)));
            match found {
                Some((data, false)) => return (id.to_string(), data, false),
                Some((_, true)) => {
                    self.sessions.remove(id);
                    tracing::debug!("Expired session discarded");
                }
                None => {}
            }
        }
        (Uuid::new_v4().to_string(), SessionData::default(), true)
    }

    pub fn save(&self, id: &str, data: SessionData) {
        if !self.sessions.contains_key(id) && self.sessions.len() >= self.max_sessions {
            self.make_room();
        }
        self.sessions.insert(
            id.to_string(),
            Entry {
                data,
                last_seen: Instant::now(),
            },
        );
    }

    pub fn remove(&self, id: &str) -> Option<SessionData> {
        self.sessions.remove(id).map(|(_, entry)| entry.data)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.last_seen.elapsed() >= self.idle_timeout
    }

    fn make_room(&self) {
        let purged = self.purge_expired();
        if self.sessions.len() < self.max_sessions {
            tracing::debug!(purged, "Purged expired sessions");
            return;
        }

        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.last_seen)
            .map(|entry| entry.key().clone());
        if let Some(id) = oldest {
            self.sessions.remove(&id);
            tracing::warn!(max_sessions = self.max_sessions, "Session store full, evicted least recent session");
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}
