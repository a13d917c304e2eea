//! Session store.
//!
//! Keyed registry of live sessions. The map sits behind an `RwLock` and
//! every session behind its own `Mutex`, so clicks on different sessions
//! never wait on each other while two clicks on the same session run one
//! after the other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::error::GameError;
use super::geometry::Target;
use super::session::Session;

type SessionHandle = Arc<Mutex<Session>>;

fn lock(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

fn older_than(since: DateTime<Utc>, now: DateTime<Utc>, age: Duration) -> bool {
    match chrono::Duration::from_std(age) {
        Ok(age) => now - since >= age,
        // Out of range means "forever"
        Err(_) => false,
    }
}

/// Session store - tracks all live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, session_id: &str) -> Result<SessionHandle, GameError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .ok_or(GameError::SessionNotFound)
    }

    /// Create a session under a fresh id and return the id.
    pub fn create(
        &self,
        player_name: String,
        count: u32,
        targets: Vec<Target>,
        now: DateTime<Utc>,
    ) -> Result<String, GameError> {
        if targets.len() != count as usize {
            return Err(GameError::invalid(format!(
                "expected {} targets, got {}",
                count,
                targets.len()
            )));
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut id = uuid::Uuid::new_v4().to_string();
        while sessions.contains_key(&id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        let session = Session::new(id.clone(), player_name, targets, now)?;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        Ok(id)
    }

    /// Snapshot of a session.
    pub fn get(&self, session_id: &str) -> Result<Session, GameError> {
        let handle = self.handle(session_id)?;
        let session = lock(&handle).clone();
        Ok(session)
    }

    /// Run `f` with exclusive access to one session.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, GameError> {
        let handle = self.handle(session_id)?;
        let mut session = lock(&handle);
        Ok(f(&mut *session))
    }

    /// Remove a session.
    pub fn remove(&self, session_id: &str) -> Option<Session> {
        let handle = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)?;
        let session = lock(&handle).clone();
        Some(session)
    }

    fn handles(&self) -> Vec<(String, SessionHandle)> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect()
    }

    fn remove_where(&self, pred: impl Fn(&Session) -> bool) -> Vec<String> {
        // Predicates run with no map lock held
        let handles = self.handles();
        let doomed: Vec<(String, SessionHandle)> = handles
            .into_iter()
            .filter(|(_, handle)| pred(&*lock(handle)))
            .collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = Vec::with_capacity(doomed.len());
        for (id, handle) in doomed {
            // Skip entries replaced since the scan
            if sessions.get(&id).is_some_and(|h| Arc::ptr_eq(h, &handle)) {
                sessions.remove(&id);
                removed.push(id);
            }
        }

        removed
    }

    /// Remove unfinished sessions idle for at least `ttl`.
    /// Returns the removed ids.
    pub fn expire_stale(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
        self.remove_where(|s| !s.is_completed() && older_than(s.last_activity, now, ttl))
    }

    /// Remove finished sessions that ended at least `retention` ago.
    pub fn cleanup_finished(&self, now: DateTime<Utc>, retention: Duration) -> Vec<String> {
        self.remove_where(|s| {
            s.is_completed() && older_than(s.ended_at.unwrap_or(s.last_activity), now, retention)
        })
    }

    /// Count sessions still awaiting clicks.
    pub fn active_count(&self) -> usize {
        self.handles()
            .iter()
            .filter(|(_, handle)| !lock(handle).is_completed())
            .count()
    }

    /// Total session count.
    pub fn count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
