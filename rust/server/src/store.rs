use crate::errors::SessionError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tactica_engine::errors::GameError;
use tactica_engine::session::{Session, SessionId};

/// Authoritative map of running sessions.
///
/// Each session sits behind its own mutex: mutations of one session are
/// serialized while different sessions never contend. Components hold the
/// store, never copies of a session; [`SessionStore::snapshot`] exists for
/// read-only consumers that need an owned view.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session. A session id already in play is rejected.
    pub fn insert(&self, session: Session) -> Result<(), SessionError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        if guard.contains_key(&session.id) {
            return Err(GameError::SessionAlreadyStarted.into());
        }
        guard.insert(session.id.clone(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    fn handle(&self, session_id: &str) -> Result<Arc<Mutex<Session>>, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::not_found(session_id))
    }

    /// Runs `f` against the session while holding its lock.
    pub fn read<T>(&self, session_id: &str, f: impl FnOnce(&Session) -> T) -> Result<T, SessionError> {
        let handle = self.handle(session_id)?;
        let session = handle.lock().map_err(|_| SessionError::StoragePoisoned)?;
        Ok(f(&session))
    }

    /// Applies a mutation atomically with respect to other mutations of the
    /// same session. `f` must not call back into the store for this session.
    pub fn update<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> Result<T, GameError>,
    ) -> Result<T, SessionError> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().map_err(|_| SessionError::StoragePoisoned)?;
        Ok(f(&mut session)?)
    }

    pub fn snapshot(&self, session_id: &str) -> Result<Session, SessionError> {
        self.read(session_id, Session::clone)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        match self.sessions.read() {
            Ok(guard) => guard.contains_key(session_id),
            Err(poisoned) => poisoned.into_inner().contains_key(session_id),
        }
    }

    pub fn remove(&self, session_id: &str) -> Result<(), SessionError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| SessionError::not_found(session_id))
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let guard = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
