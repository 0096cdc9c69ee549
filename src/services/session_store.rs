use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::services::access_gate::{AccessGate, GateState};

/// How many REJECTED sessions are remembered at most.
pub const DEFAULT_REJECTED_LIMIT: usize = 10_000;

/// Thread-safe map from session id to that session's access gate.
///
/// Only sessions that submitted a password are stored. Anonymous visitors get
/// an id but no entry, so `state()` reports NOT_SUBMITTED for them. ACCEPTED
/// sessions live for the process; REJECTED ones are capped at `rejected_limit`.
#[derive(Clone)]
pub struct SessionStore {
    secret: Arc<str>,
    sessions: Arc<DashMap<Uuid, AccessGate>>,
    rejected: Arc<AtomicUsize>,
    rejected_limit: usize,
}

impl SessionStore {
    pub fn new(secret: &str) -> Self {
        Self::with_rejected_limit(secret, DEFAULT_REJECTED_LIMIT)
    }

    pub fn with_rejected_limit(secret: &str, rejected_limit: usize) -> Self {
        Self {
            secret: Arc::from(secret),
            sessions: Arc::new(DashMap::new()),
            rejected: Arc::new(AtomicUsize::new(0)),
            rejected_limit,
        }
    }

    /// The request's session id, or a fresh one when the cookie is missing.
    /// The bool is true when the id is new and a cookie must be issued.
    pub fn resolve(&self, id: Option<Uuid>) -> (Uuid, bool) {
        match id {
            Some(id) => (id, false),
            None => (Uuid::new_v4(), true),
        }
    }

    /// Runs a submission through the session's gate.
    ///
    /// Returns the id the session continues under: a newly issued one when the
    /// submission is what accepted it, the given id otherwise.
    pub fn submit(&self, id: Uuid, secret: String) -> (Uuid, GateState) {
        let mut gate = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| AccessGate::new(self.secret.clone()));

        let before = gate.state();
        let after = gate.submit(secret);

        match (before, after) {
            (GateState::Accepted, _) => (id, after),
            (_, GateState::Accepted) => {
                self.forget(id);
                let fresh = Uuid::new_v4();
                self.sessions.insert(fresh, gate);
                (fresh, after)
            }
            _ => {
                self.remember_rejected(id, gate);
                (id, after)
            }
        }
    }

    pub fn state(&self, id: Uuid) -> GateState {
        self.sessions
            .get(&id)
            .map(|gate| gate.state())
            .unwrap_or(GateState::NotSubmitted)
    }

    pub fn is_authenticated(&self, id: Uuid) -> bool {
        self.state(id) == GateState::Accepted
    }

    /// Stored sessions, accepted and rejected.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    fn remember_rejected(&self, id: Uuid, gate: AccessGate) {
        if self.sessions.contains_key(&id) {
            return;
        }
        if self.rejected.load(Ordering::Relaxed) >= self.rejected_limit {
            debug!("Rejected-session limit ({}) reached, not recording", self.rejected_limit);
            return;
        }
        if self.sessions.insert(id, gate).is_none() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn forget(&self, id: Uuid) {
        if let Some((_, gate)) = self.sessions.remove(&id) {
            if gate.state() == GateState::Rejected {
                self.rejected.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new("pw");
        let (alice, _) = store.resolve(None);
        let (bob, _) = store.resolve(None);

        let (alice, state) = store.submit(alice, "pw".to_string());
        assert_eq!(state, GateState::Accepted);
        assert!(store.is_authenticated(alice));
        assert!(!store.is_authenticated(bob));
        assert_eq!(store.state(bob), GateState::NotSubmitted);
    }

    #[test]
    fn test_unknown_session_is_not_authenticated() {
        let store = SessionStore::new("pw");
        assert!(!store.is_authenticated(Uuid::new_v4()));
    }

    #[test]
    fn test_resolve_stores_nothing() {
        let store = SessionStore::new("pw");
        let (id, created) = store.resolve(None);
        assert!(created);
        assert_eq!(store.resolve(Some(id)), (id, false));
        for _ in 0..100 {
            store.resolve(None);
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_rejection_is_recorded_per_session() {
        let store = SessionStore::new("pw");
        let (id, _) = store.resolve(None);
        assert_eq!(store.submit(id, "wrong".to_string()), (id, GateState::Rejected));
        assert_eq!(store.state(id), GateState::Rejected);
        assert_eq!(store.len(), 1);

        // A second rejection keeps the single entry
        store.submit(id, "still wrong".to_string());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_acceptance_issues_a_new_id() {
        let store = SessionStore::new("pw");
        let (id, _) = store.resolve(None);
        store.submit(id, "wrong".to_string());

        let (accepted, state) = store.submit(id, "pw".to_string());
        assert_eq!(state, GateState::Accepted);
        assert_ne!(accepted, id);
        assert!(store.is_authenticated(accepted));
        assert_eq!(store.state(id), GateState::NotSubmitted);
        assert_eq!(store.len(), 1);

        // Further submissions on the accepted id keep it
        assert_eq!(store.submit(accepted, "wrong".to_string()), (accepted, GateState::Accepted));
    }

    #[test]
    fn test_rejected_sessions_are_capped() {
        let store = SessionStore::with_rejected_limit("pw", 3);
        let ids: Vec<Uuid> = (0..10).map(|_| store.resolve(None).0).collect();
        for id in &ids {
            assert_eq!(store.submit(*id, "wrong".to_string()).1, GateState::Rejected);
        }
        assert_eq!(store.len(), 3);

        // Recovering a remembered rejection frees its slot
        store.submit(ids[0], "pw".to_string());
        let (late, _) = store.resolve(None);
        store.submit(late, "wrong".to_string());
        assert_eq!(store.state(late), GateState::Rejected);
        assert_eq!(store.len(), 4);

        // Over the cap a new session still gets in with the right password
        let (another, _) = store.resolve(None);
        store.submit(another, "wrong".to_string());
        assert_eq!(store.state(another), GateState::NotSubmitted);
        assert_eq!(store.submit(another, "pw".to_string()).1, GateState::Accepted);
    }
}
