//! In-memory registry of active admin sessions.
//!
//! A session is created at login and keyed by an opaque id that also rides
//! inside the token's claims. Removing a session here invalidates every
//! token bound to it, which is what logout, remote termination, and
//! emergency lockdown rely on.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub username: String,
    pub ip_address: String,
    pub user_agent: String,
    pub login_time: DateTime<Utc>,
}

impl Session {
    pub fn new(username: String, ip_address: String, user_agent: String) -> Self {
        Self {
            username,
            ip_address,
            user_agent,
            login_time: Utc::now(),
        }
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, session_id: String, session: Session) {
        self.sessions.insert(session_id, session);
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    pub fn remove(&self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id).map(|(_, s)| s)
    }

    /// All sessions belonging to `username`, with their ids.
    pub fn list_by_user(&self, username: &str) -> Vec<(String, Session)> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().username == username)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Remove every session of `username` except `keep`, returning the ids
    /// that were terminated. Other users' sessions are untouched.
    pub fn remove_others(&self, username: &str, keep: &str) -> Vec<String> {
        let doomed: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().username == username && entry.key() != keep)
            .map(|entry| entry.key().clone())
            .collect();

        for id in &doomed {
            self.sessions.remove(id);
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user: &str) -> Session {
        Session::new(
            user.to_string(),
            "10.0.0.1".to_string(),
            "test-agent".to_string(),
        )
    }

    #[test]
    fn test_create_exists_remove() {
        let registry = SessionRegistry::new();
        registry.create("s1".to_string(), session("admin"));

        assert!(registry.exists("s1"));
        assert!(!registry.exists("s2"));

        let removed = registry.remove("s1").unwrap();
        assert_eq!(removed.username, "admin");
        assert!(!registry.exists("s1"));
        assert!(registry.remove("s1").is_none());
    }

    #[test]
    fn test_list_by_user() {
        let registry = SessionRegistry::new();
        registry.create("a1".to_string(), session("admin"));
        registry.create("a2".to_string(), session("admin"));
        registry.create("b1".to_string(), session("other"));

        let admin_sessions = registry.list_by_user("admin");
        assert_eq!(admin_sessions.len(), 2);
        assert!(admin_sessions.iter().all(|(_, s)| s.username == "admin"));
    }

    #[test]
    fn test_remove_others_keeps_caller() {
        let registry = SessionRegistry::new();
        registry.create("a1".to_string(), session("admin"));
        registry.create("a2".to_string(), session("admin"));
        registry.create("a3".to_string(), session("admin"));
        registry.create("b1".to_string(), session("other"));

        let mut terminated = registry.remove_others("admin", "a2");
        terminated.sort();
        assert_eq!(terminated, vec!["a1".to_string(), "a3".to_string()]);

        assert!(registry.exists("a2"));
        assert!(registry.exists("b1"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_others_with_single_session() {
        let registry = SessionRegistry::new();
        registry.create("a1".to_string(), session("admin"));

        assert!(registry.remove_others("admin", "a1").is_empty());
        assert!(registry.exists("a1"));
    }
}
