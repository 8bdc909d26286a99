//! Session stores.
//!
//! A session is an opaque id mapped to a bag of multi-valued attributes.
//! Local logins store `username`; federated logins store whatever the
//! identity provider released (mail, group memberships).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Multi-valued session attributes.
pub type Attributes = HashMap<String, Vec<String>>;

/// Idle lifetime used when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Storage for session attributes.
///
/// Implementations carry their own concurrency guarantees.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Attributes of session `id`, if it exists and has not expired.
    async fn load(&self, id: &str) -> Option<Attributes>;

    /// Create or replace session `id`.
    async fn save(&self, id: &str, attributes: Attributes);

    /// Remove session `id`. Returns whether it existed.
    async fn destroy(&self, id: &str) -> bool;

    /// Number of live sessions.
    async fn len(&self) -> usize;

    /// Drop expired sessions. Returns how many were removed.
    async fn prune(&self) -> usize;
}

#[derive(Debug, Clone)]
struct SessionEntry {
    attributes: Attributes,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_active(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process session store with an idle timeout.
///
/// Every successful load pushes the expiry forward by the ttl.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Option<Attributes> {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(id) {
            if entry.is_active(now) {
                entry.expires_at = now + self.ttl;
                return Some(entry.attributes.clone());
            }
        }
        self.sessions.remove_if(id, |_, entry| !entry.is_active(now));
        None
    }

    async fn save(&self, id: &str, attributes: Attributes) {
        let entry = SessionEntry {
            attributes,
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions.insert(id.to_string(), entry);
    }

    async fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions.iter().filter(|r| r.value().is_active(now)).count()
    }

    async fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.is_active(now));
        before.saturating_sub(self.sessions.len())
    }
}

/// Generate a fresh session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// First value of attribute `name`.
pub fn first_value<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes
        .get(name)
        .and_then(|values| values.first())
        .map(String::as_str)
}
