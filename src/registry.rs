//! Side table mapping session identity back to the owning descriptor.
//!
//! Owned by the multiplexer. Associating the two here, instead of tagging
//! the session object with a back-reference, keeps the coupling out of the
//! transport collaborator's types.

use dashmap::DashMap;
use tracing::trace;

use crate::server::ServerKey;
use crate::session::SessionId;

/// Session identity → descriptor key.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: DashMap<SessionId, ServerKey>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `id` with `server`. Re-registering an id overwrites the
    /// previous association.
    pub fn register(&self, id: SessionId, server: ServerKey) {
        trace!(id = %id, server = %server, "session registered");
        self.entries.insert(id, server);
    }

    /// The descriptor key a session belongs to, if registered.
    pub fn server_for(&self, id: SessionId) -> Option<ServerKey> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    /// Drop the association, returning the key that was registered.
    pub fn remove(&self, id: SessionId) -> Option<ServerKey> {
        self.entries.remove(&id).map(|(_, key)| key)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
