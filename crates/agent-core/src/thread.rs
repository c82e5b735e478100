//! Thread Management
//!
//! A thread is a single ongoing conversation: an id plus an ordered,
//! append-only message history. Threads are created on first reference and
//! live for the process lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::message::Conversation;

/// Unique thread identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single conversation thread
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Thread {
    /// Unique identifier
    pub id: ThreadId,

    /// Append-only conversation history
    pub conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Create a new thread with a generated id
    pub fn new() -> Self {
        Self::with_id(ThreadId::new())
    }

    /// Create with a specific id
    pub fn with_id(id: ThreadId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory thread store
///
/// Each thread sits behind its own async mutex: concurrent turns on the same
/// thread id are serialized (one in-flight turn per thread, preserving the
/// append-only ordering invariant) while distinct threads proceed
/// independently. Threads are never evicted.
pub struct ThreadStore {
    threads: RwLock<HashMap<ThreadId, Arc<Mutex<Thread>>>>,
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadStore {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }

    /// Get the thread for an id, creating it on first reference
    pub fn get_or_create(&self, id: &ThreadId) -> Arc<Mutex<Thread>> {
        if let Some(thread) = self.threads.read().unwrap_or_else(|e| e.into_inner()).get(id) {
            return thread.clone();
        }

        let mut threads = self.threads.write().unwrap_or_else(|e| e.into_inner());
        threads
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(thread = %id, "Creating thread");
                Arc::new(Mutex::new(Thread::with_id(id.clone())))
            })
            .clone()
    }

    /// Look up an existing thread without creating it
    pub fn get(&self, id: &ThreadId) -> Option<Arc<Mutex<Thread>>> {
        self.threads
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Number of threads
    pub fn len(&self) -> usize {
        self.threads.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_thread_creation() {
        let thread = Thread::new();
        assert_eq!(thread.message_count(), 0);
    }

    #[tokio::test]
    async fn test_store_creates_on_first_reference() {
        let store = ThreadStore::new();
        let id = ThreadId::from_string("main-conversation");

        assert!(store.get(&id).is_none());

        let thread = store.get_or_create(&id);
        thread.lock().await.conversation.push(Message::user("Hi"));

        let same = store.get_or_create(&id);
        assert_eq!(same.lock().await.message_count(), 1);
        assert_eq!(store.len(), 1);
    }
}
