//! Bounded conversation memory, keyed by conversation id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::turn::Turn;

/// Conversation id used when a caller does not name one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Number of turns a conversation keeps unless configured otherwise.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// A FIFO window over the most recent turns of one conversation.
///
/// After any [`append`](Self::append) the window holds at most `max_turns`
/// turns; the oldest are evicted first.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self { turns: Vec::new(), max_turns }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        if self.turns.len() > self.max_turns {
            let drain_to = self.turns.len() - self.max_turns;
            self.turns.drain(0..drain_to);
        }
    }

    /// The retained turns, oldest first.
    pub fn window(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

/// A conversation shared between requests.
///
/// Holding the lock for the duration of a generate call serializes
/// requests on the same conversation.
pub type SharedMemory = Arc<Mutex<ConversationMemory>>;

/// Number of conversations kept before the least recently used is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug)]
struct SessionEntry {
    memory: SharedMemory,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

/// Process-wide registry of conversations.
///
/// Holds at most `max_sessions` conversations. Opening a new one beyond
/// that evicts the least recently used; a request still holding an evicted
/// memory finishes against it, and the next request for that id starts
/// from an empty window.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    sessions: Arc<Mutex<Sessions>>,
    max_turns: usize,
    max_sessions: usize,
}

impl MemoryStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Sessions::default())),
            max_turns,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Cap the number of live conversations (at least one).
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Return the memory for `conversation_id`, creating an empty one on first use.
    pub async fn session(&self, conversation_id: &str) -> SharedMemory {
        let mut sessions = self.sessions.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if let Some(entry) = sessions.entries.get_mut(conversation_id) {
            entry.last_used = now;
            return entry.memory.clone();
        }

        if sessions.entries.len() >= self.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.entries.remove(&oldest);
                debug!(conversation = %oldest, "evicted least recently used conversation");
            }
        }

        let memory = Arc::new(Mutex::new(ConversationMemory::new(self.max_turns)));
        let entry = SessionEntry { memory: memory.clone(), last_used: now };
        sessions.entries.insert(conversation_id.to_string(), entry);
        memory
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}
