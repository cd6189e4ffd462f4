//! Per-user bounded conversation memory.
//!
//! Sessions are an in-memory map keyed by user identity: no cross-process
//! sharing, no durability across restarts (documented limitation). Each
//! session holds at most `window` turns; the oldest turn is evicted first.
//!
//! Locking: the outer mutex only guards map access and is never held
//! across an await. Each session carries its own async mutex, so
//! operations for the same user serialize while different users never
//! contend. Turns land in the order their queries completed generation
//! (completion-order policy), not the order they were received.

use crate::types::Turn;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// A single user's ordered, bounded turn history.
#[derive(Debug, Default)]
struct Session {
    turns: VecDeque<Turn>,
}

/// Bounded, per-user conversation store.
pub struct ConversationMemory {
    /// Maximum turns retained per session
    window: usize,

    /// Sessions keyed by user identity
    sessions: Mutex<HashMap<String, Arc<AsyncMutex<Session>>>>,
}

impl ConversationMemory {
    /// Create a memory with the given per-session window size.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The configured window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Get or create the session for a user.
    fn session(&self, user: &str) -> Arc<AsyncMutex<Session>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            sessions
                .entry(user.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(Session::default()))),
        )
    }

    /// Get the session for a user if one exists.
    fn existing_session(&self, user: &str) -> Option<Arc<AsyncMutex<Session>>> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(user).map(Arc::clone)
    }

    /// Append a turn to the user's session, evicting the oldest turn when
    /// the window would be exceeded.
    pub async fn append(&self, user: &str, turn: Turn) {
        let session = self.session(user);
        let mut guard = session.lock().await;

        guard.turns.push_back(turn);
        while guard.turns.len() > self.window {
            guard.turns.pop_front();
        }

        tracing::debug!(
            "Appended turn for user '{}' ({} turns retained)",
            user,
            guard.turns.len()
        );
    }

    /// The most recent turns for a user, oldest first, capped at `max_turns`.
    pub async fn recent(&self, user: &str, max_turns: usize) -> Vec<Turn> {
        let Some(session) = self.existing_session(user) else {
            return Vec::new();
        };

        let guard = session.lock().await;
        let skip = guard.turns.len().saturating_sub(max_turns);
        guard.turns.iter().skip(skip).cloned().collect()
    }

    /// Drop a user's session entirely.
    pub async fn clear(&self, user: &str) {
        let removed = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.remove(user).is_some()
        };

        if removed {
            tracing::info!("Cleared conversation memory for user '{}'", user);
        } else {
            tracing::debug!("No conversation memory found for user '{}'", user);
        }
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatReply;
    use std::sync::Arc;
    use std::time::Duration;

    fn turn(label: &str) -> Turn {
        Turn::new(label, &ChatReply::new(format!("answer to {}", label), vec![]))
    }

    #[tokio::test]
    async fn test_append_and_recent_ordering() {
        let memory = ConversationMemory::new(10);

        memory.append("peter", turn("first")).await;
        memory.append("peter", turn("second")).await;
        memory.append("peter", turn("third")).await;

        let turns = memory.recent("peter", 10).await;
        let queries: Vec<&str> = turns.iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_window_evicts_oldest_first() {
        let window = 3;
        let memory = ConversationMemory::new(window);

        for i in 0..=window {
            memory.append("peter", turn(&format!("q{}", i))).await;
        }

        let turns = memory.recent("peter", window).await;
        assert_eq!(turns.len(), window);
        // q0 evicted, q1..=q3 remain oldest-first
        let queries: Vec<&str> = turns.iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["q1", "q2", "q3"]);
    }

    #[tokio::test]
    async fn test_recent_caps_at_max_turns() {
        let memory = ConversationMemory::new(10);
        for i in 0..5 {
            memory.append("peter", turn(&format!("q{}", i))).await;
        }

        let turns = memory.recent("peter", 2).await;
        let queries: Vec<&str> = turns.iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["q3", "q4"]);
    }

    #[tokio::test]
    async fn test_recent_for_unknown_user_is_empty_and_creates_no_session() {
        let memory = ConversationMemory::new(10);
        assert!(memory.recent("nobody", 5).await.is_empty());
        assert_eq!(memory.session_count(), 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_user() {
        let memory = ConversationMemory::new(10);
        memory.append("peter", turn("peters question")).await;
        memory.append("jane", turn("janes question")).await;

        let peters = memory.recent("peter", 10).await;
        assert_eq!(peters.len(), 1);
        assert_eq!(peters[0].query, "peters question");

        let janes = memory.recent("jane", 10).await;
        assert_eq!(janes.len(), 1);
        assert_eq!(janes[0].query, "janes question");
    }

    #[tokio::test]
    async fn test_clear_drops_session() {
        let memory = ConversationMemory::new(10);
        memory.append("peter", turn("q")).await;
        assert_eq!(memory.session_count(), 1);

        memory.clear("peter").await;
        assert_eq!(memory.session_count(), 0);
        assert!(memory.recent("peter", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_same_user_appends_serialize() {
        let memory = Arc::new(ConversationMemory::new(100));

        let mut handles = Vec::new();
        for i in 0..50 {
            let memory = Arc::clone(&memory);
            handles.push(tokio::spawn(async move {
                memory.append("peter", turn(&format!("q{}", i))).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // No turn is lost or duplicated under concurrency
        let turns = memory.recent("peter", 100).await;
        assert_eq!(turns.len(), 50);
        let mut queries: Vec<String> = turns.iter().map(|t| t.query.clone()).collect();
        queries.sort();
        queries.dedup();
        assert_eq!(queries.len(), 50);
    }

    #[tokio::test]
    async fn test_appends_land_in_completion_order() {
        let memory = Arc::new(ConversationMemory::new(10));

        // "slow" starts first but completes after "fast"
        let slow = {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                memory.append("peter", turn("slow")).await;
            })
        };
        let fast = {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                memory.append("peter", turn("fast")).await;
            })
        };

        slow.await.unwrap();
        fast.await.unwrap();

        let turns = memory.recent("peter", 10).await;
        let queries: Vec<&str> = turns.iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["fast", "slow"]);
    }
}
