//! Per-participant window registry
//!
//! One `KeyState` per tracked participant, behind an async mutex so frame
//! submissions for the same key serialize across window mutation and
//! persistence, while different keys proceed in parallel. The registry bounds
//! its key space with least-recently-seen eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::window::BoundedWindow;
use crate::{AttentionKey, LONG_TERM_CAPACITY, MAJORITY_THRESHOLD, SHORT_TERM_CAPACITY};

/// Default bound on tracked keys before least-recently-seen eviction
pub const DEFAULT_MAX_KEYS: usize = 4096;

/// Rolling window state for one participant
#[derive(Debug)]
pub struct KeyState {
    short_term: BoundedWindow,
    long_term: BoundedWindow,
}

impl KeyState {
    fn new() -> Self {
        Self {
            short_term: BoundedWindow::new(SHORT_TERM_CAPACITY),
            long_term: BoundedWindow::new(LONG_TERM_CAPACITY),
        }
    }

    /// Label this frame would receive: 1 iff the short-term window sum after
    /// pushing `raw` reaches the majority threshold. Does not mutate; callers
    /// commit once persistence has succeeded.
    pub fn preview_label(&self, raw: f32) -> u8 {
        if self.short_term.projected_sum(raw) >= MAJORITY_THRESHOLD {
            1
        } else {
            0
        }
    }

    /// Commit an observed frame: push the raw score into the short-term
    /// window and its label into the long-term window.
    pub fn commit(&mut self, raw: f32, label: u8) {
        self.short_term.push(raw);
        self.long_term.push(label as f32);
    }

    /// Mean of the long-term window, 0.0 when empty
    pub fn session_average(&self) -> f32 {
        self.long_term.mean()
    }
}

struct TrackedKey {
    state: Arc<AsyncMutex<KeyState>>,
    last_seen: Instant,
}

/// One row of the enumeration endpoint
#[derive(Debug, Clone, Serialize)]
pub struct KeySnapshot {
    pub key: AttentionKey,
    pub session_average: f32,
}

/// Process-wide registry of per-participant window state
pub struct WindowRegistry {
    inner: Mutex<HashMap<AttentionKey, TrackedKey>>,
    max_keys: usize,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::with_max_keys(DEFAULT_MAX_KEYS)
    }

    pub fn with_max_keys(max_keys: usize) -> Self {
        assert!(max_keys > 0, "registry bound must be positive");
        Self {
            inner: Mutex::new(HashMap::new()),
            max_keys,
        }
    }

    /// Handle to the key's state, created lazily on first sight.
    ///
    /// Touching a key refreshes its eviction clock; when the bound is
    /// exceeded the least-recently-seen other key is dropped.
    pub fn entry(&self, key: &AttentionKey) -> Arc<AsyncMutex<KeyState>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some(tracked) = map.get_mut(key) {
            tracked.last_seen = now;
            return tracked.state.clone();
        }

        if map.len() >= self.max_keys {
            if let Some(stale) = map
                .iter()
                .min_by_key(|(_, t)| t.last_seen)
                .map(|(k, _)| k.clone())
            {
                debug!(meeting_id = %stale.meeting_id, user = %stale.user_identity,
                    "evicting least-recently-seen attention key");
                map.remove(&stale);
            }
        }

        let state = Arc::new(AsyncMutex::new(KeyState::new()));
        map.insert(
            key.clone(),
            TrackedKey {
                state: state.clone(),
                last_seen: now,
            },
        );
        state
    }

    /// Number of currently tracked keys
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Session averages for every tracked key
    pub async fn snapshot(&self) -> Vec<KeySnapshot> {
        let handles: Vec<(AttentionKey, Arc<AsyncMutex<KeyState>>)> = {
            let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.iter().map(|(k, t)| (k.clone(), t.state.clone())).collect()
        };

        let mut out = Vec::with_capacity(handles.len());
        for (key, state) in handles {
            let average = state.lock().await.session_average();
            out.push(KeySnapshot {
                key,
                session_average: average,
            });
        }
        out
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(meeting: &str, user: &str) -> AttentionKey {
        AttentionKey::new(meeting, user)
    }

    #[tokio::test]
    async fn preview_then_commit_matches_running_sum() {
        let registry = WindowRegistry::new();
        let entry = registry.entry(&key("m1", "a@x.com"));
        let mut state = entry.lock().await;

        // Three fully attentive frames: sum crosses 3.0 on the third
        assert_eq!(state.preview_label(1.0), 0);
        state.commit(1.0, 0);
        assert_eq!(state.preview_label(1.0), 0);
        state.commit(1.0, 0);
        assert_eq!(state.preview_label(1.0), 1);
        state.commit(1.0, 1);
    }

    #[tokio::test]
    async fn partial_scores_count_toward_the_threshold() {
        let registry = WindowRegistry::new();
        let entry = registry.entry(&key("m1", "a@x.com"));
        let mut state = entry.lock().await;

        for _ in 0..4 {
            let label = state.preview_label(0.5);
            assert_eq!(label, 0); // sums 0.5 .. 2.0
            state.commit(0.5, label);
        }
        // Fifth 0.5 only reaches 2.5
        assert_eq!(state.preview_label(0.5), 0);
        // A full score on top of 2.0 reaches 3.0
        assert_eq!(state.preview_label(1.0), 1);
    }

    #[tokio::test]
    async fn session_average_tracks_long_term_window() {
        let registry = WindowRegistry::new();
        let entry = registry.entry(&key("m1", "a@x.com"));
        let mut state = entry.lock().await;

        assert_eq!(state.session_average(), 0.0);
        state.commit(1.0, 1);
        state.commit(0.0, 0);
        assert!((state.session_average() - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let registry = WindowRegistry::new();
        {
            let entry = registry.entry(&key("m1", "a@x.com"));
            entry.lock().await.commit(1.0, 1);
        }
        let entry = registry.entry(&key("m1", "b@x.com"));
        assert_eq!(entry.lock().await.session_average(), 0.0);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn exceeding_the_bound_evicts_least_recently_seen() {
        let registry = WindowRegistry::with_max_keys(2);
        let tick = std::time::Duration::from_millis(2);
        registry.entry(&key("m1", "a@x.com"));
        std::thread::sleep(tick);
        registry.entry(&key("m1", "b@x.com"));
        std::thread::sleep(tick);
        // Touch "a" so "b" becomes the stale one
        registry.entry(&key("m1", "a@x.com"));
        std::thread::sleep(tick);
        registry.entry(&key("m1", "c@x.com"));

        assert_eq!(registry.len(), 2);
        let snapshot = registry.snapshot().await;
        let users: Vec<&str> = snapshot.iter().map(|s| s.key.user_identity.as_str()).collect();
        assert!(users.contains(&"a@x.com"));
        assert!(users.contains(&"c@x.com"));
        assert!(!users.contains(&"b@x.com"));
    }
}
