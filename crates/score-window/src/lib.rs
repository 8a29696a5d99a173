//! Attention score windows
//!
//! In-memory, per-participant rolling state for the attention pipeline:
//! - `BoundedWindow`: fixed-capacity drop-oldest score buffer
//! - `KeyState`: the short-term (5 frame) and long-term (30 frame) windows
//!   for one participant, with the majority-vote labelling rule
//! - `WindowRegistry`: process-wide registry keyed by `AttentionKey`, with
//!   per-key mutual exclusion and least-recently-seen eviction

mod registry;
mod window;

pub use registry::{KeySnapshot, KeyState, WindowRegistry, DEFAULT_MAX_KEYS};
pub use window::BoundedWindow;

use serde::{Deserialize, Serialize};

/// Sentinel identity when neither identifier is present
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Short-term window capacity (frames)
pub const SHORT_TERM_CAPACITY: usize = 5;

/// Long-term window capacity (frames)
pub const LONG_TERM_CAPACITY: usize = 30;

/// Sum-threshold over the short-term window for an attentive label
pub const MAJORITY_THRESHOLD: f32 = 3.0;

/// Identifies one tracked participant within a meeting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttentionKey {
    pub meeting_id: String,
    pub user_identity: String,
}

impl AttentionKey {
    pub fn new(meeting_id: impl Into<String>, user_identity: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            user_identity: user_identity.into(),
        }
    }

    /// Resolve the participant identity: primary identifier first, then the
    /// secondary, then the `unknown` sentinel. Empty strings count as absent.
    pub fn resolve(
        meeting_id: impl Into<String>,
        user_id: Option<&str>,
        user_name: Option<&str>,
    ) -> Self {
        let identity = user_id
            .filter(|s| !s.is_empty())
            .or_else(|| user_name.filter(|s| !s.is_empty()))
            .unwrap_or(UNKNOWN_IDENTITY);
        Self::new(meeting_id, identity)
    }

    /// Whether the identity resolved to the sentinel
    pub fn is_unknown(&self) -> bool {
        self.user_identity == UNKNOWN_IDENTITY
    }
}
