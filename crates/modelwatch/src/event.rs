//! Turn-end events consumed from the host runtime.

use serde::{Deserialize, Serialize};

/// Session label used in run keys when the host sends none.
const DEFAULT_SESSION: &str = "default";

/// The model active for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveModel {
    /// Provider id as reported by the host (not normalized).
    pub provider: String,
    /// Model id.
    pub id: String,
}

impl ActiveModel {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }
}

/// A completed turn, together with the host context it ran in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEndEvent {
    /// Index of the turn within the session.
    #[serde(default)]
    pub turn_index: u64,
    /// Session the turn belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Active model, if the host attached one.
    #[serde(default)]
    pub model: Option<ActiveModel>,
}

impl TurnEndEvent {
    pub fn new(turn_index: u64, session_id: Option<String>, model: Option<ActiveModel>) -> Self {
        Self {
            turn_index,
            session_id,
            model,
        }
    }

    /// `"<session>:<turn>"`, identifying the turn for bookkeeping.
    pub fn run_key(&self) -> String {
        let session = self
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION);
        format!("{}:{}", session, self.turn_index)
    }
}
