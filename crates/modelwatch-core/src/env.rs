//! Environment snapshot and override names.
//!
//! Every lookup trims the value and treats an empty string as unset, so
//! `TELEGRAM_CHAT_ID=" "` behaves exactly like a missing variable.

use std::collections::HashMap;

/// Override for the state directory.
pub const STATE_DIR_ENV: &str = "OPENCLAW_STATE_DIR";

/// Overrides for the agent directory, highest precedence first.
pub const AGENT_DIR_ENVS: [&str; 2] = ["OPENCLAW_AGENT_DIR", "PI_CODING_AGENT_DIR"];

/// Overrides for the notification chat id, highest precedence first.
pub const CHAT_ID_ENVS: [&str; 3] = [
    "OPENCLAW_MODEL_NOTIFY_CHAT_ID",
    "OPENCLAW_TELEGRAM_CHAT_ID",
    "TELEGRAM_CHAT_ID",
];

/// Overrides for the bot token, highest precedence first.
pub const TOKEN_ENVS: [&str; 2] = ["OPENCLAW_TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN"];

/// Selects the `channels.telegram.accounts.<name>` entry.
pub const ACCOUNT_ENV: &str = "OPENCLAW_TELEGRAM_ACCOUNT";

/// Account consulted when `OPENCLAW_TELEGRAM_ACCOUNT` is unset.
pub const DEFAULT_ACCOUNT: &str = "default";

/// Immutable snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a single variable, trimmed, empty treated as unset.
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).and_then(|v| non_empty(v))
    }

    /// First set variable among `names`, together with its name.
    pub fn first_of<'a>(&self, names: &[&'a str]) -> Option<(&'a str, String)> {
        names
            .iter()
            .find_map(|name| self.get(name).map(|value| (*name, value)))
    }

    /// Telegram account name to consult in the config document.
    pub fn telegram_account(&self) -> String {
        self.get(ACCOUNT_ENV)
            .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string())
    }
}

/// Trim a string, returning `None` when nothing is left.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
