//! The agent's JSON configuration document.
//!
//! Only the fields modelwatch needs are modelled; everything else in the
//! document is ignored. The file is never written.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::env::non_empty;
use crate::error::{CoreError, Result};
use crate::paths::WatchPaths;

/// Fields of `openclaw.json` used for notification delivery.
///
/// Each field is read independently from the parsed document, so a
/// wrongly-typed sibling (`"accounts": {"default": null}`,
/// `"logging": {"file": 42}`) only hides itself, never the rest.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    doc: Value,
}

impl NotifyConfig {
    /// Wrap an already-parsed document.
    pub fn from_value(doc: Value) -> Self {
        Self { doc }
    }

    /// `channels.telegram`.
    fn telegram(&self) -> Option<&Value> {
        self.doc.get("channels")?.get("telegram")
    }

    /// `channels.telegram.accounts.<name>`.
    fn account(&self, name: &str) -> Option<&Value> {
        self.telegram()?.get("accounts")?.get(name)
    }

    /// Bot token of the named account.
    pub fn account_token(&self, account: &str) -> Option<String> {
        string_field(self.account(account)?, "botToken")
    }

    /// Chat id of the named account.
    pub fn account_chat_id(&self, account: &str) -> Option<String> {
        self.account(account)?.get("chatId").and_then(chat_id_string)
    }

    /// Top-level `channels.telegram.botToken`.
    pub fn channel_token(&self) -> Option<String> {
        string_field(self.telegram()?, "botToken")
    }

    /// Top-level `channels.telegram.chatId`.
    pub fn channel_chat_id(&self) -> Option<String> {
        self.telegram()?.get("chatId").and_then(chat_id_string)
    }

    /// Log file named by `logging.file`, if any.
    pub fn configured_log_file(&self, paths: &WatchPaths) -> Option<PathBuf> {
        let raw = string_field(self.doc.get("logging")?, "file")?;
        Some(paths.resolve_configured(&raw))
    }
}

/// A trimmed, non-empty string field; other JSON types count as absent.
fn string_field(parent: &Value, key: &str) -> Option<String> {
    parent.get(key)?.as_str().and_then(non_empty)
}

/// Log file to scan: `logging.file` when configured, else the default.
pub fn log_file(config: Option<&NotifyConfig>, paths: &WatchPaths) -> PathBuf {
    config
        .and_then(|c| c.configured_log_file(paths))
        .unwrap_or_else(|| paths.default_log_file())
}

/// Normalize a chat id: integers are stringified, strings trimmed.
pub fn chat_id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => non_empty(s),
        _ => None,
    }
}

/// Load the configuration document.
///
/// Missing, unreadable and malformed documents all yield `None`.
pub fn load_notify_config(path: &Path) -> Option<NotifyConfig> {
    match read_json_optional::<Value>(path) {
        Ok(doc) => doc.map(NotifyConfig::from_value),
        Err(e) => {
            debug!(error = %e, "Ignoring notify config");
            None
        }
    }
}

/// Reads JSON from a file, returning None if the file doesn't exist.
pub(crate) fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path).map_err(|source| CoreError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&data).map_err(|source| CoreError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}
