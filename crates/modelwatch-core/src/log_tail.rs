//! Chat-id recovery from the tail of the gateway log.
//!
//! When no chat id is configured anywhere, the most recent inbound Telegram
//! update in the log tells us where the owner last talked to the bot. Log
//! lines are either plain text or JSON records whose `message` field holds
//! the text; both forms are handled.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::chat_id_string;
use crate::error::{CoreError, Result};

/// Bytes read from the end of the log.
pub const LOG_TAIL_BYTES: u64 = 512 * 1024;

/// Field of a JSON log record holding the message text.
pub const LOG_MESSAGE_KEY: &str = "message";

/// Marker preceding a logged inbound update.
pub const UPDATE_MARKER: &str = "telegram update:";

static PAYLOAD_RE: OnceLock<Regex> = OnceLock::new();
static ESCAPED_CHAT_RE: OnceLock<Regex> = OnceLock::new();

fn payload_re() -> &'static Regex {
    PAYLOAD_RE.get_or_init(|| {
        Regex::new(r"telegram update:\s*(\{.*\})").expect("payload pattern is valid")
    })
}

// Matches `\"chat\":{\"id\":123` or `\"chat\":{\"id\":\"123\"` in text that
// still carries one level of JSON string escaping.
fn escaped_chat_re() -> &'static Regex {
    ESCAPED_CHAT_RE.get_or_init(|| {
        Regex::new(r#"\\"chat\\"\s*:\s*\{\s*\\"id\\"\s*:\s*(?:(-?\d+)|\\"([^"\\]+)\\")"#)
            .expect("escaped chat pattern is valid")
    })
}

/// Recover the most recent chat id from the tail of `path`.
///
/// Missing files, read errors and tails without a usable update all yield
/// `None`.
pub fn recover_chat_id(path: &Path) -> Option<String> {
    let tail = match read_tail(path, LOG_TAIL_BYTES) {
        Ok(Some(tail)) => tail,
        Ok(None) => return None,
        Err(e) => {
            debug!(error = %e, "Skipping log tail chat id recovery");
            return None;
        }
    };

    let found = find_chat_id_in_text(&tail);
    if let Some(chat_id) = &found {
        debug!(path = %path.display(), chat_id = %chat_id, "Recovered chat id from log tail");
    }
    found
}

/// Scan `text` newest line first and return the first chat id found.
pub fn find_chat_id_in_text(text: &str) -> Option<String> {
    text.lines().rev().find_map(chat_id_from_line)
}

/// Extract a chat id from one log line.
pub fn chat_id_from_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let effective = effective_text(line);
    if !effective.contains(UPDATE_MARKER) {
        return None;
    }

    let payload = payload_re()
        .captures(&effective)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    if let Some(payload) = payload {
        if let Ok(update) = serde_json::from_str::<Value>(payload) {
            return chat_id_from_update(&update);
        }
    }

    escaped_chat_id(&effective)
}

/// The text of a log line: the `message` field of a JSON record, or the
/// raw line.
fn effective_text(line: &str) -> String {
    if line.starts_with('{') && line.ends_with('}') {
        if let Ok(Value::Object(record)) = serde_json::from_str::<Value>(line) {
            if let Some(Value::String(message)) = record.get(LOG_MESSAGE_KEY) {
                return message.clone();
            }
        }
    }
    line.to_string()
}

/// Chat id of a Telegram update: `message.chat.id` or `channel_post.chat.id`.
fn chat_id_from_update(update: &Value) -> Option<String> {
    ["message", "channel_post"]
        .iter()
        .find_map(|kind| update.get(*kind)?.get("chat")?.get("id").and_then(chat_id_string))
}

fn escaped_chat_id(text: &str) -> Option<String> {
    let caps = escaped_chat_re().captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Read at most `budget` bytes from the end of `path`.
fn read_tail(path: &Path, budget: u64) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let read_error = |source| CoreError::ReadError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_error)?;
    let len = file.metadata().map_err(read_error)?.len();
    if len == 0 {
        return Ok(None);
    }

    let take = budget.min(len);
    file.seek(SeekFrom::Start(len - take)).map_err(read_error)?;

    let mut buffer = Vec::with_capacity(take as usize);
    file.take(take).read_to_end(&mut buffer).map_err(read_error)?;

    Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
}
