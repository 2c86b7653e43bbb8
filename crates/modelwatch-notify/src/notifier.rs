//! Best-effort notifier.
//!
//! Delivery problems are reported as warnings, each class of problem at
//! most once per process. Callers always get `()` back.

use std::collections::HashSet;
use std::sync::Mutex;

use modelwatch_core::DeliveryTarget;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::transport::{TelegramTransport, Transport};

pub const MISSING_TOKEN_KEY: &str = "missing-token";
pub const MISSING_CHAT_ID_KEY: &str = "missing-chat-id";
pub const SEND_ERROR_KEY: &str = "send-error";

/// Warning key for a non-success status.
pub fn send_failed_key(status: u16) -> String {
    format!("send-failed:{}", status)
}

/// Set of warning keys already emitted.
#[derive(Debug, Default)]
pub struct WarnOnce {
    warned: Mutex<HashSet<String>>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` unless `key` has warned before. Returns whether it logged.
    pub fn warn_once(&self, key: &str, message: &str) -> bool {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        if !warned.insert(key.to_string()) {
            return false;
        }
        warn!(key = %key, "{}", message);
        true
    }

    /// Keys warned so far, sorted.
    pub fn keys(&self) -> Vec<String> {
        let warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = warned.iter().cloned().collect();
        keys.sort();
        keys
    }
}

/// Delivers notification text to a resolved target.
#[derive(Debug)]
pub struct Notifier<T = TelegramTransport> {
    transport: T,
    warnings: WarnOnce,
}

impl Notifier<TelegramTransport> {
    /// Notifier using the public Telegram Bot API.
    pub fn telegram() -> Self {
        Self::new(TelegramTransport::new())
    }
}

impl<T: Transport> Notifier<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            warnings: WarnOnce::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Warning keys emitted so far.
    pub fn warned_keys(&self) -> Vec<String> {
        self.warnings.keys()
    }

    /// Record a warning through this notifier's one-shot registry.
    pub fn warn_once(&self, key: &str, message: &str) -> bool {
        self.warnings.warn_once(key, message)
    }

    /// Attempt delivery. Never fails; problems become one-shot warnings.
    pub async fn notify(&self, target: &DeliveryTarget, text: &str) {
        let Some(token) = target.token() else {
            self.warnings.warn_once(
                MISSING_TOKEN_KEY,
                "Model switch notification skipped: no Telegram bot token \
                 (set TELEGRAM_BOT_TOKEN or channels.telegram.botToken)",
            );
            return;
        };

        let Some(chat_id) = target.chat_id() else {
            self.warnings.warn_once(
                MISSING_CHAT_ID_KEY,
                "Model switch notification skipped: no Telegram chat id \
                 (set TELEGRAM_CHAT_ID or channels.telegram.chatId)",
            );
            return;
        };

        match self.transport.send_message(token, chat_id, text).await {
            Ok(()) => {
                info!(chat_id = %chat_id, text = %text, "Sent model switch notification");
            }
            Err(NotifyError::Status { status, body }) => {
                self.warnings.warn_once(
                    &send_failed_key(status),
                    &format!("Model switch notification failed ({}): {}", status, body),
                );
            }
            Err(e) => {
                self.warnings.warn_once(
                    SEND_ERROR_KEY,
                    &format!("Model switch notification failed: {}", e),
                );
            }
        }
    }
}
