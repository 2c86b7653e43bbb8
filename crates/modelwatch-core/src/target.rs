//! Delivery target resolution.
//!
//! Each field is resolved independently as an ordered fallback chain; the
//! first non-empty source wins.
//!
//! Token: `OPENCLAW_TELEGRAM_BOT_TOKEN`, `TELEGRAM_BOT_TOKEN`, the named
//! account's `botToken`, then `channels.telegram.botToken`.
//!
//! Chat id: `OPENCLAW_MODEL_NOTIFY_CHAT_ID`, `OPENCLAW_TELEGRAM_CHAT_ID`,
//! `TELEGRAM_CHAT_ID`, the named account's `chatId`,
//! `channels.telegram.chatId`, then the most recent chat seen in the log.

use std::fmt;
use std::path::PathBuf;

use crate::config::{load_notify_config, log_file, NotifyConfig};
use crate::env::{Environment, CHAT_ID_ENVS, TOKEN_ENVS};
use crate::log_tail::recover_chat_id;
use crate::paths::WatchPaths;

/// Where a notification goes. Built fresh for every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryTarget {
    token: Option<String>,
    chat_id: Option<String>,
}

impl DeliveryTarget {
    /// Create a target from already-resolved values.
    pub fn new(token: Option<String>, chat_id: Option<String>) -> Self {
        Self { token, chat_id }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// Both token and chat id are present.
    pub fn is_complete(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }
}

/// Origin of a resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// An environment variable.
    Env(&'static str),
    /// `channels.telegram.accounts.<name>`.
    AccountConfig(String),
    /// `channels.telegram`.
    ChannelConfig,
    /// Recovered from the log tail.
    LogTail(PathBuf),
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSource::Env(name) => write!(f, "env {}", name),
            TargetSource::AccountConfig(name) => {
                write!(f, "config channels.telegram.accounts.{}", name)
            }
            TargetSource::ChannelConfig => write!(f, "config channels.telegram"),
            TargetSource::LogTail(path) => write!(f, "log tail {}", path.display()),
        }
    }
}

/// A delivery target along with where each field came from.
#[derive(Debug, Clone, Default)]
pub struct TracedTarget {
    pub target: DeliveryTarget,
    pub token_source: Option<TargetSource>,
    pub chat_id_source: Option<TargetSource>,
}

/// Resolve the delivery target for the given environment.
pub fn resolve_delivery_target(env: &Environment) -> DeliveryTarget {
    resolve_delivery_target_traced(env).target
}

/// Resolve the delivery target, recording the source of each field.
pub fn resolve_delivery_target_traced(env: &Environment) -> TracedTarget {
    let paths = WatchPaths::resolve(env);
    let config = load_notify_config(&paths.config_file());
    resolve_with(env, &paths, config.as_ref())
}

fn resolve_with(env: &Environment, paths: &WatchPaths, config: Option<&NotifyConfig>) -> TracedTarget {
    let account = env.telegram_account();

    let token = env
        .first_of(&TOKEN_ENVS)
        .map(|(name, value)| (value, TargetSource::Env(name)))
        .or_else(|| {
            config?
                .account_token(&account)
                .map(|value| (value, TargetSource::AccountConfig(account.clone())))
        })
        .or_else(|| {
            config?
                .channel_token()
                .map(|value| (value, TargetSource::ChannelConfig))
        });

    let chat_id = env
        .first_of(&CHAT_ID_ENVS)
        .map(|(name, value)| (value, TargetSource::Env(name)))
        .or_else(|| {
            config?
                .account_chat_id(&account)
                .map(|value| (value, TargetSource::AccountConfig(account.clone())))
        })
        .or_else(|| {
            config?
                .channel_chat_id()
                .map(|value| (value, TargetSource::ChannelConfig))
        })
        .or_else(|| {
            let path = log_file(config, paths);
            recover_chat_id(&path).map(|value| (value, TargetSource::LogTail(path)))
        });

    let (token, token_source) = split(token);
    let (chat_id, chat_id_source) = split(chat_id);

    TracedTarget {
        target: DeliveryTarget::new(token, chat_id),
        token_source,
        chat_id_source,
    }
}

fn split(resolved: Option<(String, TargetSource)>) -> (Option<String>, Option<TargetSource>) {
    match resolved {
        Some((value, source)) => (Some(value), Some(source)),
        None => (None, None),
    }
}
