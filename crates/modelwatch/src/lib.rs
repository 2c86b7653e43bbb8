//! modelwatch - announces when a running agent switches model, provider or
//! auth profile.
//!
//! The host runtime reports every completed turn as a [`TurnEndEvent`]. The
//! [`ModelWatch`] handler computes the turn's model signature, and when it
//! differs from the last one seen, sends `Model switch -> <provider>/<model>
//! @ <profile>` to the configured Telegram chat.
//!
//! # Environment Variables
//!
//! All optional:
//! - `OPENCLAW_STATE_DIR`: State directory (default `~/.openclaw`)
//! - `OPENCLAW_AGENT_DIR` / `PI_CODING_AGENT_DIR`: Agent directory
//! - `OPENCLAW_TELEGRAM_BOT_TOKEN` / `TELEGRAM_BOT_TOKEN`: Bot token
//! - `OPENCLAW_MODEL_NOTIFY_CHAT_ID` / `OPENCLAW_TELEGRAM_CHAT_ID` /
//!   `TELEGRAM_CHAT_ID`: Target chat
//! - `OPENCLAW_TELEGRAM_ACCOUNT`: Account entry in `openclaw.json` (default `default`)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use modelwatch::{ActiveModel, ModelWatch, TurnEndEvent};
//! use modelwatch_core::Environment;
//! use modelwatch_notify::Notifier;
//!
//! #[tokio::main]
//! async fn main() {
//!     let notifier = Arc::new(Notifier::telegram());
//!     let mut watch = ModelWatch::new(Environment::from_process(), notifier);
//!
//!     let event = TurnEndEvent::new(1, None, Some(ActiveModel::new("openai", "gpt-5")));
//!     watch.on_turn_end(&event).await;
//! }
//! ```

pub mod error;
pub mod event;
pub mod handler;
pub mod stream;

pub use error::{Result, WatchError};
pub use event::{ActiveModel, TurnEndEvent};
pub use handler::{
    spawn_detached, EnvTargetResolver, LastReported, ModelWatch, TargetResolver, TurnOutcome,
};
pub use stream::{run_event_stream, StreamStats};
