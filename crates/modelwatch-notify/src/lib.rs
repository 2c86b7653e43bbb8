//! Notification delivery for modelwatch.
//!
//! The [`Notifier`] takes a resolved [`DeliveryTarget`] and a message and
//! makes one delivery attempt through a [`Transport`]. It never returns an
//! error: missing configuration and failed sends are reported as warnings,
//! each distinct problem once per process.
//!
//! [`DeliveryTarget`]: modelwatch_core::DeliveryTarget

pub mod error;
pub mod notifier;
pub mod transport;

pub use error::{NotifyError, Result};
pub use notifier::{send_failed_key, Notifier, WarnOnce};
pub use transport::{TelegramTransport, Transport, TELEGRAM_API_URL};
