//! modelwatch core - everything needed to decide *whether* and *where* to
//! announce a model switch.
//!
//! - **auth_profiles**: Last-good auth profile per (normalized) provider
//! - **config**: The agent's JSON configuration document
//! - **env**: Environment snapshot and override variable names
//! - **log_tail**: Chat-id recovery from the tail of the gateway log
//! - **paths**: State/agent directory layout
//! - **signature**: Canonical `(provider, model, profile)` signatures
//! - **target**: Delivery target resolution
//!
//! All lookups are best-effort: missing or malformed inputs resolve to
//! "no value", never to an error.

pub mod auth_profiles;
pub mod config;
pub mod env;
pub mod error;
pub mod log_tail;
pub mod paths;
pub mod signature;
pub mod target;

pub use auth_profiles::{
    load_auth_profile_store, normalize_provider_id, resolve_auth_profile, AuthProfileStore,
};
pub use config::{load_notify_config, NotifyConfig};
pub use env::Environment;
pub use error::{CoreError, Result};
pub use log_tail::{find_chat_id_in_text, recover_chat_id, LOG_TAIL_BYTES};
pub use paths::WatchPaths;
pub use signature::{signature, switch_message, UNKNOWN_PROFILE};
pub use target::{
    resolve_delivery_target, resolve_delivery_target_traced, DeliveryTarget, TargetSource,
    TracedTarget,
};
