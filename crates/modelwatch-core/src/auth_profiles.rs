//! Last-good auth profile lookup.
//!
//! The agent records, per provider, the auth profile that most recently
//! authenticated successfully. Keys are normalized provider ids; stores
//! written by older agents may still use the raw id.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::config::read_json_optional;
use crate::env::non_empty;
use crate::paths::WatchPaths;

/// Provider aliases folded onto their canonical id.
const PROVIDER_ALIASES: &[(&str, &str)] = &[
    ("z.ai", "zai"),
    ("z-ai", "zai"),
    ("opencode-zen", "opencode"),
    ("qwen", "qwen-portal"),
    ("kimi-code", "kimi-coding"),
];

/// `lastGood` entries of `auth-profiles.json`.
#[derive(Debug, Clone, Default)]
pub struct AuthProfileStore {
    pub last_good: HashMap<String, String>,
}

impl AuthProfileStore {
    /// Collect string-valued `lastGood` entries; anything else is skipped.
    pub fn from_value(doc: &Value) -> Self {
        let last_good = doc
            .get("lastGood")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(provider, profile)| {
                        Some((provider.clone(), profile.as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { last_good }
    }

    /// Last-good profile for `provider`: normalized key first, raw key second.
    pub fn last_good_for(&self, provider: &str) -> Option<String> {
        let normalized = normalize_provider_id(provider);
        [normalized.as_str(), provider, provider.trim()]
            .iter()
            .find_map(|key| self.last_good.get(*key).and_then(|p| non_empty(p)))
    }
}

/// Lowercase, trim and fold aliases.
pub fn normalize_provider_id(provider: &str) -> String {
    let lowered = provider.trim().to_lowercase();
    PROVIDER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lowered)
}

/// Load the store; missing or malformed files yield `None`.
pub fn load_auth_profile_store(path: &Path) -> Option<AuthProfileStore> {
    match read_json_optional::<Value>(path) {
        Ok(doc) => doc.map(|doc| AuthProfileStore::from_value(&doc)),
        Err(e) => {
            debug!(error = %e, "Ignoring auth profile store");
            None
        }
    }
}

/// Last-good profile name for `provider` under `paths`.
pub fn resolve_auth_profile(paths: &WatchPaths, provider: &str) -> Option<String> {
    load_auth_profile_store(&paths.auth_profiles_file())?.last_good_for(provider)
}
