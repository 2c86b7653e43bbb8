//! Filesystem locations used by modelwatch.
//!
//! # Storage Structure
//!
//! Everything lives under the agent's state directory (`~/.openclaw/` by
//! default). modelwatch only ever reads from it:
//!
//! ```text
//! ~/.openclaw/
//! ├── openclaw.json                 # channel + logging configuration
//! ├── .env                          # optional env overrides (CLI only)
//! ├── workspace/logs/openclaw.log   # gateway log, scanned for chat ids
//! └── agents/main/agent/
//!     └── auth-profiles.json        # last-good auth profile per provider
//! ```
//!
//! # Environment Variables
//!
//! - `OPENCLAW_STATE_DIR`: Override the base state directory
//! - `OPENCLAW_AGENT_DIR` / `PI_CODING_AGENT_DIR`: Override the agent directory

use std::path::PathBuf;

use crate::env::{Environment, AGENT_DIR_ENVS, STATE_DIR_ENV};

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".openclaw";

const CONFIG_FILE: &str = "openclaw.json";
const ENV_FILE: &str = ".env";
const AUTH_PROFILES_FILE: &str = "auth-profiles.json";

/// Resolved locations for one environment snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPaths {
    /// Base state directory.
    pub state_dir: PathBuf,
    /// Agent directory holding the auth-profile store.
    pub agent_dir: PathBuf,
}

impl WatchPaths {
    /// Resolve paths from the environment.
    ///
    /// The state directory is determined by:
    /// 1. `OPENCLAW_STATE_DIR` if set
    /// 2. `~/.openclaw` if the home directory is available
    /// 3. `.openclaw` in the current directory as fallback
    pub fn resolve(env: &Environment) -> Self {
        let state_dir = env
            .get(STATE_DIR_ENV)
            .map(|dir| expand_path(&dir))
            .unwrap_or_else(default_state_dir);

        let agent_dir = env
            .first_of(&AGENT_DIR_ENVS)
            .map(|(_, dir)| expand_path(&dir))
            .unwrap_or_else(|| state_dir.join("agents").join("main").join("agent"));

        Self {
            state_dir,
            agent_dir,
        }
    }

    /// Build paths rooted at an explicit state directory.
    pub fn from_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let agent_dir = state_dir.join("agents").join("main").join("agent");
        Self {
            state_dir,
            agent_dir,
        }
    }

    /// The JSON configuration document.
    pub fn config_file(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE)
    }

    /// The optional `.env` file loaded by the CLI.
    pub fn env_file(&self) -> PathBuf {
        self.state_dir.join(ENV_FILE)
    }

    /// Log file used when the config document does not name one.
    pub fn default_log_file(&self) -> PathBuf {
        self.state_dir
            .join("workspace")
            .join("logs")
            .join("openclaw.log")
    }

    /// The auth-profile store.
    pub fn auth_profiles_file(&self) -> PathBuf {
        self.agent_dir.join(AUTH_PROFILES_FILE)
    }

    /// Resolve a configured path: `~` is expanded, relative paths hang off
    /// the state directory.
    pub fn resolve_configured(&self, raw: &str) -> PathBuf {
        let path = expand_path(raw);
        if path.is_absolute() {
            path
        } else {
            self.state_dir.join(path)
        }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(DEFAULT_STATE_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

/// Expand `~` and `$VAR` references; unexpandable input is kept verbatim.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_dir_override() {
        let env = Environment::from_pairs([(STATE_DIR_ENV, "/srv/claw")]);
        let paths = WatchPaths::resolve(&env);
        assert_eq!(paths.state_dir, PathBuf::from("/srv/claw"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/claw/openclaw.json"));
        assert_eq!(
            paths.default_log_file(),
            PathBuf::from("/srv/claw/workspace/logs/openclaw.log")
        );
        assert_eq!(
            paths.auth_profiles_file(),
            PathBuf::from("/srv/claw/agents/main/agent/auth-profiles.json")
        );
    }

    #[test]
    fn test_agent_dir_overrides_in_order() {
        let env = Environment::from_pairs([
            (STATE_DIR_ENV, "/srv/claw"),
            ("PI_CODING_AGENT_DIR", "/b"),
            ("OPENCLAW_AGENT_DIR", "/a"),
        ]);
        assert_eq!(WatchPaths::resolve(&env).agent_dir, PathBuf::from("/a"));

        let env = Environment::from_pairs([(STATE_DIR_ENV, "/srv/claw"), ("PI_CODING_AGENT_DIR", "/b")]);
        let paths = WatchPaths::resolve(&env);
        assert_eq!(paths.auth_profiles_file(), PathBuf::from("/b/auth-profiles.json"));
    }

    #[test]
    fn test_default_state_dir_name() {
        let paths = WatchPaths::resolve(&Environment::default());
        assert!(paths.state_dir.ends_with(".openclaw"));
    }

    #[test]
    fn test_resolve_configured_relative() {
        let paths = WatchPaths::from_state_dir("/srv/claw");
        assert_eq!(
            paths.resolve_configured("logs/gw.log"),
            PathBuf::from("/srv/claw/logs/gw.log")
        );
        assert_eq!(paths.resolve_configured("/var/log/gw.log"), PathBuf::from("/var/log/gw.log"));
    }

    #[test]
    fn test_env_file_name() {
        let paths = WatchPaths::from_state_dir("/srv/claw");
        assert!(paths.env_file().ends_with(".env"));
    }
}
