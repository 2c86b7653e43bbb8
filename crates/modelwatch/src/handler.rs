//! Turn-end handler: detects model switches and announces them.
//!
//! The handler owns its dedup state. A switch is announced at most once:
//! the new signature is recorded whether or not delivery succeeds, so a
//! missing token does not cause a notification attempt on every turn.
//!
//! Deliveries are serial. At most one send is in flight, and messages reach
//! the chat in the order the switches were observed.

use std::future::Future;
use std::sync::Arc;

use modelwatch_core::{
    resolve_auth_profile, resolve_delivery_target, signature, switch_message, DeliveryTarget,
    Environment, WatchPaths,
};
use modelwatch_notify::{Notifier, Transport};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::TurnEndEvent;

/// Produces a fresh delivery target for each notification attempt.
pub trait TargetResolver: Send + Sync {
    fn resolve(&self) -> DeliveryTarget;
}

impl<F> TargetResolver for F
where
    F: Fn() -> DeliveryTarget + Send + Sync,
{
    fn resolve(&self) -> DeliveryTarget {
        self()
    }
}

/// Resolves targets from env overrides, the config document and the log.
#[derive(Debug, Clone)]
pub struct EnvTargetResolver {
    env: Environment,
}

impl EnvTargetResolver {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }
}

impl TargetResolver for EnvTargetResolver {
    fn resolve(&self) -> DeliveryTarget {
        resolve_delivery_target(&self.env)
    }
}

/// What was last seen. Lives as long as the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastReported {
    pub signature: Option<String>,
    pub run_key: Option<String>,
}

/// Result of observing one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// No usable model information on the event.
    Skipped,
    /// Same signature as last time.
    Unchanged,
    /// New signature; `message` should be delivered.
    Changed { signature: String, message: String },
}

/// Watches turn-end events for model switches.
pub struct ModelWatch<T: Transport + 'static> {
    paths: WatchPaths,
    notifier: Arc<Notifier<T>>,
    resolver: Arc<dyn TargetResolver>,
    last: LastReported,
    /// Tail of the detached delivery chain.
    in_flight: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> ModelWatch<T> {
    /// Handler reading paths and targets from `env`.
    pub fn new(env: Environment, notifier: Arc<Notifier<T>>) -> Self {
        let paths = WatchPaths::resolve(&env);
        Self {
            paths,
            notifier,
            resolver: Arc::new(EnvTargetResolver::new(env)),
            last: LastReported::default(),
            in_flight: None,
        }
    }

    /// Replace the target resolver.
    pub fn with_target_resolver(mut self, resolver: impl TargetResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Use explicit paths for the auth-profile store.
    pub fn with_paths(mut self, paths: WatchPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn last_reported(&self) -> &LastReported {
        &self.last
    }

    pub fn notifier(&self) -> &Arc<Notifier<T>> {
        &self.notifier
    }

    /// Classify a turn and update the dedup state. Performs no delivery.
    pub fn observe(&mut self, event: &TurnEndEvent) -> TurnOutcome {
        let Some(model) = event.model.as_ref() else {
            return TurnOutcome::Skipped;
        };
        let provider = model.provider.trim();
        let model_id = model.id.trim();
        if provider.is_empty() || model_id.is_empty() {
            return TurnOutcome::Skipped;
        }

        let profile = resolve_auth_profile(&self.paths, provider);
        let sig = signature(provider, model_id, profile.as_deref());
        let run_key = event.run_key();

        if self.last.signature.as_deref() == Some(sig.as_str()) {
            self.last.run_key = Some(run_key);
            return TurnOutcome::Unchanged;
        }

        debug!(
            previous = ?self.last.signature,
            current = %sig,
            run_key = %run_key,
            "Model switch detected"
        );

        let message = switch_message(provider, model_id, profile.as_deref());
        self.last = LastReported {
            signature: Some(sig.clone()),
            run_key: Some(run_key),
        };

        TurnOutcome::Changed {
            signature: sig,
            message,
        }
    }

    /// Handle a turn and wait for any resulting delivery.
    pub async fn on_turn_end(&mut self, event: &TurnEndEvent) -> TurnOutcome {
        let outcome = self.observe(event);
        if let TurnOutcome::Changed { message, .. } = &outcome {
            // Earlier detached sends go out first.
            self.flush().await;
            deliver(
                Arc::clone(&self.notifier),
                Arc::clone(&self.resolver),
                message.clone(),
            )
            .await;
        }
        outcome
    }

    /// Handle a turn without waiting for delivery.
    ///
    /// Dedup state is updated before this returns; the send runs on a
    /// detached task queued behind any earlier one. Returns whether a send
    /// was queued.
    pub fn dispatch_turn_end(&mut self, event: &TurnEndEvent) -> bool {
        let TurnOutcome::Changed { message, .. } = self.observe(event) else {
            return false;
        };

        let previous = self.in_flight.take();
        let notifier = Arc::clone(&self.notifier);
        let resolver = Arc::clone(&self.resolver);
        self.in_flight = Some(spawn_detached(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            deliver(notifier, resolver, message).await;
        }));
        true
    }

    /// Wait until every queued delivery has finished.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            let _ = handle.await;
        }
    }
}

/// Resolve a fresh target off the async workers, then notify.
async fn deliver<T: Transport + 'static>(
    notifier: Arc<Notifier<T>>,
    resolver: Arc<dyn TargetResolver>,
    message: String,
) {
    let target = match tokio::task::spawn_blocking(move || resolver.resolve()).await {
        Ok(target) => target,
        Err(e) => {
            notifier.warn_once(
                "resolve-failed",
                &format!("Model switch notification skipped: target resolution failed: {}", e),
            );
            return;
        }
    };
    notifier.notify(&target, &message).await;
}

/// Spawn `task`, converting a panic inside it into a warning.
pub fn spawn_detached<F>(task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let inner = tokio::spawn(task);
    tokio::spawn(async move {
        if let Err(e) = inner.await {
            warn!(error = %e, "Model switch notification task failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ActiveModel;
    use modelwatch_notify::Result as NotifyResult;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
    }

    impl Transport for RecordingTransport {
        async fn send_message(&self, _token: &str, _chat_id: &str, text: &str) -> NotifyResult<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn turn(index: u64, provider: &str, id: &str) -> TurnEndEvent {
        TurnEndEvent::new(index, Some("s".into()), Some(ActiveModel::new(provider, id)))
    }

    fn watch(dir: &std::path::Path) -> ModelWatch<RecordingTransport> {
        let notifier = Arc::new(Notifier::new(RecordingTransport::default()));
        ModelWatch::new(Environment::default(), notifier)
            .with_paths(WatchPaths::from_state_dir(dir))
            .with_target_resolver(|| DeliveryTarget::new(Some("t".into()), Some("1".into())))
    }

    fn sent(watch: &ModelWatch<RecordingTransport>) -> Vec<String> {
        watch.notifier().transport().sent.lock().unwrap().clone()
    }

    #[test]
    fn test_observe_skips_missing_model() {
        let dir = tempdir().unwrap();
        let mut watch = watch(dir.path());
        assert_eq!(watch.observe(&TurnEndEvent::new(1, None, None)), TurnOutcome::Skipped);
        assert_eq!(watch.observe(&turn(2, "", "gpt-5")), TurnOutcome::Skipped);
        assert_eq!(watch.observe(&turn(3, "openai", "  ")), TurnOutcome::Skipped);
        assert_eq!(watch.last_reported(), &LastReported::default());
    }

    #[test]
    fn test_observe_tracks_run_key_when_unchanged() {
        let dir = tempdir().unwrap();
        let mut watch = watch(dir.path());

        let first = watch.observe(&turn(1, "openai", "gpt-5"));
        assert!(matches!(first, TurnOutcome::Changed { .. }));
        assert_eq!(watch.observe(&turn(2, "openai", "gpt-5")), TurnOutcome::Unchanged);

        assert_eq!(
            watch.last_reported(),
            &LastReported {
                signature: Some("openai/gpt-5@unknown".to_string()),
                run_key: Some("s:2".to_string()),
            }
        );
    }

    #[test]
    fn test_profile_change_is_a_switch() {
        let dir = tempdir().unwrap();
        let paths = WatchPaths::from_state_dir(dir.path());
        std::fs::create_dir_all(&paths.agent_dir).unwrap();
        let mut watch = watch(dir.path());

        assert!(matches!(watch.observe(&turn(1, "openai", "gpt-5")), TurnOutcome::Changed { .. }));

        std::fs::write(
            paths.auth_profiles_file(),
            r#"{"lastGood": {"openai": "openai:work"}}"#,
        )
        .unwrap();

        assert_eq!(
            watch.observe(&turn(2, "openai", "gpt-5")),
            TurnOutcome::Changed {
                signature: "openai/gpt-5@openai:work".to_string(),
                message: "Model switch -> openai/gpt-5 @ openai:work".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_on_turn_end_sends_once_per_switch() {
        let dir = tempdir().unwrap();
        let mut watch = watch(dir.path());

        watch.on_turn_end(&turn(1, "openai", "gpt-5")).await;
        watch.on_turn_end(&turn(2, "openai", "gpt-5")).await;
        watch.on_turn_end(&turn(3, "anthropic", "gpt-5")).await;

        assert_eq!(
            sent(&watch),
            vec![
                "Model switch -> openai/gpt-5 @ unknown".to_string(),
                "Model switch -> anthropic/gpt-5 @ unknown".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_target_still_records_signature() {
        let dir = tempdir().unwrap();
        let notifier = Arc::new(Notifier::new(RecordingTransport::default()));
        let mut watch = ModelWatch::new(Environment::default(), notifier)
            .with_paths(WatchPaths::from_state_dir(dir.path()))
            .with_target_resolver(DeliveryTarget::default);

        watch.on_turn_end(&turn(1, "openai", "gpt-5")).await;
        assert_eq!(
            watch.on_turn_end(&turn(2, "openai", "gpt-5")).await,
            TurnOutcome::Unchanged
        );
        assert!(sent(&watch).is_empty());
        assert_eq!(watch.notifier().warned_keys(), vec!["missing-token".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_is_detached() {
        let dir = tempdir().unwrap();
        let mut watch = watch(dir.path());

        assert!(watch.dispatch_turn_end(&turn(1, "openai", "gpt-5")));
        assert!(!watch.dispatch_turn_end(&turn(2, "openai", "gpt-5")));

        watch.flush().await;
        assert_eq!(sent(&watch), vec!["Model switch -> openai/gpt-5 @ unknown".to_string()]);
    }

    /// Takes 200 ms for openai messages, no time for anything else.
    #[derive(Default)]
    struct SlowOpenAiTransport {
        sent: Mutex<Vec<String>>,
    }

    impl Transport for SlowOpenAiTransport {
        async fn send_message(&self, _token: &str, _chat_id: &str, text: &str) -> NotifyResult<()> {
            if text.contains("openai") {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn slow_watch(dir: &std::path::Path) -> ModelWatch<SlowOpenAiTransport> {
        let notifier = Arc::new(Notifier::new(SlowOpenAiTransport::default()));
        ModelWatch::new(Environment::default(), notifier)
            .with_paths(WatchPaths::from_state_dir(dir))
            .with_target_resolver(|| DeliveryTarget::new(Some("t".into()), Some("1".into())))
    }

    #[tokio::test]
    async fn test_detached_sends_keep_switch_order() {
        let dir = tempdir().unwrap();
        let mut watch = slow_watch(dir.path());

        assert!(watch.dispatch_turn_end(&turn(1, "openai", "gpt-5")));
        assert!(watch.dispatch_turn_end(&turn(2, "anthropic", "claude")));
        watch.flush().await;

        assert_eq!(
            *watch.notifier().transport().sent.lock().unwrap(),
            vec![
                "Model switch -> openai/gpt-5 @ unknown".to_string(),
                "Model switch -> anthropic/claude @ unknown".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_awaited_send_waits_for_detached_one() {
        let dir = tempdir().unwrap();
        let mut watch = slow_watch(dir.path());

        assert!(watch.dispatch_turn_end(&turn(1, "openai", "gpt-5")));
        watch.on_turn_end(&turn(2, "anthropic", "claude")).await;

        assert_eq!(
            *watch.notifier().transport().sent.lock().unwrap(),
            vec![
                "Model switch -> openai/gpt-5 @ unknown".to_string(),
                "Model switch -> anthropic/claude @ unknown".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_resolver_becomes_warning() {
        let dir = tempdir().unwrap();
        let notifier = Arc::new(Notifier::new(RecordingTransport::default()));
        let mut watch = ModelWatch::new(Environment::default(), notifier)
            .with_paths(WatchPaths::from_state_dir(dir.path()))
            .with_target_resolver(|| -> DeliveryTarget { panic!("unreadable state") });

        watch.on_turn_end(&turn(1, "openai", "gpt-5")).await;
        assert!(sent(&watch).is_empty());
        assert_eq!(watch.notifier().warned_keys(), vec!["resolve-failed".to_string()]);
    }

    #[tokio::test]
    async fn test_spawn_detached_swallows_panic() {
        let handle = spawn_detached(async { panic!("boom") });
        assert!(handle.await.is_ok());
    }
}
