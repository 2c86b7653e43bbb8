//! Turn-event stream from the host runtime.
//!
//! The host writes one JSON [`TurnEndEvent`] per line. Events are handled
//! strictly in order; each one, including its delivery, finishes before
//! the next line is read.

use modelwatch_notify::Transport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::TurnEndEvent;
use crate::handler::{ModelWatch, TurnOutcome};

/// Counters for one processed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Lines parsed as events.
    pub events: usize,
    /// Lines skipped because they were not valid events.
    pub malformed: usize,
    /// Events that announced a switch.
    pub switches: usize,
}

/// Feed every event from `reader` to `handler` until EOF.
pub async fn run_event_stream<R, T>(reader: R, handler: &mut ModelWatch<T>) -> Result<StreamStats>
where
    R: AsyncBufRead + Unpin,
    T: Transport + 'static,
{
    let mut stats = StreamStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: TurnEndEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping malformed turn event");
                stats.malformed += 1;
                continue;
            }
        };

        stats.events += 1;
        if let TurnOutcome::Changed { .. } = handler.on_turn_end(&event).await {
            stats.switches += 1;
        }
    }

    handler.flush().await;
    debug!(?stats, "Event stream closed");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelwatch_core::{DeliveryTarget, Environment, WatchPaths};
    use modelwatch_notify::{Notifier, Result as NotifyResult};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::tempdir;

    /// Records sends; the first one is slow.
    #[derive(Default)]
    struct SlowFirstTransport {
        sent: Mutex<Vec<String>>,
    }

    impl Transport for SlowFirstTransport {
        async fn send_message(&self, _token: &str, _chat_id: &str, text: &str) -> NotifyResult<()> {
            let first = self.sent.lock().unwrap().is_empty();
            if first {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn handler(dir: &std::path::Path) -> ModelWatch<SlowFirstTransport> {
        let notifier = Arc::new(Notifier::new(SlowFirstTransport::default()));
        ModelWatch::new(Environment::default(), notifier)
            .with_paths(WatchPaths::from_state_dir(dir))
            .with_target_resolver(|| DeliveryTarget::new(Some("t".into()), Some("1".into())))
    }

    fn sent(handler: &ModelWatch<SlowFirstTransport>) -> Vec<String> {
        handler.notifier().transport().sent.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let dir = tempdir().unwrap();
        let mut handler = handler(dir.path());
        let input = concat!(
            r#"{"turnIndex": 1, "model": {"provider": "openai", "id": "gpt-5"}}"#,
            "\n",
            "this is not json\n",
            "\n",
            r#"{"turnIndex": 2, "model": {"provider": "openai", "id": "gpt-5"}}"#,
            "\n",
        );

        let stats = run_event_stream(input.as_bytes(), &mut handler).await.unwrap();

        assert_eq!(
            stats,
            StreamStats {
                events: 2,
                malformed: 1,
                switches: 1,
            }
        );
        assert_eq!(sent(&handler), vec!["Model switch -> openai/gpt-5 @ unknown".to_string()]);
        assert_eq!(handler.last_reported().run_key.as_deref(), Some("default:2"));
    }

    #[tokio::test]
    async fn test_switches_delivered_in_order() {
        let dir = tempdir().unwrap();
        let mut handler = handler(dir.path());
        let input = concat!(
            r#"{"turnIndex": 1, "model": {"provider": "openai", "id": "gpt-5"}}"#,
            "\n",
            r#"{"turnIndex": 2, "model": {"provider": "anthropic", "id": "claude"}}"#,
            "\n",
            r#"{"turnIndex": 3}"#,
        );

        let stats = run_event_stream(input.as_bytes(), &mut handler).await.unwrap();

        assert_eq!(stats.switches, 2);
        assert_eq!(
            sent(&handler),
            vec![
                "Model switch -> openai/gpt-5 @ unknown".to_string(),
                "Model switch -> anthropic/claude @ unknown".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let dir = tempdir().unwrap();
        let mut handler = handler(dir.path());
        let stats = run_event_stream(&b""[..], &mut handler).await.unwrap();
        assert_eq!(stats, StreamStats::default());
        assert!(sent(&handler).is_empty());
    }
}
