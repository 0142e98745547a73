//! Interactive terminal front-end.
//!
//! Lines typed by the user are submitted as chat messages. Feedback is
//! given with `/up` and `/down`, optionally followed by the bubble number
//! printed next to an assistant reply.

use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use super::api::ChatBackend;
use super::controller::{ChatController, FeedbackOutcome};
use super::panel::{BubbleId, ChatPanel};
use super::storage::KeyValueStore;
use crate::protocol::FeedbackKind;

const HELP: &str = "Type a message and press Enter. /up [n] and /down [n] rate reply #n (default: latest), /quit exits.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a chat message (may be blank; the controller ignores blanks).
    Say(String),
    /// Rate an assistant bubble; `None` means the latest one.
    Rate(FeedbackKind, Option<usize>),
    /// Print usage.
    Help,
    /// Leave the loop.
    Quit,
    /// Unrecognised slash command.
    Unknown(String),
}

impl Command {
    /// Parse a line of user input.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        let kind = match name {
            "up" | "like" => FeedbackKind::Positive,
            "down" | "dislike" => FeedbackKind::Negative,
            "help" | "?" => return Self::Help,
            "quit" | "exit" | "q" => return Self::Quit,
            _ => return Self::Unknown(trimmed.to_string()),
        };

        match arg.map(|a| a.trim_start_matches('#').parse::<usize>()) {
            None => Self::Rate(kind, None),
            Some(Ok(n)) => Self::Rate(kind, Some(n)),
            Some(Err(_)) => Self::Unknown(trimmed.to_string()),
        }
    }
}

/// Restore the session, then read commands from `input` until EOF or `/quit`.
///
/// Chat messages and feedback run concurrently with reading, so a new line
/// can be sent while earlier replies are still pending. At EOF the pending
/// operations are awaited; `/quit` drops them.
pub async fn run<S, B, P, R>(controller: &ChatController<S, B, P>, input: R) -> anyhow::Result<()>
where
    S: KeyValueStore,
    B: ChatBackend,
    P: ChatPanel,
    R: AsyncBufRead + Unpin,
{
    controller.restore_session();
    println!("{HELP}");

    let mut lines = input.lines();
    let mut pending: FuturesUnordered<LocalBoxFuture<'_, ()>> = FuturesUnordered::new();
    let mut reading = true;

    loop {
        tokio::select! {
            Some(()) = pending.next(), if !pending.is_empty() => {}
            line = lines.next_line(), if reading => {
                let Some(line) = line? else {
                    reading = false;
                    continue;
                };
                match Command::parse(&line) {
                    Command::Say(text) => {
                        pending.push(
                            async move {
                                controller.submit(&text).await;
                            }
                            .boxed_local(),
                        );
                    }
                    Command::Rate(kind, target) => {
                        let bubble = match target {
                            Some(n) => Some(BubbleId(n)),
                            None => controller.rateable_bubbles().last().copied(),
                        };
                        let Some(bubble) = bubble else {
                            println!("No reply to rate yet.");
                            continue;
                        };
                        pending.push(
                            async move {
                                let outcome = controller.send_feedback(bubble, kind).await;
                                if outcome == FeedbackOutcome::NotRateable {
                                    println!("#{} is not an assistant reply.", bubble.0);
                                }
                            }
                            .boxed_local(),
                        );
                    }
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Unknown(cmd) => warn!(command = %cmd, "Unknown command"),
                }
            }
            else => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::Result;
    use crate::client::history::{self, DEFAULT_STORAGE_KEY, MessageRecord};
    use crate::client::panel::PanelState;
    use crate::client::storage::MemoryStore;
    use crate::protocol::{ChatReply, FeedbackRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Echoes every message. A message equal to `held` is answered only
    /// after another chat request has arrived.
    #[derive(Default)]
    struct EchoBackend {
        held: Option<&'static str>,
        release: Notify,
        chat_calls: AtomicUsize,
        feedback: Mutex<Vec<FeedbackRequest>>,
    }

    #[async_trait::async_trait]
    impl ChatBackend for EchoBackend {
        async fn send_chat(&self, message: &str) -> Result<ChatReply> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            if self.held == Some(message) {
                self.release.notified().await;
            } else {
                self.release.notify_one();
            }
            Ok(ChatReply {
                response: Some(format!("echo: {message}")),
                detected_mood: Some("neutral".into()),
                tone_used: None,
            })
        }

        async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
            self.feedback.lock().unwrap().push(feedback.clone());
            Ok(())
        }
    }

    fn controller(
        store: MemoryStore,
        backend: &Arc<EchoBackend>,
    ) -> ChatController<MemoryStore, Arc<EchoBackend>, PanelState> {
        ChatController::new(store, Arc::clone(backend), PanelState::new())
    }

    #[tokio::test]
    async fn test_next_line_is_sent_while_reply_pending() {
        let backend = Arc::new(EchoBackend {
            held: Some("first"),
            ..EchoBackend::default()
        });
        let chat = controller(MemoryStore::new(), &backend);

        let input: &[u8] = b"first\nsecond\n";
        tokio::time::timeout(Duration::from_secs(5), run(&chat, input))
            .await
            .expect("second line was never sent")
            .unwrap();

        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 2);
        let texts: Vec<String> =
            chat.with_panel(|panel| panel.texts().into_iter().map(String::from).collect());
        let position = |text: &str| texts.iter().position(|t| t == text).unwrap();
        assert!(position("echo: second") < position("echo: first"));
        assert_eq!(chat.history().len(), 4);
    }

    #[tokio::test]
    async fn test_eof_waits_for_pending_replies() {
        let backend = Arc::new(EchoBackend::default());
        let chat = controller(MemoryStore::new(), &backend);

        let input: &[u8] = b"hello\n\n";
        run(&chat, input).await.unwrap();

        chat.with_panel(|panel| assert_eq!(panel.texts(), vec!["hello", "echo: hello"]));
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quit_stops_reading() {
        let backend = Arc::new(EchoBackend::default());
        let chat = controller(MemoryStore::new(), &backend);

        let input: &[u8] = b"/quit\nnever sent\n";
        run(&chat, input).await.unwrap();

        chat.with_panel(|panel| assert!(panel.bubbles.is_empty()));
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_latest_restored_reply() {
        let store = MemoryStore::new();
        let stored = vec![
            MessageRecord::user("hello"),
            MessageRecord::ai("echo: hello", Some("neutral".into()), "hello"),
        ];
        history::save_history(&store, DEFAULT_STORAGE_KEY, &stored).unwrap();
        let backend = Arc::new(EchoBackend::default());
        let chat = controller(store, &backend);

        let input: &[u8] = b"/down\n/up 0\n";
        run(&chat, input).await.unwrap();

        chat.with_panel(|panel| assert!(panel.bubbles[1].thanked));
        let sent = backend.feedback.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].feedback, "negative");
        assert_eq!(sent[0].message, "hello");
        assert_eq!(sent[0].response, "echo: hello");
    }

    #[test]
    fn test_parse_messages() {
        assert_eq!(Command::parse("hello"), Command::Say("hello".into()));
        assert_eq!(Command::parse("   "), Command::Say("   ".into()));
    }

    #[test]
    fn test_parse_feedback() {
        assert_eq!(
            Command::parse("/up"),
            Command::Rate(FeedbackKind::Positive, None)
        );
        assert_eq!(
            Command::parse("/down 3"),
            Command::Rate(FeedbackKind::Negative, Some(3))
        );
        assert_eq!(
            Command::parse(" /up #5 "),
            Command::Rate(FeedbackKind::Positive, Some(5))
        );
        assert_eq!(Command::parse("/up x"), Command::Unknown("/up x".into()));
    }

    #[test]
    fn test_parse_control() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/nope"), Command::Unknown("/nope".into()));
    }
}
