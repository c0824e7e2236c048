//! The message transcript and its single frame reducer.
//!
//! All mutation of transcript state happens inside [`Transcript::apply`],
//! invoked once per inbound frame. At most one message is streaming at
//! any time, and it is always the most recently appended assistant
//! message; every other accessor is read-only.

use crate::assembly::{append_chunk, collapse_repeated_words};
use crate::wire::{GenerationMetrics, Inbound, ServerFrame, SqlOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Substring of the server's warning text that marks it as a SQL
/// detection warning worth keeping in the transcript, not just in the
/// status line.
const SQL_WARNING_PATTERN: &str = "SQL query detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Plain,
    SqlResult {
        query: String,
        result: SqlOutcome,
    },
    SqlWarning,
    GenerationMetrics {
        metrics: GenerationMetrics,
    },
}

/// One chat turn. `content` is owned exclusively by the message and is
/// only mutated while `is_streaming` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_streaming: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            kind: MessageKind::Plain,
            content,
            is_streaming: false,
            timestamp: Utc::now(),
        }
    }
}

/// What a frame did to the transcript, for the caller to react to
/// (status line, reveal scheduling, persistence).
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Frame consumed with no observable effect.
    Ignored,
    /// Connection/status text to surface.
    Status(String),
    /// Error text to surface; non-fatal to the stream.
    ErrorStatus(String),
    /// The streaming message identified here was created or extended.
    StreamUpdated(Uuid),
    /// The streaming message identified here was cleaned and frozen.
    Finalized(Uuid),
    /// A non-streaming message was appended.
    MessageAdded(Uuid),
}

/// Ordered sequence of messages for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a transcript from persisted messages. Anything that was
    /// mid-stream when saved is frozen; a restored message can never
    /// resume streaming.
    pub fn restore(mut messages: Vec<Message>) -> Self {
        for message in &mut messages {
            message.is_streaming = false;
        }
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.is_streaming)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> Uuid {
        let message = Message::new(Sender::User, content.into());
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Applies one decoded inbound payload. This is the only mutation
    /// path for server-driven state.
    pub fn apply(&mut self, inbound: Inbound) -> FrameOutcome {
        match inbound {
            Inbound::Frame(frame) => self.apply_frame(frame),
            Inbound::Legacy(content) => {
                let message = Message::new(Sender::Assistant, content);
                let id = message.id;
                self.messages.push(message);
                FrameOutcome::MessageAdded(id)
            }
        }
    }

    fn apply_frame(&mut self, frame: ServerFrame) -> FrameOutcome {
        match frame {
            ServerFrame::Status { content } => FrameOutcome::Status(content),
            ServerFrame::Warning { content } => {
                if content.contains(SQL_WARNING_PATTERN) {
                    let mut message = Message::new(Sender::System, content.clone());
                    message.kind = MessageKind::SqlWarning;
                    self.messages.push(message);
                }
                FrameOutcome::Status(content)
            }
            ServerFrame::Chunk { content } => self.apply_chunk(content),
            ServerFrame::Complete { .. } => self.finalize_streaming(),
            ServerFrame::SqlResult { query, result } => {
                let mut message = Message::new(Sender::System, String::new());
                message.kind = MessageKind::SqlResult { query, result };
                let id = message.id;
                self.messages.push(message);
                FrameOutcome::MessageAdded(id)
            }
            ServerFrame::GenerationMetrics { metrics } => {
                let mut message = Message::new(Sender::System, String::new());
                message.kind = MessageKind::GenerationMetrics { metrics };
                let id = message.id;
                self.messages.push(message);
                FrameOutcome::MessageAdded(id)
            }
            ServerFrame::Error { content } => FrameOutcome::ErrorStatus(content),
            ServerFrame::SqlError { query, error } => {
                let mut message =
                    Message::new(Sender::System, format!("SQL execution failed: {error}"));
                message.kind = MessageKind::SqlWarning;
                self.messages.push(message);
                FrameOutcome::ErrorStatus(format!("SQL error for `{query}`: {error}"))
            }
            // Explicitly suppressed.
            ServerFrame::Hold { .. } | ServerFrame::ReleaseHold { .. } => FrameOutcome::Ignored,
        }
    }

    fn apply_chunk(&mut self, content: String) -> FrameOutcome {
        if let Some(open) = self.messages.last_mut().filter(|m| m.is_streaming) {
            open.content = append_chunk(&open.content, &content);
            return FrameOutcome::StreamUpdated(open.id);
        }
        let mut message = Message::new(Sender::Assistant, content);
        message.is_streaming = true;
        let id = message.id;
        self.messages.push(message);
        FrameOutcome::StreamUpdated(id)
    }

    fn finalize_streaming(&mut self) -> FrameOutcome {
        match self.messages.last_mut().filter(|m| m.is_streaming) {
            Some(open) => {
                open.content = collapse_repeated_words(&open.content);
                open.is_streaming = false;
                FrameOutcome::Finalized(open.id)
            }
            // A complete frame with no open stream (e.g. after reconnect)
            // has nothing to freeze.
            None => FrameOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> Inbound {
        Inbound::Frame(ServerFrame::Chunk { content: content.into() })
    }

    #[test]
    fn chunk_opens_a_streaming_assistant_message() {
        let mut transcript = Transcript::new();
        let outcome = transcript.apply(chunk("<reasoning_start>"));
        let open = transcript.streaming_message().expect("open stream");
        assert_eq!(outcome, FrameOutcome::StreamUpdated(open.id));
        assert_eq!(open.sender, Sender::Assistant);
        assert_eq!(open.content, "<reasoning_start>");
    }

    #[test]
    fn chunks_accumulate_into_the_same_message() {
        let mut transcript = Transcript::new();
        transcript.apply(chunk("SELECT "));
        transcript.apply(chunk("id FROM t"));
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.streaming_message().unwrap().content, "SELECT id FROM t");
    }

    #[test]
    fn at_most_one_streaming_message_exists() {
        let mut transcript = Transcript::new();
        transcript.apply(chunk("first "));
        transcript.apply(Inbound::Frame(ServerFrame::Complete { content: None }));
        transcript.apply(chunk("second"));
        let streaming: Vec<_> =
            transcript.messages().iter().filter(|m| m.is_streaming).collect();
        assert_eq!(streaming.len(), 1);
        assert!(transcript.messages().last().unwrap().is_streaming);
    }

    #[test]
    fn complete_dedups_and_freezes_the_open_message() {
        let mut transcript = Transcript::new();
        transcript.apply(chunk("the the cat"));
        let outcome = transcript.apply(Inbound::Frame(ServerFrame::Complete { content: None }));
        let last = transcript.messages().last().unwrap();
        assert_eq!(outcome, FrameOutcome::Finalized(last.id));
        assert!(!last.is_streaming);
        assert_eq!(last.content, "the  cat");
    }

    #[test]
    fn complete_without_open_stream_is_ignored() {
        let mut transcript = Transcript::new();
        let outcome = transcript.apply(Inbound::Frame(ServerFrame::Complete { content: None }));
        assert_eq!(outcome, FrameOutcome::Ignored);
        assert!(transcript.is_empty());
    }

    #[test]
    fn user_message_does_not_absorb_chunks() {
        let mut transcript = Transcript::new();
        transcript.push_user("total volume?");
        transcript.apply(chunk("answer"));
        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.messages()[0].sender, Sender::User);
        assert!(!transcript.messages()[0].is_streaming);
    }

    #[test]
    fn sql_detection_warning_is_recorded_as_message() {
        let mut transcript = Transcript::new();
        let text = "SQL query detected but database connection is not available";
        let outcome = transcript.apply(Inbound::Frame(ServerFrame::Warning { content: text.into() }));
        assert_eq!(outcome, FrameOutcome::Status(text.to_string()));
        let last = transcript.messages().last().unwrap();
        assert_eq!(last.kind, MessageKind::SqlWarning);
        assert_eq!(last.sender, Sender::System);
    }

    #[test]
    fn plain_warning_only_touches_status() {
        let mut transcript = Transcript::new();
        let outcome =
            transcript.apply(Inbound::Frame(ServerFrame::Warning { content: "slow model".into() }));
        assert_eq!(outcome, FrameOutcome::Status("slow model".into()));
        assert!(transcript.is_empty());
    }

    #[test]
    fn sql_result_is_stored_as_system_message() {
        let mut transcript = Transcript::new();
        let outcome = transcript.apply(Inbound::Frame(ServerFrame::SqlResult {
            query: "SELECT 1".into(),
            result: SqlOutcome { success: true, row_count: Some(1), ..SqlOutcome::default() },
        }));
        let last = transcript.messages().last().unwrap();
        assert_eq!(outcome, FrameOutcome::MessageAdded(last.id));
        assert!(matches!(last.kind, MessageKind::SqlResult { .. }));
    }

    #[test]
    fn hold_frames_have_no_observable_effect() {
        let mut transcript = Transcript::new();
        transcript.apply(chunk("mid-stream"));
        let before = transcript.messages().to_vec();
        assert_eq!(
            transcript.apply(Inbound::Frame(ServerFrame::Hold { content: Some("wait".into()) })),
            FrameOutcome::Ignored
        );
        assert_eq!(
            transcript.apply(Inbound::Frame(ServerFrame::ReleaseHold { content: None })),
            FrameOutcome::Ignored
        );
        assert_eq!(transcript.messages(), &before[..]);
    }

    #[test]
    fn legacy_payload_becomes_plain_assistant_message() {
        let mut transcript = Transcript::new();
        transcript.apply(Inbound::Legacy("old style answer".into()));
        let last = transcript.messages().last().unwrap();
        assert_eq!(last.sender, Sender::Assistant);
        assert_eq!(last.kind, MessageKind::Plain);
        assert!(!last.is_streaming);
    }

    #[test]
    fn restore_freezes_any_saved_stream() {
        let mut transcript = Transcript::new();
        transcript.apply(chunk("interrupted"));
        let saved = transcript.messages().to_vec();
        let restored = Transcript::restore(saved);
        assert!(restored.streaming_message().is_none());
        assert_eq!(restored.messages().len(), 1);
    }

    #[test]
    fn duplicate_chunk_is_suppressed_silently() {
        let mut transcript = Transcript::new();
        transcript.apply(chunk("SELECT * FROM t;SELECT * FROM t;"));
        transcript.apply(chunk("SELECT * FROM t;"));
        assert_eq!(
            transcript.streaming_message().unwrap().content,
            "SELECT * FROM t;SELECT * FROM t;"
        );
    }
}
