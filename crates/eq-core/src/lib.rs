//! Core contracts and stream-assembly logic for the EdgeQuery console.
//!
//! The assistant streams its answer as text fragments carrying literal
//! delimiter tags. This crate owns everything needed to turn that stream
//! back into a structured answer: the wire frame vocabulary, the chunk
//! accumulator, the section extractor, the reveal scheduler, and the
//! transcript reducer. Nothing in here touches a terminal or a socket.

pub mod assembly;
pub mod reveal;
pub mod sections;
pub mod transcript;
pub mod wire;

pub use assembly::{append_chunk, collapse_repeated_words};
pub use reveal::{RevealScheduler, RevealState};
pub use sections::{extract_sections, is_structured, Section, SectionFlags, StructuredContent};
pub use transcript::{FrameOutcome, Message, MessageKind, Sender, Transcript};
pub use wire::{
    decode_frame, decode_inbound, ChatRole, ChatTurn, GenerationMetrics, Inbound, OverallMetrics,
    QueryRequest, ServerFrame, SessionMetrics, SqlOutcome, WireError,
};
