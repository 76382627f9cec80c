//! quill-agent: conversation orchestration for a proposal-drafting agent
//!
//! This crate turns free-form user input into query / resume exchanges with a
//! backend that can answer directly, interrupt to ask for feedback on a draft,
//! and finally approve it. It owns the transcript and the continuation state
//! and recovers from failed exchanges without losing either.

pub mod error;
pub mod events;
pub mod export;
pub mod handle;
pub mod orchestrator;
pub mod session;
pub mod suggest;
pub mod transcript;
pub mod transport;

#[cfg(test)]
mod proptests;

pub use error::{Error, ErrorKind, ErrorReport};
pub use events::OrchestratorEvent;
pub use export::{ApprovedProposal, ExportSink, ExportStatus};
pub use handle::OrchestratorHandle;
pub use orchestrator::{Mode, ModeKind, Orchestrator, OrchestratorConfig, SubmitOutcome};
pub use session::{Credentials, MemorySession, SessionContext};
pub use suggest::filter_suggestions;
pub use transcript::{Role, TranscriptStore, Turn};
pub use transport::{HttpTransport, Request, Transport};
