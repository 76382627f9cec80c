//! Orchestrator event types

use quill_api::RequestKind;
use serde::{Deserialize, Serialize};

use crate::{error::ErrorKind, orchestrator::ModeKind, transcript::Turn};

/// Events emitted while the orchestrator handles submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// A request was admitted and is about to be sent
    RequestStart { kind: RequestKind },

    /// A turn was added to the transcript
    TurnAppended { turn: Turn },

    /// The conversation mode changed
    ModeChanged { from: ModeKind, to: ModeKind },

    /// The exchange failed; an error turn has been recorded
    Error { kind: ErrorKind, message: String },

    /// The request is over: answered, failed or aborted. Always the last
    /// event of a request.
    RequestEnd { kind: RequestKind },

    /// The in-flight request was aborted; `RequestEnd` follows
    Cancelled,

    /// The export collaborator reported back
    ExportRecorded {
        link: Option<String>,
        error: Option<String>,
    },
}

impl OrchestratorEvent {
    /// Check if this event closes a request
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorEvent::RequestEnd { .. })
    }
}
