//! Hand-off of an approved proposal to an external save operation

use async_trait::async_trait;
use quill_api::ConversationState;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the orchestrator exposes once a draft has been approved
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedProposal {
    pub state: ConversationState,
    pub proposal: String,
}

/// External collaborator that persists an approved proposal.
///
/// Returns a link to the saved document on success.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn save(&self, approved: &ApprovedProposal, is_winning: bool) -> Result<String>;
}

/// Outcome of the most recent export, as reported by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ExportStatus {
    Linked(String),
    Failed(String),
}

impl ExportStatus {
    pub fn link(&self) -> Option<&str> {
        match self {
            ExportStatus::Linked(link) => Some(link),
            ExportStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExportStatus::Linked(_) => None,
            ExportStatus::Failed(message) => Some(message),
        }
    }
}
