//! Classification of raw backend replies into a closed set of outcomes

use crate::{
    error::{Error, Result},
    state::ConversationState,
    types::{RawReply, RequestKind},
};

/// `status` value the backend uses to signal the draft was accepted
pub const STATUS_APPROVED: &str = "approved";

/// A backend reply after classification
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Plain answer, no feedback loop
    Answer { text: String },
    /// Draft awaiting human feedback
    Interrupt {
        content: String,
        feedback_options: Vec<String>,
        state: ConversationState,
    },
    /// Draft accepted; the backend may or may not echo the final state
    Approved { state: Option<ConversationState> },
    /// Backend reported a failure in the body
    ServerError { message: String },
}

impl Reply {
    /// Classify a reply according to the exchange it answers
    pub fn classify(kind: RequestKind, raw: RawReply) -> Result<Self> {
        match kind {
            RequestKind::Query => classify_query(raw),
            RequestKind::Resume => classify_resume(raw),
        }
    }
}

/// Treat empty strings like missing fields.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

fn classify_query(raw: RawReply) -> Result<Reply> {
    if let Some(message) = present(raw.error) {
        return Ok(Reply::ServerError { message });
    }

    if raw.interrupt == Some(true) {
        let content = present(raw.proposal)
            .or_else(|| present(raw.message))
            .ok_or_else(|| Error::malformed("Missing content in server response"))?;
        let state = raw
            .state
            .ok_or_else(|| Error::malformed("Missing state in interrupt response"))?;
        return Ok(Reply::Interrupt {
            content,
            feedback_options: raw.feedback_options.unwrap_or_default(),
            state,
        });
    }

    match present(raw.response) {
        Some(text) => Ok(Reply::Answer { text }),
        None => Err(Error::malformed("Missing response field in server data")),
    }
}

fn classify_resume(raw: RawReply) -> Result<Reply> {
    if let Some(message) = present(raw.error) {
        return Ok(Reply::ServerError { message });
    }

    if raw.interrupt == Some(true) {
        if let Some(content) = present(raw.proposal.clone()) {
            let state = raw
                .state
                .ok_or_else(|| Error::malformed("Missing state in interrupt response"))?;
            return Ok(Reply::Interrupt {
                content,
                feedback_options: raw.feedback_options.unwrap_or_default(),
                state,
            });
        }
    }

    if raw.status.as_deref() == Some(STATUS_APPROVED) {
        return Ok(Reply::Approved { state: raw.state });
    }

    match present(raw.response) {
        Some(text) => Ok(Reply::Answer { text }),
        None => Err(Error::malformed("Missing response field in server data")),
    }
}
