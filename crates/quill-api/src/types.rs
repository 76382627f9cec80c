//! Request and response shapes exchanged with the backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::state::ConversationState;

/// Retrieval sub-mode the backend runs the draft graph in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Local,
    Hybrid,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Local => "local",
            ChatMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ChatMode::Local),
            "hybrid" => Ok(ChatMode::Hybrid),
            other => Err(crate::Error::InvalidConfig(format!(
                "unknown chat mode '{}' (expected local or hybrid)",
                other
            ))),
        }
    }
}

/// Which of the two exchanges a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// New conversation, no continuation token attached
    Query,
    /// Feedback on an interrupted draft, continuation token attached
    Resume,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Query => "query",
            RequestKind::Resume => "resume",
        }
    }
}

/// Context the surrounding application attaches to every fresh query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Target RFQ the proposal answers
    pub rfq_id: Option<String>,
    /// Retrieval sub-mode
    pub mode: ChatMode,
}

/// Body of `POST /api/retrieve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub user_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfq_id: Option<String>,
    pub mode: ChatMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl QueryRequest {
    pub fn new(
        user_query: impl Into<String>,
        context: &QueryContext,
        user_id: Option<String>,
    ) -> Self {
        Self {
            user_query: user_query.into(),
            rfq_id: context.rfq_id.clone(),
            mode: context.mode,
            user_id,
        }
    }
}

/// Body of `POST /api/resume`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRequest {
    /// Held state with `feedback` already appended to `human_feedback`
    pub state: ConversationState,
    pub feedback: String,
}

impl ResumeRequest {
    /// Build a resume request from the held state and the user's feedback
    pub fn new(held: &ConversationState, feedback: impl Into<String>) -> Self {
        let feedback = feedback.into();
        Self {
            state: held.with_feedback(feedback.clone()),
            feedback,
        }
    }
}

/// Reply body as sent by the backend, before classification.
///
/// The backend signals its intent purely through which fields are present,
/// so everything is optional here. See [`crate::reply`] for interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawReply {
    pub interrupt: Option<bool>,
    pub proposal: Option<String>,
    pub message: Option<String>,
    pub feedback_options: Option<Vec<String>>,
    pub response: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub state: Option<ConversationState>,
}

/// Body of `POST /api/save-to-drive`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub state: ConversationState,
    pub proposal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfq_id: Option<String>,
    pub is_winning: bool,
}

/// Reply of `POST /api/save-to-drive`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveReply {
    pub view_link: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Body of `POST /api/prompt-suggestions`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSuggestionsRequest {
    pub rfq_id: Option<String>,
}

/// Reply of `POST /api/prompt-suggestions`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSuggestionsReply {
    pub prompts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_mode_parse() {
        assert_eq!("local".parse::<ChatMode>().unwrap(), ChatMode::Local);
        assert_eq!(" Hybrid ".parse::<ChatMode>().unwrap(), ChatMode::Hybrid);
        assert!("global".parse::<ChatMode>().is_err());
    }

    #[test]
    fn test_query_request_omits_absent_context() {
        let req = QueryRequest::new("Draft a proposal", &QueryContext::default(), None);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"user_query": "Draft a proposal", "mode": "local"})
        );
    }

    #[test]
    fn test_query_request_carries_context() {
        let ctx = QueryContext {
            rfq_id: Some("rfq-17".into()),
            mode: ChatMode::Hybrid,
        };
        let req = QueryRequest::new("Draft", &ctx, Some("ana@example.com".into()));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "user_query": "Draft",
                "rfq_id": "rfq-17",
                "mode": "hybrid",
                "user_id": "ana@example.com"
            })
        );
    }

    #[test]
    fn test_resume_request_appends_feedback() {
        let held: ConversationState =
            serde_json::from_value(json!({"iteration": 1, "human_feedback": []})).unwrap();
        let req = ResumeRequest::new(&held, "Too vague");
        assert_eq!(req.feedback, "Too vague");
        assert_eq!(req.state.human_feedback(), vec!["Too vague"]);
        assert!(held.human_feedback().is_empty());
    }

    #[test]
    fn test_raw_reply_ignores_unknown_fields() {
        let raw: RawReply = serde_json::from_value(json!({
            "response": "hi",
            "traceback": "..."
        }))
        .unwrap();
        assert_eq!(raw.response.as_deref(), Some("hi"));
        assert!(raw.interrupt.is_none());
    }
}
