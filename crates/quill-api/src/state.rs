//! Opaque server-held conversation state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the only field the client ever writes.
const HUMAN_FEEDBACK: &str = "human_feedback";

/// Continuation token issued by the backend with an interrupt.
///
/// The client treats this as an opaque JSON object: it is stored as received
/// and sent back verbatim on resume, except that the user's feedback is
/// appended to `human_feedback` (see [`ConversationState::with_feedback`]).
/// Fields such as `user_query`, `candidate`, `examples`, `messages`,
/// `runtime_limit`, `iteration` and `structure` belong to the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationState(Map<String, Value>);

impl ConversationState {
    /// Return a copy with `feedback` appended to `human_feedback`.
    ///
    /// An absent or `null` list becomes a one-element array. A scalar value is
    /// kept as the first element of the new array.
    pub fn with_feedback(&self, feedback: impl Into<String>) -> Self {
        let mut map = self.0.clone();
        let entry = map.entry(HUMAN_FEEDBACK).or_insert(Value::Null);
        if !entry.is_array() {
            *entry = match entry.take() {
                Value::Null => Value::Array(Vec::new()),
                previous => Value::Array(vec![previous]),
            };
        }
        if let Value::Array(list) = entry {
            list.push(Value::String(feedback.into()));
        }
        Self(map)
    }

    /// Feedback strings accumulated so far (non-string entries are skipped)
    pub fn human_feedback(&self) -> Vec<&str> {
        match self.0.get(HUMAN_FEEDBACK) {
            Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Borrow the raw object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> ConversationState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_with_feedback_appends_exactly_one() {
        let s = state(json!({
            "user_query": "Draft a proposal for X",
            "human_feedback": ["too vague"],
            "iteration": 2
        }));
        let next = s.with_feedback("needs cost breakdown");
        assert_eq!(next.human_feedback(), vec!["too vague", "needs cost breakdown"]);
        // everything else untouched
        assert_eq!(next.as_map()["user_query"], json!("Draft a proposal for X"));
        assert_eq!(next.as_map()["iteration"], json!(2));
    }

    #[test]
    fn test_with_feedback_leaves_original_untouched() {
        let s = state(json!({"human_feedback": []}));
        let _ = s.with_feedback("approve");
        assert!(s.human_feedback().is_empty());
    }

    #[test]
    fn test_with_feedback_creates_missing_list() {
        let s = state(json!({"iteration": 0}));
        assert_eq!(s.with_feedback("approve").human_feedback(), vec!["approve"]);

        let s = state(json!({"human_feedback": null}));
        assert_eq!(s.with_feedback("approve").human_feedback(), vec!["approve"]);
    }

    #[test]
    fn test_with_feedback_wraps_scalar() {
        let s = state(json!({"human_feedback": "earlier"}));
        assert_eq!(
            s.with_feedback("later").human_feedback(),
            vec!["earlier", "later"]
        );
    }

    #[test]
    fn test_roundtrip_is_transparent() {
        let raw = json!({
            "candidate": {"content": "Draft v1"},
            "examples": [],
            "messages": [],
            "runtime_limit": 3,
            "structure": null
        });
        let s = state(raw.clone());
        assert_eq!(serde_json::to_value(&s).unwrap(), raw);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(serde_json::from_value::<ConversationState>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<ConversationState>(json!("state")).is_err());
    }
}
