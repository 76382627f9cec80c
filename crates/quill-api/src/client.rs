//! HTTP client for the proposal backend

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{Error, Result},
    types::{
        PromptSuggestionsReply, PromptSuggestionsRequest, QueryRequest, RawReply, ResumeRequest,
        SaveReply, SaveRequest,
    },
};

/// Environment variable naming the backend base URL
pub const API_URL_ENV: &str = "QUILL_API_URL";

/// Default per-request timeout applied by the HTTP client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const RETRIEVE_PATH: &str = "/api/retrieve";
const RESUME_PATH: &str = "/api/resume";
const SAVE_PATH: &str = "/api/save-to-drive";
const SUGGESTIONS_PATH: &str = "/api/prompt-suggestions";

/// Backend API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidConfig("backend URL is empty".into()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "backend URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a new conversation
    pub async fn query(&self, request: &QueryRequest, auth: Option<&str>) -> Result<RawReply> {
        self.post_json(RETRIEVE_PATH, request, auth).await
    }

    /// Resume an interrupted conversation with feedback
    pub async fn resume(&self, request: &ResumeRequest, auth: Option<&str>) -> Result<RawReply> {
        self.post_json(RESUME_PATH, request, auth).await
    }

    /// Hand an approved proposal to the export endpoint
    pub async fn save_proposal(
        &self,
        request: &SaveRequest,
        auth: Option<&str>,
    ) -> Result<SaveReply> {
        self.post_json(SAVE_PATH, request, auth).await
    }

    /// Fetch example prompts the backend derived from an RFQ
    pub async fn prompt_suggestions(
        &self,
        rfq_id: Option<&str>,
        auth: Option<&str>,
    ) -> Result<Vec<String>> {
        let request = PromptSuggestionsRequest {
            rfq_id: rfq_id.map(str::to_string),
        };
        let reply: PromptSuggestionsReply =
            self.post_json(SUGGESTIONS_PATH, &request, auth).await?;
        Ok(reply.prompts)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, auth: Option<&str>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = auth {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!("{} returned {}: {}", path, status, text);
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_body(&text)
    }
}

/// Parse a success body, distinguishing "nothing" from "garbage".
pub fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(Error::EmptyResponse);
    }
    Ok(serde_json::from_str(trimmed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMode, QueryContext};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query_request() -> QueryRequest {
        let ctx = QueryContext {
            rfq_id: Some("rfq-9".into()),
            mode: ChatMode::Hybrid,
        };
        QueryRequest::new("Draft a proposal for X", &ctx, Some("u-1".into()))
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            BackendClient::new(""),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            BackendClient::new("api.example.com"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = BackendClient::new("https://api.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_parse_body_empty_and_null() {
        assert!(matches!(
            parse_body::<RawReply>("   "),
            Err(Error::EmptyResponse)
        ));
        assert!(matches!(
            parse_body::<RawReply>("null"),
            Err(Error::EmptyResponse)
        ));
        assert!(matches!(
            parse_body::<RawReply>("<html>"),
            Err(Error::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_query_posts_context_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/retrieve"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(json!({
                "user_query": "Draft a proposal for X",
                "rfq_id": "rfq-9",
                "mode": "hybrid",
                "user_id": "u-1"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "Here is a draft..."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let reply = client
            .query(&query_request(), Some("tok-123"))
            .await
            .unwrap();
        assert_eq!(reply.response.as_deref(), Some("Here is a draft..."));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/retrieve"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "An error occurred"})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let err = client.query(&query_request(), None).await.unwrap_err();
        match err {
            Error::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("An error occurred"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/retrieve"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Internal oops"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let err = client.query(&query_request(), None).await.unwrap_err();
        assert!(err.is_protocol(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_resume_sends_state_with_feedback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/resume"))
            .and(body_partial_json(json!({
                "feedback": "Too vague",
                "state": {"human_feedback": ["Too vague"], "iteration": 1}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "interrupt": true,
                "proposal": "Draft v2",
                "state": {"human_feedback": ["Too vague"], "iteration": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let held = serde_json::from_value(json!({"human_feedback": [], "iteration": 1})).unwrap();
        let client = BackendClient::new(server.uri()).unwrap();
        let reply = client
            .resume(&ResumeRequest::new(&held, "Too vague"), None)
            .await
            .unwrap();
        assert_eq!(reply.proposal.as_deref(), Some("Draft v2"));
        assert_eq!(reply.interrupt, Some(true));
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/resume"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let held = serde_json::from_value(json!({})).unwrap();
        let client = BackendClient::new(server.uri()).unwrap();
        let err = client
            .resume(&ResumeRequest::new(&held, "Approve"), Some("stale"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_save_and_suggestions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/save-to-drive"))
            .and(body_partial_json(json!({"is_winning": true, "proposal": "Final"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Upload successful",
                "view_link": "https://docs.example.com/d/1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/prompt-suggestions"))
            .and(body_json(json!({"rfq_id": "rfq-9"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "prompts": ["Draft a borehole plan", "Write a bid"]
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let save = SaveRequest {
            state: serde_json::from_value(json!({"iteration": 3})).unwrap(),
            proposal: "Final".into(),
            refresh_token: None,
            rfq_id: Some("rfq-9".into()),
            is_winning: true,
        };
        let reply = client.save_proposal(&save, None).await.unwrap();
        assert_eq!(reply.view_link.as_deref(), Some("https://docs.example.com/d/1"));

        let prompts = client
            .prompt_suggestions(Some("rfq-9"), None)
            .await
            .unwrap();
        assert_eq!(prompts, vec!["Draft a borehole plan", "Write a bid"]);
    }
}
