//! Transport abstraction for talking to the backend agent

use std::sync::Arc;

use async_trait::async_trait;
use quill_api::{
    BackendClient, QueryRequest, RawReply, RequestKind, ResumeRequest, Result, SaveRequest,
};

use crate::{
    error::Error,
    export::{ApprovedProposal, ExportSink},
    session::SessionContext,
};

/// An outgoing request, derived from the mode at submission time
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Query(QueryRequest),
    Resume(ResumeRequest),
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Query(_) => RequestKind::Query,
            Request::Resume(_) => RequestKind::Resume,
        }
    }

    /// State sent with a resume, feedback already appended
    pub fn sent_state(&self) -> Option<&quill_api::ConversationState> {
        match self {
            Request::Query(_) => None,
            Request::Resume(r) => Some(&r.state),
        }
    }

    /// Dispatch to the matching transport call
    pub async fn send(&self, transport: &dyn Transport, auth: Option<&str>) -> Result<RawReply> {
        match self {
            Request::Query(r) => transport.query(r, auth).await,
            Request::Resume(r) => transport.resume(r, auth).await,
        }
    }
}

/// The two exchanges the orchestrator performs against the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a new conversation
    async fn query(&self, request: &QueryRequest, auth: Option<&str>) -> Result<RawReply>;

    /// Resume an interrupted conversation
    async fn resume(&self, request: &ResumeRequest, auth: Option<&str>) -> Result<RawReply>;
}

/// HTTP transport backed by [`BackendClient`]
pub struct HttpTransport {
    client: BackendClient,
    session: Arc<dyn SessionContext>,
    rfq_id: Option<String>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(client: BackendClient, session: Arc<dyn SessionContext>) -> Self {
        Self {
            client,
            session,
            rfq_id: None,
        }
    }

    /// RFQ attached to exports and remote suggestions
    pub fn with_rfq(mut self, rfq_id: Option<String>) -> Self {
        self.rfq_id = rfq_id;
        self
    }

    /// Example prompts the backend derives from the configured RFQ
    pub async fn prompt_suggestions(&self) -> Result<Vec<String>> {
        let token = self.session.access_token();
        self.client
            .prompt_suggestions(self.rfq_id.as_deref(), token.as_deref())
            .await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(&self, request: &QueryRequest, auth: Option<&str>) -> Result<RawReply> {
        self.client.query(request, auth).await
    }

    async fn resume(&self, request: &ResumeRequest, auth: Option<&str>) -> Result<RawReply> {
        self.client.resume(request, auth).await
    }
}

#[async_trait]
impl ExportSink for HttpTransport {
    async fn save(
        &self,
        approved: &ApprovedProposal,
        is_winning: bool,
    ) -> crate::error::Result<String> {
        let request = SaveRequest {
            state: approved.state.clone(),
            proposal: approved.proposal.clone(),
            refresh_token: self.session.refresh_token(),
            rfq_id: self.rfq_id.clone(),
            is_winning,
        };
        let token = self.session.access_token();
        let reply = self.client.save_proposal(&request, token.as_deref()).await?;

        if let Some(message) = reply.error.filter(|e| !e.is_empty()) {
            return Err(Error::ServerReported(message));
        }
        match reply.view_link.filter(|l| !l.is_empty()) {
            Some(link) => {
                tracing::debug!("Proposal saved: {}", link);
                Ok(link)
            }
            None => Err(quill_api::Error::malformed("Missing view link in save response").into()),
        }
    }
}
