//! Conversation state machine

use parking_lot::{Mutex, RwLock};
use quill_api::{ConversationState, QueryContext, QueryRequest, Reply, RequestKind, ResumeRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::{
    error::{Error, ErrorReport, Result},
    events::OrchestratorEvent,
    export::{ApprovedProposal, ExportSink, ExportStatus},
    handle::OrchestratorHandle,
    session::SessionContext,
    transcript::{TranscriptStore, Turn},
    transport::{Request, Transport},
};

/// Assistant turn recorded when the backend approves the draft
pub const APPROVAL_MESSAGE: &str = "✅ Proposal approved. Process complete.";

/// Default time allowed for one exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// RFQ and sub-mode attached to fresh queries
    pub context: QueryContext,
    /// Upper bound on one exchange, surfaced as a network error
    pub request_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            context: QueryContext::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Where the conversation stands. Continuation state lives inside the
/// variants that need it, so it exists exactly when the mode allows it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    /// Plain query/response
    #[default]
    Idle,
    /// A draft awaits feedback; the next input resumes
    Interrupted {
        state: ConversationState,
        feedback_options: Vec<String>,
        proposal: String,
    },
    /// Draft accepted; state kept for export
    Approved {
        state: ConversationState,
        proposal: String,
    },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Idle => ModeKind::Idle,
            Mode::Interrupted { .. } => ModeKind::Interrupted,
            Mode::Approved { .. } => ModeKind::Approved,
        }
    }

    pub fn state(&self) -> Option<&ConversationState> {
        match self {
            Mode::Idle => None,
            Mode::Interrupted { state, .. } | Mode::Approved { state, .. } => Some(state),
        }
    }

    pub fn feedback_options(&self) -> &[String] {
        match self {
            Mode::Interrupted {
                feedback_options, ..
            } => feedback_options,
            _ => &[],
        }
    }

    /// Most recent draft text, if a feedback loop has produced one
    pub fn latest_proposal(&self) -> Option<&str> {
        match self {
            Mode::Idle => None,
            Mode::Interrupted { proposal, .. } | Mode::Approved { proposal, .. } => Some(proposal),
        }
    }
}

/// Fieldless projection of [`Mode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Idle,
    Interrupted,
    Approved,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Idle => "idle",
            ModeKind::Interrupted => "interrupted",
            ModeKind::Approved => "approved",
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input; nothing appended, nothing sent
    Ignored,
    /// Another request was in flight; nothing appended, nothing sent
    Rejected,
    /// Aborted before a reply was accepted; only the user turn was recorded
    Cancelled,
    /// Reply accepted
    Completed { kind: RequestKind, mode: ModeKind },
    /// Exchange failed; an error turn was recorded
    Failed {
        kind: RequestKind,
        error: ErrorReport,
    },
}

/// Clears the busy flag and pending input on every exit path of a request.
struct BusyGuard<'a> {
    orchestrator: &'a Orchestrator,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator.input.lock().clear();
        self.orchestrator.transcript.set_busy(false);
        self.orchestrator.handle.idle_notify.notify_waiters();
    }
}

/// Drives the query / interrupt / resume / approve protocol
pub struct Orchestrator {
    config: OrchestratorConfig,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionContext>,
    transcript: Arc<TranscriptStore>,
    mode: RwLock<Mode>,
    input: Mutex<String>,
    last_error: Mutex<Option<ErrorReport>>,
    last_export: Mutex<Option<ExportStatus>>,
    event_tx: broadcast::Sender<OrchestratorEvent>,
    handle: OrchestratorHandle,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        config: OrchestratorConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionContext>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let transcript = Arc::new(TranscriptStore::new());
        Self {
            config,
            transport,
            session,
            handle: OrchestratorHandle::new(Arc::clone(&transcript)),
            transcript,
            mode: RwLock::new(Mode::Idle),
            input: Mutex::new(String::new()),
            last_error: Mutex::new(None),
            last_export: Mutex::new(None),
            event_tx,
        }
    }

    /// Subscribe to orchestrator events
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for aborting or awaiting requests
    pub fn handle(&self) -> OrchestratorHandle {
        self.handle.clone()
    }

    /// Shared transcript store
    pub fn transcript(&self) -> Arc<TranscriptStore> {
        Arc::clone(&self.transcript)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Current ordered turns
    pub fn snapshot(&self) -> Vec<Turn> {
        self.transcript.snapshot()
    }

    pub fn is_busy(&self) -> bool {
        self.transcript.is_busy()
    }

    pub fn mode(&self) -> Mode {
        self.mode.read().clone()
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.read().kind()
    }

    /// Held continuation state
    pub fn state(&self) -> Option<ConversationState> {
        self.mode.read().state().cloned()
    }

    pub fn feedback_options(&self) -> Vec<String> {
        self.mode.read().feedback_options().to_vec()
    }

    pub fn latest_proposal(&self) -> Option<String> {
        self.mode.read().latest_proposal().map(str::to_string)
    }

    /// Pending input buffer
    pub fn input(&self) -> String {
        self.input.lock().clone()
    }

    /// Replace the pending input. Editing dismisses the last error.
    pub fn set_input(&self, text: impl Into<String>) {
        *self.input.lock() = text.into();
        self.dismiss_error();
    }

    pub fn last_error(&self) -> Option<ErrorReport> {
        self.last_error.lock().clone()
    }

    pub fn dismiss_error(&self) {
        self.last_error.lock().take();
    }

    /// Submit the pending input buffer
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.input();
        self.submit(&text).await
    }

    /// Submit user text.
    ///
    /// The request kind follows from the mode: an interrupted conversation is
    /// resumed with `text` as feedback, anything else starts a fresh query.
    /// Failures are recorded as assistant turns and never returned as `Err`.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(cancel) = self.handle.begin() else {
            tracing::debug!("Submission rejected: request already in flight");
            return SubmitOutcome::Rejected;
        };
        let _guard = BusyGuard { orchestrator: self };
        self.dismiss_error();

        let request = self.build_request(text);
        let kind = request.kind();
        tracing::debug!("Sending {} request", kind.as_str());
        let _ = self.event_tx.send(OrchestratorEvent::RequestStart { kind });
        self.append(Turn::user(text));

        let auth = self.session.access_token();
        let timeout = self.config.request_timeout;
        let exchange = async {
            let raw = tokio::time::timeout(
                timeout,
                request.send(self.transport.as_ref(), auth.as_deref()),
            )
            .await
            .map_err(|_| Error::Timeout(timeout))??;
            Ok::<_, Error>(Reply::classify(kind, raw)?)
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} request cancelled", kind.as_str());
                let _ = self.event_tx.send(OrchestratorEvent::Cancelled);
                let _ = self.event_tx.send(OrchestratorEvent::RequestEnd { kind });
                return SubmitOutcome::Cancelled;
            }
            result = exchange => result,
        };

        let outcome = match result.and_then(|reply| self.apply(&request, reply)) {
            Ok(mode) => SubmitOutcome::Completed { kind, mode },
            Err(err) => SubmitOutcome::Failed {
                kind,
                error: self.fail(err),
            },
        };
        let _ = self.event_tx.send(OrchestratorEvent::RequestEnd { kind });
        outcome
    }

    fn build_request(&self, text: &str) -> Request {
        match &*self.mode.read() {
            Mode::Interrupted { state, .. } => Request::Resume(ResumeRequest::new(state, text)),
            Mode::Idle | Mode::Approved { .. } => Request::Query(QueryRequest::new(
                text,
                &self.config.context,
                self.session.user_id(),
            )),
        }
    }

    /// Accept a classified reply: record the assistant turn and move the mode.
    fn apply(&self, request: &Request, reply: Reply) -> Result<ModeKind> {
        let (content, from, to) = {
            let mut mode = self.mode.write();
            let (content, next) = match reply {
                Reply::ServerError { message } => return Err(Error::ServerReported(message)),
                Reply::Answer { text } => (text, Mode::Idle),
                Reply::Interrupt {
                    content,
                    feedback_options,
                    state,
                } => (
                    content.clone(),
                    Mode::Interrupted {
                        state,
                        feedback_options,
                        proposal: content,
                    },
                ),
                Reply::Approved { state } => {
                    let proposal = mode.latest_proposal().unwrap_or_default().to_string();
                    let state = state
                        .or_else(|| request.sent_state().cloned())
                        .unwrap_or_default();
                    (
                        APPROVAL_MESSAGE.to_string(),
                        Mode::Approved { state, proposal },
                    )
                }
            };
            let from = mode.kind();
            *mode = next;
            (content, from, mode.kind())
        };

        self.append(Turn::assistant(content));
        if from != to {
            tracing::debug!("Mode {} -> {}", from, to);
            let _ = self
                .event_tx
                .send(OrchestratorEvent::ModeChanged { from, to });
        }
        Ok(to)
    }

    /// Record a failed exchange; the mode is left as it was.
    fn fail(&self, err: Error) -> ErrorReport {
        if err.is_unauthorized() {
            tracing::warn!("Backend rejected credentials, clearing session");
            self.session.clear();
        }
        let report = ErrorReport::from(&err);
        tracing::warn!("Exchange failed ({}): {}", report.kind, report.message);

        self.append(Turn::assistant(report.marker()));
        *self.last_error.lock() = Some(report.clone());
        let _ = self.event_tx.send(OrchestratorEvent::Error {
            kind: report.kind,
            message: report.message.clone(),
        });
        report
    }

    fn append(&self, turn: Turn) {
        self.transcript.append(turn.clone());
        let _ = self.event_tx.send(OrchestratorEvent::TurnAppended { turn });
    }

    /// Payload for the export collaborator; present only once approved
    pub fn approved_proposal(&self) -> Option<ApprovedProposal> {
        match &*self.mode.read() {
            Mode::Approved { state, proposal } => Some(ApprovedProposal {
                state: state.clone(),
                proposal: proposal.clone(),
            }),
            _ => None,
        }
    }

    /// Hand the approved proposal to `sink` and record what it reports back.
    ///
    /// Returns `None` when there is nothing approved to export.
    pub async fn export(&self, sink: &dyn ExportSink, is_winning: bool) -> Option<ExportStatus> {
        let approved = self.approved_proposal()?;
        let status = match sink.save(&approved, is_winning).await {
            Ok(link) => ExportStatus::Linked(link),
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                ExportStatus::Failed(e.to_string())
            }
        };
        self.record_export(status.clone());
        Some(status)
    }

    /// Record an export result obtained outside [`export`](Self::export)
    pub fn record_export(&self, status: ExportStatus) {
        let _ = self.event_tx.send(OrchestratorEvent::ExportRecorded {
            link: status.link().map(str::to_string),
            error: status.error().map(str::to_string),
        });
        *self.last_export.lock() = Some(status);
    }

    pub fn last_export(&self) -> Option<ExportStatus> {
        self.last_export.lock().clone()
    }
}
