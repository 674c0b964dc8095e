//! HTTP client for one engine endpoint.

use crate::config::ClientConfig;
use crate::params::{RequestParams, ENTRY, IDENT};
use crate::reply::{CloseOutcome, CloseReport, RawResponse, Reply, ResponseMode};
use crate::session::Session;
use regress_core::{
    parse_document, parse_response, EngineResponse, RegressError, RegressResult, TransportError,
};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

/// Sends requests to one engine endpoint and decodes the answers.
///
/// Requests are issued one at a time; every call is awaited to completion
/// before the next one starts.
pub struct SessionClient {
    endpoint: String,
    project: Option<String>,
    config: ClientConfig,
    http: reqwest::Client,
}

impl SessionClient {
    /// Client with the default configuration.
    pub fn new(endpoint: impl Into<String>) -> RegressResult<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    /// Client with explicit per-deployment behaviour.
    pub fn with_config(endpoint: impl Into<String>, config: ClientConfig) -> RegressResult<Self> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| RegressError::Config(format!("Invalid endpoint '{endpoint}': {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RegressError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            project: None,
            config,
            http,
        })
    }

    /// Labels log output with a project name. Has no effect on requests.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Engine URL every request goes to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Project label used in log output.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Behaviour this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `params` (or a bare GET) and returns the normalized response.
    pub async fn request(&self, params: Option<RequestParams>) -> RegressResult<EngineResponse> {
        let body = self.exchange(self.prepare(params).as_ref()).await?;
        Ok(parse_response(&body)?)
    }

    /// Sends `params` and returns the element tree without normalizing it.
    pub async fn request_raw(&self, params: Option<RequestParams>) -> RegressResult<RawResponse> {
        let body = self.exchange(self.prepare(params).as_ref()).await?;
        Ok(RawResponse::new(parse_document(&body)?))
    }

    /// Sends `params` and ignores whatever comes back.
    pub async fn send(&self, params: Option<RequestParams>) -> RegressResult<()> {
        self.exchange(self.prepare(params).as_ref()).await?;
        Ok(())
    }

    /// Single entry point behind [`request`](Self::request),
    /// [`request_raw`](Self::request_raw) and [`send`](Self::send).
    pub async fn request_with_mode(
        &self,
        params: Option<RequestParams>,
        mode: ResponseMode,
    ) -> RegressResult<Reply> {
        match mode {
            ResponseMode::Parsed => self.request(params).await.map(Reply::Parsed),
            ResponseMode::Raw => self.request_raw(params).await.map(Reply::Raw),
            ResponseMode::Ignore => self.send(params).await.map(|()| Reply::Ignored),
        }
    }

    // --- Session lifecycle ---

    /// Opens a session with a parameterless request.
    pub async fn start_session(&self) -> RegressResult<Session> {
        let response = self.request(None).await?;
        let id = response
            .ident()
            .ok_or_else(|| RegressError::Session("Engine response carried no ident".into()))?
            .to_string();
        info!(endpoint = %self.endpoint, session = %id, "Session initiated");
        Ok(Session::new(id, response))
    }

    /// Sends `entry` as the next user turn of `session`.
    pub async fn continue_session(&self, session: &Session, entry: &str) -> RegressResult<Session> {
        self.send_turn(session, RequestParams::new().with(ENTRY, entry))
            .await
    }

    /// Sends an arbitrary turn; `ident` is always taken from `session`.
    pub async fn send_turn(
        &self,
        session: &Session,
        params: RequestParams,
    ) -> RegressResult<Session> {
        let params = params.with(IDENT, session.id.as_str());
        let response = self.request(Some(params)).await?;
        Ok(session.advance(response))
    }

    /// Opens `count` sessions, one request after another.
    ///
    /// Any failure aborts the whole operation.
    pub async fn open_sessions(&self, count: usize) -> RegressResult<Vec<String>> {
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let response = self.request(None).await?;
            let id = response.ident().ok_or_else(|| {
                RegressError::Session(format!("Session #{n} response carried no ident"))
            })?;
            info!(n, session = %id, "Acquired session");
            ids.push(id.to_string());
        }
        Ok(ids)
    }

    /// Asks the engine to close `session_id`.
    ///
    /// Returns `true` iff the engine answered with an exactly empty body.
    /// Transport failures are errors, not `false`.
    pub async fn close_session(&self, session_id: &str) -> RegressResult<bool> {
        match self.close_outcome(session_id).await {
            CloseOutcome::Closed => Ok(true),
            CloseOutcome::Rejected { .. } => Ok(false),
            CloseOutcome::Failed(e) => Err(e.into()),
        }
    }

    /// Closes every session in turn; `true` iff all of them closed.
    ///
    /// Every identifier is attempted even after a failure.
    pub async fn close_sessions<S: AsRef<str>>(&self, session_ids: &[S]) -> bool {
        self.close_sessions_detailed(session_ids).await.all_closed()
    }

    /// Like [`close_sessions`](Self::close_sessions), keeping each outcome.
    pub async fn close_sessions_detailed<S: AsRef<str>>(&self, session_ids: &[S]) -> CloseReport {
        let mut report = CloseReport::default();
        for id in session_ids {
            let id = id.as_ref();
            let outcome = self.close_outcome(id).await;
            report.outcomes.push((id.to_string(), outcome));
        }
        report
    }

    async fn close_outcome(&self, session_id: &str) -> CloseOutcome {
        // Close requests go out exactly as built; injected defaults do not apply.
        let params = RequestParams::close(session_id);
        match self.exchange(Some(&params)).await {
            Ok(body) if body.is_empty() => {
                debug!(session = %session_id, "Session closed");
                CloseOutcome::Closed
            }
            Ok(body) => {
                let body = String::from_utf8_lossy(&body).into_owned();
                warn!(session = %session_id, body = %body, "Engine did not close session");
                CloseOutcome::Rejected { body }
            }
            Err(e) => {
                warn!(session = %session_id, error = %e, "Close request failed");
                CloseOutcome::Failed(e)
            }
        }
    }

    // --- Wire ---

    fn prepare(&self, params: Option<RequestParams>) -> Option<RequestParams> {
        if self.config.inject_defaults.is_empty() {
            return params;
        }
        let mut params = params.unwrap_or_default();
        params.merge(&self.config.inject_defaults);
        Some(params)
    }

    async fn exchange(&self, params: Option<&RequestParams>) -> Result<Vec<u8>, TransportError> {
        let request = match params {
            Some(params) => self.http.post(&self.endpoint).form(params),
            None => self.http.get(&self.endpoint),
        };

        debug!(
            endpoint = %self.endpoint,
            project = self.project.as_deref().unwrap_or("-"),
            method = if params.is_some() { "POST" } else { "GET" },
            ident = params.and_then(RequestParams::ident).unwrap_or(""),
            "Engine request"
        );

        let resp = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound {
                url: self.endpoint.clone(),
            });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = resp.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.config.timeout())
            } else {
                TransportError::Body(e.to_string())
            }
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "Engine response");
        Ok(body.to_vec())
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.config.timeout())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("endpoint", &self.endpoint)
            .field("project", &self.project)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
