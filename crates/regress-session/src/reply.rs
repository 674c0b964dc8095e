use regress_core::{Elements, EngineResponse, TransportError, XmlElement};

/// What to do with the engine's answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Normalize the body into an [`EngineResponse`].
    #[default]
    Parsed,
    /// Hand back the element tree untouched.
    Raw,
    /// Fire and forget; the body is read to completion and discarded
    /// without being parsed.
    Ignore,
}

/// Result of [`SessionClient::request_with_mode`](crate::SessionClient::request_with_mode).
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Normalized response.
    Parsed(EngineResponse),
    /// Un-normalized element tree.
    Raw(RawResponse),
    /// The body was discarded.
    Ignored,
}

impl Reply {
    /// The normalized response, if one was requested.
    pub fn into_parsed(self) -> Option<EngineResponse> {
        match self {
            Self::Parsed(resp) => Some(resp),
            _ => None,
        }
    }

    /// The raw tree, if one was requested.
    pub fn into_raw(self) -> Option<RawResponse> {
        match self {
            Self::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Escape hatch for callers that need the engine's XML as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    root: XmlElement,
}

impl RawResponse {
    pub(crate) fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Every element of the document, root first, in document order.
    pub fn iter(&self) -> Elements<'_> {
        self.root.iter()
    }

    /// The document's root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Takes ownership of the tree.
    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

impl<'a> IntoIterator for &'a RawResponse {
    type Item = &'a XmlElement;
    type IntoIter = Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// How a single close request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Empty body: the engine closed the session.
    Closed,
    /// The engine answered with content, so the close did not take.
    Rejected {
        /// Whatever the engine sent back.
        body: String,
    },
    /// The request itself failed.
    Failed(TransportError),
}

impl CloseOutcome {
    /// Whether the session is known to be closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Per-identifier result of closing several sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseReport {
    /// Outcomes in the order the identifiers were given.
    pub outcomes: Vec<(String, CloseOutcome)>,
}

impl CloseReport {
    /// True iff every session closed. An empty report is trivially true.
    pub fn all_closed(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_closed())
    }

    /// Identifiers that did not close.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_closed())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Outcome for one identifier.
    pub fn outcome(&self, id: &str) -> Option<&CloseOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, outcome)| outcome)
    }

    /// Number of close attempts.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing was attempted.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
