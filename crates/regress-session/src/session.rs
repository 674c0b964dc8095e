use chrono::{DateTime, Utc};
use regress_core::EngineResponse;
use serde::{Deserialize, Serialize};

/// A conversation with the engine, as seen from the client.
///
/// The engine owns the real state; the client only keeps the identifier and
/// the latest turn so callers can thread them into the next request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Engine-assigned identifier (`ident`).
    pub id: String,
    /// Normalized response of the most recent turn.
    pub last_response: EngineResponse,
    /// Turns exchanged so far, the opening request included.
    pub turns: u32,
    /// When the opening response arrived.
    pub started_at: DateTime<Utc>,
    /// When the latest response arrived.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Starts tracking a session from its opening response.
    pub fn new(id: impl Into<String>, first_response: EngineResponse) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            last_response: first_response,
            turns: 1,
            started_at: now,
            updated_at: now,
        }
    }

    /// The session after one more turn.
    ///
    /// The engine normally echoes `ident`; if it leaves it out the previous
    /// identifier is kept.
    pub fn advance(&self, response: EngineResponse) -> Self {
        let id = response.ident().unwrap_or(&self.id).to_string();
        Self {
            id,
            last_response: response,
            turns: self.turns + 1,
            started_at: self.started_at,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regress_core::FieldValue;

    fn response_with_ident(ident: Option<&str>) -> EngineResponse {
        let mut resp = EngineResponse::new();
        if let Some(id) = ident {
            resp.insert("ident", FieldValue::Text(id.to_string()));
        }
        resp.insert("botanswer", FieldValue::Text("ok".into()));
        resp
    }

    #[test]
    fn test_advance_counts_turns() {
        let first = Session::new("s1", response_with_ident(Some("s1")));
        let second = first.advance(response_with_ident(Some("s1")));
        assert_eq!(second.turns, 2);
        assert_eq!(second.started_at, first.started_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn test_advance_keeps_id_when_missing() {
        let first = Session::new("s1", response_with_ident(Some("s1")));
        let next = first.advance(response_with_ident(None));
        assert_eq!(next.id, "s1");

        let rotated = first.advance(response_with_ident(Some("s2")));
        assert_eq!(rotated.id, "s2");
    }
}
