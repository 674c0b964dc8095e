use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session identifier parameter.
pub const IDENT: &str = "ident";
/// Free-text user input parameter.
pub const ENTRY: &str = "entry";
/// Delivery channel the answer is rendered for.
pub const CHANNEL: &str = "channel";
/// Parameter that asks the engine to close the session.
pub const SESSION_CLOSED: &str = "sessionclosed";

/// Form parameters for one engine request.
///
/// Keys are kept sorted so the encoded body is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversational turn: `ident` plus `entry`. An empty `ident` opens a
    /// new session.
    pub fn turn(ident: impl Into<String>, entry: impl Into<String>) -> Self {
        Self::new().with(IDENT, ident).with(ENTRY, entry)
    }

    /// The close request for `ident`.
    pub fn close(ident: impl Into<String>) -> Self {
        Self::new().with(IDENT, ident).with(SESSION_CLOSED, "1")
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Removes `key`, returning its old value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Current `ident`, if set.
    pub fn ident(&self) -> Option<&str> {
        self.get(IDENT)
    }

    /// Current `entry`, if set.
    pub fn entry(&self) -> Option<&str> {
        self.get(ENTRY)
    }

    /// Copies every pair from `other` over this set.
    pub fn merge<'a>(&mut self, other: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (key, value) in other {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Iterates pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
