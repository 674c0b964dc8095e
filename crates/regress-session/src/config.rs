use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameter key that turns off third-party integrations on the engine.
pub const DISABLE_INTEGRATION_KEY: &str = "disable_integration";

/// Per-deployment client behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Parameters forced into every request, overriding caller values.
    #[serde(default)]
    pub inject_defaults: BTreeMap<String, String>,
    /// Milliseconds to wait for a complete response.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            inject_defaults: BTreeMap::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Preset for deployments that must run with integrations disabled.
    pub fn disable_integration() -> Self {
        Self::default().with_default(DISABLE_INTEGRATION_KEY, "true")
    }

    /// Adds one injected parameter.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inject_defaults.insert(key.into(), value.into());
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        self
    }

    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
