//! Read-only project configuration.
//!
//! One JSON document per deployed project. The harness only reads it; it
//! resolves an environment name to an endpoint and supplies the optional
//! fixtures the scenarios are driven by.

use regress_core::{RegressError, RegressResult};
use regress_session::{ClientConfig, SessionClient, DISABLE_INTEGRATION_KEY};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A deployed project under regression test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Short project name, typically upper case (`"TWC"`).
    #[serde(default)]
    pub name: String,
    /// Environment name to engine URL.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    /// Knowledge-base publish id the engine is expected to report.
    #[serde(default)]
    pub version_number: String,

    /// Live-chat escalation fixture.
    #[serde(default)]
    pub live_chat_values: Option<LiveChatValues>,
    /// Active-close dtree fixture.
    #[serde(default)]
    pub active_close_values: Option<ActiveCloseValues>,
    /// Input expected to return related FAQs.
    #[serde(default)]
    pub semantic_input: Option<String>,
    /// Dtree path ending on a node with a custom back label.
    #[serde(default)]
    pub custom_back_text_values: Option<CustomBackTextValues>,
    /// Input whose answer has no connectors.
    #[serde(default)]
    pub blank_connector_values: Option<BlankConnectorValues>,
    /// Dtree entry point, sent on a fresh session.
    #[serde(default)]
    pub dtree_input: Option<String>,
    /// Prompt text shown above related results.
    #[serde(default)]
    pub related_results_prompt: Option<String>,
    /// Ambiguous input expected to return disambiguation options.
    #[serde(default)]
    pub disambiguation_input: Option<String>,
    /// Multipart answer fixture.
    #[serde(default)]
    pub multipart_answer_values: Option<MultipartAnswerValues>,
    /// Project-specific extras not modelled above, such as
    /// `user_intent_values`. Read them with [`ProjectConfig::custom_value`].
    #[serde(default)]
    pub custom: BTreeMap<String, serde_json::Value>,

    /// Deployment must run with integrations disabled.
    #[serde(default)]
    pub disable_integration: bool,
    /// Extra parameters forced into every request.
    #[serde(default)]
    pub inject_defaults: BTreeMap<String, String>,
    /// Request timeout override, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Inputs that should route the user to a live agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveChatValues {
    /// Entries sent in order; the last response is checked.
    pub live_chat_input: Vec<String>,
    /// Queue the engine is expected to pick.
    pub live_chat_skill: String,
}

/// Input that enters the active-close dtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCloseValues {
    /// Entry that starts the active-close dtree.
    pub input: String,
    /// `answerID` of the active-close answer.
    pub answer_id: String,
}

/// Two inputs: enter a dtree, then reach the node with a custom back label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomBackTextValues {
    /// Dtree entry, then the node input.
    pub inputs: Vec<String>,
    /// Expected `backnavtext`.
    pub text: String,
}

/// Input whose answer must offer no connectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankConnectorValues {
    /// Entry sent on the session.
    pub input: String,
}

/// An answer that is multipart on most channels.
///
/// On `non_multipart_channel` the engine must send it as one part, so
/// `delimiter` must not appear in the answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartAnswerValues {
    /// Entry whose answer is multipart.
    pub input: String,
    /// Separator between answer parts.
    pub delimiter: String,
    /// Channel that renders the answer in one part.
    #[serde(default)]
    pub non_multipart_channel: Option<String>,
}

/// Input whose answer reports a known user intent.
///
/// Lives under `custom.user_intent_values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIntentValues {
    /// Entry sent on the session.
    pub input: String,
    /// Expected `userintent`.
    pub text: String,
}

/// Key of [`UserIntentValues`] inside [`ProjectConfig::custom`].
pub const USER_INTENT_KEY: &str = "user_intent_values";

impl ProjectConfig {
    /// Parses a configuration document.
    pub fn from_json_str(json: &str) -> RegressResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> RegressResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            RegressError::Config(format!(
                "Failed to read project config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&data)
    }

    /// Engine URL for `environment`.
    pub fn endpoint(&self, environment: &str) -> RegressResult<&str> {
        self.endpoints
            .get(environment)
            .map(String::as_str)
            .ok_or_else(|| {
                let known: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
                RegressError::Config(format!(
                    "No endpoint '{environment}' for project '{}'; known: [{}]",
                    self.name,
                    known.join(", ")
                ))
            })
    }

    /// Deserializes the `custom` entry `key`, if the project defines one.
    pub fn custom_value<T: DeserializeOwned>(&self, key: &str) -> RegressResult<Option<T>> {
        self.custom
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    RegressError::Config(format!(
                        "Invalid custom entry '{key}' for project '{}': {e}",
                        self.name
                    ))
                })
            })
            .transpose()
    }

    /// Client behaviour this project needs.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if self.disable_integration {
            config = config.with_default(DISABLE_INTEGRATION_KEY, "true");
        }
        config.inject_defaults.extend(
            self.inject_defaults
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms.max(1);
        }
        config
    }

    /// A ready client for `environment`.
    pub fn client(&self, environment: &str) -> RegressResult<SessionClient> {
        let client = SessionClient::with_config(self.endpoint(environment)?, self.client_config())?;
        Ok(client.with_project(self.name.clone()))
    }
}
