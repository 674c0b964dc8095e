//! Fixture-driven behaviour checks against a live session.
//!
//! Each scenario takes its inputs from a [`ProjectConfig`] fixture block and
//! skips itself when the project does not define one.

use crate::checks::{check_version, expect_field, Violation};
use crate::config::{
    ActiveCloseValues, BlankConnectorValues, CustomBackTextValues, LiveChatValues,
    MultipartAnswerValues, ProjectConfig, UserIntentValues, USER_INTENT_KEY,
};
use async_trait::async_trait;
use regress_core::{KnownField, RegressError, RegressResult};
use regress_session::{RequestParams, Session, SessionClient, CHANNEL, ENTRY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Entry that makes the engine report its knowledge-base version.
pub const VERSION_NUMBER_ENTRY: &str = "versionnumber";

/// Name and purpose of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    /// Stable snake_case identifier.
    pub name: String,
    /// One-line summary of the behaviour checked.
    pub description: String,
}

impl ScenarioDescriptor {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// How a scenario ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScenarioOutcome {
    /// Every expectation held.
    Passed,
    /// The project has no fixture for this scenario.
    Skipped {
        /// Which fixture was missing.
        reason: String,
    },
    /// At least one expectation failed.
    Failed {
        /// Every expectation that did not hold.
        violations: Vec<Violation>,
    },
}

impl ScenarioOutcome {
    /// `Passed` when `violations` is empty, `Failed` otherwise.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Self::Passed
        } else {
            Self::Failed { violations }
        }
    }

    fn skipped(reason: &str) -> Self {
        Self::Skipped {
            reason: reason.to_string(),
        }
    }

    /// Every expectation held.
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// The scenario did not run.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// A behaviour check run against an open session.
///
/// Transport and parse failures are returned as errors; failed expectations
/// are a [`ScenarioOutcome::Failed`].
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Name and purpose.
    fn descriptor(&self) -> &ScenarioDescriptor;

    /// Runs the scenario, continuing `session` where it needs one.
    async fn run(&self, client: &SessionClient, session: &Session)
        -> RegressResult<ScenarioOutcome>;
}

/// Every scenario, configured from `config`.
pub fn scenarios_for(config: &ProjectConfig) -> Vec<Arc<dyn Scenario>> {
    vec![
        Arc::new(LiveChat::from_config(config)),
        Arc::new(ActiveClose::from_config(config)),
        Arc::new(Semantic::from_config(config)),
        Arc::new(VersionNumber::from_config(config)),
        Arc::new(CustomBackText::from_config(config)),
        Arc::new(BlankConnectors::from_config(config)),
        Arc::new(Dtree::from_config(config)),
        Arc::new(RelatedResultsPrompt::from_config(config)),
        Arc::new(Disambiguation::from_config(config)),
        Arc::new(NonMultipartAnswer::from_config(config)),
        Arc::new(UserIntent::from_config(config)),
    ]
}

fn same_session(session: &Session, after: &Session) -> Option<Violation> {
    (after.last_response.ident() != Some(session.id.as_str())).then(|| {
        Violation::new(
            KnownField::Ident.as_str(),
            format!(
                "session changed from {} to {:?}",
                session.id,
                after.last_response.ident()
            ),
        )
    })
}

// --- Live chat ---

/// Escalation inputs trigger a live-chat request to the configured queue.
pub struct LiveChat {
    descriptor: ScenarioDescriptor,
    values: Option<LiveChatValues>,
}

impl LiveChat {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "live_chat",
                "Escalation inputs request live chat on the configured skill",
            ),
            values: config.live_chat_values.clone(),
        }
    }
}

#[async_trait]
impl Scenario for LiveChat {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(values) = &self.values else {
            return Ok(ScenarioOutcome::skipped("No live chat values found in config."));
        };
        if values.live_chat_input.is_empty() {
            return Ok(ScenarioOutcome::skipped("Live chat input list is empty."));
        }

        let mut current = session.clone();
        for input in &values.live_chat_input {
            debug!(entry = %input, "Live chat input");
            current = client.continue_session(&current, input).await?;
        }

        let resp = &current.last_response;
        let mut violations: Vec<Violation> = same_session(session, &current).into_iter().collect();
        violations.extend(expect_field(
            resp,
            KnownField::LiveChatSkill.as_str(),
            Some(values.live_chat_skill.as_str()),
        ));
        if resp.live_chat_requested() != Some(true) {
            violations.push(Violation::new(
                KnownField::LiveChatRequested.as_str(),
                "live chat not requested; queue may be out of hours",
            ));
        }
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- Active close ---

/// The active-close input lands on its dtree and hides user entry.
pub struct ActiveClose {
    descriptor: ScenarioDescriptor,
    values: Option<ActiveCloseValues>,
}

impl ActiveClose {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "active_close",
                "Active-close input enters its dtree with auto-submit off",
            ),
            values: config.active_close_values.clone(),
        }
    }
}

#[async_trait]
impl Scenario for ActiveClose {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(values) = &self.values else {
            return Ok(ScenarioOutcome::skipped("No active close values found in config."));
        };

        let after = client.continue_session(session, &values.input).await?;
        let resp = &after.last_response;

        let mut violations: Vec<Violation> = same_session(session, &after).into_iter().collect();
        violations.extend(expect_field(
            resp,
            KnownField::AnswerId.as_str(),
            Some(values.answer_id.as_str()),
        ));
        violations.extend(expect_field(
            resp,
            KnownField::AutoSubmitMode.as_str(),
            Some("false"),
        ));
        violations.extend(expect_field(
            resp,
            KnownField::HideUserEntry.as_str(),
            Some("true"),
        ));
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- Semantic search ---

/// A semantic query returns related FAQs.
pub struct Semantic {
    descriptor: ScenarioDescriptor,
    input: Option<String>,
}

impl Semantic {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "semantic",
                "Semantic input returns a related FAQ list",
            ),
            input: config.semantic_input.clone(),
        }
    }
}

#[async_trait]
impl Scenario for Semantic {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(input) = &self.input else {
            return Ok(ScenarioOutcome::skipped("No semantic input to test."));
        };

        let after = client.continue_session(session, input).await?;
        let violations = match after.last_response.related_list() {
            Some(_) => Vec::new(),
            None => vec![Violation::new(
                KnownField::RelatedList.as_str(),
                "no related results",
            )],
        };
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- Version number ---

/// The engine runs the knowledge-base version the project expects.
pub struct VersionNumber {
    descriptor: ScenarioDescriptor,
    expected: String,
}

impl VersionNumber {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "version_number",
                "The engine reports the expected knowledge-base publish id",
            ),
            expected: config.version_number.clone(),
        }
    }
}

#[async_trait]
impl Scenario for VersionNumber {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        if self.expected.is_empty() {
            return Ok(ScenarioOutcome::skipped("No version number in config."));
        }
        let after = client
            .continue_session(session, VERSION_NUMBER_ENTRY)
            .await?;
        Ok(ScenarioOutcome::from_violations(check_version(
            &after.last_response,
            &self.expected,
        )))
    }
}

// --- Custom back text ---

/// A dtree node shows its custom back-button label.
pub struct CustomBackText {
    descriptor: ScenarioDescriptor,
    values: Option<CustomBackTextValues>,
}

impl CustomBackText {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "custom_back_text",
                "Second dtree node carries the custom back text",
            ),
            values: config.custom_back_text_values.clone(),
        }
    }
}

#[async_trait]
impl Scenario for CustomBackText {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(values) = &self.values else {
            return Ok(ScenarioOutcome::skipped("Skipping custom back text test."));
        };
        let [enter, node, ..] = values.inputs.as_slice() else {
            return Ok(ScenarioOutcome::skipped(
                "Custom back text needs two inputs.",
            ));
        };

        let entered = client.continue_session(session, enter).await?;
        info!(
            answer = entered.last_response.bot_answer().unwrap_or(""),
            session = %entered.id,
            "First dtree transaction"
        );
        let at_node = client.continue_session(&entered, node).await?;
        info!(
            answer = at_node.last_response.bot_answer().unwrap_or(""),
            session = %at_node.id,
            "Second dtree transaction"
        );

        Ok(ScenarioOutcome::from_violations(
            expect_field(
                &at_node.last_response,
                KnownField::BackNavText.as_str(),
                Some(values.text.as_str()),
            )
            .into_iter()
            .collect(),
        ))
    }
}

// --- Blank connectors ---

/// An answer without follow-ups decodes connectors as empty.
pub struct BlankConnectors {
    descriptor: ScenarioDescriptor,
    values: Option<BlankConnectorValues>,
}

impl BlankConnectors {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "blank_connectors",
                "Input whose answer offers no connectors",
            ),
            values: config.blank_connector_values.clone(),
        }
    }
}

#[async_trait]
impl Scenario for BlankConnectors {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(values) = &self.values else {
            return Ok(ScenarioOutcome::skipped("Skipping blank connectors test."));
        };

        let after = client.continue_session(session, &values.input).await?;
        let violations = match after.last_response.connectors() {
            None => Vec::new(),
            Some(items) => vec![Violation::new(
                KnownField::Connectors.as_str(),
                format!("response returned {} connectors", items.len()),
            )],
        };
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- Dtree ---

/// A dtree entry point offers connectors, even from a brand-new session.
pub struct Dtree {
    descriptor: ScenarioDescriptor,
    input: Option<String>,
}

impl Dtree {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "dtree",
                "Dtree input on a fresh session returns connectors",
            ),
            input: config.dtree_input.clone(),
        }
    }
}

#[async_trait]
impl Scenario for Dtree {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        _session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(input) = &self.input else {
            return Ok(ScenarioOutcome::skipped("No dtree input in config."));
        };

        // Empty ident: the engine opens a new session for this turn.
        let resp = client
            .request(Some(RequestParams::turn("", input.as_str())))
            .await?;
        let violations = match resp.connectors() {
            Some(_) => Vec::new(),
            None => vec![Violation::new(
                KnownField::Connectors.as_str(),
                "response did not contain connectors",
            )],
        };
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- Related results prompt ---

/// Related results are introduced by the configured prompt text.
pub struct RelatedResultsPrompt {
    descriptor: ScenarioDescriptor,
    input: Option<String>,
    prompt: Option<String>,
}

impl RelatedResultsPrompt {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "related_results_prompt",
                "Semantic input shows the configured related-results prompt",
            ),
            input: config.semantic_input.clone(),
            prompt: config.related_results_prompt.clone(),
        }
    }
}

#[async_trait]
impl Scenario for RelatedResultsPrompt {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let (Some(input), Some(prompt)) = (&self.input, &self.prompt) else {
            return Ok(ScenarioOutcome::skipped(
                "Needs both semantic input and a related results prompt.",
            ));
        };

        let after = client.continue_session(session, input).await?;
        let violations = expect_field(
            &after.last_response,
            KnownField::RelatedListPromptText.as_str(),
            Some(prompt.as_str()),
        )
        .map(|mut v| {
            v.message = format!(
                "{} (session {}, response session {:?})",
                v.message,
                session.id,
                after.last_response.ident()
            );
            v
        });
        Ok(ScenarioOutcome::from_violations(
            violations.into_iter().collect(),
        ))
    }
}

// --- Disambiguation ---

/// An ambiguous input offers candidate answers to choose from.
pub struct Disambiguation {
    descriptor: ScenarioDescriptor,
    input: Option<String>,
}

impl Disambiguation {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "disambiguation",
                "Ambiguous input returns disambiguation options",
            ),
            input: config.disambiguation_input.clone(),
        }
    }
}

#[async_trait]
impl Scenario for Disambiguation {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(input) = &self.input else {
            return Ok(ScenarioOutcome::skipped("No disambiguation input in config."));
        };

        let after = client.continue_session(session, input).await?;
        let violations = match after.last_response.disambiguation_options() {
            Some(_) => Vec::new(),
            None => vec![Violation::new(
                KnownField::DisambiguationOptions.as_str(),
                format!("no disambiguation options for {input:?}"),
            )],
        };
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- Non-multipart answer ---

/// A multipart answer arrives in one piece on a single-part channel.
pub struct NonMultipartAnswer {
    descriptor: ScenarioDescriptor,
    values: Option<MultipartAnswerValues>,
}

impl NonMultipartAnswer {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "non_multipart_answer",
                "Single-part channel receives the answer without part delimiters",
            ),
            values: config.multipart_answer_values.clone(),
        }
    }
}

#[async_trait]
impl Scenario for NonMultipartAnswer {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        _session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let Some(values) = &self.values else {
            return Ok(ScenarioOutcome::skipped("No multipart answer values in config."));
        };

        // Sent without an ident, so the engine answers on a fresh session.
        let mut params = RequestParams::new().with(ENTRY, values.input.as_str());
        if let Some(channel) = &values.non_multipart_channel {
            params.insert(CHANNEL, channel.as_str());
        }
        let resp = client.request(Some(params)).await?;

        let field = KnownField::BotAnswer.as_str();
        let violations = match resp.bot_answer() {
            Some(answer) if answer.contains(values.delimiter.as_str()) => vec![Violation::new(
                field,
                format!("answer split on {:?}: {answer}", values.delimiter),
            )],
            Some(_) => Vec::new(),
            None => vec![Violation::new(field, "response carried no answer")],
        };
        Ok(ScenarioOutcome::from_violations(violations))
    }
}

// --- User intent ---

/// A known input reports the expected user intent.
pub struct UserIntent {
    descriptor: ScenarioDescriptor,
    values: Result<Option<UserIntentValues>, String>,
}

impl UserIntent {
    /// Takes its fixture from `config`.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            descriptor: ScenarioDescriptor::new(
                "user_intent",
                "Configured input reports its user intent",
            ),
            values: config
                .custom_value(USER_INTENT_KEY)
                .map_err(|e| e.to_string()),
        }
    }
}

#[async_trait]
impl Scenario for UserIntent {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn run(
        &self,
        client: &SessionClient,
        session: &Session,
    ) -> RegressResult<ScenarioOutcome> {
        let values = match &self.values {
            Ok(Some(values)) => values,
            Ok(None) => {
                return Ok(ScenarioOutcome::skipped(
                    "No user intent values in custom config.",
                ))
            }
            Err(e) => return Err(RegressError::Config(e.clone())),
        };

        let after = client.continue_session(session, &values.input).await?;
        Ok(ScenarioOutcome::from_violations(
            expect_field(
                &after.last_response,
                KnownField::UserIntent.as_str(),
                Some(values.text.as_str()),
            )
            .into_iter()
            .collect(),
        ))
    }
}
