//! Conformance layer of the engine regression harness.
//!
//! Loads a project's configuration, checks normalized responses against the
//! standard response template, and runs fixture-driven [`Scenario`]s over a
//! live session.

/// Response template and init-response checks.
pub mod checks;
/// Project configuration.
pub mod config;
/// Fixture-driven behaviour scenarios.
pub mod scenarios;

pub use checks::{
    check_init_response, check_standard_template, check_version, expect_field, publish_id,
    Violation, INIT_NULL_KEYS, INIT_VALUE_KEYS, RESPONSE_KEYS,
};
pub use config::{
    ActiveCloseValues, BlankConnectorValues, CustomBackTextValues, LiveChatValues,
    MultipartAnswerValues, ProjectConfig, UserIntentValues, USER_INTENT_KEY,
};
pub use scenarios::{scenarios_for, Scenario, ScenarioDescriptor, ScenarioOutcome};
