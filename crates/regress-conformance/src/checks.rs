//! Expectations every engine response must meet.
//!
//! Checks never panic and never stop at the first problem; they return every
//! [`Violation`] found so a report can list them all.

use regex::Regex;
use regress_core::{EngineResponse, FieldValue, KnownField};
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Keys every response must carry.
pub const RESPONSE_KEYS: &[KnownField] = &[
    KnownField::AnswerId,
    KnownField::AnswerLinkId,
    KnownField::AutoSubmitMode,
    KnownField::AutoSubmitWaitTime,
    KnownField::BackNavDisabled,
    KnownField::BackNavFlag,
    KnownField::BackNavText,
    KnownField::UserIntent,
    KnownField::BotAnswer,
    KnownField::ConditionId,
    KnownField::ConditionLinkId,
    KnownField::Connectors,
    KnownField::ConversationHistory,
    KnownField::CurrentBa,
    KnownField::CurrentChannel,
    KnownField::DisableAutocomplete,
    KnownField::DisambiguationOptions,
    KnownField::DtreeNodeId,
    KnownField::DtreeObjectId,
    KnownField::EntrySuggestions,
    KnownField::FbResponse,
    KnownField::ForceSessionClose,
    KnownField::HideUserEntry,
    KnownField::IcsAppended,
    KnownField::Ident,
    KnownField::LiveChatRequested,
    KnownField::LiveChatSkill,
    KnownField::MaxSemanticFaqs,
    KnownField::Question,
    KnownField::RecognitionId,
    KnownField::RelatedListPromptText,
    KnownField::Section,
    KnownField::SiteContext,
    KnownField::TransactionCount,
    KnownField::UserEntryAllowed,
    KnownField::UserLogId,
    KnownField::ValidResponse,
];

/// Keys that must be empty on the session-opening response.
pub const INIT_NULL_KEYS: &[KnownField] = &[
    KnownField::BackNavFlag,
    KnownField::Connectors,
    KnownField::ConversationHistory,
    KnownField::DisambiguationOptions,
    KnownField::DtreeNodeId,
    KnownField::DtreeObjectId,
    KnownField::FbResponse,
    KnownField::LiveChatSkill,
    KnownField::Question,
    KnownField::RelatedListPromptText,
    KnownField::SiteContext,
];

/// Keys that must be populated on the session-opening response.
pub const INIT_VALUE_KEYS: &[KnownField] = &[
    KnownField::AnswerId,
    KnownField::AnswerLinkId,
    KnownField::AutoSubmitMode,
    KnownField::AutoSubmitWaitTime,
    KnownField::BackNavDisabled,
    KnownField::BotAnswer,
    KnownField::ConditionId,
    KnownField::ConditionLinkId,
    KnownField::CurrentBa,
    KnownField::CurrentChannel,
    KnownField::DisableAutocomplete,
    KnownField::EntrySuggestions,
    KnownField::ForceSessionClose,
    KnownField::HideUserEntry,
    KnownField::IcsAppended,
    KnownField::Ident,
    KnownField::LiveChatRequested,
    KnownField::MaxSemanticFaqs,
    KnownField::RecognitionId,
    KnownField::Section,
    KnownField::TransactionCount,
    KnownField::UserEntryAllowed,
    KnownField::UserLogId,
    KnownField::ValidResponse,
];

/// Engine status line of a healthy response.
pub const VALID_RESPONSE: &str = "CVUSAVA Status: Ok";
/// Length of an engine session identifier.
pub const IDENT_LEN: usize = 22;

/// One failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field the expectation is about.
    pub field: String,
    /// What was wrong.
    pub message: String,
}

impl Violation {
    /// A violation on `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every documented key is present (null counts as present).
pub fn check_standard_template(resp: &EngineResponse) -> Vec<Violation> {
    RESPONSE_KEYS
        .iter()
        .filter(|key| !resp.contains(key.as_str()))
        .map(|key| Violation::new(key.as_str(), "missing from response"))
        .collect()
}

/// Shape of the session-opening response.
pub fn check_init_response(resp: &EngineResponse) -> Vec<Violation> {
    let mut violations = Vec::new();

    for key in INIT_NULL_KEYS {
        match resp.known(*key) {
            Some(FieldValue::Null) => {}
            Some(other) => violations.push(Violation::new(
                key.as_str(),
                format!("expected null, got {other:?}"),
            )),
            None => violations.push(Violation::new(key.as_str(), "missing from response")),
        }
    }
    for key in INIT_VALUE_KEYS {
        if resp.known(*key).map_or(true, FieldValue::is_null) {
            violations.push(Violation::new(key.as_str(), "unexpected null"));
        }
    }

    expect_text(resp, KnownField::AutoSubmitMode, "true", &mut violations);
    expect_text(resp, KnownField::BackNavDisabled, "true", &mut violations);
    expect_text(resp, KnownField::DisableAutocomplete, "false", &mut violations);
    expect_text(resp, KnownField::ForceSessionClose, "false", &mut violations);
    expect_text(resp, KnownField::HideUserEntry, "false", &mut violations);
    expect_text(resp, KnownField::LiveChatRequested, "false", &mut violations);
    expect_text(resp, KnownField::UserEntryAllowed, "true", &mut violations);
    expect_text(resp, KnownField::ValidResponse, VALID_RESPONSE, &mut violations);

    if let Some(wait) = text(resp, KnownField::AutoSubmitWaitTime) {
        if wait.is_empty() || !wait.chars().all(|c| c.is_ascii_digit()) {
            violations.push(Violation::new(
                KnownField::AutoSubmitWaitTime.as_str(),
                format!("expected digits, got {wait:?}"),
            ));
        }
    }

    if let Some(answer) = text(resp, KnownField::BotAnswer) {
        if answer.chars().count() <= 5 {
            violations.push(Violation::new(
                KnownField::BotAnswer.as_str(),
                format!("answer too short: {answer:?}"),
            ));
        }
    }

    for key in [KnownField::CurrentBa, KnownField::CurrentChannel] {
        if let Some(value) = text(resp, key) {
            if !value.to_lowercase().contains("root") {
                violations.push(Violation::new(
                    key.as_str(),
                    format!("expected a root context, got {value:?}"),
                ));
            }
        }
    }

    if let Some(raw) = text(resp, KnownField::EntrySuggestions) {
        match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            Ok(list) if !list.is_empty() => {}
            Ok(_) => violations.push(Violation::new(
                KnownField::EntrySuggestions.as_str(),
                "no suggestions",
            )),
            Err(e) => violations.push(Violation::new(
                KnownField::EntrySuggestions.as_str(),
                format!("not a JSON list: {e}"),
            )),
        }
    }

    if let Some(ident) = text(resp, KnownField::Ident) {
        if ident.chars().count() != IDENT_LEN {
            violations.push(Violation::new(
                KnownField::Ident.as_str(),
                format!("expected {IDENT_LEN} characters, got {}", ident.chars().count()),
            ));
        }
    }

    if let Some(log_id) = text(resp, KnownField::UserLogId) {
        if !(9..=10).contains(&log_id.chars().count()) {
            violations.push(Violation::new(
                KnownField::UserLogId.as_str(),
                format!("userlogid was {log_id:?}"),
            ));
        }
    }

    violations
}

/// Knowledge-base publish id reported in a `versionnumber` answer.
pub fn publish_id(bot_answer: &str) -> Option<&str> {
    static PUBLISH_ID: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PUBLISH_ID
        .get_or_init(|| Regex::new(r"publish_id: (\d+)").ok())
        .as_ref()?;
    re.captures(bot_answer)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The engine reports the expected knowledge-base version.
pub fn check_version(resp: &EngineResponse, expected: &str) -> Vec<Violation> {
    let field = KnownField::BotAnswer.as_str();
    let Some(answer) = resp.bot_answer() else {
        return vec![Violation::new(field, "no answer to read the version from")];
    };
    match publish_id(answer) {
        Some(found) if found == expected => Vec::new(),
        Some(found) => vec![Violation::new(
            field,
            format!("version number was {found}. Expected {expected}"),
        )],
        None => vec![Violation::new(
            field,
            format!("version number not found. Botanswer: {answer}"),
        )],
    }
}

/// `field` must equal `expected` exactly.
pub fn expect_field(
    resp: &EngineResponse,
    field: &str,
    expected: Option<&str>,
) -> Option<Violation> {
    let actual = resp.text(field);
    (actual != expected).then(|| {
        Violation::new(
            field,
            format!("expected {expected:?}, got {actual:?}"),
        )
    })
}

fn text(resp: &EngineResponse, key: KnownField) -> Option<&str> {
    resp.text(key.as_str())
}

fn expect_text(
    resp: &EngineResponse,
    key: KnownField,
    expected: &str,
    violations: &mut Vec<Violation>,
) {
    // Missing or null values are already reported by the key-set checks.
    if let Some(actual) = text(resp, key) {
        if actual != expected {
            violations.push(Violation::new(
                key.as_str(),
                format!("expected {expected:?}, got {actual:?}"),
            ));
        }
    }
}
