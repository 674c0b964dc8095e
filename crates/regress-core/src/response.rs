//! Normalized engine response record.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One item of a repeating structure: sub-element tag to its text.
///
/// Related-FAQ items, connectors and disambiguation options share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Option<String>>);

/// A related-FAQ entry (`AnswerId`, `RecognitionId`, `QuestionText`, ...).
pub type FaqItem = Record;
/// A follow-up link or action offered by the engine.
pub type ConnectorItem = Record;
/// One candidate answer in a disambiguation prompt.
pub type DisambiguationOption = Record;

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// Text of `key`; `None` when absent or empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Whether the sub-element was present at all.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of sub-elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no sub-elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Value stored under one response field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Present but without content (`<foo/>`, `<connectors></connectors>`).
    Null,
    /// Verbatim element text; never coerced.
    Text(String),
    /// A non-empty repeating structure.
    Records(Vec<Record>),
}

impl FieldValue {
    /// The text, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The records, if this is a repeating structure with items.
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(r) => Some(r),
            _ => None,
        }
    }

    /// Whether this is the empty sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! known_fields {
    ($($variant:ident => $key:literal),+ $(,)?) => {
        /// Response keys the engine documents.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum KnownField {
            $(
                #[doc = concat!("`", $key, "`")]
                $variant,
            )+
        }

        impl KnownField {
            /// Every known field, in documentation order.
            pub const ALL: &'static [KnownField] = &[$(KnownField::$variant),+];

            /// The key as it appears in a normalized response.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(KnownField::$variant => $key,)+
                }
            }

            /// Looks up a key; case-sensitive, as the engine's tags are.
            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some(KnownField::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

known_fields! {
    AnswerId => "answerID",
    AnswerLinkId => "answerLinkID",
    AutoSubmitMode => "autosubmitmode",
    AutoSubmitWaitTime => "autosubmitwaittime",
    BackNavDisabled => "backnavdisabled",
    BackNavFlag => "backnavflag",
    BackNavText => "backnavtext",
    UserIntent => "userintent",
    BotAnswer => "botanswer",
    ConditionId => "conditionID",
    ConditionLinkId => "conditionLinkID",
    Connectors => "connectors",
    ConversationHistory => "conversationhistory",
    CurrentBa => "currentBA",
    CurrentChannel => "currentChannel",
    DisableAutocomplete => "disableautocomplete",
    DisambiguationOptions => "disambiguationoptions",
    DtreeNodeId => "dtreenodeid",
    DtreeObjectId => "dtreeobjectid",
    EntrySuggestions => "entrysuggestions",
    FbResponse => "fbresponse",
    ForceSessionClose => "forcesessionclose",
    HideUserEntry => "hideuserentry",
    IcsAppended => "icsappended",
    Ident => "ident",
    LiveChatRequested => "livechatrequested",
    LiveChatSkill => "livechatskill",
    MaxSemanticFaqs => "maxsemanticfaqs",
    Question => "question",
    RecognitionId => "recognitionID",
    RelatedListPromptText => "relatedlistprompttext",
    Section => "section",
    SiteContext => "sitecontext",
    TransactionCount => "transactioncount",
    UserEntryAllowed => "userentryallowed",
    UserLogId => "userlogid",
    ValidResponse => "validresponse",
    RelatedList => "related_list",
}

impl fmt::Display for KnownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response key, either documented or passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldName {
    /// A documented key.
    Known(KnownField),
    /// Any other tag the engine sent.
    Unknown(String),
}

impl FieldName {
    /// Classifies a raw key.
    pub fn from_key(key: &str) -> Self {
        KnownField::from_key(key).map_or_else(|| Self::Unknown(key.to_string()), Self::Known)
    }

    /// The raw key.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(k) => k.as_str(),
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized engine response: field name to [`FieldValue`].
///
/// Key order is irrelevant. The typed accessors cover the documented fields;
/// [`EngineResponse::get`] reaches anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineResponse {
    fields: HashMap<String, FieldValue>,
}

impl EngineResponse {
    /// Creates an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a field; a later insert under the same key wins.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Raw field value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Value of a documented field.
    pub fn known(&self, field: KnownField) -> Option<&FieldValue> {
        self.get(field.as_str())
    }

    /// Text of a field; `None` when absent, null, or a list.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Records of a repeating field; `None` when absent or null.
    pub fn records(&self, key: &str) -> Option<&[Record]> {
        self.get(key).and_then(FieldValue::as_records)
    }

    /// Whether the field was present in the response, null or not.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Whether the field was present and empty.
    pub fn is_null(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::is_null)
    }

    /// Reads a `"true"`/`"false"` flag. Anything else is `None`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.text(key)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Every key present, classified.
    pub fn field_names(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.fields.keys().map(|k| FieldName::from_key(k))
    }

    /// Keys the engine sent that are not documented.
    pub fn unknown_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|k| KnownField::from_key(k).is_none())
    }

    /// Iterates all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields were decoded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // --- Typed accessors ---

    /// Session identifier.
    pub fn ident(&self) -> Option<&str> {
        self.text(KnownField::Ident.as_str())
    }

    /// Answer text shown to the user.
    pub fn bot_answer(&self) -> Option<&str> {
        self.text(KnownField::BotAnswer.as_str())
    }

    /// Matched answer id, as text.
    pub fn answer_id(&self) -> Option<&str> {
        self.text(KnownField::AnswerId.as_str())
    }

    /// Recognized question.
    pub fn user_intent(&self) -> Option<&str> {
        self.text(KnownField::UserIntent.as_str())
    }

    /// Custom label of the dtree back button.
    pub fn back_nav_text(&self) -> Option<&str> {
        self.text(KnownField::BackNavText.as_str())
    }

    /// Live-chat queue the engine routed to.
    pub fn live_chat_skill(&self) -> Option<&str> {
        self.text(KnownField::LiveChatSkill.as_str())
    }

    /// Prompt shown above related results.
    pub fn related_list_prompt_text(&self) -> Option<&str> {
        self.text(KnownField::RelatedListPromptText.as_str())
    }

    /// Related-FAQ items, `None` when the engine suggested none.
    pub fn related_list(&self) -> Option<&[FaqItem]> {
        self.records(KnownField::RelatedList.as_str())
    }

    /// Connectors, `None` when the engine offered none.
    pub fn connectors(&self) -> Option<&[ConnectorItem]> {
        self.records(KnownField::Connectors.as_str())
    }

    /// Disambiguation options, `None` when there are none.
    pub fn disambiguation_options(&self) -> Option<&[DisambiguationOption]> {
        self.records(KnownField::DisambiguationOptions.as_str())
    }

    /// `livechatrequested` flag.
    pub fn live_chat_requested(&self) -> Option<bool> {
        self.flag(KnownField::LiveChatRequested.as_str())
    }

    /// `autosubmitmode` flag.
    pub fn auto_submit_mode(&self) -> Option<bool> {
        self.flag(KnownField::AutoSubmitMode.as_str())
    }

    /// `hideuserentry` flag.
    pub fn hide_user_entry(&self) -> Option<bool> {
        self.flag(KnownField::HideUserEntry.as_str())
    }
}

impl FromIterator<(String, FieldValue)> for EngineResponse {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
