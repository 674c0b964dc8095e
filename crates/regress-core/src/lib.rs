//! Core types for the engine regression harness.
//!
//! This crate turns the conversational engine's loosely-typed XML responses
//! into a normalized record and defines the error taxonomy shared by the
//! session client and the conformance checks.
//!
//! # Main types
//!
//! - [`EngineResponse`]: Normalized response mapping field names to [`FieldValue`]s.
//! - [`FieldValue`]: Text, the empty sentinel, or a list of [`Record`]s.
//! - [`FieldName`] / [`KnownField`]: Documented keys plus a pass-through.
//! - [`XmlElement`]: Owned element tree backing raw access.
//! - [`RegressError`], [`ParseError`], [`TransportError`]: Error taxonomy.

/// Error taxonomy.
pub mod error;
/// Tracing subscriber bootstrap.
pub mod logging;
/// XML payload normalization.
pub mod parser;
/// Normalized response record.
pub mod response;
/// Owned XML element tree.
pub mod xml;

pub use error::{ParseError, RegressError, RegressResult, TransportError};
pub use logging::init_logging;
pub use parser::{normalize, parse_document, parse_response};
pub use response::{
    ConnectorItem, DisambiguationOption, EngineResponse, FaqItem, FieldName, FieldValue,
    KnownField, Record,
};
pub use xml::{parse_tree, Elements, XmlElement};
