//! Decodes one engine XML payload into an [`EngineResponse`].
//!
//! Every top-level child of the root becomes one field. Three repeating
//! structures are special-cased and decoded into lists of [`Record`]s:
//!
//! | tag (match)                          | path to items                    | key                      |
//! |--------------------------------------|----------------------------------|--------------------------|
//! | `faqitems` (exact)                   | `suggestedfaqlist/semanticfaqs`  | `related_list`           |
//! | `connectors` (any case)              | the element itself               | `connectors`             |
//! | `disambiguationoptions` (any case)   | the element itself               | `disambiguationoptions`  |
//!
//! A container with no items decodes to [`FieldValue::Null`], never to an
//! empty list.

use crate::error::ParseError;
use crate::response::{EngineResponse, FieldValue, KnownField, Record};
use crate::xml::{parse_tree, XmlElement};
use quick_xml::Reader;
use tracing::trace;

const FAQ_ITEMS_TAG: &str = "faqitems";
const SEMANTIC_FAQS_PATH: &str = "suggestedfaqlist/semanticfaqs";

/// Parses a raw response body.
pub fn parse_response(body: impl AsRef<[u8]>) -> Result<EngineResponse, ParseError> {
    let root = parse_document(body)?;
    Ok(normalize(&root))
}

/// Decodes a raw body into its element tree without normalizing it.
///
/// The body is decoded with the encoding named by a byte-order mark or the
/// XML declaration, UTF-8 otherwise.
pub fn parse_document(body: impl AsRef<[u8]>) -> Result<XmlElement, ParseError> {
    let text = decode_body(body.as_ref())?;
    parse_tree(&text)
}

fn decode_body(body: &[u8]) -> Result<String, ParseError> {
    let mut reader = Reader::from_reader(body);
    // The first event settles the encoding. Markup errors surface in parse_tree.
    let _ = reader.read_event();
    let text = reader
        .decoder()
        .decode(body)
        .map_err(|e| ParseError::Encoding(e.to_string()))?;
    Ok(text.trim_start_matches('\u{feff}').to_owned())
}

/// Normalizes an already parsed document.
pub fn normalize(root: &XmlElement) -> EngineResponse {
    let mut response = EngineResponse::new();

    for child in &root.children {
        if child.tag == FAQ_ITEMS_TAG {
            let items = child.find_path(SEMANTIC_FAQS_PATH);
            response.insert(KnownField::RelatedList.as_str(), list_or_null(items));
        } else if child.tag.eq_ignore_ascii_case(KnownField::Connectors.as_str()) {
            response.insert(KnownField::Connectors.as_str(), list_or_null(Some(child)));
        } else if child
            .tag
            .eq_ignore_ascii_case(KnownField::DisambiguationOptions.as_str())
        {
            response.insert(
                KnownField::DisambiguationOptions.as_str(),
                list_or_null(Some(child)),
            );
        } else {
            let value = child
                .text
                .clone()
                .map_or(FieldValue::Null, FieldValue::Text);
            response.insert(child.tag.clone(), value);
        }
    }

    trace!(fields = response.len(), "normalized engine response");
    response
}

fn list_or_null(container: Option<&XmlElement>) -> FieldValue {
    match container {
        Some(el) if !el.is_empty() => {
            FieldValue::Records(el.children.iter().map(to_record).collect())
        }
        _ => FieldValue::Null,
    }
}

fn to_record(item: &XmlElement) -> Record {
    item.children
        .iter()
        .map(|field| (field.tag.clone(), field.text.clone()))
        .collect()
}
