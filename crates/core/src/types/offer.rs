//! Offer records built from one warehouse row.
//!
//! The offers column has drifted between table revisions: it may arrive as a
//! repeated column, as a JSON array serialized into a string, or as a plain
//! delimited string. [`parse_offer_list`] accepts all of them.

use serde::Serialize;
use serde_json::Value;

/// Characters that separate offer names in a delimited string column.
const OFFER_DELIMITERS: [char; 3] = [';', ',', '|'];

/// Offers recommended for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferRecord {
    /// VIN as stored in the warehouse row.
    pub vin: String,
    /// Main recommended offer, if the row has one.
    pub primary_offer: Option<String>,
    /// Other applicable offers, never repeating the primary offer.
    pub secondary_offers: Vec<String>,
    /// Customer status code (e.g. `ASISTIO`, `POTENCIAL`).
    pub customer_status: Option<String>,
}

impl OfferRecord {
    /// Build a record from raw column values.
    ///
    /// Blank primary offer and status become `None`. The offers column goes
    /// through [`parse_offer_list`] and then [`without_primary`].
    #[must_use]
    pub fn from_columns(
        vin: impl Into<String>,
        primary: Option<&str>,
        offers: &Value,
        status: Option<&str>,
    ) -> Self {
        let primary_offer = non_blank(primary);
        let secondary_offers = without_primary(parse_offer_list(offers), primary_offer.as_deref());

        Self {
            vin: vin.into(),
            primary_offer,
            secondary_offers,
            customer_status: non_blank(status),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Turn an offers column value into an ordered list of offer names.
///
/// - string: parsed as a JSON array when possible, otherwise split on
///   `;`, `,` or `|` with segments trimmed and empty ones dropped
/// - array: elements kept in order; non-string elements are stringified and
///   nulls dropped
/// - null: empty list
/// - any other scalar: a single-element list
#[must_use]
pub fn parse_offer_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => array_items(&items),
            _ => split_delimited(raw),
        },
        Value::Array(items) => array_items(items),
        other => {
            let single = scalar_to_string(other);
            if single.is_empty() { Vec::new() } else { vec![single] }
        }
    }
}

fn array_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter(|item| !item.is_null())
        .map(scalar_to_string)
        .collect()
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn split_delimited(raw: &str) -> Vec<String> {
    raw.split(|c: char| OFFER_DELIMITERS.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Remove every entry equal to `primary` once both are trimmed and lowercased.
#[must_use]
pub fn without_primary(offers: Vec<String>, primary: Option<&str>) -> Vec<String> {
    let primary_key = comparison_key(primary.unwrap_or_default());
    offers
        .into_iter()
        .filter(|offer| comparison_key(offer) != primary_key)
        .collect()
}

fn comparison_key(s: &str) -> String {
    s.trim().to_lowercase()
}
