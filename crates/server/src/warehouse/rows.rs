//! `BigQuery` REST response decoding.
//!
//! `jobs.query` returns rows as positional `f`/`v` cells next to a schema.
//! [`decode_rows`] zips them back into JSON objects keyed by column name:
//! scalars stay strings, `REPEATED` fields become arrays and `RECORD` fields
//! become nested objects.

use ofertas_vin_core::OfferRecord;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::queries::alias;

/// Response body of `jobs.query`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    fn is_repeated(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|mode| mode.eq_ignore_ascii_case("REPEATED"))
    }

    fn is_record(&self) -> bool {
        matches!(
            self.field_type.to_ascii_uppercase().as_str(),
            "RECORD" | "STRUCT"
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub v: Value,
}

/// Decode every row of a response against its schema.
#[must_use]
pub fn decode_rows(response: &QueryResponse) -> Vec<Map<String, Value>> {
    let fields = response
        .schema
        .as_ref()
        .map_or(&[][..], |schema| schema.fields.as_slice());

    response
        .rows
        .iter()
        .map(|row| decode_cells(fields, &row.f))
        .collect()
}

fn decode_cells(fields: &[FieldSchema], cells: &[Cell]) -> Map<String, Value> {
    fields
        .iter()
        .zip(cells)
        .map(|(field, cell)| (field.name.clone(), decode_field(field, &cell.v)))
        .collect()
}

fn decode_field(field: &FieldSchema, value: &Value) -> Value {
    if field.is_repeated() {
        return match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| decode_single(field, item.get("v").unwrap_or(item)))
                    .collect(),
            ),
            Value::Null => Value::Array(Vec::new()),
            other => Value::Array(vec![decode_single(field, other)]),
        };
    }

    decode_single(field, value)
}

fn decode_single(field: &FieldSchema, value: &Value) -> Value {
    if !field.is_record() {
        return value.clone();
    }

    // A record cell is itself a row: {"f": [{"v": ...}, ...]}
    let cells: Vec<Cell> = value
        .get("f")
        .and_then(|f| serde_json::from_value(f.clone()).ok())
        .unwrap_or_default();

    if cells.is_empty() {
        return value.clone();
    }
    Value::Object(decode_cells(&field.fields, &cells))
}

/// Map a decoded lookup row onto an [`OfferRecord`].
///
/// `requested_vin` is used when the row's VIN cell is empty.
#[must_use]
pub fn offer_record(row: &Map<String, Value>, requested_vin: &str) -> OfferRecord {
    let vin = row
        .get(alias::VIN)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|vin| !vin.is_empty())
        .unwrap_or(requested_vin);

    OfferRecord::from_columns(
        vin,
        row.get(alias::PRIMARY).and_then(Value::as_str),
        row.get(alias::OFFERS).unwrap_or(&Value::Null),
        row.get(alias::STATUS).and_then(Value::as_str),
    )
}
